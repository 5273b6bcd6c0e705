//! Publishing workflow: validate → sign → store → index.
//!
//! The four steps run as one logical unit with partial-failure safety:
//!
//! 1. **Validate** the draft payload; any error-severity violation aborts
//!    before a single byte is written.
//! 2. **Serialize canonically** so identical logical content always hashes the
//!    same way, then sign the bytes.
//! 3. **Store** the signed artifact under its content hash.
//! 4. **Index** the new version for the (client, profile) slot.
//!
//! Store-then-index ordering is deliberate. An artifact that exists but is not
//! indexed is a harmless orphan: content-addressed storage tolerates it and a
//! retry of the whole publish is safe because `put` is idempotent. The reverse
//! order could leave an index entry pointing at nothing, which is corruption.

use crate::core::{OrchestratorError, Result, Severity, Violation};
use crate::models::{Artifact, DraftKey, McpConfig};
use crate::signing::ArtifactSigner;
use crate::storage::ArtifactStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Outcome of a successful publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishReceipt {
    /// Slot the artifact was published for
    pub client_id: String,
    /// Profile within the client family
    pub profile_id: String,
    /// Version number assigned in the index
    pub version: u64,
    /// Content address of the stored artifact
    pub content_hash: String,
    /// Key id that signed the payload
    pub key_id: String,
    /// ISO 8601 publish timestamp
    pub created_at: String,
    /// Number of servers in the published payload
    pub server_count: usize,
}

/// Orchestrates validated configuration publishing against a store.
pub struct PublishingWorkflow<'a> {
    store: &'a ArtifactStore,
}

impl<'a> PublishingWorkflow<'a> {
    /// Create a workflow over the given store.
    #[must_use]
    pub fn new(store: &'a ArtifactStore) -> Self {
        Self {
            store,
        }
    }

    /// Publish a draft payload as a signed, content-addressed artifact.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::Validation`] if the payload fails schema checks
    ///   (nothing is written in this case)
    /// - [`OrchestratorError::StorageWriteFailure`] if the artifact write
    ///   fails (nothing is indexed; retrying the publish is safe)
    /// - [`OrchestratorError::VersionConflict`] if a concurrent publish won
    ///   the version race (retrying recomputes the version)
    pub fn publish(
        &self,
        key: &DraftKey,
        payload: &McpConfig,
        signer: &ArtifactSigner,
    ) -> Result<PublishReceipt> {
        // Step 1: validate before any write
        let violations = validate_payload(payload);
        if violations.iter().any(|v| v.severity == Severity::Error) {
            return Err(OrchestratorError::Validation {
                violations,
            });
        }

        // Step 2: canonical bytes, hash, signature
        let payload_bytes = payload.canonical_bytes()?;
        let content_hash = ArtifactStore::compute_content_hash(&payload_bytes);
        let signature = signer.sign(&payload_bytes);
        let created_at = Utc::now().to_rfc3339();
        debug!(draft = %key, %content_hash, "draft validated and signed");

        let artifact = Artifact {
            content_hash: content_hash.clone(),
            created_at: created_at.clone(),
            signature,
            key_id: signer.key_id().to_string(),
            payload: payload.clone(),
        };

        // Step 3: store (idempotent by content hash)
        self.store.put(&artifact)?;

        // Step 4: index under the next version
        let version = self.store.latest(&key.client_id, &key.profile_id)?.map_or(1, |(v, _)| v + 1);
        self.store.publish_index_entry(
            &key.client_id,
            &key.profile_id,
            version,
            &content_hash,
            signer.key_id(),
            &created_at,
        )?;

        info!(draft = %key, version, %content_hash, "published artifact");
        Ok(PublishReceipt {
            client_id: key.client_id.clone(),
            profile_id: key.profile_id.clone(),
            version,
            content_hash,
            key_id: signer.key_id().to_string(),
            created_at,
            server_count: payload.server_count(),
        })
    }
}

/// Schema validation of a configuration payload.
///
/// Returns the complete structured finding list; callers decide whether
/// error-severity findings abort (the publish step does).
#[must_use]
pub fn validate_payload(payload: &McpConfig) -> Vec<Violation> {
    let mut violations = Vec::new();

    if payload.mcp_servers.is_empty() {
        violations.push(Violation::error(
            "EMPTY_CONFIG",
            "Configuration is empty. Add at least one server before publishing.",
            None,
        ));
    }

    for (name, entry) in &payload.mcp_servers {
        let is_remote = entry.url.is_some() || entry.transport.is_some();
        if is_remote {
            if entry.url.as_deref().is_none_or(str::is_empty) {
                violations.push(Violation::error(
                    "MISSING_URL",
                    format!("Remote server '{name}' is missing a 'url' field."),
                    Some(name),
                ));
            }
            if entry.command.is_some() {
                violations.push(Violation::error(
                    "AMBIGUOUS_TRANSPORT",
                    format!("Server '{name}' declares both a command and a URL."),
                    Some(name),
                ));
            }
        } else if entry.command.as_deref().is_none_or(str::is_empty) {
            violations.push(Violation::error(
                "MISSING_COMMAND",
                format!("Server '{name}' is missing the required 'command' field."),
                Some(name),
            ));
        }

        if let Some(env) = &entry.env {
            for (env_key, env_value) in env {
                if env_value.trim().is_empty() {
                    violations.push(Violation::warning(
                        "EMPTY_ENV_VAR",
                        format!("Server '{name}' has empty environment variable '{env_key}'."),
                        Some(name),
                    ));
                }
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::McpServerEntry;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn payload_with(name: &str, entry: McpServerEntry) -> McpConfig {
        let mut payload = McpConfig::default();
        payload.mcp_servers.insert(name.to_string(), entry);
        payload
    }

    fn filesystem_payload() -> McpConfig {
        payload_with(
            "filesystem",
            McpServerEntry::stdio(
                "npx",
                vec!["-y".into(), "@modelcontextprotocol/server-filesystem".into()],
                None,
            ),
        )
    }

    #[test]
    fn test_publish_assigns_version_one() {
        let temp = tempdir().unwrap();
        let store = ArtifactStore::new(temp.path()).unwrap();
        let signer = ArtifactSigner::generate("default");
        let key = DraftKey::new("claude-desktop", "default");

        let receipt =
            PublishingWorkflow::new(&store).publish(&key, &filesystem_payload(), &signer).unwrap();
        assert_eq!(receipt.version, 1);
        assert_eq!(receipt.server_count, 1);

        let (version, hash) = store.latest("claude-desktop", "default").unwrap().unwrap();
        assert_eq!(version, 1);
        assert_eq!(hash, receipt.content_hash);
    }

    #[test]
    fn test_successive_publishes_increment_version() {
        let temp = tempdir().unwrap();
        let store = ArtifactStore::new(temp.path()).unwrap();
        let signer = ArtifactSigner::generate("default");
        let key = DraftKey::new("claude-desktop", "default");
        let workflow = PublishingWorkflow::new(&store);

        let r1 = workflow.publish(&key, &filesystem_payload(), &signer).unwrap();
        let github =
            payload_with("github", McpServerEntry::stdio("npx", vec!["-y".into()], None));
        let r2 = workflow.publish(&key, &github, &signer).unwrap();

        assert_eq!(r1.version, 1);
        assert_eq!(r2.version, 2);
        assert_ne!(r1.content_hash, r2.content_hash);
    }

    #[test]
    fn test_identical_payload_republish_dedups_storage() {
        let temp = tempdir().unwrap();
        let store = ArtifactStore::new(temp.path()).unwrap();
        let signer = ArtifactSigner::generate("default");
        let key = DraftKey::new("claude-desktop", "default");
        let workflow = PublishingWorkflow::new(&store);

        let r1 = workflow.publish(&key, &filesystem_payload(), &signer).unwrap();
        let r2 = workflow.publish(&key, &filesystem_payload(), &signer).unwrap();

        // Same content address, distinct versions
        assert_eq!(r1.content_hash, r2.content_hash);
        assert_eq!(r2.version, 2);
    }

    #[test]
    fn test_empty_payload_fails_validation_before_write() {
        let temp = tempdir().unwrap();
        let store = ArtifactStore::new(temp.path()).unwrap();
        let signer = ArtifactSigner::generate("default");
        let key = DraftKey::new("claude-desktop", "default");

        let err = PublishingWorkflow::new(&store)
            .publish(&key, &McpConfig::default(), &signer)
            .unwrap_err();
        let violations = err.violations().unwrap();
        assert_eq!(violations[0].code, "EMPTY_CONFIG");

        // Nothing written, nothing indexed
        assert!(store.latest("claude-desktop", "default").unwrap().is_none());
    }

    #[test]
    fn test_validator_flags_missing_command() {
        let entry = McpServerEntry {
            command: None,
            args: vec![],
            env: None,
            transport: None,
            url: None,
            headers: None,
        };
        let violations = validate_payload(&payload_with("broken", entry));
        assert!(violations.iter().any(|v| v.code == "MISSING_COMMAND"));
    }

    #[test]
    fn test_validator_warns_on_empty_env_value() {
        let mut env = BTreeMap::new();
        env.insert("GITHUB_TOKEN".to_string(), "  ".to_string());
        let payload = payload_with("github", McpServerEntry::stdio("npx", vec![], Some(env)));

        let violations = validate_payload(&payload);
        let warning = violations.iter().find(|v| v.code == "EMPTY_ENV_VAR").unwrap();
        assert_eq!(warning.severity, Severity::Warning);

        // Warnings do not block publish
        let temp = tempdir().unwrap();
        let store = ArtifactStore::new(temp.path()).unwrap();
        let signer = ArtifactSigner::generate("default");
        let key = DraftKey::new("claude-desktop", "default");
        assert!(PublishingWorkflow::new(&store).publish(&key, &payload, &signer).is_ok());
    }

    #[test]
    fn test_validator_flags_remote_without_url() {
        let entry = McpServerEntry {
            command: None,
            args: vec![],
            env: None,
            transport: Some("sse".into()),
            url: None,
            headers: None,
        };
        let violations = validate_payload(&payload_with("n8n", entry));
        assert!(violations.iter().any(|v| v.code == "MISSING_URL"));
    }
}
