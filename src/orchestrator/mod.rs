//! Orchestration context: the single entry point transport layers call into.
//!
//! The original design kept a process-wide draft registry in ambient global
//! state. Here it is an explicit [`Orchestrator`] owning the server registry,
//! artifact store, deployment log, and a per-key draft map. Mutation of a
//! given (client, profile) draft, including the publish read-modify-write for
//! that key, is serialized through a per-key mutex; operations on different
//! keys proceed independently.

use crate::builder::{ConfigBuilder, DraftState};
use crate::config::OrchestratorConfig;
use crate::core::Result;
use crate::deploy::{DeploymentLog, DeploymentRecord, DeploymentWorkflow};
use crate::diff::{self, ConfigDiff};
use crate::models::{DraftKey, McpConfig};
use crate::publish::{PublishReceipt, PublishingWorkflow};
use crate::registry::ServerRegistry;
use crate::signing::ArtifactSigner;
use crate::storage::{ArtifactStore, IndexEntry};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Owns all orchestration state and serializes per-key operations.
pub struct Orchestrator {
    registry: ServerRegistry,
    store: ArtifactStore,
    log: DeploymentLog,
    config: OrchestratorConfig,
    drafts: DashMap<DraftKey, Arc<Mutex<ConfigBuilder>>>,
}

impl Orchestrator {
    /// Build an orchestrator from configuration, initializing storage
    /// directories as needed.
    pub fn new(config: OrchestratorConfig) -> Result<Self> {
        Ok(Self {
            registry: ServerRegistry::with_defaults(),
            store: ArtifactStore::new(config.storage_dir.clone())?,
            log: DeploymentLog::new(config.deployments_dir.clone())?,
            config,
            drafts: DashMap::new(),
        })
    }

    /// The server registry (read-only catalog).
    #[must_use]
    pub fn registry(&self) -> &ServerRegistry {
        &self.registry
    }

    /// The artifact store.
    #[must_use]
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Add a server to the draft for `key`, creating the draft on first use.
    pub fn add_server(
        &self,
        key: &DraftKey,
        server_id: &str,
        params: &BTreeMap<String, String>,
        env_vars: &BTreeMap<String, String>,
    ) -> Result<()> {
        self.with_draft(key, |draft| draft.add_server(&self.registry, server_id, params, env_vars))
    }

    /// Remove a server from the draft for `key`. No-op if absent.
    pub fn remove_server(&self, key: &DraftKey, server_id: &str) -> Result<()> {
        self.with_draft(key, |draft| {
            draft.remove_server(server_id);
            Ok(())
        })
    }

    /// Reset the draft for `key` to empty.
    pub fn clear_draft(&self, key: &DraftKey) -> Result<()> {
        self.with_draft(key, |draft| {
            draft.clear();
            Ok(())
        })
    }

    /// Current payload of the draft for `key` (empty payload if no draft).
    pub fn build_draft(&self, key: &DraftKey) -> Result<McpConfig> {
        self.with_draft(key, |draft| Ok(draft.build()))
    }

    /// Snapshot the draft for `key` so a transport can persist it.
    pub fn snapshot_draft(&self, key: &DraftKey) -> Result<DraftState> {
        self.with_draft(key, |draft| Ok(draft.snapshot()))
    }

    /// Replace the draft for `key` with a previously persisted snapshot.
    pub fn restore_draft(&self, key: &DraftKey, state: DraftState) -> Result<()> {
        let cell = self.draft_cell(key);
        let mut draft = cell.lock().expect("draft lock poisoned");
        *draft = ConfigBuilder::from_snapshot(key.clone(), state);
        Ok(())
    }

    /// Diff the current draft against the latest published payload for `key`.
    ///
    /// An empty payload stands in for "nothing published yet", so a first
    /// draft diffs as all-added.
    pub fn diff_against_latest(&self, key: &DraftKey) -> Result<ConfigDiff> {
        let draft_payload = self.build_draft(key)?;
        let published = match self.store.latest(&key.client_id, &key.profile_id)? {
            Some((_, hash)) => self.store.get(&hash)?.payload,
            None => McpConfig::default(),
        };
        Ok(diff::compare(&published, &draft_payload))
    }

    /// Publish the draft for `key`, discarding the draft on success.
    ///
    /// Holds the per-key lock across validate→sign→store→index so concurrent
    /// publishers on the same slot cannot race the version counter.
    pub fn publish(&self, key: &DraftKey, signer: &ArtifactSigner) -> Result<PublishReceipt> {
        let cell = self.draft_cell(key);
        let mut draft = cell.lock().expect("draft lock poisoned");
        let receipt = PublishingWorkflow::new(&self.store).publish(key, &draft.build(), signer)?;
        draft.clear();
        debug!(slot = %key, version = receipt.version, "draft discarded after publish");
        Ok(receipt)
    }

    /// Deploy a published artifact (latest unless `artifact_hash` is given)
    /// to `target_path`.
    pub fn deploy(
        &self,
        key: &DraftKey,
        target_path: &Path,
        artifact_hash: Option<&str>,
    ) -> Result<DeploymentRecord> {
        DeploymentWorkflow::new(&self.store, &self.log, &self.config.public_key_path)
            .deploy(key, target_path, artifact_hash)
    }

    /// Roll back to the artifact deployed before the most recent one.
    pub fn rollback(&self, key: &DraftKey) -> Result<DeploymentRecord> {
        DeploymentWorkflow::new(&self.store, &self.log, &self.config.public_key_path).rollback(key)
    }

    /// Publish history for a slot, oldest first.
    pub fn publish_history(&self, key: &DraftKey) -> Result<Vec<IndexEntry>> {
        self.store.history(&key.client_id, &key.profile_id)
    }

    /// Deployment history for a slot, oldest first.
    pub fn deployment_history(&self, key: &DraftKey) -> Result<Vec<DeploymentRecord>> {
        self.log.history(key)
    }

    /// Run `f` with exclusive access to the draft for `key`.
    fn with_draft<T>(&self, key: &DraftKey, f: impl FnOnce(&mut ConfigBuilder) -> Result<T>) -> Result<T> {
        let cell = self.draft_cell(key);
        let mut draft = cell.lock().expect("draft lock poisoned");
        f(&mut draft)
    }

    fn draft_cell(&self, key: &DraftKey) -> Arc<Mutex<ConfigBuilder>> {
        self.drafts
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(ConfigBuilder::new(key.clone()))))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{TempDir, tempdir};

    fn orchestrator() -> (TempDir, Orchestrator, ArtifactSigner) {
        let temp = tempdir().unwrap();
        let config = OrchestratorConfig::for_root(temp.path());
        let signer = ArtifactSigner::generate("default");
        signer.save_public_key(&config.public_key_path).unwrap();
        let orch = Orchestrator::new(config).unwrap();
        (temp, orch, signer)
    }

    fn fs_params() -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("path".to_string(), "/data".to_string());
        params
    }

    #[test]
    fn test_draft_created_on_first_access() {
        let (_temp, orch, _) = orchestrator();
        let key = DraftKey::new("claude-desktop", "default");
        let payload = orch.build_draft(&key).unwrap();
        assert!(payload.mcp_servers.is_empty());
    }

    #[test]
    fn test_publish_discards_draft() {
        let (_temp, orch, signer) = orchestrator();
        let key = DraftKey::new("claude-desktop", "default");
        orch.add_server(&key, "filesystem", &fs_params(), &BTreeMap::new()).unwrap();

        let receipt = orch.publish(&key, &signer).unwrap();
        assert_eq!(receipt.version, 1);
        assert!(orch.build_draft(&key).unwrap().mcp_servers.is_empty());
    }

    #[test]
    fn test_failed_publish_keeps_draft() {
        let (_temp, orch, signer) = orchestrator();
        let key = DraftKey::new("claude-desktop", "default");
        // Empty draft fails validation
        assert!(orch.publish(&key, &signer).is_err());

        orch.add_server(&key, "filesystem", &fs_params(), &BTreeMap::new()).unwrap();
        assert!(orch.publish(&key, &signer).is_ok());
    }

    #[test]
    fn test_diff_against_latest_all_added_when_unpublished() {
        let (_temp, orch, _) = orchestrator();
        let key = DraftKey::new("claude-desktop", "default");
        orch.add_server(&key, "filesystem", &fs_params(), &BTreeMap::new()).unwrap();

        let diff = orch.diff_against_latest(&key).unwrap();
        assert_eq!(diff.added, vec!["filesystem"]);
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn test_keys_are_isolated() {
        let (_temp, orch, _) = orchestrator();
        let key_a = DraftKey::new("claude-desktop", "default");
        let key_b = DraftKey::new("claude-desktop", "dev");
        orch.add_server(&key_a, "filesystem", &fs_params(), &BTreeMap::new()).unwrap();

        assert_eq!(orch.build_draft(&key_a).unwrap().server_count(), 1);
        assert_eq!(orch.build_draft(&key_b).unwrap().server_count(), 0);
    }

    #[test]
    fn test_concurrent_adds_on_same_key_serialize() {
        use std::sync::Arc as StdArc;
        let (_temp, orch, _) = orchestrator();
        let orch = StdArc::new(orch);
        let key = DraftKey::new("claude-desktop", "default");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let orch = StdArc::clone(&orch);
                let key = key.clone();
                std::thread::spawn(move || {
                    orch.add_server(&key, "filesystem", &fs_params(), &BTreeMap::new()).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Last-write-wins: still exactly one entry
        assert_eq!(orch.build_draft(&key).unwrap().server_count(), 1);
    }
}
