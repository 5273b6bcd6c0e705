//! Draft configuration builder.
//!
//! A [`ConfigBuilder`] accumulates edits to one (client, profile) slot before
//! publishing. It is pure in-memory state over registry data: no disk or
//! network I/O happens here. Drafts live in the orchestrator's draft registry
//! and are discarded on publish or explicit clear. Transports that span
//! process invocations carry drafts as [`DraftState`] snapshots.

use crate::core::{OrchestratorError, Result};
use crate::models::{DraftKey, McpConfig, McpServerEntry};
use crate::registry::{HttpAuthType, ServerDefinition, ServerRegistry, TransportType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Serializable snapshot of a draft's contents.
///
/// The slot key is deliberately not part of the snapshot; it is re-supplied on
/// restore so a snapshot cannot be replayed against the wrong slot by accident.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftState {
    /// Resolved server entries keyed by server id
    pub servers: BTreeMap<String, McpServerEntry>,
    /// Registry id that produced each entry
    pub provenance: BTreeMap<String, String>,
}

/// Mutable draft of a client's MCP server configuration.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    key: DraftKey,
    servers: BTreeMap<String, McpServerEntry>,
    /// Which registry definition produced each entry (server name → server_id)
    provenance: BTreeMap<String, String>,
}

impl ConfigBuilder {
    /// Create an empty draft for the given slot.
    #[must_use]
    pub fn new(key: DraftKey) -> Self {
        Self {
            key,
            servers: BTreeMap::new(),
            provenance: BTreeMap::new(),
        }
    }

    /// The (client, profile) slot this draft belongs to.
    #[must_use]
    pub fn key(&self) -> &DraftKey {
        &self.key
    }

    /// Add a server from the registry to the draft.
    ///
    /// Placeholders in the definition's args/URL are substituted from
    /// `params`, falling back to declared defaults. Re-adding an existing
    /// server id replaces its entry (last-write-wins).
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::ServerNotFound`] if `server_id` is not in the registry
    /// - [`OrchestratorError::MissingParameter`] if a required parameter has
    ///   neither a supplied value nor a default, or a required environment
    ///   variable is not supplied
    pub fn add_server(
        &mut self,
        registry: &ServerRegistry,
        server_id: &str,
        params: &BTreeMap<String, String>,
        env_vars: &BTreeMap<String, String>,
    ) -> Result<()> {
        let definition = registry.lookup(server_id)?;
        let entry = resolve_entry(definition, params, env_vars)?;

        debug!(server_id, draft = %self.key, "adding server to draft");
        self.servers.insert(server_id.to_string(), entry);
        self.provenance.insert(server_id.to_string(), definition.server_id.clone());
        Ok(())
    }

    /// Remove a server from the draft. No-op if the server is absent.
    pub fn remove_server(&mut self, server_id: &str) {
        if self.servers.remove(server_id).is_some() {
            self.provenance.remove(server_id);
            debug!(server_id, draft = %self.key, "removed server from draft");
        }
    }

    /// Build the immutable payload representing current draft state.
    ///
    /// Pure: calling this does not change the draft.
    #[must_use]
    pub fn build(&self) -> McpConfig {
        McpConfig {
            mcp_servers: self.servers.clone(),
        }
    }

    /// Reset the draft to empty.
    pub fn clear(&mut self) {
        self.servers.clear();
        self.provenance.clear();
    }

    /// Sorted server names currently in the draft.
    #[must_use]
    pub fn server_names(&self) -> Vec<&str> {
        self.servers.keys().map(String::as_str).collect()
    }

    /// Whether a server is present in the draft.
    #[must_use]
    pub fn has_server(&self, server_id: &str) -> bool {
        self.servers.contains_key(server_id)
    }

    /// Number of servers in the draft.
    #[must_use]
    pub fn count(&self) -> usize {
        self.servers.len()
    }

    /// Registry id that produced the named entry, if it is still present.
    #[must_use]
    pub fn provenance(&self, server_id: &str) -> Option<&str> {
        self.provenance.get(server_id).map(String::as_str)
    }

    /// Snapshot the draft for persistence.
    #[must_use]
    pub fn snapshot(&self) -> DraftState {
        DraftState {
            servers: self.servers.clone(),
            provenance: self.provenance.clone(),
        }
    }

    /// Rebuild a draft for `key` from a previously taken snapshot.
    #[must_use]
    pub fn from_snapshot(key: DraftKey, state: DraftState) -> Self {
        Self {
            key,
            servers: state.servers,
            provenance: state.provenance,
        }
    }
}

/// Resolve a registry definition into a concrete invocation spec.
fn resolve_entry(
    definition: &ServerDefinition,
    params: &BTreeMap<String, String>,
    env_vars: &BTreeMap<String, String>,
) -> Result<McpServerEntry> {
    for env_name in &definition.required_env {
        if !env_vars.contains_key(env_name) {
            return Err(OrchestratorError::MissingParameter {
                server_id: definition.server_id.clone(),
                name: env_name.clone(),
            });
        }
    }

    // Required parameters need a value or default even when no template
    // references them.
    for parameter in &definition.parameters {
        if parameter.required
            && parameter.default.is_none()
            && !params.contains_key(&parameter.name)
        {
            return Err(OrchestratorError::MissingParameter {
                server_id: definition.server_id.clone(),
                name: parameter.name.clone(),
            });
        }
    }

    match definition.transport {
        TransportType::Stdio => {
            let command =
                definition.stdio_command.clone().ok_or_else(|| OrchestratorError::Validation {
                    violations: vec![crate::core::Violation::error(
                        "MISSING_COMMAND",
                        format!(
                            "Stdio server '{}' has no command in its definition",
                            definition.server_id
                        ),
                        Some(&definition.server_id),
                    )],
                })?;
            let args = definition
                .stdio_args
                .iter()
                .map(|arg| substitute(definition, arg, params))
                .collect::<Result<Vec<_>>>()?;
            let env = collect_env(definition, env_vars);
            Ok(McpServerEntry::stdio(command, args, env))
        }
        TransportType::Http | TransportType::Sse => {
            let template =
                definition.http_url.as_deref().ok_or_else(|| OrchestratorError::Validation {
                    violations: vec![crate::core::Violation::error(
                        "MISSING_URL",
                        format!(
                            "Remote server '{}' has no URL in its definition",
                            definition.server_id
                        ),
                        Some(&definition.server_id),
                    )],
                })?;
            let url = substitute(definition, template, params)?;
            let transport = match definition.transport {
                TransportType::Http => "http",
                TransportType::Sse => "sse",
                TransportType::Stdio => unreachable!("outer match excludes stdio"),
            };
            let headers = bearer_headers(definition, env_vars);
            Ok(McpServerEntry::remote(transport, url, headers))
        }
    }
}

/// Replace every `{param}` placeholder with a supplied value or declared default.
fn substitute(
    definition: &ServerDefinition,
    template: &str,
    params: &BTreeMap<String, String>,
) -> Result<String> {
    let mut resolved = template.to_string();
    for parameter in &definition.parameters {
        let placeholder = format!("{{{}}}", parameter.name);
        if !resolved.contains(&placeholder) {
            continue;
        }
        let value = params
            .get(&parameter.name)
            .cloned()
            .or_else(|| parameter.default.clone())
            .ok_or_else(|| OrchestratorError::MissingParameter {
                server_id: definition.server_id.clone(),
                name: parameter.name.clone(),
            })?;
        resolved = resolved.replace(&placeholder, &value);
    }
    Ok(resolved)
}

/// Environment block for stdio servers: required vars plus any supplied
/// optional vars.
fn collect_env(
    definition: &ServerDefinition,
    env_vars: &BTreeMap<String, String>,
) -> Option<BTreeMap<String, String>> {
    let mut env = BTreeMap::new();
    for name in definition.required_env.iter().chain(&definition.optional_env) {
        if let Some(value) = env_vars.get(name) {
            env.insert(name.clone(), value.clone());
        }
    }
    if env.is_empty() { None } else { Some(env) }
}

/// Authorization header for bearer-authenticated remote servers.
///
/// The token is taken from the first required environment variable, which is
/// how catalog entries declare their API keys.
fn bearer_headers(
    definition: &ServerDefinition,
    env_vars: &BTreeMap<String, String>,
) -> Option<BTreeMap<String, String>> {
    match definition.http_auth_type {
        Some(HttpAuthType::Bearer) => {
            let token = definition.required_env.first().and_then(|name| env_vars.get(name))?;
            let mut headers = BTreeMap::new();
            headers.insert("Authorization".to_string(), format!("Bearer {token}"));
            Some(headers)
        }
        Some(HttpAuthType::None | HttpAuthType::OAuth) | None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ConfigBuilder {
        ConfigBuilder::new(DraftKey::new("claude-desktop", "default"))
    }

    fn registry() -> ServerRegistry {
        ServerRegistry::with_defaults()
    }

    #[test]
    fn test_add_server_resolves_placeholders() {
        let registry = registry();
        let mut builder = draft();
        let mut params = BTreeMap::new();
        params.insert("path".to_string(), "/home/me/docs".to_string());

        builder.add_server(&registry, "filesystem", &params, &BTreeMap::new()).unwrap();

        let payload = builder.build();
        let entry = &payload.mcp_servers["filesystem"];
        assert_eq!(entry.command.as_deref(), Some("npx"));
        assert_eq!(
            entry.args,
            vec!["-y", "@modelcontextprotocol/server-filesystem", "/home/me/docs"]
        );
    }

    #[test]
    fn test_add_server_unknown_id() {
        let registry = registry();
        let mut builder = draft();
        let err = builder
            .add_server(&registry, "nope", &BTreeMap::new(), &BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::ServerNotFound { .. }));
    }

    #[test]
    fn test_add_server_missing_required_parameter() {
        let registry = registry();
        let mut builder = draft();
        let err = builder
            .add_server(&registry, "filesystem", &BTreeMap::new(), &BTreeMap::new())
            .unwrap_err();
        assert!(
            matches!(err, OrchestratorError::MissingParameter { ref name, .. } if name == "path")
        );
    }

    #[test]
    fn test_required_param_without_placeholder_is_rejected() {
        use crate::registry::{ParameterDefinition, ParameterType};

        let definition = ServerDefinition {
            server_id: "scratch".to_string(),
            display_name: "Scratch Server".to_string(),
            description: "Local scratch server".to_string(),
            transport: TransportType::Stdio,
            stdio_command: Some("scratch-mcp".to_string()),
            stdio_args: vec!["--serve".to_string()],
            http_url: None,
            http_auth_type: None,
            required_env: Vec::new(),
            optional_env: Vec::new(),
            // Required but never referenced by a {workspace} placeholder
            parameters: vec![ParameterDefinition {
                name: "workspace".to_string(),
                param_type: ParameterType::Path,
                description: "Workspace directory".to_string(),
                required: true,
                default: None,
                example: None,
            }],
            documentation_url: None,
            npm_package: None,
            pypi_package: None,
            package_manager: Default::default(),
            tags: Vec::new(),
        };
        let mut registry = ServerRegistry::new();
        registry.register(definition).unwrap();

        let mut builder = draft();
        let err = builder
            .add_server(&registry, "scratch", &BTreeMap::new(), &BTreeMap::new())
            .unwrap_err();
        assert!(
            matches!(err, OrchestratorError::MissingParameter { ref name, .. } if name == "workspace")
        );

        // Supplying the value is enough even though nothing substitutes it
        let mut params = BTreeMap::new();
        params.insert("workspace".to_string(), "/tmp/ws".to_string());
        assert!(builder.add_server(&registry, "scratch", &params, &BTreeMap::new()).is_ok());
    }

    #[test]
    fn test_add_server_missing_required_env() {
        let registry = registry();
        let mut builder = draft();
        let err = builder
            .add_server(&registry, "github", &BTreeMap::new(), &BTreeMap::new())
            .unwrap_err();
        assert!(
            matches!(err, OrchestratorError::MissingParameter { ref name, .. } if name == "GITHUB_TOKEN")
        );
    }

    #[test]
    fn test_readd_replaces_entry() {
        let registry = registry();
        let mut builder = draft();
        let mut first = BTreeMap::new();
        first.insert("path".to_string(), "/a".to_string());
        let mut second = BTreeMap::new();
        second.insert("path".to_string(), "/b".to_string());

        builder.add_server(&registry, "filesystem", &first, &BTreeMap::new()).unwrap();
        builder.add_server(&registry, "filesystem", &second, &BTreeMap::new()).unwrap();

        assert_eq!(builder.count(), 1);
        let payload = builder.build();
        assert!(payload.mcp_servers["filesystem"].args.contains(&"/b".to_string()));
    }

    #[test]
    fn test_remove_absent_server_is_noop() {
        let mut builder = draft();
        builder.remove_server("not-there");
        assert_eq!(builder.count(), 0);
    }

    #[test]
    fn test_build_is_pure() {
        let registry = registry();
        let mut builder = draft();
        let mut env = BTreeMap::new();
        env.insert("GITHUB_TOKEN".to_string(), "ghp_x".to_string());
        builder.add_server(&registry, "github", &BTreeMap::new(), &env).unwrap();

        let first = builder.build();
        let second = builder.build();
        assert_eq!(first, second);
        assert_eq!(builder.count(), 1);
    }

    #[test]
    fn test_sse_server_gets_bearer_header_and_default_port() {
        let registry = registry();
        let mut builder = draft();
        let mut env = BTreeMap::new();
        env.insert("N8N_API_KEY".to_string(), "secret".to_string());

        builder.add_server(&registry, "n8n", &BTreeMap::new(), &env).unwrap();

        let payload = builder.build();
        let entry = &payload.mcp_servers["n8n"];
        assert_eq!(entry.transport.as_deref(), Some("sse"));
        assert_eq!(entry.url.as_deref(), Some("http://localhost:5679/mcp/sse"));
        assert_eq!(entry.headers.as_ref().unwrap()["Authorization"], "Bearer secret");
    }

    #[test]
    fn test_clear_resets_draft() {
        let registry = registry();
        let mut builder = draft();
        let mut env = BTreeMap::new();
        env.insert("GITHUB_TOKEN".to_string(), "ghp_x".to_string());
        builder.add_server(&registry, "github", &BTreeMap::new(), &env).unwrap();

        builder.clear();
        assert_eq!(builder.count(), 0);
        assert!(builder.build().mcp_servers.is_empty());
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let registry = registry();
        let mut builder = draft();
        let mut params = BTreeMap::new();
        params.insert("path".to_string(), "/data".to_string());
        builder.add_server(&registry, "filesystem", &params, &BTreeMap::new()).unwrap();

        let state = builder.snapshot();
        let restored =
            ConfigBuilder::from_snapshot(DraftKey::new("claude-desktop", "default"), state);

        assert_eq!(restored.build(), builder.build());
        assert_eq!(restored.provenance("filesystem"), Some("filesystem"));
    }

    #[test]
    fn test_provenance_tracked() {
        let registry = registry();
        let mut builder = draft();
        let mut env = BTreeMap::new();
        env.insert("GITHUB_TOKEN".to_string(), "ghp_x".to_string());
        builder.add_server(&registry, "github", &BTreeMap::new(), &env).unwrap();
        assert_eq!(builder.provenance("github"), Some("github"));
        builder.remove_server("github");
        assert_eq!(builder.provenance("github"), None);
    }
}
