//! Shared data models for configuration payloads and signed artifacts.
//!
//! The payload format mirrors what MCP clients actually read: a top-level
//! `mcpServers` mapping from server name to invocation spec. Maps are
//! `BTreeMap` so serialization is canonical: identical logical content always
//! produces identical bytes, which is what makes content addressing and
//! deduplication work.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifies one logical configuration slot: a (client, profile) pair.
///
/// At most one draft exists per key at a time; the orchestrator serializes
/// mutation per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DraftKey {
    /// Client family identifier (e.g. `claude-desktop`)
    pub client_id: String,
    /// Profile identifier (e.g. `default`, `dev`)
    pub profile_id: String,
}

impl DraftKey {
    /// Create a key from its two components.
    pub fn new(client_id: impl Into<String>, profile_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            profile_id: profile_id.into(),
        }
    }
}

impl fmt::Display for DraftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.client_id, self.profile_id)
    }
}

/// The configuration payload an MCP client reads.
///
/// Serializes as `{"mcpServers": {...}}` with server names in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpConfig {
    /// Map of server names to their resolved invocation specs
    #[serde(rename = "mcpServers")]
    pub mcp_servers: BTreeMap<String, McpServerEntry>,
}

impl McpConfig {
    /// Serialize to canonical bytes (compact JSON, sorted keys).
    ///
    /// Content hashes are computed over exactly these bytes, and deployment
    /// writes exactly these bytes to the target file.
    pub fn canonical_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Number of server entries in the payload.
    #[must_use]
    pub fn server_count(&self) -> usize {
        self.mcp_servers.len()
    }
}

/// A single resolved server entry in a client configuration.
///
/// Stdio servers carry `command`/`args`/`env`; HTTP and SSE servers carry
/// `type`/`url`/`headers`. Fields absent for a transport are omitted from the
/// serialized form entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerEntry {
    /// The command to execute (stdio servers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Arguments to pass to the command (stdio servers)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Environment variables set for the server process (stdio servers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,

    /// Transport discriminator for remote servers (`"http"` or `"sse"`)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,

    /// Endpoint URL (HTTP/SSE servers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Request headers, e.g. bearer authorization (HTTP/SSE servers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
}

impl McpServerEntry {
    /// Construct a stdio entry.
    pub fn stdio(
        command: impl Into<String>,
        args: Vec<String>,
        env: Option<BTreeMap<String, String>>,
    ) -> Self {
        Self {
            command: Some(command.into()),
            args,
            env,
            transport: None,
            url: None,
            headers: None,
        }
    }

    /// Construct a remote (HTTP/SSE) entry.
    pub fn remote(
        transport: impl Into<String>,
        url: impl Into<String>,
        headers: Option<BTreeMap<String, String>>,
    ) -> Self {
        Self {
            command: None,
            args: Vec::new(),
            env: None,
            transport: Some(transport.into()),
            url: Some(url.into()),
            headers,
        }
    }
}

/// An immutable, signed, content-addressed configuration snapshot.
///
/// The content hash is a pure function of the payload's canonical bytes, so
/// two artifacts with identical payloads share one stored copy. Version
/// numbers are deliberately *not* part of the envelope: the same content can
/// be published at different versions (and for different keys) without
/// duplicating storage, so versions live in the publish index instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// Content address in `sha256:<hex>` format
    pub content_hash: String,
    /// ISO 8601 creation timestamp
    pub created_at: String,
    /// Hex-encoded Ed25519 signature over the canonical payload bytes
    pub signature: String,
    /// Identifier of the key that produced the signature
    pub key_id: String,
    /// The configuration payload itself
    pub payload: McpConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_bytes_are_order_independent() {
        let mut a = McpConfig::default();
        a.mcp_servers.insert("zeta".into(), McpServerEntry::stdio("npx", vec![], None));
        a.mcp_servers.insert("alpha".into(), McpServerEntry::stdio("npx", vec![], None));

        let mut b = McpConfig::default();
        b.mcp_servers.insert("alpha".into(), McpServerEntry::stdio("npx", vec![], None));
        b.mcp_servers.insert("zeta".into(), McpServerEntry::stdio("npx", vec![], None));

        assert_eq!(a.canonical_bytes().unwrap(), b.canonical_bytes().unwrap());
    }

    #[test]
    fn test_stdio_entry_omits_remote_fields() {
        let entry = McpServerEntry::stdio(
            "npx",
            vec!["-y".to_string(), "@modelcontextprotocol/server-memory".to_string()],
            None,
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["command"], "npx");
        assert!(json.get("url").is_none());
        assert!(json.get("type").is_none());
        assert!(json.get("env").is_none());
    }

    #[test]
    fn test_remote_entry_round_trip() {
        let mut headers = BTreeMap::new();
        headers.insert("Authorization".to_string(), "Bearer token".to_string());
        let entry = McpServerEntry::remote("sse", "http://localhost:5679/mcp/sse", Some(headers));

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"type\":\"sse\""));
        let back: McpServerEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_draft_key_display() {
        let key = DraftKey::new("claude-desktop", "default");
        assert_eq!(key.to_string(), "claude-desktop/default");
    }
}
