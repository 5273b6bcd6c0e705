//! Data models for MCP server definitions.
//!
//! A [`ServerDefinition`] is an immutable catalog entry describing how a
//! server is invoked: its transport, command or URL template, declared
//! parameters, and environment variable requirements. Definitions are created
//! by the registry loader and read-only thereafter.

use serde::{Deserialize, Serialize};

/// Transport used to talk to an MCP server.
///
/// Closed enum: every consumption site matches exhaustively, so adding a
/// variant is a compile-time-checked decision point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    /// Local process speaking over stdin/stdout
    Stdio,
    /// Remote HTTP endpoint
    Http,
    /// Remote Server-Sent Events endpoint
    Sse,
}

/// Authentication scheme for HTTP/SSE servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpAuthType {
    /// No authentication
    None,
    /// Bearer token in the `Authorization` header
    Bearer,
    /// OAuth flow handled by the client
    OAuth,
}

/// Package manager capable of installing a server.
///
/// Installation itself is out of scope for the orchestration core; this is
/// installability metadata surfaced to callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    /// npm / npx
    Npm,
    /// pip
    Pip,
    /// pipx
    Pipx,
    /// uvx
    Uvx,
    /// Custom installation command
    Custom,
    /// Not installable via a package manager (local script, binary)
    #[default]
    None,
}

/// Data type of a configurable server parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    /// Free-form string
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Filesystem path
    Path,
}

/// Definition of a user-configurable server parameter.
///
/// Parameter values substitute `{name}` placeholders in `stdio_args` and
/// `http_url` templates when a server is added to a draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDefinition {
    /// Parameter name, matching the `{name}` placeholder
    pub name: String,
    /// Parameter data type
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    /// Human-readable description
    pub description: String,
    /// Whether the parameter must be supplied (or have a default)
    #[serde(default)]
    pub required: bool,
    /// Default value used when no value is supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Example value for documentation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// Immutable catalog entry for an MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerDefinition {
    /// Unique server identifier (e.g. `filesystem`, `github`)
    pub server_id: String,
    /// Human-readable server name
    pub display_name: String,
    /// Server purpose and capabilities
    pub description: String,

    /// Transport type
    pub transport: TransportType,

    /// Command to execute (stdio servers), e.g. `npx`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdio_command: Option<String>,
    /// Command-line arguments; may contain `{param}` placeholders
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stdio_args: Vec<String>,

    /// Endpoint URL (HTTP/SSE servers); may contain `{param}` placeholders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_url: Option<String>,
    /// Authentication scheme (HTTP/SSE servers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_auth_type: Option<HttpAuthType>,

    /// Environment variable names that must be supplied
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_env: Vec<String>,
    /// Environment variable names that may be supplied
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional_env: Vec<String>,

    /// User-configurable parameters
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterDefinition>,

    /// URL to server documentation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
    /// NPM package name if installable via npm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npm_package: Option<String>,
    /// PyPI package name if installable via pip/pipx/uvx
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pypi_package: Option<String>,
    /// Preferred package manager for installation
    #[serde(default)]
    pub package_manager: PackageManager,
    /// Tags for categorization (e.g. `search`, `database`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl ServerDefinition {
    /// Find the declared parameter with the given name, if any.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParameterDefinition> {
        self.parameters.iter().find(|p| p.name == name)
    }
}
