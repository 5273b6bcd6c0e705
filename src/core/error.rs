//! Error handling for the MCP orchestrator.
//!
//! The error system follows two principles:
//! 1. **Strongly-typed errors** for precise handling in code: every failure in
//!    the orchestration core maps to one [`OrchestratorError`] variant.
//! 2. **Human-readable reasons** so the transport layer can surface actionable
//!    messages without inspecting variant internals.
//!
//! # Error Categories
//!
//! - **Lookup**: [`OrchestratorError::ServerNotFound`]
//! - **Draft construction**: [`OrchestratorError::MissingParameter`]
//! - **Validation**: [`OrchestratorError::Validation`] carrying the full
//!   structured violation list from the schema validator
//! - **Signing**: [`OrchestratorError::Signing`] for malformed key material
//! - **Storage**: [`OrchestratorError::StorageNotFound`],
//!   [`OrchestratorError::StorageWriteFailure`]
//! - **Deployment**: [`OrchestratorError::ArtifactNotFound`],
//!   [`OrchestratorError::SignatureInvalid`],
//!   [`OrchestratorError::NothingToRollback`]
//!
//! Standard library and serde errors are converted automatically so `?` works
//! throughout the core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Severity of a single validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks publishing.
    Error,
    /// Reported but does not block publishing.
    Warning,
}

/// A single structured finding produced by the configuration validator.
///
/// The validator never raises per-field errors as control flow; it accumulates
/// violations and the publish step fails once with the complete list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Stable machine-readable code (e.g. `EMPTY_CONFIG`, `MISSING_COMMAND`).
    pub code: String,
    /// Human-readable explanation with enough detail to correct the input.
    pub message: String,
    /// Severity of the finding.
    pub severity: Severity,
    /// Server entry the finding refers to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
}

impl Violation {
    /// Create an error-severity violation scoped to a server entry.
    pub fn error(code: &str, message: impl Into<String>, server: Option<&str>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            severity: Severity::Error,
            server: server.map(str::to_string),
        }
    }

    /// Create a warning-severity violation scoped to a server entry.
    pub fn warning(code: &str, message: impl Into<String>, server: Option<&str>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            severity: Severity::Warning,
            server: server.map(str::to_string),
        }
    }
}

/// The main error type for orchestration operations.
///
/// Each variant represents a specific failure mode with enough context for the
/// caller to correct input or decide on retry. Storage write failures during
/// publish are safe to retry wholesale because `put` is idempotent by content
/// hash.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// The requested server id is not present in the server registry.
    #[error("Server '{server_id}' not found in registry")]
    ServerNotFound {
        /// The server identifier that was looked up
        server_id: String,
    },

    /// A server id was registered twice in the same registry.
    #[error("Server '{server_id}' is already registered")]
    DuplicateServer {
        /// The server identifier that collided
        server_id: String,
    },

    /// A required parameter has neither a supplied value nor a declared default.
    #[error("Server '{server_id}' requires parameter '{name}' and no default is declared")]
    MissingParameter {
        /// Server whose definition declares the parameter
        server_id: String,
        /// Name of the missing parameter
        name: String,
    },

    /// Draft validation failed. Carries every finding, not just the first.
    #[error("Configuration validation failed with {} error(s)", .violations.iter().filter(|v| v.severity == Severity::Error).count())]
    Validation {
        /// The complete list of findings from the validator
        violations: Vec<Violation>,
    },

    /// Key material is structurally invalid (wrong length, corrupt encoding).
    ///
    /// A signature that simply does not verify is *not* this error; that case
    /// is reported as `Ok(false)` from verification so callers can fail closed
    /// without exception-driven control flow.
    #[error("Signing error: {reason}")]
    Signing {
        /// What was malformed about the key material
        reason: String,
    },

    /// No artifact is stored under the given content hash.
    #[error("No artifact stored under content hash '{content_hash}'")]
    StorageNotFound {
        /// The content hash that was requested
        content_hash: String,
    },

    /// A storage write failed. The partial write is never visible under the
    /// final content-addressed name.
    #[error("Storage write failed for {path}: {reason}")]
    StorageWriteFailure {
        /// Path the write targeted
        path: String,
        /// Underlying failure description
        reason: String,
    },

    /// Deployment could not resolve an artifact to deploy.
    #[error("Deployment failed: no published artifact for {client_id}/{profile_id}{}", .content_hash.as_ref().map(|h| format!(" matching {h}")).unwrap_or_default())]
    ArtifactNotFound {
        /// Target client family
        client_id: String,
        /// Target profile
        profile_id: String,
        /// Explicit hash requested, if any
        content_hash: Option<String>,
    },

    /// Signature verification failed during deployment. The payload is never
    /// written to the target path in this case.
    #[error("Signature verification failed for artifact '{content_hash}'")]
    SignatureInvalid {
        /// The artifact whose signature did not verify
        content_hash: String,
    },

    /// Rollback was requested but no prior deployment exists to restore.
    #[error("Nothing to roll back for {client_id}/{profile_id}")]
    NothingToRollback {
        /// Target client family
        client_id: String,
        /// Target profile
        profile_id: String,
    },

    /// Version numbers per (client, profile) must increase by exactly one.
    #[error("Index version conflict for {client_id}/{profile_id}: expected {expected}, got {actual}")]
    VersionConflict {
        /// Target client family
        client_id: String,
        /// Target profile
        profile_id: String,
        /// The only version the index would accept
        expected: u64,
        /// The version the caller supplied
        actual: u64,
    },

    /// I/O failure outside the content-addressed write path.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OrchestratorError {
    /// Violations attached to a validation failure, if this is one.
    pub fn violations(&self) -> Option<&[Violation]> {
        match self {
            Self::Validation {
                violations,
            } => Some(violations),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the orchestration core.
pub type Result<T> = std::result::Result<T, OrchestratorError>;
