//! # MCP Orchestrator
//!
//! A lifecycle manager for Model Context Protocol (MCP) client configurations:
//! build a draft from a catalog of server definitions, validate it, sign it
//! with Ed25519, store it as an immutable content-addressed artifact, and
//! deploy it to client config files with a complete, append-only audit trail
//! and one-step rollback.
//!
//! ## Pipeline
//!
//! ```text
//! registry ──▶ builder ──▶ publish (validate ▶ sign ▶ store ▶ index) ──▶ deploy
//!                                                                          │
//!                                              deployment log ◀────────────┘
//! ```
//!
//! - [`registry`] - Catalog of MCP server definitions (transports, parameters,
//!   environment requirements)
//! - [`builder`] - Mutable drafts that resolve catalog entries into concrete
//!   invocation specs
//! - [`diff`] - Structural comparison between two configuration payloads
//! - [`signing`] - Ed25519 signing and fail-closed verification
//! - [`storage`] - Content-addressed artifact store plus per-slot version
//!   index
//! - [`publish`] - The validate/sign/store/index workflow
//! - [`deploy`] - Verified deployment, append-only audit log, and rollback
//! - [`orchestrator`] - The context object tying everything together
//! - [`cli`] - The `mcpo` command-line transport
//!
//! ## Guarantees
//!
//! - **Immutability**: artifacts are stored under their SHA-256 content hash
//!   and never modified. Identical payloads share one artifact.
//! - **Monotonic versions**: each (client, profile) slot's versions increase
//!   by exactly 1 with no gaps, enforced under an exclusive file lock.
//! - **Verified deploys**: signatures are checked before a single byte
//!   reaches the target path, and target writes are atomic.
//! - **Auditability**: every deployment attempt, including failures and
//!   rollbacks, is an appended log record; history is never rewritten.
//!
//! ## Example
//!
//! ```no_run
//! use mcpo_cli::config::OrchestratorConfig;
//! use mcpo_cli::models::DraftKey;
//! use mcpo_cli::orchestrator::Orchestrator;
//! use mcpo_cli::signing::ArtifactSigner;
//! use std::collections::BTreeMap;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = OrchestratorConfig::load_or_default()?;
//! let signer = ArtifactSigner::from_file(&config.private_key_path, &config.key_id)?;
//! let orch = Orchestrator::new(config)?;
//!
//! let key = DraftKey::new("claude-desktop", "default");
//! let mut params = BTreeMap::new();
//! params.insert("path".to_string(), "/home/me/docs".to_string());
//! orch.add_server(&key, "filesystem", &params, &BTreeMap::new())?;
//!
//! let receipt = orch.publish(&key, &signer)?;
//! println!("published v{} as {}", receipt.version, receipt.content_hash);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod cli;
pub mod config;
pub mod core;
pub mod deploy;
pub mod diff;
pub mod models;
pub mod orchestrator;
pub mod publish;
pub mod registry;
pub mod signing;
pub mod storage;
pub mod utils;

pub use crate::core::{OrchestratorError, Result};
