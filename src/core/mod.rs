//! Core types and error handling shared across the orchestration pipeline.

pub mod error;

pub use error::{OrchestratorError, Result, Severity, Violation};
