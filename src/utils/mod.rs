//! Filesystem utilities shared across the orchestration core.
//!
//! - [`fs`] - Atomic writes, directory creation, and JSON file helpers

pub mod fs;

pub use fs::{atomic_write, ensure_dir, read_json_file, write_json_file};
