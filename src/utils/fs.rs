//! Safe file system operations for the orchestrator.
//!
//! All durable state in the orchestrator (artifacts, index files, deployment
//! logs, live client configs) goes through [`atomic_write`]: content is
//! written to a temporary file in the target directory, synced, then renamed
//! into place. Readers never observe a partially written file, and a failed
//! write leaves the original untouched.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Creates a directory and all parent directories if they don't exist.
///
/// No-op if the directory already exists.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Atomically writes bytes to a file using a write-then-rename strategy.
///
/// 1. Write content to a temporary file next to the target
/// 2. Sync the temporary file to disk
/// 3. Rename the temporary file onto the target path
///
/// The temporary file lives in the same directory as the target so the rename
/// never crosses a filesystem boundary. On any failure the temp file is
/// removed and the target is left as it was.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = tempfile::Builder::new()
        .prefix(".tmp_")
        .tempfile_in(dir)
        .with_context(|| format!("Failed to create temp file in: {}", dir.display()))?;

    temp.write_all(content)
        .with_context(|| format!("Failed to write temp file for: {}", path.display()))?;
    temp.as_file().sync_all().with_context(|| "Failed to sync file to disk")?;

    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}

/// Reads and parses a JSON file.
pub fn read_json_file<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON from file: {}", path.display()))
}

/// Writes data as JSON to a file atomically.
///
/// `pretty` selects human-readable formatting (used for index files and
/// deployment logs inspected by operators).
pub fn write_json_file<T>(path: &Path, data: &T, pretty: bool) -> Result<()>
where
    T: serde::Serialize,
{
    let json = if pretty {
        serde_json::to_string_pretty(data)?
    } else {
        serde_json::to_string(data)?
    };

    atomic_write(path, json.as_bytes())
        .with_context(|| format!("Failed to write JSON file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u64,
    }

    #[test]
    fn test_atomic_write_creates_parents() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("a").join("b").join("file.json");
        atomic_write(&path, b"{}").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"{}");
    }

    #[test]
    fn test_atomic_write_replaces_existing_content() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("file.txt");
        atomic_write(&path, b"old").unwrap();
        atomic_write(&path, b"new").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_files() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("file.txt");
        atomic_write(&path, b"content").unwrap();

        let leftovers: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".tmp_"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_json_round_trip() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("sample.json");
        let sample = Sample {
            name: "filesystem".into(),
            count: 3,
        };
        write_json_file(&path, &sample, true).unwrap();
        let back: Sample = read_json_file(&path).unwrap();
        assert_eq!(back, sample);
    }

    #[test]
    fn test_read_json_file_missing() {
        let temp = tempdir().unwrap();
        let result: Result<Sample> = read_json_file(&temp.path().join("missing.json"));
        assert!(result.is_err());
    }
}
