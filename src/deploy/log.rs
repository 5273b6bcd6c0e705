//! Append-only deployment audit log.
//!
//! One JSONL file per (client, profile): every deployment event is a new line,
//! existing lines are never rewritten, so the full history is always
//! reconstructable. Appends are serialized per key with an exclusive file
//! lock to keep concurrent writers from interleaving.

use crate::core::Result;
use crate::models::DraftKey;
use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Terminal state of a deployment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    /// Payload was verified and written to the target
    Success,
    /// The target write failed; the original file was left untouched
    Failed,
    /// A prior artifact was restored over the current one
    RolledBack,
}

/// One entry in the deployment audit trail.
///
/// Rollback never mutates history: it appends a new record pointing back at
/// the restored artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// Unique id for this deployment event
    pub deployment_id: String,
    /// Client family deployed to
    pub client_id: String,
    /// Profile deployed
    pub profile_id: String,
    /// Content hash of the artifact that was (or would have been) written
    pub artifact_hash: String,
    /// Path the payload was written to
    pub target_path: String,
    /// Outcome of the attempt
    pub status: DeploymentStatus,
    /// ISO 8601 timestamp
    pub timestamp: String,
    /// Hash deployed immediately before this event, for rollback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_artifact_hash: Option<String>,
}

/// Tracks deployment history per (client, profile) slot.
#[derive(Debug)]
pub struct DeploymentLog {
    dir: PathBuf,
}

impl DeploymentLog {
    /// Open (or initialize) a log rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
        })
    }

    /// Append a record to the slot's log.
    ///
    /// Holds an exclusive lock on the log file for the duration of the write
    /// so concurrent appenders cannot interleave partial lines.
    pub fn append(&self, record: &DeploymentRecord) -> Result<()> {
        let path = self.log_path(&record.client_id, &record.profile_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.lock_exclusive()?;
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        file.sync_all()?;
        debug!(
            client_id = %record.client_id,
            profile_id = %record.profile_id,
            status = ?record.status,
            artifact = %record.artifact_hash,
            "appended deployment record"
        );
        Ok(())
    }

    /// Full history for a slot, oldest first. Empty if nothing was deployed.
    pub fn history(&self, key: &DraftKey) -> Result<Vec<DeploymentRecord>> {
        let path = self.log_path(&key.client_id, &key.profile_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path)?;
        let mut records = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            records.push(serde_json::from_str(line)?);
        }
        Ok(records)
    }

    /// Most recent record that actually placed an artifact on the target
    /// (success or rollback), if any.
    pub fn last_applied(&self, key: &DraftKey) -> Result<Option<DeploymentRecord>> {
        Ok(self
            .history(key)?
            .into_iter()
            .rev()
            .find(|r| matches!(r.status, DeploymentStatus::Success | DeploymentStatus::RolledBack)))
    }

    fn log_path(&self, client_id: &str, profile_id: &str) -> PathBuf {
        self.dir.join(client_id).join(format!("{profile_id}.jsonl"))
    }
}

/// Where a slot's log file lives relative to the log root. Exposed for tests
/// and operator tooling.
pub fn log_file_name(dir: &Path, key: &DraftKey) -> PathBuf {
    dir.join(&key.client_id).join(format!("{}.jsonl", key.profile_id))
}
