//! Content-addressed artifact storage and the publish index.
//!
//! # Layout
//!
//! ```text
//! {root}/artifacts/{hh}/{sha256-hex}.json   signed artifact envelopes
//! {root}/index/{client_id}/{profile_id}.json  published version history
//! {root}/index/{client_id}/.{profile_id}.lock index write lock
//! ```
//!
//! Artifacts are keyed by the SHA-256 of their canonical payload bytes in the
//! `sha256:<hex>` format. A stored artifact is immutable:
//! `put` of identical payload bytes is a dedup no-op, and writes go through a
//! temp-then-rename so a failed write is never visible under the final name.
//!
//! The index append is the only read-modify-write in the store and is guarded
//! by an exclusive file lock per (client, profile); versions must increase by
//! exactly one. Store-before-index ordering is enforced here as well: an index
//! entry is refused when its artifact is not already stored, so a reader can
//! never follow the index to a missing artifact.

use crate::core::{OrchestratorError, Result};
use crate::models::Artifact;
use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Prefix identifying the hash algorithm in content addresses.
pub const HASH_PREFIX: &str = "sha256:";

/// One published version in a (client, profile) index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Version number, strictly increasing from 1 with no gaps
    pub version: u64,
    /// Content address of the published artifact
    pub content_hash: String,
    /// ISO 8601 publish timestamp
    pub created_at: String,
    /// Key id that signed the artifact
    pub key_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    client_id: String,
    profile_id: String,
    entries: Vec<IndexEntry>,
}

/// Durable, content-addressed persistence for configuration artifacts.
#[derive(Debug)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open (or initialize) a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("artifacts"))?;
        fs::create_dir_all(root.join("index"))?;
        Ok(Self {
            root,
        })
    }

    /// The store's root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Compute the content address of payload bytes.
    #[must_use]
    pub fn compute_content_hash(payload_bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(payload_bytes);
        format!("{HASH_PREFIX}{}", hex::encode(hasher.finalize()))
    }

    /// Persist a signed artifact under its content hash.
    ///
    /// Idempotent: a second put of an artifact with identical payload bytes is
    /// a no-op returning the same hash. The envelope's `content_hash` must
    /// match the payload it carries.
    ///
    /// # Errors
    ///
    /// [`OrchestratorError::StorageWriteFailure`] on I/O failure or hash
    /// mismatch; a failed write leaves nothing visible under the final name.
    pub fn put(&self, artifact: &Artifact) -> Result<String> {
        let payload_bytes = artifact.payload.canonical_bytes()?;
        let hash = Self::compute_content_hash(&payload_bytes);
        if hash != artifact.content_hash {
            return Err(OrchestratorError::StorageWriteFailure {
                path: artifact.content_hash.clone(),
                reason: format!("envelope content_hash does not match payload (computed {hash})"),
            });
        }

        let path = self.artifact_path(&hash)?;
        if path.exists() {
            debug!(%hash, "artifact already stored, dedup no-op");
            return Ok(hash);
        }

        crate::utils::write_json_file(&path, artifact, false).map_err(|e| {
            OrchestratorError::StorageWriteFailure {
                path: path.display().to_string(),
                reason: format!("{e:#}"),
            }
        })?;
        info!(%hash, "stored artifact");
        Ok(hash)
    }

    /// Whether an artifact is stored under the given content hash.
    #[must_use]
    pub fn contains(&self, content_hash: &str) -> bool {
        self.artifact_path(content_hash).map(|p| p.exists()).unwrap_or(false)
    }

    /// Fetch the artifact stored under a content hash.
    ///
    /// # Errors
    ///
    /// [`OrchestratorError::StorageNotFound`] if nothing is stored there.
    pub fn get(&self, content_hash: &str) -> Result<Artifact> {
        let path = self.artifact_path(content_hash)?;
        if !path.exists() {
            return Err(OrchestratorError::StorageNotFound {
                content_hash: content_hash.to_string(),
            });
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Append a version entry to the (client, profile) index.
    ///
    /// Holds an exclusive file lock for the duration of the read-modify-write,
    /// so two concurrent publishers cannot both claim the same version. The
    /// referenced artifact must already be stored (store-before-index).
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::StorageNotFound`] if the artifact is not stored
    /// - [`OrchestratorError::VersionConflict`] unless `version == latest + 1`
    pub fn publish_index_entry(
        &self,
        client_id: &str,
        profile_id: &str,
        version: u64,
        content_hash: &str,
        key_id: &str,
        created_at: &str,
    ) -> Result<()> {
        if !self.contains(content_hash) {
            return Err(OrchestratorError::StorageNotFound {
                content_hash: content_hash.to_string(),
            });
        }

        let _lock = self.lock_index(client_id, profile_id)?;

        let mut index = self.load_index(client_id, profile_id)?;
        let expected = index.entries.last().map_or(1, |e| e.version + 1);
        if version != expected {
            return Err(OrchestratorError::VersionConflict {
                client_id: client_id.to_string(),
                profile_id: profile_id.to_string(),
                expected,
                actual: version,
            });
        }

        index.entries.push(IndexEntry {
            version,
            content_hash: content_hash.to_string(),
            created_at: created_at.to_string(),
            key_id: key_id.to_string(),
        });

        let path = self.index_path(client_id, profile_id);
        crate::utils::write_json_file(&path, &index, true).map_err(|e| {
            OrchestratorError::StorageWriteFailure {
                path: path.display().to_string(),
                reason: format!("{e:#}"),
            }
        })?;
        info!(client_id, profile_id, version, %content_hash, "published index entry");
        Ok(())
    }

    /// Latest published (version, content hash) for a slot, if any.
    pub fn latest(&self, client_id: &str, profile_id: &str) -> Result<Option<(u64, String)>> {
        let index = self.load_index(client_id, profile_id)?;
        Ok(index.entries.last().map(|e| (e.version, e.content_hash.clone())))
    }

    /// Full publish history for a slot, oldest first.
    pub fn history(&self, client_id: &str, profile_id: &str) -> Result<Vec<IndexEntry>> {
        Ok(self.load_index(client_id, profile_id)?.entries)
    }

    fn load_index(&self, client_id: &str, profile_id: &str) -> Result<IndexFile> {
        let path = self.index_path(client_id, profile_id);
        if !path.exists() {
            return Ok(IndexFile {
                client_id: client_id.to_string(),
                profile_id: profile_id.to_string(),
                entries: Vec::new(),
            });
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn index_path(&self, client_id: &str, profile_id: &str) -> PathBuf {
        self.root.join("index").join(client_id).join(format!("{profile_id}.json"))
    }

    fn lock_index(&self, client_id: &str, profile_id: &str) -> Result<IndexLock> {
        let dir = self.root.join("index").join(client_id);
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!(".{profile_id}.lock"));
        let file = OpenOptions::new().create(true).truncate(false).write(true).open(&path)?;
        file.lock_exclusive()?;
        Ok(IndexLock {
            _file: file,
        })
    }

    /// Resolve a content hash to its storage path, validating the format so a
    /// malformed hash can never escape the artifacts directory.
    fn artifact_path(&self, content_hash: &str) -> Result<PathBuf> {
        let hex_part = content_hash.strip_prefix(HASH_PREFIX).ok_or_else(|| {
            OrchestratorError::StorageNotFound {
                content_hash: content_hash.to_string(),
            }
        })?;
        if hex_part.len() != 64 || !hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(OrchestratorError::StorageNotFound {
                content_hash: content_hash.to_string(),
            });
        }
        Ok(self.root.join("artifacts").join(&hex_part[..2]).join(format!("{hex_part}.json")))
    }
}

/// Exclusive index lock; released when dropped.
struct IndexLock {
    _file: File,
}
