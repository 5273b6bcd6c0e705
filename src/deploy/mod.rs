//! Deployment workflow: apply a published artifact to a live client config.
//!
//! Deployment resolves an artifact (explicit hash or latest published),
//! verifies its signature against the configured public key, writes the
//! canonical payload bytes atomically to the target path, and appends an
//! audit record. A payload that fails verification is never written.
//!
//! Rollback re-deploys the artifact that was live before the most recent
//! applied deployment, recording a new `rolled_back` entry rather than
//! mutating history.

pub mod log;

pub use log::{DeploymentLog, DeploymentRecord, DeploymentStatus};

use crate::core::{OrchestratorError, Result};
use crate::models::DraftKey;
use crate::signing;
use crate::storage::ArtifactStore;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

/// Orchestrates artifact deployment against a store and audit log.
pub struct DeploymentWorkflow<'a> {
    store: &'a ArtifactStore,
    log: &'a DeploymentLog,
    public_key_path: PathBuf,
}

impl<'a> DeploymentWorkflow<'a> {
    /// Create a workflow verifying signatures against `public_key_path`.
    pub fn new(store: &'a ArtifactStore, log: &'a DeploymentLog, public_key_path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            log,
            public_key_path: public_key_path.into(),
        }
    }

    /// Deploy an artifact to the target path.
    ///
    /// With `artifact_hash = None` the latest published version for the slot
    /// is deployed.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::ArtifactNotFound`] when no artifact resolves
    /// - [`OrchestratorError::SignatureInvalid`] when verification fails (the
    ///   target file is left untouched)
    /// - [`OrchestratorError::StorageWriteFailure`] when the target write
    ///   fails; a `failed` audit record is appended before the error surfaces
    pub fn deploy(
        &self,
        key: &DraftKey,
        target_path: &Path,
        artifact_hash: Option<&str>,
    ) -> Result<DeploymentRecord> {
        self.apply(key, target_path, artifact_hash, DeploymentStatus::Success)
    }

    /// Restore the artifact that was live before the most recent applied
    /// deployment.
    ///
    /// # Errors
    ///
    /// [`OrchestratorError::NothingToRollback`] when no prior deployment
    /// exists or the most recent one had nothing before it.
    pub fn rollback(&self, key: &DraftKey) -> Result<DeploymentRecord> {
        let last = self.log.last_applied(key)?.ok_or_else(|| OrchestratorError::NothingToRollback {
            client_id: key.client_id.clone(),
            profile_id: key.profile_id.clone(),
        })?;
        let restore_hash =
            last.previous_artifact_hash.ok_or_else(|| OrchestratorError::NothingToRollback {
                client_id: key.client_id.clone(),
                profile_id: key.profile_id.clone(),
            })?;

        info!(slot = %key, restore = %restore_hash, "rolling back deployment");
        self.apply(key, Path::new(&last.target_path), Some(&restore_hash), DeploymentStatus::RolledBack)
    }

    /// Shared deploy path; `status_on_success` distinguishes a plain deploy
    /// from a rollback in the audit trail.
    fn apply(
        &self,
        key: &DraftKey,
        target_path: &Path,
        artifact_hash: Option<&str>,
        status_on_success: DeploymentStatus,
    ) -> Result<DeploymentRecord> {
        // Resolve: explicit hash or latest published
        let resolved_hash = match artifact_hash {
            Some(hash) => hash.to_string(),
            None => {
                self.store
                    .latest(&key.client_id, &key.profile_id)?
                    .ok_or_else(|| OrchestratorError::ArtifactNotFound {
                        client_id: key.client_id.clone(),
                        profile_id: key.profile_id.clone(),
                        content_hash: None,
                    })?
                    .1
            }
        };

        let artifact = self.store.get(&resolved_hash).map_err(|e| match e {
            OrchestratorError::StorageNotFound {
                content_hash,
            } => OrchestratorError::ArtifactNotFound {
                client_id: key.client_id.clone(),
                profile_id: key.profile_id.clone(),
                content_hash: Some(content_hash),
            },
            other => other,
        })?;

        // Verify before anything touches the target; never write an
        // unverified payload.
        let payload_bytes = artifact.payload.canonical_bytes()?;
        let verified =
            signing::verify_signature(&payload_bytes, &artifact.signature, &self.public_key_path)?;
        if !verified {
            warn!(slot = %key, artifact = %resolved_hash, "signature verification failed");
            return Err(OrchestratorError::SignatureInvalid {
                content_hash: resolved_hash,
            });
        }

        let previous = self.log.last_applied(key)?.map(|r| r.artifact_hash);

        let mut record = DeploymentRecord {
            deployment_id: Uuid::new_v4().to_string(),
            client_id: key.client_id.clone(),
            profile_id: key.profile_id.clone(),
            artifact_hash: resolved_hash.clone(),
            target_path: target_path.display().to_string(),
            status: status_on_success,
            timestamp: Utc::now().to_rfc3339(),
            previous_artifact_hash: previous,
        };

        // Atomic write: the target either gets the full payload or keeps its
        // previous content.
        if let Err(e) = crate::utils::atomic_write(target_path, &payload_bytes) {
            record.status = DeploymentStatus::Failed;
            // The write failure is the caller's error; a broken audit append
            // must not mask it.
            if let Err(log_err) = self.log.append(&record) {
                warn!(slot = %key, error = %log_err, "could not record failed deployment");
            }
            return Err(OrchestratorError::StorageWriteFailure {
                path: target_path.display().to_string(),
                reason: format!("{e:#}"),
            });
        }

        self.log.append(&record)?;
        info!(slot = %key, artifact = %resolved_hash, target = %target_path.display(), "deployed artifact");
        Ok(record)
    }
}
