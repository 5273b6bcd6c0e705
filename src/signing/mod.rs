//! Artifact signing and verification.
//!
//! Artifacts are signed with Ed25519 over the canonical payload bytes. Key
//! material round-trips through hex-encoded files: a 32-byte seed for the
//! private key and a 32-byte public key. Private key files are written with
//! owner-only permissions on unix.
//!
//! Verification fails closed: a signature that does not verify (or that is
//! malformed) reports `Ok(false)`, while structurally invalid key material is
//! a [`OrchestratorError::Signing`] error so callers can distinguish "not
//! verified" from "broken input".

use crate::core::{OrchestratorError, Result};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Length of a hex-encoded 32-byte key.
const KEY_HEX_LEN: usize = 64;

/// Signs artifact payloads with an Ed25519 key bound to a key id.
pub struct ArtifactSigner {
    key_id: String,
    signing_key: SigningKey,
}

impl ArtifactSigner {
    /// Generate a fresh keypair bound to `key_id`.
    #[must_use]
    pub fn generate(key_id: impl Into<String>) -> Self {
        let mut rng = rand::rngs::OsRng;
        Self {
            key_id: key_id.into(),
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// Load a signer from a hex-encoded private key file.
    ///
    /// # Errors
    ///
    /// [`OrchestratorError::Signing`] if the file is unreadable or the key
    /// material is not a hex-encoded 32-byte seed.
    pub fn from_file(path: &Path, key_id: impl Into<String>) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| OrchestratorError::Signing {
            reason: format!("cannot read private key {}: {e}", path.display()),
        })?;
        let seed = decode_key_hex(content.trim(), "private key")?;
        Ok(Self {
            key_id: key_id.into(),
            signing_key: SigningKey::from_bytes(&seed),
        })
    }

    /// The key id this signer is bound to.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Sign payload bytes, returning a hex-encoded detached signature.
    #[must_use]
    pub fn sign(&self, payload: &[u8]) -> String {
        hex::encode(self.signing_key.sign(payload).to_bytes())
    }

    /// Hex-encoded public key for this signer.
    #[must_use]
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }

    /// Save the private key seed to `path` with owner-only permissions.
    ///
    /// The file handle is scoped and synced before return on every path.
    pub fn save_private_key(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(path)?;
        file.write_all(hex::encode(self.signing_key.to_bytes()).as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()?;
        debug!(path = %path.display(), key_id = %self.key_id, "saved private key");
        Ok(())
    }

    /// Save the public key to `path`.
    pub fn save_public_key(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        file.write_all(self.public_key_hex().as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()?;
        Ok(())
    }
}

/// Verify a detached hex signature over `payload` against a public key file.
///
/// Returns `Ok(false)` for any signature that does not verify, including
/// malformed signature bytes.
///
/// # Errors
///
/// [`OrchestratorError::Signing`] when the public key file itself is
/// unreadable or structurally invalid (wrong length, corrupt hex).
pub fn verify_signature(payload: &[u8], signature_hex: &str, public_key_path: &Path) -> Result<bool> {
    let content = fs::read_to_string(public_key_path).map_err(|e| OrchestratorError::Signing {
        reason: format!("cannot read public key {}: {e}", public_key_path.display()),
    })?;
    let key_bytes = decode_key_hex(content.trim(), "public key")?;
    let verifying_key =
        VerifyingKey::from_bytes(&key_bytes).map_err(|e| OrchestratorError::Signing {
            reason: format!("invalid public key: {e}"),
        })?;

    let Ok(sig_bytes) = hex::decode(signature_hex) else {
        return Ok(false);
    };
    let Ok(sig_array) = <[u8; 64]>::try_from(sig_bytes.as_slice()) else {
        return Ok(false);
    };
    let signature = Signature::from_bytes(&sig_array);

    Ok(verifying_key.verify_strict(payload, &signature).is_ok())
}

fn decode_key_hex(hex_str: &str, what: &str) -> Result<[u8; 32]> {
    if hex_str.len() != KEY_HEX_LEN {
        return Err(OrchestratorError::Signing {
            reason: format!("{what} must be {KEY_HEX_LEN} hex chars, got {}", hex_str.len()),
        });
    }
    let bytes = hex::decode(hex_str).map_err(|e| OrchestratorError::Signing {
        reason: format!("{what} is not valid hex: {e}"),
    })?;
    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| OrchestratorError::Signing {
        reason: format!("{what} must decode to 32 bytes"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sign_verify_round_trip() {
        let temp = tempdir().unwrap();
        let pub_path = temp.path().join("signing.pub");

        let signer = ArtifactSigner::generate("default");
        signer.save_public_key(&pub_path).unwrap();

        let payload = br#"{"mcpServers":{}}"#;
        let sig = signer.sign(payload);
        assert!(verify_signature(payload, &sig, &pub_path).unwrap());
    }

    #[test]
    fn test_mutated_payload_fails_verification() {
        let temp = tempdir().unwrap();
        let pub_path = temp.path().join("signing.pub");

        let signer = ArtifactSigner::generate("default");
        signer.save_public_key(&pub_path).unwrap();

        let sig = signer.sign(b"original payload");
        assert!(!verify_signature(b"original payloaD", &sig, &pub_path).unwrap());
    }

    #[test]
    fn test_malformed_signature_returns_false_not_error() {
        let temp = tempdir().unwrap();
        let pub_path = temp.path().join("signing.pub");
        ArtifactSigner::generate("default").save_public_key(&pub_path).unwrap();

        assert!(!verify_signature(b"payload", "not-hex-at-all", &pub_path).unwrap());
        assert!(!verify_signature(b"payload", "abcd", &pub_path).unwrap());
    }

    #[test]
    fn test_corrupt_public_key_is_signing_error() {
        let temp = tempdir().unwrap();
        let pub_path = temp.path().join("signing.pub");
        std::fs::write(&pub_path, "deadbeef").unwrap();

        let err = verify_signature(b"payload", &"0".repeat(128), &pub_path).unwrap_err();
        assert!(matches!(err, OrchestratorError::Signing { .. }));
    }

    #[test]
    fn test_private_key_round_trips_through_file() {
        let temp = tempdir().unwrap();
        let key_path = temp.path().join("keys").join("signing.key");

        let signer = ArtifactSigner::generate("prod-2025");
        signer.save_private_key(&key_path).unwrap();

        let loaded = ArtifactSigner::from_file(&key_path, "prod-2025").unwrap();
        assert_eq!(loaded.public_key_hex(), signer.public_key_hex());
        assert_eq!(loaded.key_id(), "prod-2025");
    }

    #[cfg(unix)]
    #[test]
    fn test_private_key_permissions_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let temp = tempdir().unwrap();
        let key_path = temp.path().join("signing.key");

        ArtifactSigner::generate("default").save_private_key(&key_path).unwrap();

        let mode = std::fs::metadata(&key_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_different_key_fails_verification() {
        let temp = tempdir().unwrap();
        let pub_path = temp.path().join("other.pub");
        ArtifactSigner::generate("other").save_public_key(&pub_path).unwrap();

        let signer = ArtifactSigner::generate("default");
        let sig = signer.sign(b"payload");
        assert!(!verify_signature(b"payload", &sig, &pub_path).unwrap());
    }
}
