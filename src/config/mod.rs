//! Orchestrator configuration.
//!
//! Settings live in `~/.mcp-orchestrator/config.toml` and point at the
//! storage root, deployment log directory, and signing key files. All paths
//! in the file may use `~`, which is expanded at load time. Absent file or
//! absent keys fall back to defaults under the orchestrator home directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory name under the user's home holding all orchestrator state.
pub const ORCHESTRATOR_HOME: &str = ".mcp-orchestrator";

/// Resolved orchestrator configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Root of the content-addressed artifact store
    pub storage_dir: PathBuf,
    /// Directory holding deployment logs
    pub deployments_dir: PathBuf,
    /// Directory holding persisted draft snapshots
    pub drafts_dir: PathBuf,
    /// Ed25519 private key (hex seed)
    pub private_key_path: PathBuf,
    /// Ed25519 public key used for deploy-time verification
    pub public_key_path: PathBuf,
    /// Key id recorded on signed artifacts
    pub key_id: String,
}

/// On-disk shape of `config.toml`; every field optional so a partial file
/// overrides only what it names.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    storage_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deployments_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    drafts_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    private_key_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    public_key_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key_id: Option<String>,
}

impl OrchestratorConfig {
    /// Defaults rooted at `root` (used directly by tests; production roots at
    /// the orchestrator home).
    #[must_use]
    pub fn for_root(root: &Path) -> Self {
        Self {
            storage_dir: root.join("store"),
            deployments_dir: root.join("deployments"),
            drafts_dir: root.join("drafts"),
            private_key_path: root.join("keys").join("signing.key"),
            public_key_path: root.join("keys").join("signing.pub"),
            key_id: "default".to_string(),
        }
    }

    /// The orchestrator home directory (`~/.mcp-orchestrator`).
    pub fn home_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().context("Cannot determine home directory")?.join(ORCHESTRATOR_HOME))
    }

    /// Default path of the configuration file.
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("config.toml"))
    }

    /// Load from the default location, falling back to defaults for anything
    /// the file does not set (or if the file does not exist).
    pub fn load_or_default() -> Result<Self> {
        Self::load_from(&Self::default_config_path()?)
    }

    /// Load from an explicit config file path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let home = Self::home_dir()?;
        let mut config = Self::for_root(&home);

        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(config);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let raw: RawConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in config file: {}", path.display()))?;

        if let Some(dir) = raw.storage_dir {
            config.storage_dir = expand(&dir);
        }
        if let Some(dir) = raw.deployments_dir {
            config.deployments_dir = expand(&dir);
        }
        if let Some(dir) = raw.drafts_dir {
            config.drafts_dir = expand(&dir);
        }
        if let Some(key) = raw.private_key_path {
            config.private_key_path = expand(&key);
        }
        if let Some(key) = raw.public_key_path {
            config.public_key_path = expand(&key);
        }
        if let Some(id) = raw.key_id {
            config.key_id = id;
        }
        Ok(config)
    }

    /// Persist the configuration to `path` as TOML.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let raw = RawConfig {
            storage_dir: Some(self.storage_dir.display().to_string()),
            deployments_dir: Some(self.deployments_dir.display().to_string()),
            drafts_dir: Some(self.drafts_dir.display().to_string()),
            private_key_path: Some(self.private_key_path.display().to_string()),
            public_key_path: Some(self.public_key_path.display().to_string()),
            key_id: Some(self.key_id.clone()),
        };
        let content = toml::to_string_pretty(&raw).context("Failed to serialize config")?;
        crate::utils::atomic_write(path, content.as_bytes())
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }
}

/// Expand `~` in a configured path.
fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
