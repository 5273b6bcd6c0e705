//! `keygen` command: generate the Ed25519 signing keypair.

use crate::config::OrchestratorConfig;
use crate::signing::ArtifactSigner;
use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;

/// Generate an Ed25519 keypair at the configured key paths.
#[derive(Debug, Args)]
pub struct KeygenCommand {
    /// Key id recorded on artifacts signed with this key
    #[arg(long)]
    key_id: Option<String>,

    /// Overwrite existing key material
    #[arg(long)]
    force: bool,
}

impl KeygenCommand {
    pub fn execute(self, config: &OrchestratorConfig) -> Result<()> {
        if config.private_key_path.exists() && !self.force {
            bail!(
                "A private key already exists at {}. Pass --force to overwrite it; \
                 artifacts signed with the old key will no longer verify.",
                config.private_key_path.display()
            );
        }

        let key_id = self.key_id.unwrap_or_else(|| config.key_id.clone());
        let signer = ArtifactSigner::generate(key_id);
        signer.save_private_key(&config.private_key_path)?;
        signer.save_public_key(&config.public_key_path)?;

        println!("{} Generated signing keypair (key id '{}')", "✓".green(), signer.key_id());
        println!("    private: {}", config.private_key_path.display());
        println!("    public:  {}", config.public_key_path.display());
        println!("    pubkey:  {}", signer.public_key_hex());
        Ok(())
    }
}
