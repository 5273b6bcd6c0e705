//! `publish` command: validate, sign, store, and index the current draft.

use super::{SlotArgs, orchestrator_for};
use crate::config::OrchestratorConfig;
use crate::core::OrchestratorError;
use crate::signing::ArtifactSigner;
use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

/// Publish the current draft as a signed, versioned artifact.
#[derive(Debug, Args)]
pub struct PublishCommand {
    #[command(flatten)]
    slot: SlotArgs,

    /// Private key file (defaults to the configured path)
    #[arg(long)]
    key_path: Option<PathBuf>,
}

impl PublishCommand {
    pub fn execute(self, config: &OrchestratorConfig) -> Result<()> {
        let key_path = self.key_path.as_ref().unwrap_or(&config.private_key_path);
        if !key_path.exists() {
            bail!(
                "No private key at {}. Run 'mcpo keygen' to generate one.",
                key_path.display()
            );
        }
        let signer = ArtifactSigner::from_file(key_path, &config.key_id)?;

        let key = self.slot.key();
        let orch = orchestrator_for(config, &key)?;

        let receipt = match orch.publish(&key, &signer) {
            Ok(receipt) => receipt,
            Err(OrchestratorError::Validation {
                violations,
            }) => {
                eprintln!("{} Draft {} failed validation:", "✗".red(), key);
                for violation in &violations {
                    eprintln!("    [{}] {}", violation.code.yellow(), violation.message);
                }
                bail!("publish aborted, nothing was written");
            }
            Err(e) => return Err(e.into()),
        };

        // Draft was consumed; drop its snapshot
        super::draft::persist(&orch, config, &key)?;

        println!(
            "{} Published {} version {} ({} server{})",
            "✓".green(),
            key,
            receipt.version.to_string().bold(),
            receipt.server_count,
            if receipt.server_count == 1 { "" } else { "s" }
        );
        println!("    hash:   {}", receipt.content_hash);
        println!("    key id: {}", receipt.key_id);
        Ok(())
    }
}
