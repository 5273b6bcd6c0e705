//! `deploy`, `rollback`, and `history` commands.

use super::{SlotArgs, orchestrator_for};
use crate::config::OrchestratorConfig;
use crate::deploy::DeploymentStatus;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

/// Write a published artifact to a client's config path.
#[derive(Debug, Args)]
pub struct DeployCommand {
    /// Path the client reads its configuration from
    target_path: PathBuf,

    #[command(flatten)]
    slot: SlotArgs,

    /// Deploy a specific artifact (sha256:<hex>) instead of the latest
    #[arg(long)]
    hash: Option<String>,
}

impl DeployCommand {
    pub fn execute(self, config: &OrchestratorConfig) -> Result<()> {
        let key = self.slot.key();
        let orch = orchestrator_for(config, &key)?;
        let record = orch.deploy(&key, &self.target_path, self.hash.as_deref())?;

        println!(
            "{} Deployed {} to {}",
            "✓".green(),
            record.artifact_hash.bold(),
            record.target_path
        );
        Ok(())
    }
}

/// Restore the artifact deployed before the most recent one.
#[derive(Debug, Args)]
pub struct RollbackCommand {
    #[command(flatten)]
    slot: SlotArgs,
}

impl RollbackCommand {
    pub fn execute(self, config: &OrchestratorConfig) -> Result<()> {
        let key = self.slot.key();
        let orch = orchestrator_for(config, &key)?;
        let record = orch.rollback(&key)?;

        println!(
            "{} Rolled back {} to {} at {}",
            "✓".green(),
            key,
            record.artifact_hash.bold(),
            record.target_path
        );
        Ok(())
    }
}

/// Show published versions or deployment events for a slot.
#[derive(Debug, Args)]
pub struct HistoryCommand {
    #[command(flatten)]
    slot: SlotArgs,

    /// Show deployment events instead of published versions
    #[arg(long)]
    deployments: bool,
}

impl HistoryCommand {
    pub fn execute(self, config: &OrchestratorConfig) -> Result<()> {
        let key = self.slot.key();
        let orch = orchestrator_for(config, &key)?;

        if self.deployments {
            let records = orch.deployment_history(&key)?;
            if records.is_empty() {
                println!("No deployments recorded for {key}");
                return Ok(());
            }
            println!("{} for {key}:", "Deployment history".bold());
            for record in records {
                let status = match record.status {
                    DeploymentStatus::Success => "success".green().to_string(),
                    DeploymentStatus::Failed => "failed".red().to_string(),
                    DeploymentStatus::RolledBack => "rolled_back".yellow().to_string(),
                };
                println!(
                    "  {} {status:<12} {} -> {}",
                    record.timestamp.dimmed(),
                    record.artifact_hash,
                    record.target_path
                );
            }
        } else {
            let entries = orch.publish_history(&key)?;
            if entries.is_empty() {
                println!("Nothing published for {key}");
                return Ok(());
            }
            println!("{} for {key}:", "Publish history".bold());
            for entry in entries {
                println!(
                    "  v{:<4} {} {} (key {})",
                    entry.version,
                    entry.created_at.dimmed(),
                    entry.content_hash,
                    entry.key_id
                );
            }
        }
        Ok(())
    }
}
