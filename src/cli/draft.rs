//! `draft` command: stage configuration edits for a slot.
//!
//! Drafts outlive a single CLI invocation by being snapshotted to
//! `<drafts_dir>/<client>/<profile>.json` after every mutating subcommand.
//! Publish removes the snapshot once the draft is consumed.

use super::{SlotArgs, orchestrator_for, parse_key_val};
use crate::builder::DraftState;
use crate::config::OrchestratorConfig;
use crate::models::DraftKey;
use crate::orchestrator::Orchestrator;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Stage configuration edits for a (client, profile) slot.
#[derive(Debug, Args)]
pub struct DraftCommand {
    #[command(subcommand)]
    command: DraftSubcommand,
}

#[derive(Debug, Subcommand)]
enum DraftSubcommand {
    /// Add a catalog server to the draft (re-adding replaces the entry)
    Add {
        /// Server id from the catalog (see `mcpo servers list`)
        server_id: String,

        #[command(flatten)]
        slot: SlotArgs,

        /// Parameter value as name=value (repeatable)
        #[arg(short, long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,

        /// Environment variable as NAME=value (repeatable)
        #[arg(short, long = "env", value_parser = parse_key_val)]
        env: Vec<(String, String)>,
    },
    /// Remove a server from the draft (no-op if absent)
    Remove {
        /// Server id to remove
        server_id: String,

        #[command(flatten)]
        slot: SlotArgs,
    },
    /// Show the draft payload as it would be published
    Show {
        #[command(flatten)]
        slot: SlotArgs,
    },
    /// Diff the draft against the latest published version
    Diff {
        #[command(flatten)]
        slot: SlotArgs,
    },
    /// Discard the draft entirely
    Clear {
        #[command(flatten)]
        slot: SlotArgs,
    },
}

impl DraftCommand {
    pub fn execute(self, config: &OrchestratorConfig) -> Result<()> {
        match self.command {
            DraftSubcommand::Add {
                server_id,
                slot,
                params,
                env,
            } => {
                let key = slot.key();
                let orch = orchestrator_for(config, &key)?;
                let params: BTreeMap<_, _> = params.into_iter().collect();
                let env: BTreeMap<_, _> = env.into_iter().collect();
                orch.add_server(&key, &server_id, &params, &env)?;
                persist(&orch, config, &key)?;
                println!("{} Added '{}' to draft {}", "✓".green(), server_id.bold(), key);
            }
            DraftSubcommand::Remove {
                server_id,
                slot,
            } => {
                let key = slot.key();
                let orch = orchestrator_for(config, &key)?;
                orch.remove_server(&key, &server_id)?;
                persist(&orch, config, &key)?;
                println!("{} Removed '{}' from draft {}", "✓".green(), server_id.bold(), key);
            }
            DraftSubcommand::Show {
                slot,
            } => {
                let key = slot.key();
                let orch = orchestrator_for(config, &key)?;
                let payload = orch.build_draft(&key)?;
                if payload.mcp_servers.is_empty() {
                    println!("Draft {key} is empty");
                } else {
                    println!("{}", serde_json::to_string_pretty(&payload)?);
                }
            }
            DraftSubcommand::Diff {
                slot,
            } => {
                let key = slot.key();
                let orch = orchestrator_for(config, &key)?;
                let diff = orch.diff_against_latest(&key)?;
                if diff.is_empty() {
                    println!("Draft {key} matches the latest published version");
                    return Ok(());
                }
                for name in &diff.added {
                    println!("  {} {name}", "+".green());
                }
                for name in &diff.removed {
                    println!("  {} {name}", "-".red());
                }
                for name in &diff.changed {
                    println!("  {} {name}", "~".yellow());
                }
                for name in &diff.unchanged {
                    println!("    {}", name.dimmed());
                }
            }
            DraftSubcommand::Clear {
                slot,
            } => {
                let key = slot.key();
                let orch = orchestrator_for(config, &key)?;
                orch.clear_draft(&key)?;
                persist(&orch, config, &key)?;
                println!("{} Cleared draft {}", "✓".green(), key);
            }
        }
        Ok(())
    }
}

/// Where a slot's draft snapshot lives on disk.
fn draft_file(config: &OrchestratorConfig, key: &DraftKey) -> PathBuf {
    config.drafts_dir.join(&key.client_id).join(format!("{}.json", key.profile_id))
}

/// Load a persisted draft snapshot into the orchestrator, if one exists.
pub(crate) fn restore_persisted(
    orch: &Orchestrator,
    config: &OrchestratorConfig,
    key: &DraftKey,
) -> Result<()> {
    let path = draft_file(config, key);
    if path.exists() {
        let state: DraftState = crate::utils::read_json_file(&path)
            .with_context(|| format!("Corrupt draft snapshot: {}", path.display()))?;
        orch.restore_draft(key, state)?;
    }
    Ok(())
}

/// Snapshot the current draft to disk; an empty draft removes the snapshot.
pub(crate) fn persist(
    orch: &Orchestrator,
    config: &OrchestratorConfig,
    key: &DraftKey,
) -> Result<()> {
    let state = orch.snapshot_draft(key)?;
    let path = draft_file(config, key);
    if state.servers.is_empty() {
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove draft snapshot: {}", path.display()))?;
        }
        return Ok(());
    }
    crate::utils::write_json_file(&path, &state, true)
        .with_context(|| format!("Failed to persist draft snapshot: {}", path.display()))
}
