//! Command-line interface for the MCP orchestrator.
//!
//! Each subcommand lives in its own module with its own argument struct and
//! execution logic. The CLI is a thin transport over [`crate::orchestrator`]:
//! it parses arguments, loads configuration, restores any persisted draft for
//! the targeted slot, invokes the orchestrator, and renders the result.
//!
//! # Commands
//!
//! - `servers` - Browse and search the server catalog
//! - `draft` - Stage configuration edits for a (client, profile) slot
//! - `publish` - Validate, sign, store, and index the current draft
//! - `deploy` - Write a published artifact to a client's config path
//! - `rollback` - Restore the previously deployed artifact
//! - `history` - Show published versions or deployment events
//! - `keygen` - Generate an Ed25519 signing keypair
//!
//! # Basic Workflow
//!
//! ```bash
//! # 1. Generate signing keys (once)
//! mcpo keygen
//!
//! # 2. Stage servers into a draft
//! mcpo draft add filesystem --param path=/home/me/docs
//! mcpo draft add github --env GITHUB_TOKEN=ghp_xxx
//!
//! # 3. Preview and publish
//! mcpo draft diff
//! mcpo publish
//!
//! # 4. Deploy to the client's config file
//! mcpo deploy ~/.config/claude/claude_desktop_config.json
//! ```

mod deploy;
mod draft;
mod keygen;
mod publish;
mod servers;

use crate::config::OrchestratorConfig;
use crate::models::DraftKey;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI structure.
///
/// Global options are available to every subcommand. `--verbose` and
/// `--quiet` are mutually exclusive and control the log filter; `--config`
/// overrides the default configuration file location
/// (`~/.mcp-orchestrator/config.toml`).
#[derive(Parser)]
#[command(
    name = "mcpo",
    about = "MCP Orchestrator - build, sign, publish, and deploy MCP client configurations",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to a custom configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Browse and search the server catalog
    Servers(servers::ServersCommand),
    /// Stage configuration edits for a (client, profile) slot
    Draft(draft::DraftCommand),
    /// Validate, sign, store, and index the current draft
    Publish(publish::PublishCommand),
    /// Write a published artifact to a client's config path
    Deploy(deploy::DeployCommand),
    /// Restore the previously deployed artifact
    Rollback(deploy::RollbackCommand),
    /// Show published versions or deployment events for a slot
    History(deploy::HistoryCommand),
    /// Generate an Ed25519 signing keypair
    Keygen(keygen::KeygenCommand),
}

impl Cli {
    /// Default log directive implied by the verbosity flags.
    #[must_use]
    pub fn log_directive(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }

    /// Execute the parsed command.
    pub fn execute(self) -> Result<()> {
        let config = match &self.config {
            Some(path) => OrchestratorConfig::load_from(path)?,
            None => OrchestratorConfig::load_or_default()?,
        };

        match self.command {
            Commands::Servers(cmd) => cmd.execute(),
            Commands::Draft(cmd) => cmd.execute(&config),
            Commands::Publish(cmd) => cmd.execute(&config),
            Commands::Deploy(cmd) => cmd.execute(&config),
            Commands::Rollback(cmd) => cmd.execute(&config),
            Commands::History(cmd) => cmd.execute(&config),
            Commands::Keygen(cmd) => cmd.execute(&config),
        }
    }
}

/// Slot selector shared by draft, publish, deploy, and history commands.
#[derive(Debug, Clone, Args)]
pub(crate) struct SlotArgs {
    /// Client family to target (e.g. claude-desktop, cursor)
    #[arg(long, default_value = "claude-desktop")]
    client: String,

    /// Profile within the client family
    #[arg(long, default_value = "default")]
    profile: String,
}

impl SlotArgs {
    pub(crate) fn key(&self) -> DraftKey {
        DraftKey::new(&self.client, &self.profile)
    }
}

/// Build an orchestrator and restore the persisted draft for `key`, if any.
pub(crate) fn orchestrator_for(
    config: &OrchestratorConfig,
    key: &DraftKey,
) -> Result<Orchestrator> {
    let orch = Orchestrator::new(config.clone())?;
    draft::restore_persisted(&orch, config, key)?;
    Ok(orch)
}

/// Parse a `name=value` argument.
pub(crate) fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{s}'"))?;
    if name.is_empty() {
        return Err(format!("empty name in '{s}'"));
    }
    Ok((name.to_string(), value.to_string()))
}
