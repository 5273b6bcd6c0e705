//! `servers` command: browse and search the catalog.

use crate::registry::{ServerDefinition, ServerRegistry, TransportType};
use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

/// Browse the catalog of known MCP servers.
#[derive(Debug, Args)]
pub struct ServersCommand {
    #[command(subcommand)]
    command: ServersSubcommand,
}

#[derive(Debug, Subcommand)]
enum ServersSubcommand {
    /// List every server in the catalog
    List {
        /// Show parameters and environment requirements
        #[arg(long)]
        detailed: bool,
    },
    /// Search the catalog by id, name, description, or tag
    Search {
        /// Case-insensitive substring to match
        query: String,
    },
}

impl ServersCommand {
    pub fn execute(self) -> Result<()> {
        let registry = ServerRegistry::with_defaults();
        match self.command {
            ServersSubcommand::List {
                detailed,
            } => {
                println!("{} ({} available)", "MCP servers".bold(), registry.count());
                println!();
                for server in registry.list_all() {
                    print_server(server, detailed);
                }
            }
            ServersSubcommand::Search {
                query,
            } => {
                let hits = registry.search(&query);
                if hits.is_empty() {
                    println!("No servers matching '{query}'");
                    return Ok(());
                }
                println!("{} servers matching '{query}':", hits.len());
                println!();
                for server in hits {
                    print_server(server, false);
                }
            }
        }
        Ok(())
    }
}

fn print_server(server: &ServerDefinition, detailed: bool) {
    let transport = match server.transport {
        TransportType::Stdio => "stdio",
        TransportType::Http => "http",
        TransportType::Sse => "sse",
    };
    println!(
        "  {} {} [{}] - {}",
        server.server_id.bold().cyan(),
        format!("({})", server.display_name).dimmed(),
        transport,
        server.description
    );

    if detailed {
        for param in &server.parameters {
            let required = if param.required && param.default.is_none() {
                "required".yellow().to_string()
            } else {
                "optional".to_string()
            };
            println!("      param {} ({required}): {}", param.name.green(), param.description);
        }
        for env in &server.required_env {
            println!("      env   {} ({})", env.green(), "required".yellow());
        }
        for env in &server.optional_env {
            println!("      env   {env} (optional)");
        }
        if !server.tags.is_empty() {
            println!("      tags  {}", server.tags.join(", ").dimmed());
        }
    }
}
