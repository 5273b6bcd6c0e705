//! `mcpo` CLI entry point.
//!
//! Parses arguments, initializes logging, executes the command, and renders
//! failures on stderr with a non-zero exit code.

use clap::Parser;
use colored::Colorize;
use mcpo_cli::cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flags when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_directive()));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    if let Err(e) = cli.execute() {
        eprintln!("{} {e:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
