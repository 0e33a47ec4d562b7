//! olm-run - deploy operator bundles through OLM
//!
//! A command line tool that installs an operator bundle onto a cluster through
//! an existing Operator Lifecycle Manager installation and tears it down again.

use clap::Parser;
use miette::Diagnostic;
use tracing_subscriber::EnvFilter;

mod bundle;
mod cli;
mod commands;
mod config;
mod context;
mod error;
mod manager;
mod operations;

use cli::{Cli, Commands};

/// Log filter used when RUST_LOG is not set
fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "olm_run=info",
        1 => "olm_run=debug",
        _ => "olm_run=trace",
    }
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(cli.kubeconfig, args).await,
        Commands::Cleanup(args) => commands::cleanup::run(cli.kubeconfig, args).await,
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if let Some(help) = e.help() {
            eprintln!("  help: {}", help);
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_follows_verbosity() {
        assert_eq!(default_filter(0), "olm_run=info");
        assert_eq!(default_filter(1), "olm_run=debug");
        assert_eq!(default_filter(2), "olm_run=trace");
        assert_eq!(default_filter(7), "olm_run=trace");
    }

    #[test]
    fn test_default_filters_parse() {
        for verbose in 0..3 {
            assert!(EnvFilter::try_new(default_filter(verbose)).is_ok());
        }
    }
}
