//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument types:
//! - olm: Arguments shared by run and cleanup
//! - completions: Completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod completions;
pub mod olm;

pub use completions::CompletionsArgs;
pub use olm::OlmArgs;

/// olm-run - deploy operator bundles through OLM
///
/// Deploy and tear down an operator bundle on a cluster with OLM installed.
#[derive(Parser, Debug)]
#[command(
    name = "olm-run",
    author,
    version,
    color = clap::ColorChoice::Auto,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Deploy and tear down operator bundles through OLM",
    long_about = "olm-run installs an operator bundle onto a cluster through an existing OLM \
                  installation by creating a catalog registry, CatalogSource, OperatorGroup and \
                  Subscription, and removes all of them again on cleanup.",
    after_help = "Examples:\n   \
                  olm-run run --manifests ./bundle --operator-version 0.0.1\n   \
                  olm-run run --manifests ./bundle --operator-version 0.0.1 --install-mode AllNamespaces\n   \
                  olm-run cleanup --manifests ./bundle --operator-version 0.0.1\n"
)]
pub struct Cli {
    /// Path to a single kubeconfig file. When unset, kubectl's own loading
    /// rules apply, including a KUBECONFIG list of files
    #[arg(long, global = true, value_name = "PATH")]
    pub kubeconfig: Option<PathBuf>,

    /// Enable verbose output (repeat for trace logging)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy an operator bundle through OLM
    Run(OlmArgs),

    /// Remove an operator bundle, its OLM resources and its registry
    Cleanup(OlmArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}
