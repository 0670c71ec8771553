//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// specmill - build, watch, and preview pipeline for specification documents
#[derive(Parser, Debug)]
#[command(name = "specmill")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Running specmill without a subcommand builds once.")]
pub struct Cli {
    /// Emit NDJSON events instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the source document to the output file (default)
    Build {
        /// Source document (overrides specmill.toml)
        #[arg(short, long)]
        source: Option<PathBuf>,
    },

    /// Remove the generated output
    Clean,

    /// Rebuild on every source or bibliography change
    Watch {
        /// Source document (overrides specmill.toml)
        #[arg(short, long)]
        source: Option<PathBuf>,
    },

    /// Watch and serve a live-reloading local preview
    Start {
        /// Source document (overrides specmill.toml)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Preview port (overrides specmill.toml)
        #[arg(short, long)]
        port: Option<u16>,
    },
}
