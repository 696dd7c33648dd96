//! CLI module for Sampledex.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Sampledex - natural-language search for audio samples
///
/// Index folders of short audio samples with a joint audio/text embedding
/// model, then find them by describing how they sound.
#[derive(Parser, Debug)]
#[command(name = "sampledex")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index a folder of audio samples
    Index {
        /// Folder to scan recursively
        folder: String,

        /// Skip files longer than this many seconds
        #[arg(short, long)]
        max_duration: Option<f64>,

        /// Number of files to embed concurrently
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Search indexed samples by description
    Search {
        /// Description of the sound
        query: String,

        /// Maximum number of results
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// List indexed samples
    List,

    /// Remove indexed samples whose files no longer exist
    Prune,

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check the store and embedding service
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
