//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Checkpointed incremental collector for Jira issues
#[derive(Parser, Debug)]
#[command(name = "jira-collector")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Collector configuration file (YAML)
    #[arg(short, long, global = true, default_value = "collector.yaml")]
    pub config: PathBuf,

    /// Checkpoint file (JSON)
    #[arg(short = 's', long, global = true, default_value = "checkpoints.json")]
    pub checkpoints: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute one pass for each configured input
    Run {
        /// Only run the named input
        #[arg(long)]
        input: Option<String>,

        /// Write events to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate the configuration file
    Validate,

    /// Inspect or clear stored checkpoints
    Checkpoint {
        #[command(subcommand)]
        command: CheckpointCommand,
    },
}

/// Checkpoint maintenance subcommands
#[derive(Subcommand, Debug)]
pub enum CheckpointCommand {
    /// Print the checkpoint of each configured input
    Show,

    /// Delete the checkpoint of one input, forcing a re-seed on the next run
    Clear {
        /// Input name
        input: String,
    },
}
