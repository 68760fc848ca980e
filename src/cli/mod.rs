//! CLI module
//!
//! Command-line interface for running the collector.
//!
//! # Commands
//!
//! - `run` - Execute one pass for each configured input
//! - `validate` - Check the configuration file
//! - `checkpoint show` - Print stored checkpoints
//! - `checkpoint clear` - Delete the checkpoint of one input

mod commands;
mod runner;

pub use commands::{CheckpointCommand, Cli, Commands};
pub use runner::Runner;
