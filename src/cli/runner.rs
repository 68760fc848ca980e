//! CLI command execution

use super::commands::{CheckpointCommand, Cli, Commands};
use crate::checkpoint::{CheckpointStore, FileCheckpointStore};
use crate::collector::Pass;
use crate::config::CollectorConfig;
use crate::error::{Error, Result};
use crate::sink::{EventSink, JsonLinesSink};
use chrono::DateTime;
use std::path::Path;

/// Executes CLI commands
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a runner for parsed arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Execute the selected command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run { input, output } => {
                self.run_passes(input.as_deref(), output.as_deref()).await
            }
            Commands::Validate => self.validate(),
            Commands::Checkpoint { command } => self.checkpoint(command).await,
        }
    }

    fn load_config(&self) -> Result<CollectorConfig> {
        CollectorConfig::from_file(&self.cli.config)
    }

    /// Run one pass for each configured input, in configuration order.
    /// A fatal error in one pass aborts the run.
    async fn run_passes(&self, only: Option<&str>, output: Option<&Path>) -> Result<()> {
        let config = self.load_config()?;
        let store = FileCheckpointStore::from_file(&self.cli.checkpoints)?;

        let sink: Box<dyn EventSink> = match output {
            Some(path) => Box::new(JsonLinesSink::file(path).await?),
            None => Box::new(JsonLinesSink::stdout()),
        };

        let mut matched = false;
        for input in &config.inputs {
            if only.is_some_and(|name| name != input.name) {
                continue;
            }
            matched = true;

            let account = config.resolve_account(&input.account)?;
            let summary = Pass::new(input, account, config.proxy.as_ref(), &store, sink.as_ref())?
                .run()
                .await?;

            eprintln!(
                "{}: {} emitted, {} skipped, {} page(s), checkpoint {}",
                input.name, summary.emitted, summary.skipped, summary.pages, summary.checkpoint
            );
        }

        if let Some(name) = only {
            if !matched {
                return Err(Error::config(format!("no input named '{name}'")));
            }
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let config = self.load_config()?;
        for input in &config.inputs {
            config.resolve_account(&input.account)?;
        }
        println!(
            "Configuration OK: {} account(s), {} input(s)",
            config.accounts.len(),
            config.inputs.len()
        );
        Ok(())
    }

    async fn checkpoint(&self, command: &CheckpointCommand) -> Result<()> {
        let store = FileCheckpointStore::from_file(&self.cli.checkpoints)?;

        match command {
            CheckpointCommand::Show => {
                let config = self.load_config()?;
                for input in &config.inputs {
                    match store.get(&input.name).await? {
                        Some(value) => println!("{}: {} ({})", input.name, value, human_time(value)),
                        None => println!("{}: <absent>", input.name),
                    }
                }
            }
            CheckpointCommand::Clear { input } => {
                store.delete(input).await?;
                println!("Cleared checkpoint for input '{input}'");
            }
        }

        Ok(())
    }
}

/// Render a millisecond checkpoint as a human-readable UTC time
fn human_time(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map_or_else(|| "invalid".to_string(), |dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_human_time() {
        assert_eq!(human_time(1_709_284_530_123), "2024-03-01 09:15 UTC");
    }
}
