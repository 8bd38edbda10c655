//! Command-line interface for little-ar.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "little-ar", version, about = "AR model viewer with hit-test placement")]
pub struct Cli {
    /// JSON config file; defaults are used for anything it leaves out.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Override the model path from the config.
    #[arg(long)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum CliCommand {
    /// Open the desktop preview window (default).
    Preview,
    /// Run a scripted session against the simulated runtime and print a JSON summary.
    Headless {
        /// Ticks to run.
        #[arg(long, default_value_t = 120)]
        frames: u64,
        /// Tick at which to fire a select action.
        #[arg(long)]
        select_at: Option<u64>,
        /// Viewer yaw change per tick, in degrees.
        #[arg(long, default_value_t = 0.0)]
        sweep_degrees: f32,
    },
}

impl Cli {
    pub fn command(&self) -> CliCommand {
        self.command.clone().unwrap_or(CliCommand::Preview)
    }
}
