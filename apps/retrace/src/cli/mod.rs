//! # retrace CLI Module
//!
//! ## Available Commands
//!
//! - `replay` - Run an edit script through the history engine
//! - `config` - Show the effective configuration

mod commands;

use clap::{Parser, Subcommand};
use retrace_core::HistoryError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// retrace - snapshot undo/redo for graph editors
///
/// Replays scripted edit sessions through the history engine and journals
/// every persistence notification.
#[derive(Parser, Debug)]
#[command(name = "retrace")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging (unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay an edit script
    Replay {
        /// Path to the JSON script
        #[arg(short, long)]
        script: PathBuf,

        /// Write persistence notifications to this JSONL file
        #[arg(short, long)]
        journal: Option<PathBuf>,
    },

    /// Show the effective configuration
    Config,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), HistoryError> {
    let config_path = cli.config.as_deref();
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Replay { script, journal }) => {
            cmd_replay(config_path, json_mode, &script, journal.as_deref())
        }
        // No subcommand - show configuration by default
        Some(Commands::Config) | None => cmd_config(config_path, json_mode),
    }
}
