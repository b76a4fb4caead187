//! # retrace - Edit History Replay
//!
//! The binary front end for the retrace undo/redo engine.
//!
//! This application provides:
//! - Replay of JSON edit scripts through a `HistoryEngine`
//! - A JSONL journal of persistence notifications
//! - Inspection of the effective configuration
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                apps/retrace (THE BINARY)             │
//! │                                                      │
//! │   ┌─────────────┐  ┌─────────────┐  ┌────────────┐   │
//! │   │    CLI      │  │   Script    │  │  Journal   │   │
//! │   │   (clap)    │─▶│  Replayer   │─▶│  (JSONL)   │   │
//! │   └─────────────┘  └──────┬──────┘  └────────────┘   │
//! │                           ▼                          │
//! │                   ┌───────────────┐                  │
//! │                   │ retrace-core  │                  │
//! │                   │ (THE ENGINE)  │                  │
//! │                   └───────────────┘                  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! retrace replay -s session.json -j journal.jsonl
//! retrace --config retrace.toml --json-mode replay -s session.json
//! retrace config
//! ```

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // RETRACE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("RETRACE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "retrace=debug,retrace_core=debug"
    } else {
        "retrace=info,retrace_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr so stdout stays parseable in --json-mode.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r"
  retrace v{}
  snapshot undo/redo for graph editors
",
        env!("CARGO_PKG_VERSION")
    );
}
