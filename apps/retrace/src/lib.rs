//! # retrace
//!
//! Host-side tooling around `retrace-core`: configuration loading, a JSONL
//! persistence journal and a scripted edit-session runner. The `retrace`
//! binary is a thin clap front end over these modules.

pub mod config;
pub mod journal;
pub mod script;

pub use config::{AppConfig, CAPACITY_ENV};
pub use journal::JsonlJournal;
pub use script::{ReplayReport, Replayer, ScriptStep, parse_script};
