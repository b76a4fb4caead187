//! # CLI Command Implementations

use retrace::{AppConfig, CAPACITY_ENV, JsonlJournal, Replayer, parse_script};
use retrace_core::{ChangeSet, Direction, HistoryError, PersistHook};
use std::cell::RefCell;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::rc::Rc;

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of an edit script (50 MB).
const MAX_SCRIPT_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Maximum size of a configuration file (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), HistoryError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| HistoryError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(HistoryError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path and ensure it is a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, HistoryError> {
    let canonical = path.canonicalize().map_err(|e| {
        HistoryError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(HistoryError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path against its canonical parent directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, HistoryError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        HistoryError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(HistoryError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| HistoryError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

/// Read a validated text file.
fn read_input(path: &Path, max_size: u64) -> Result<String, HistoryError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, max_size)?;
    std::fs::read_to_string(&validated)
        .map_err(|e| HistoryError::IoError(format!("Read file: {}", e)))
}

/// Load the configuration file (if any), then apply environment overrides.
fn load_config(path: Option<&Path>) -> Result<AppConfig, HistoryError> {
    let config = match path {
        Some(path) => {
            tracing::debug!("Loading configuration from {:?}", path);
            AppConfig::from_toml_str(&read_input(path, MAX_CONFIG_FILE_SIZE)?)?
        }
        None => AppConfig::default(),
    };

    config
        .with_capacity_override(std::env::var(CAPACITY_ENV).ok().as_deref())?
        .validated()
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String, HistoryError> {
    serde_json::to_string_pretty(value).map_err(|e| HistoryError::SerializationError(e.to_string()))
}

// =============================================================================
// REPLAY COMMAND
// =============================================================================

/// Replay an edit script and print the resulting state.
pub fn cmd_replay(
    config_path: Option<&Path>,
    json_mode: bool,
    script: &Path,
    journal: Option<&Path>,
) -> Result<(), HistoryError> {
    let config = load_config(config_path)?;
    let steps = parse_script(&read_input(script, MAX_SCRIPT_FILE_SIZE)?)?;
    tracing::info!("Replaying {} steps from {:?}", steps.len(), script);

    let sink = match journal {
        Some(path) => {
            let path = validate_output_path(path)?;
            let file = File::create(&path)
                .map_err(|e| HistoryError::IoError(format!("Create journal: {}", e)))?;
            Some((path, Rc::new(RefCell::new(JsonlJournal::new(BufWriter::new(file))))))
        }
        None => None,
    };

    let mut replayer = match &sink {
        Some((_, journal)) => {
            let journal = Rc::clone(journal);
            Replayer::with_persist_hook(
                config.history,
                move |change: &ChangeSet, direction: Direction| {
                    journal.borrow_mut().persist(change, direction);
                },
            )?
        }
        None => Replayer::new(config.history)?,
    };

    let outcome = replayer.run(&steps);

    let journal_lines = match &sink {
        Some((path, journal)) => {
            let mut journal = journal.borrow_mut();
            journal.flush()?;
            if journal.failed() > 0 {
                tracing::warn!(failed = journal.failed(), "Some journal lines were not written");
            }
            tracing::info!("Journal written to {:?}", path);
            Some(journal.written())
        }
        None => None,
    };

    outcome?;
    let report = replayer.report();

    if json_mode {
        let output = serde_json::json!({
            "script": script.to_string_lossy(),
            "journal_lines": journal_lines,
            "report": report,
        });
        println!("{}", to_pretty_json(&output)?);
        return Ok(());
    }

    println!("Replay Summary");
    println!("==============");
    println!("Script:       {:?}", script);
    println!("Steps:        {}", report.stats.steps);
    println!("Recorded:     {}", report.stats.recorded);
    println!("Unchanged:    {}", report.stats.unchanged);
    println!("Undone:       {}", report.stats.undone);
    println!("Redone:       {}", report.stats.redone);
    println!("Ignored:      {}", report.stats.ignored);
    if let Some(lines) = journal_lines {
        println!("Journal:      {} lines", lines);
    }
    println!();
    println!("Undo stack ({}):", report.undo_stack.len());
    for description in report.undo_stack.iter().rev() {
        println!("  - {}", description);
    }
    println!("Redo stack ({}):", report.redo_stack.len());
    for description in &report.redo_stack {
        println!("  - {}", description);
    }
    println!();
    println!("Nodes:        {}", report.state.nodes.len());
    println!("Edges:        {}", report.state.edges.len());
    println!("Annotations:  {}", report.state.annotations.len());
    if report.batching {
        println!();
        println!("Warning: script ended with an open batch");
    }

    Ok(())
}

// =============================================================================
// CONFIG COMMAND
// =============================================================================

/// Show the effective configuration.
pub fn cmd_config(config_path: Option<&Path>, json_mode: bool) -> Result<(), HistoryError> {
    let config = load_config(config_path)?;

    if json_mode {
        println!("{}", to_pretty_json(&config)?);
        return Ok(());
    }

    println!("retrace Configuration");
    println!("=====================");
    match config_path {
        Some(path) => println!("File:      {:?}", path),
        None => println!("File:      (defaults)"),
    }
    println!();
    println!("[history]");
    println!("capacity = {}", config.history.capacity);
    println!("enabled  = {}", config.history.enabled);

    Ok(())
}
