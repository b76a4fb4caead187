//! # History Engine
//!
//! The engine owns the `past`/`future` stacks, the optional open batch and
//! the injected persistence hook. Live state stays in the collaborator
//! stores, which every operation receives as a parameter.
//!
//! ## Control Flow
//!
//! ```text
//! capture_snapshot ─▶ (caller mutates stores) ─▶ commit_change
//!                                                   │
//!                          batch open? ──yes──▶ BatchContext ─▶ end_batch ─┐
//!                              │ no                                        │
//!                              ▼                                           ▼
//!                         HistoryStacks::push ◀────────────────────────────┘
//!                              │
//!              undo / redo ─▶ apply_change_set ─▶ stores ─▶ PersistHook
//! ```
//!
//! ## Misuse
//!
//! Nothing on the interactive path returns an error. Calls that make no sense
//! (undo on an empty stack, nested `begin_batch`, `end_batch` without a
//! batch) are no-ops; the batch misuses are logged at `warn`.

use crate::apply::apply_change_set;
use crate::batch::BatchContext;
use crate::capture::{
    CaptureOptions, CaptureSession, CommitOptions, build_change_set, capture_snapshot,
};
use crate::changeset::{ChangeSet, Direction};
use crate::config::HistoryConfig;
use crate::history::HistoryStacks;
use crate::persist::PersistHook;
use crate::store::{AnnotationStore, GraphStore};
use crate::types::HistoryError;
use std::collections::VecDeque;
use std::fmt;

// =============================================================================
// LOGGING HELPERS
// =============================================================================

/// Log a rejected call and convert to `Option`.
fn log_rejected<T>(result: Result<T, HistoryError>, operation: &str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(operation, "Ignored {}: {}", operation, e);
            None
        }
    }
}

// =============================================================================
// COMMIT OUTCOME
// =============================================================================

/// What happened to a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The engine is disabled; nothing was recorded.
    Disabled,
    /// No entry differed from its "before"; nothing was recorded.
    Unchanged,
    /// A batch is open; the change set waits in the batch buffer.
    Buffered,
    /// The change set was pushed onto `past`.
    Recorded,
}

// =============================================================================
// ENGINE
// =============================================================================

/// Snapshot-based undo/redo engine.
pub struct HistoryEngine {
    enabled: bool,
    stacks: HistoryStacks,
    batch: Option<BatchContext>,
    persist_hook: Option<Box<dyn PersistHook>>,
}

impl fmt::Debug for HistoryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryEngine")
            .field("enabled", &self.enabled)
            .field("past", &self.stacks.past().len())
            .field("future", &self.stacks.future().len())
            .field("batching", &self.batch.is_some())
            .field("persist_hook", &self.persist_hook.is_some())
            .finish()
    }
}

impl Default for HistoryEngine {
    fn default() -> Self {
        let config = HistoryConfig::default();
        Self {
            enabled: config.enabled,
            stacks: HistoryStacks::new(config.capacity),
            batch: None,
            persist_hook: None,
        }
    }
}

impl HistoryEngine {
    /// Create an engine from a validated configuration.
    pub fn new(config: HistoryConfig) -> Result<Self, HistoryError> {
        config.validate()?;
        Ok(Self {
            enabled: config.enabled,
            stacks: HistoryStacks::new(config.capacity),
            batch: None,
            persist_hook: None,
        })
    }

    /// Create an engine with a persistence hook injected up front.
    pub fn with_persist_hook(
        config: HistoryConfig,
        hook: impl PersistHook + 'static,
    ) -> Result<Self, HistoryError> {
        let mut engine = Self::new(config)?;
        engine.set_persist_hook(hook);
        Ok(engine)
    }

    /// Install (or replace) the persistence hook.
    pub fn set_persist_hook(&mut self, hook: impl PersistHook + 'static) {
        self.persist_hook = Some(Box::new(hook));
    }

    pub fn clear_persist_hook(&mut self) {
        self.persist_hook = None;
    }

    /// Enable or disable recording and replay.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            tracing::debug!(enabled, "History engine toggled");
        }
        self.enabled = enabled;
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    // =========================================================================
    // CAPTURE / COMMIT
    // =========================================================================

    /// Record "before" snapshots. Pure read of the stores.
    pub fn capture_snapshot<S>(&self, stores: &S, options: CaptureOptions) -> CaptureSession
    where
        S: GraphStore + AnnotationStore + ?Sized,
    {
        capture_snapshot(stores, options)
    }

    /// Record the "after" side of a captured edit.
    ///
    /// No-op edits never enter history. Inside a batch the change set is
    /// buffered; otherwise it is pushed and pending redos are dropped.
    pub fn commit_change<S>(
        &mut self,
        stores: &S,
        session: CaptureSession,
        description: &str,
        options: CommitOptions,
    ) -> CommitOutcome
    where
        S: GraphStore + AnnotationStore + ?Sized,
    {
        if !self.enabled {
            return CommitOutcome::Disabled;
        }

        let change = build_change_set(stores, session, description, &options);
        if !change.has_changes() {
            tracing::trace!(description = %change.description, "Commit without changes skipped");
            return CommitOutcome::Unchanged;
        }

        match self.batch.as_mut() {
            Some(batch) => {
                tracing::debug!(
                    description = %change.description,
                    buffered = batch.len() + 1,
                    "Change buffered in batch"
                );
                batch.push(change);
                CommitOutcome::Buffered
            }
            None => {
                self.record(change);
                CommitOutcome::Recorded
            }
        }
    }

    fn record(&mut self, change: ChangeSet) {
        tracing::debug!(
            description = %change.description,
            entries = change.entry_count(),
            "Change recorded"
        );
        let persist = change.persist;
        let evicted = self.stacks.push(change);
        if evicted > 0 {
            tracing::debug!(evicted, capacity = self.stacks.capacity(), "Oldest history evicted");
        }
        if persist {
            if let (Some(hook), Some(change)) =
                (self.persist_hook.as_mut(), self.stacks.past().back())
            {
                hook.persist(change, Direction::Redo);
            }
        }
    }

    // =========================================================================
    // UNDO / REDO
    // =========================================================================

    /// Restore the `before` side of the newest change set.
    ///
    /// Returns `false` when nothing was undone.
    pub fn undo<S>(&mut self, stores: &mut S) -> bool
    where
        S: GraphStore + AnnotationStore + ?Sized,
    {
        if !self.ready_to_replay("undo") {
            return false;
        }
        let Some(change) = self.stacks.pop_undo() else {
            return false;
        };

        apply_change_set(stores, &change, Direction::Undo);
        tracing::debug!(description = %change.description, "Undo applied");

        let persist = change.persist;
        self.stacks.push_redo(change);
        if persist {
            if let (Some(hook), Some(change)) =
                (self.persist_hook.as_mut(), self.stacks.future().front())
            {
                hook.persist(change, Direction::Undo);
            }
        }
        true
    }

    /// Re-apply the `after` side of the nearest undone change set.
    ///
    /// Returns `false` when nothing was redone.
    pub fn redo<S>(&mut self, stores: &mut S) -> bool
    where
        S: GraphStore + AnnotationStore + ?Sized,
    {
        if !self.ready_to_replay("redo") {
            return false;
        }
        let Some(change) = self.stacks.pop_redo() else {
            return false;
        };

        apply_change_set(stores, &change, Direction::Redo);
        tracing::debug!(description = %change.description, "Redo applied");

        let persist = change.persist;
        self.stacks.push_undo(change);
        if persist {
            if let (Some(hook), Some(change)) =
                (self.persist_hook.as_mut(), self.stacks.past().back())
            {
                hook.persist(change, Direction::Redo);
            }
        }
        true
    }

    /// Replay is refused while disabled or while a batch is collecting.
    fn ready_to_replay(&self, operation: &str) -> bool {
        if !self.enabled {
            return false;
        }
        if let Some(batch) = &self.batch {
            tracing::warn!(
                operation,
                buffered = batch.len(),
                "Ignored {} while a batch is open",
                operation
            );
            return false;
        }
        true
    }

    // =========================================================================
    // BATCHING
    // =========================================================================

    /// Open a batch; nesting is refused.
    pub fn try_begin_batch(&mut self) -> Result<(), HistoryError> {
        if let Some(batch) = &self.batch {
            return Err(HistoryError::BatchAlreadyOpen(batch.len()));
        }
        tracing::debug!("Batch opened");
        self.batch = Some(BatchContext::new());
        Ok(())
    }

    /// Open a batch. A nested call is logged and ignored; returns whether a
    /// batch was opened.
    pub fn begin_batch(&mut self) -> bool {
        log_rejected(self.try_begin_batch(), "begin_batch").is_some()
    }

    /// Close the batch and push its coalesced change set, if any.
    pub fn try_end_batch(&mut self) -> Result<CommitOutcome, HistoryError> {
        let batch = self.batch.take().ok_or(HistoryError::NoOpenBatch)?;
        let buffered = batch.len();

        match batch.finish() {
            Some(change) => {
                tracing::debug!(buffered, "Batch closed");
                self.record(change);
                Ok(CommitOutcome::Recorded)
            }
            None => {
                tracing::debug!(buffered, "Batch closed without changes");
                Ok(CommitOutcome::Unchanged)
            }
        }
    }

    /// Close the batch. Without an open batch this is logged and ignored;
    /// returns whether a change set was recorded.
    pub fn end_batch(&mut self) -> bool {
        log_rejected(self.try_end_batch(), "end_batch") == Some(CommitOutcome::Recorded)
    }

    /// Discard an open batch and everything it buffered.
    ///
    /// The live stores are not rolled back. Returns the number of discarded
    /// change sets.
    pub fn abort_batch(&mut self) -> usize {
        match log_rejected(self.batch.take().ok_or(HistoryError::NoOpenBatch), "abort_batch") {
            Some(batch) => {
                if !batch.is_empty() {
                    tracing::warn!(discarded = batch.len(), "Batch aborted");
                }
                batch.len()
            }
            None => 0,
        }
    }

    /// Run `f` inside a batch.
    ///
    /// If a batch is already open, `f` joins it and the batch stays open for
    /// its owner to close.
    pub fn scoped_batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let opened = self.batch.is_none() && self.begin_batch();
        let result = f(self);
        if opened {
            self.end_batch();
        }
        result
    }

    #[must_use]
    pub fn is_batching(&self) -> bool {
        self.batch.is_some()
    }

    // =========================================================================
    // HISTORY MANAGEMENT
    // =========================================================================

    /// Drop both stacks and any open batch (e.g. after a topology reload).
    pub fn clear_history(&mut self) {
        if let Some(batch) = self.batch.take() {
            if !batch.is_empty() {
                tracing::warn!(discarded = batch.len(), "Open batch discarded by clear_history");
            }
        }
        self.stacks.clear();
        tracing::debug!("History cleared");
    }

    // =========================================================================
    // DERIVED SELECTORS
    // =========================================================================

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.enabled && !self.stacks.past().is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.enabled && !self.stacks.future().is_empty()
    }

    #[must_use]
    pub fn undo_count(&self) -> usize {
        self.stacks.past().len()
    }

    #[must_use]
    pub fn redo_count(&self) -> usize {
        self.stacks.future().len()
    }

    /// Label of the change the next `undo` would revert.
    #[must_use]
    pub fn undo_description(&self) -> Option<&str> {
        self.stacks.past().back().map(|c| c.description.as_str())
    }

    /// Label of the change the next `redo` would re-apply.
    #[must_use]
    pub fn redo_description(&self) -> Option<&str> {
        self.stacks.future().front().map(|c| c.description.as_str())
    }

    /// Undo stack, oldest first.
    #[must_use]
    pub fn past(&self) -> &VecDeque<ChangeSet> {
        self.stacks.past()
    }

    /// Redo stack, nearest first.
    #[must_use]
    pub fn future(&self) -> &VecDeque<ChangeSet> {
        self.stacks.future()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.stacks.capacity()
    }
}

// =============================================================================
// TESTS
// =============================================================================
