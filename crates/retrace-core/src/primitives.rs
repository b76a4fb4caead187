//! # Engine Primitives
//!
//! Compiled-in defaults for the history engine.

/// Default number of change sets kept in the undo stack.
///
/// Pushing beyond this evicts the oldest entry first.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Upper bound accepted for a configured capacity.
///
/// Every entry may hold full snapshots of many entities, so an unbounded
/// history is refused at configuration time.
pub const MAX_HISTORY_CAPACITY: usize = 10_000;

/// Description used when a change set is recorded without one.
pub const UNTITLED_CHANGE: &str = "Edit";
