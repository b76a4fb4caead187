//! # History Stacks
//!
//! Two bounded, disjoint stacks implementing linear undo/redo:
//! - `past`: oldest → newest. The back is the next undo.
//! - `future`: nearest → farthest. The front is the next redo.
//!
//! Change sets are moved between the stacks by value, so an entry can never
//! sit in both at once.

use crate::changeset::ChangeSet;
use std::collections::VecDeque;

/// The `past`/`future` pair with a capacity bound on `past`.
#[derive(Debug, Clone)]
pub struct HistoryStacks {
    past: VecDeque<ChangeSet>,
    future: VecDeque<ChangeSet>,
    capacity: usize,
}

impl HistoryStacks {
    /// Create empty stacks. A capacity of zero is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn past(&self) -> &VecDeque<ChangeSet> {
        &self.past
    }

    #[must_use]
    pub fn future(&self) -> &VecDeque<ChangeSet> {
        &self.future
    }

    /// Record a new edit. Invalidates every pending redo.
    ///
    /// Returns the number of entries evicted from the oldest end.
    pub fn push(&mut self, change: ChangeSet) -> usize {
        self.future.clear();
        self.past.push_back(change);
        self.enforce_capacity()
    }

    /// Take the newest `past` entry for undo.
    pub fn pop_undo(&mut self) -> Option<ChangeSet> {
        self.past.pop_back()
    }

    /// Park an undone entry as the next redo.
    pub fn push_redo(&mut self, change: ChangeSet) {
        self.future.push_front(change);
    }

    /// Take the nearest `future` entry for redo.
    pub fn pop_redo(&mut self) -> Option<ChangeSet> {
        self.future.pop_front()
    }

    /// Return a redone entry to the end of `past`.
    pub fn push_undo(&mut self, change: ChangeSet) {
        self.past.push_back(change);
        self.enforce_capacity();
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    fn enforce_capacity(&mut self) -> usize {
        let mut evicted = 0;
        while self.past.len() > self.capacity {
            self.past.pop_front();
            evicted += 1;
        }
        evicted
    }
}
