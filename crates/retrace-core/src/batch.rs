//! # Batch Aggregator
//!
//! Buffer for the change sets committed while a batch is open. On close the
//! buffer is coalesced into a single change set (see `ChangeSet::merge`).

use crate::changeset::ChangeSet;

/// Accumulation buffer alive only while a batch is open.
#[derive(Debug, Default)]
pub struct BatchContext {
    collected: Vec<ChangeSet>,
}

impl BatchContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a committed change set.
    pub fn push(&mut self, change: ChangeSet) {
        self.collected.push(change);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.collected.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collected.is_empty()
    }

    /// Close the batch. `None` if nothing was buffered or the buffered edits
    /// cancel out.
    #[must_use]
    pub fn finish(self) -> Option<ChangeSet> {
        ChangeSet::merge(self.collected).filter(ChangeSet::has_changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changeset::SnapshotEntry;
    use crate::snapshot::Snapshottable;
    use crate::types::{LiveNode, NodeId, Position};

    fn silent(description: &str) -> ChangeSet {
        let mut change = ChangeSet::new(description);
        change.persist = false;
        change
    }

    #[test]
    fn empty_batch_finishes_with_nothing() {
        let batch = BatchContext::new();
        assert!(batch.is_empty());
        assert!(batch.finish().is_none());
    }

    fn moved(change: &mut ChangeSet, x: f64) {
        let before = LiveNode::new("n1", "task", Position::new(0.0, 0.0)).to_snapshot();
        let mut after = before.clone();
        after.position = Position::new(x, x);
        change.node_entries.push(SnapshotEntry {
            id: NodeId::new("n1"),
            before: Some(before),
            after: Some(after),
        });
    }

    #[test]
    fn finished_batch_persists_if_any_commit_did() {
        let mut first = silent("a");
        moved(&mut first, 5.0);
        let mut second = ChangeSet::new("b");
        moved(&mut second, 10.0);

        let mut batch = BatchContext::new();
        batch.push(first);
        batch.push(second);
        assert_eq!(batch.len(), 2);

        let merged = batch.finish().expect("merged change");
        assert!(merged.persist);
        assert_eq!(merged.node_entries.len(), 1);
    }

    #[test]
    fn all_silent_batch_stays_silent() {
        let mut only = silent("a");
        moved(&mut only, 5.0);

        let mut batch = BatchContext::new();
        batch.push(only);

        let merged = batch.finish().expect("merged change");
        assert!(!merged.persist);
    }
}
