//! # Persistence Hook
//!
//! Injected per engine instance and notified after a change set is recorded
//! or replayed. Fire-and-forget: the engine does not await, retry or inspect
//! anything the hook does. A hook must not call back into the engine.

use crate::changeset::{ChangeSet, Direction};

/// Receiver of recorded and replayed change sets.
///
/// Freshly recorded commits are reported with `Direction::Redo`.
pub trait PersistHook {
    fn persist(&mut self, change: &ChangeSet, direction: Direction);
}

impl<F> PersistHook for F
where
    F: FnMut(&ChangeSet, Direction),
{
    fn persist(&mut self, change: &ChangeSet, direction: Direction) {
        self(change, direction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_hooks() {
        let mut seen = Vec::new();
        {
            let mut hook = |change: &ChangeSet, direction: Direction| {
                seen.push((change.description.clone(), direction));
            };
            hook.persist(&ChangeSet::new("move"), Direction::Undo);
        }
        assert_eq!(seen, vec![("move".to_string(), Direction::Undo)]);
    }
}
