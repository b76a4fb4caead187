//! # Apply Engine
//!
//! Reconstructs live collections from the `before` (undo) or `after` (redo)
//! side of a change set.
//!
//! ## Ordering
//!
//! - Entities that are live and survive keep their current position.
//! - Entities whose target is `None` are removed.
//! - Entities reintroduced by the change set are appended after the
//!   existing ones, in entry order.
//!
//! Surviving entities are rebuilt with `merge_onto_live`, so their transient
//! fields are kept.

use crate::changeset::{ChangeSet, Direction, SnapshotEntry};
use crate::snapshot::Snapshottable;
use crate::store::{AnnotationStore, GraphStore};
use crate::types::{Annotation, LiveEdge, LiveNode};
use std::collections::{BTreeMap, BTreeSet};

/// Rebuild one collection for `direction`.
pub fn apply_entries<E: Snapshottable>(
    live: &[E],
    entries: &[SnapshotEntry<E::Id, E::Snapshot>],
    direction: Direction,
) -> Vec<E> {
    let targets: BTreeMap<&E::Id, Option<&E::Snapshot>> = entries
        .iter()
        .map(|entry| (&entry.id, entry.target(direction)))
        .collect();

    let mut present: BTreeSet<&E::Id> = BTreeSet::new();
    let mut rebuilt = Vec::with_capacity(live.len() + entries.len());

    for entity in live {
        let id = entity.entity_id();
        match targets.get(id) {
            None => rebuilt.push(entity.clone()),
            Some(None) => {}
            Some(Some(target)) => {
                if present.insert(id) {
                    rebuilt.push(E::merge_onto_live(Some(entity), target));
                }
            }
        }
    }

    for entry in entries {
        if present.contains(&entry.id) {
            continue;
        }
        if let Some(target) = entry.target(direction) {
            rebuilt.push(E::merge_onto_live(None, target));
            present.insert(&entry.id);
        }
    }

    rebuilt
}

/// Everything one apply step will write, computed before any store is
/// touched.
#[derive(Debug)]
pub struct ApplyPlan {
    pub nodes: Vec<LiveNode>,
    pub edges: Vec<LiveEdge>,
    /// `None` leaves the annotation store untouched.
    pub annotations: Option<Vec<Annotation>>,
}

impl ApplyPlan {
    /// Compute the reconstructed collections from the current store state.
    pub fn compute<S>(stores: &S, change: &ChangeSet, direction: Direction) -> Self
    where
        S: GraphStore + AnnotationStore + ?Sized,
    {
        let state = stores.read_graph_state();
        let annotations = match direction {
            Direction::Undo => change.annotations_before.clone(),
            Direction::Redo => change.annotations_after.clone(),
        };

        Self {
            nodes: apply_entries(state.nodes, &change.node_entries, direction),
            edges: apply_entries(state.edges, &change.edge_entries, direction),
            annotations,
        }
    }

    /// Write every computed collection back.
    pub fn write<S>(self, stores: &mut S)
    where
        S: GraphStore + AnnotationStore + ?Sized,
    {
        stores.replace_graph_state(self.nodes, self.edges);
        if let Some(annotations) = self.annotations {
            stores.replace_annotations(annotations);
        }
    }
}

/// Read all, then write all.
pub fn apply_change_set<S>(stores: &mut S, change: &ChangeSet, direction: Direction)
where
    S: GraphStore + AnnotationStore + ?Sized,
{
    ApplyPlan::compute(stores, change, direction).write(stores);
}

// =============================================================================
// TESTS
// =============================================================================
