//! # Capture / Commit
//!
//! The two halves of recording an edit:
//! 1. `capture_snapshot` reads the "before" snapshots of a set of entities.
//! 2. The caller mutates the live stores.
//! 3. `build_change_set` reads the "after" snapshots of the same entities and
//!    produces a pruned `ChangeSet`.
//!
//! Both halves are pure reads of the stores. Whether the result enters
//! history is decided by the engine.

use crate::changeset::{ChangeMeta, ChangeSet, SnapshotEntry};
use crate::primitives::UNTITLED_CHANGE;
use crate::snapshot::{EdgeSnapshot, NodeSnapshot, Snapshottable};
use crate::store::{AnnotationStore, GraphStore};
use crate::types::{Annotation, EdgeId, LiveEdge, LiveNode, NodeId};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// OPTIONS
// =============================================================================

/// What to capture before an edit.
#[derive(Debug, Clone, Default)]
pub struct CaptureOptions {
    /// Nodes to capture, in request order.
    pub node_ids: Vec<NodeId>,
    /// Edges to capture, in request order.
    pub edge_ids: Vec<EdgeId>,
    /// Capture every live entity, and treat entities that appear by commit
    /// time as created.
    pub include_all: bool,
    /// Capture the annotation list as well.
    pub include_annotations: bool,
    /// Auxiliary facts carried into the change set.
    pub meta: Option<ChangeMeta>,
}

impl CaptureOptions {
    /// Capture every node and edge.
    #[must_use]
    pub fn all() -> Self {
        Self {
            include_all: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_nodes(mut self, ids: impl IntoIterator<Item = NodeId>) -> Self {
        self.node_ids.extend(ids);
        self
    }

    #[must_use]
    pub fn with_edges(mut self, ids: impl IntoIterator<Item = EdgeId>) -> Self {
        self.edge_ids.extend(ids);
        self
    }

    #[must_use]
    pub fn with_annotations(mut self) -> Self {
        self.include_annotations = true;
        self
    }

    #[must_use]
    pub fn with_meta(mut self, meta: ChangeMeta) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// How to commit a captured edit.
#[derive(Debug, Clone)]
pub struct CommitOptions {
    /// Notify the persistence hook for this commit.
    pub persist: bool,
    /// End-state nodes computed off-store, read instead of the graph store.
    pub explicit_nodes: Option<Vec<LiveNode>>,
    /// End-state edges computed off-store, read instead of the graph store.
    pub explicit_edges: Option<Vec<LiveEdge>>,
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self {
            persist: true,
            explicit_nodes: None,
            explicit_edges: None,
        }
    }
}

impl CommitOptions {
    /// Record without notifying the persistence hook.
    #[must_use]
    pub fn silent() -> Self {
        Self {
            persist: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_explicit_nodes(mut self, nodes: Vec<LiveNode>) -> Self {
        self.explicit_nodes = Some(nodes);
        self
    }

    #[must_use]
    pub fn with_explicit_edges(mut self, edges: Vec<LiveEdge>) -> Self {
        self.explicit_edges = Some(edges);
        self
    }
}

// =============================================================================
// CAPTURE SESSION
// =============================================================================

/// Handle linking a "before" read to its later commit.
///
/// Holds value snapshots only. It has no lifecycle beyond one edit.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    nodes_before: Vec<(NodeId, Option<NodeSnapshot>)>,
    edges_before: Vec<(EdgeId, Option<EdgeSnapshot>)>,
    include_all: bool,
    annotations_before: Option<Vec<Annotation>>,
    meta: Option<ChangeMeta>,
}

impl CaptureSession {
    /// Captured node ids, in capture order.
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes_before.iter().map(|(id, _)| id)
    }

    /// Captured edge ids, in capture order.
    pub fn edge_ids(&self) -> impl Iterator<Item = &EdgeId> {
        self.edges_before.iter().map(|(id, _)| id)
    }

    /// The "before" snapshot of a node; `None` if it did not exist or was
    /// not captured.
    #[must_use]
    pub fn node_before(&self, id: &NodeId) -> Option<&NodeSnapshot> {
        self.nodes_before
            .iter()
            .find(|(captured, _)| captured == id)
            .and_then(|(_, snap)| snap.as_ref())
    }

    #[must_use]
    pub fn annotations_before(&self) -> Option<&[Annotation]> {
        self.annotations_before.as_deref()
    }

    #[must_use]
    pub fn meta(&self) -> Option<&ChangeMeta> {
        self.meta.as_ref()
    }
}

// =============================================================================
// CAPTURE
// =============================================================================

/// Record "before" snapshots for the requested entities. Pure read.
pub fn capture_snapshot<S>(stores: &S, options: CaptureOptions) -> CaptureSession
where
    S: GraphStore + AnnotationStore + ?Sized,
{
    let state = stores.read_graph_state();

    CaptureSession {
        nodes_before: capture_entities(state.nodes, &options.node_ids, options.include_all),
        edges_before: capture_entities(state.edges, &options.edge_ids, options.include_all),
        include_all: options.include_all,
        annotations_before: options
            .include_annotations
            .then(|| stores.read_annotations().to_vec()),
        meta: options.meta.filter(|meta| !meta.is_empty()),
    }
}

/// Snapshot each requested id (all live ids first when `include_all`),
/// deduplicated, `None` for ids not currently live.
fn capture_entities<E: Snapshottable>(
    live: &[E],
    requested: &[E::Id],
    include_all: bool,
) -> Vec<(E::Id, Option<E::Snapshot>)> {
    let index: BTreeMap<&E::Id, &E> = live.iter().map(|e| (e.entity_id(), e)).collect();

    let mut ids: Vec<&E::Id> = Vec::new();
    if include_all {
        ids.extend(live.iter().map(Snapshottable::entity_id));
    }
    ids.extend(requested);

    let mut seen = BTreeSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(*id))
        .map(|id| (id.clone(), index.get(id).map(|e| e.to_snapshot())))
        .collect()
}

// =============================================================================
// COMMIT
// =============================================================================

/// Read the "after" side for every captured entity and build the change set.
///
/// Unchanged entries are pruned; callers check `has_changes()` to decide
/// whether anything happened.
pub fn build_change_set<S>(
    stores: &S,
    session: CaptureSession,
    description: &str,
    options: &CommitOptions,
) -> ChangeSet
where
    S: GraphStore + AnnotationStore + ?Sized,
{
    let state = stores.read_graph_state();
    let nodes = options.explicit_nodes.as_deref().unwrap_or(state.nodes);
    let edges = options.explicit_edges.as_deref().unwrap_or(state.edges);

    let description = if description.trim().is_empty() {
        UNTITLED_CHANGE
    } else {
        description
    };

    let mut change = ChangeSet::new(description);
    change.node_entries = commit_entities(nodes, session.nodes_before, session.include_all);
    change.edge_entries = commit_entities(edges, session.edges_before, session.include_all);
    change.annotations_after = session
        .annotations_before
        .is_some()
        .then(|| stores.read_annotations().to_vec());
    change.annotations_before = session.annotations_before;
    change.meta = session.meta;
    change.persist = options.persist;

    change.prune_unchanged();
    change
}

fn commit_entities<E: Snapshottable>(
    live: &[E],
    before: Vec<(E::Id, Option<E::Snapshot>)>,
    include_all: bool,
) -> Vec<SnapshotEntry<E::Id, E::Snapshot>> {
    let index: BTreeMap<&E::Id, &E> = live.iter().map(|e| (e.entity_id(), e)).collect();

    let mut entries: Vec<_> = before
        .into_iter()
        .map(|(id, before)| {
            let after = index.get(&id).map(|e| e.to_snapshot());
            SnapshotEntry { id, before, after }
        })
        .collect();

    if include_all {
        let known: BTreeSet<E::Id> = entries.iter().map(|e| e.id.clone()).collect();
        entries.extend(
            live.iter()
                .filter(|e| !known.contains(e.entity_id()))
                .map(|e| SnapshotEntry {
                    id: e.entity_id().clone(),
                    before: None,
                    after: Some(e.to_snapshot()),
                }),
        );
    }

    entries
}

// =============================================================================
// TESTS
// =============================================================================
