//! # Change Sets
//!
//! A `ChangeSet` is one atomic history record: the before/after snapshots of
//! every entity an edit touched, plus an optional before/after pair for the
//! annotation list and auxiliary metadata.
//!
//! ## Entry Semantics
//!
//! - `before == None`: the entity did not exist before the change (creation).
//! - `after == None`: the entity no longer exists after the change (deletion).
//!
//! ## Batch Merge Rule
//!
//! When several change sets touch the same id, the merged entry takes its
//! `before` from the earliest set and its `after` from the latest. The
//! annotation pair follows the same first/last rule.

use crate::snapshot::{EdgeSnapshot, EntitySnapshot, NodeSnapshot};
use crate::types::{Annotation, EdgeId, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

// =============================================================================
// DIRECTION
// =============================================================================

/// Which side of a change set is being applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Restore `before` values.
    Undo,
    /// Restore `after` values. Also reported for freshly recorded commits.
    Redo,
}

// =============================================================================
// SNAPSHOT ENTRY
// =============================================================================

/// Before/after pair for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry<K, T> {
    pub id: K,
    pub before: Option<T>,
    pub after: Option<T>,
}

/// Entry for a node.
pub type NodeEntry = SnapshotEntry<NodeId, NodeSnapshot>;

/// Entry for an edge.
pub type EdgeEntry = SnapshotEntry<EdgeId, EdgeSnapshot>;

impl<K, T: PartialEq> SnapshotEntry<K, T> {
    /// Structural equality of both sides.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.before == self.after
    }

    /// The snapshot to restore for `direction`.
    #[must_use]
    pub fn target(&self, direction: Direction) -> Option<&T> {
        match direction {
            Direction::Undo => self.before.as_ref(),
            Direction::Redo => self.after.as_ref(),
        }
    }

    #[must_use]
    pub fn is_creation(&self) -> bool {
        self.before.is_none() && self.after.is_some()
    }

    #[must_use]
    pub fn is_deletion(&self) -> bool {
        self.before.is_some() && self.after.is_none()
    }
}

// =============================================================================
// META
// =============================================================================

/// An identifier rename recorded alongside a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rename {
    pub from: String,
    pub to: String,
}

impl Rename {
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Auxiliary facts correlated with a change that collaborators may need
/// beyond the raw entity diffs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeMeta {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub renames: Vec<Rename>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, JsonValue>,
}

impl ChangeMeta {
    /// Meta carrying a single rename.
    #[must_use]
    pub fn rename(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            renames: vec![Rename::new(from, to)],
            tags: BTreeMap::new(),
        }
    }

    /// Attach a free-form tag.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.tags.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.renames.is_empty() && self.tags.is_empty()
    }

    /// Renames in the order a collaborator must apply them for `direction`.
    ///
    /// Undo walks the recorded renames backwards with `from`/`to` swapped.
    #[must_use]
    pub fn renames_for(&self, direction: Direction) -> Vec<Rename> {
        match direction {
            Direction::Redo => self.renames.clone(),
            Direction::Undo => self
                .renames
                .iter()
                .rev()
                .map(|r| Rename::new(r.to.clone(), r.from.clone()))
                .collect(),
        }
    }

    /// Fold a later meta into this one. Renames accumulate; later tags win.
    fn absorb(&mut self, later: Self) {
        self.renames.extend(later.renames);
        self.tags.extend(later.tags);
    }
}

// =============================================================================
// CHANGE SET
// =============================================================================

/// One atomic, history-resident record of entity diffs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    pub description: String,
    #[serde(default)]
    pub node_entries: Vec<NodeEntry>,
    #[serde(default)]
    pub edge_entries: Vec<EdgeEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations_before: Option<Vec<Annotation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations_after: Option<Vec<Annotation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ChangeMeta>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Whether the persistence hook is notified for this change.
    #[serde(default = "persist_default")]
    pub persist: bool,
}

const fn persist_default() -> bool {
    true
}

impl ChangeSet {
    /// Create an empty change set stamped with the current time.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            node_entries: Vec::new(),
            edge_entries: Vec::new(),
            annotations_before: None,
            annotations_after: None,
            meta: None,
            timestamp: now_millis(),
            persist: true,
        }
    }

    /// True if any entry's `before` differs from its `after`.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.node_entries.iter().any(|e| !e.is_unchanged())
            || self.edge_entries.iter().any(|e| !e.is_unchanged())
            || self.annotations_before != self.annotations_after
    }

    /// Drop entries whose two sides are equal.
    pub fn prune_unchanged(&mut self) {
        self.node_entries.retain(|e| !e.is_unchanged());
        self.edge_entries.retain(|e| !e.is_unchanged());
        if self.annotations_before == self.annotations_after {
            self.annotations_before = None;
            self.annotations_after = None;
        }
    }

    /// Number of node and edge entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.node_entries.len() + self.edge_entries.len()
    }

    /// Lookup the entry for a node.
    #[must_use]
    pub fn node_entry(&self, id: &NodeId) -> Option<&NodeEntry> {
        self.node_entries.iter().find(|e| &e.id == id)
    }

    /// Lookup the entry for an edge.
    #[must_use]
    pub fn edge_entry(&self, id: &EdgeId) -> Option<&EdgeEntry> {
        self.edge_entries.iter().find(|e| &e.id == id)
    }

    /// Snapshots that applying this change in `direction` puts back on the
    /// canvas, nodes first. Removed entities are not listed.
    #[must_use]
    pub fn restored(&self, direction: Direction) -> Vec<EntitySnapshot> {
        let nodes = self
            .node_entries
            .iter()
            .filter_map(|e| e.target(direction).cloned().map(EntitySnapshot::from));
        let edges = self
            .edge_entries
            .iter()
            .filter_map(|e| e.target(direction).cloned().map(EntitySnapshot::from));
        nodes.chain(edges).collect()
    }

    /// Coalesce a batch of change sets, oldest first, into one.
    ///
    /// Returns `None` for an empty batch. A single set is returned as-is.
    /// Entries that end up unchanged after merging are pruned.
    #[must_use]
    pub fn merge(batch: Vec<Self>) -> Option<Self> {
        let mut sets = batch.into_iter();
        let mut merged = sets.next()?;
        let mut merged_any = false;

        for later in sets {
            merged.absorb(later);
            merged_any = true;
        }

        if merged_any {
            merged.prune_unchanged();
        }
        Some(merged)
    }

    fn absorb(&mut self, later: Self) {
        absorb_entries(&mut self.node_entries, later.node_entries);
        absorb_entries(&mut self.edge_entries, later.edge_entries);

        if self.annotations_before.is_none() {
            self.annotations_before = later.annotations_before;
        }
        if later.annotations_after.is_some() {
            self.annotations_after = later.annotations_after;
        }

        if let Some(later_meta) = later.meta {
            match &mut self.meta {
                Some(meta) => meta.absorb(later_meta),
                None => self.meta = Some(later_meta),
            }
        }

        self.timestamp = self.timestamp.max(later.timestamp);
        self.persist |= later.persist;
    }
}

/// First writer wins for `before`, last writer wins for `after`.
/// New ids keep the order they were first seen in.
fn absorb_entries<K: Ord + Clone, T>(
    into: &mut Vec<SnapshotEntry<K, T>>,
    later: Vec<SnapshotEntry<K, T>>,
) {
    let mut index: BTreeMap<K, usize> = into
        .iter()
        .enumerate()
        .map(|(i, e)| (e.id.clone(), i))
        .collect();

    for entry in later {
        match index.get(&entry.id) {
            Some(&i) => into[i].after = entry.after,
            None => {
                index.insert(entry.id.clone(), into.len());
                into.push(entry);
            }
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// =============================================================================
// TESTS
// =============================================================================
