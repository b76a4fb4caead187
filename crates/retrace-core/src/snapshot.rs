//! # Entity Snapshot Codec
//!
//! Converts live canvas entities into immutable value snapshots and merges
//! snapshots back onto live entities.
//!
//! A snapshot holds only persisted fields, copied by value. Nothing in a
//! snapshot aliases the live entity it was taken from, so later in-place
//! edits of the live entity can never change a captured "before".
//!
//! ## Merge Rule
//!
//! `merge_onto_live(current, target)`:
//! - `current` is `Some`: keep its transient fields (selection, drag state,
//!   measured size), overwrite every persisted field from `target`.
//! - `current` is `None`: promote `target` to a live entity with transient
//!   fields defaulted.
//!
//! Restoring history therefore never resurrects stale interaction state.

use crate::types::{EdgeId, LiveEdge, LiveNode, NodeId, Position};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt::Debug;

// =============================================================================
// SNAPSHOTTABLE TRAIT
// =============================================================================

/// A live entity that can be projected into a value snapshot.
///
/// Implemented by `LiveNode` and `LiveEdge`. The apply engine and the
/// capture/commit pair are generic over this trait.
pub trait Snapshottable: Clone {
    /// Identifier type, ordered so entries can be indexed in a `BTreeMap`.
    type Id: Clone + Ord + Debug;
    /// Persisted-fields-only projection.
    type Snapshot: Clone + PartialEq + Debug;

    /// The entity's identifier.
    fn entity_id(&self) -> &Self::Id;

    /// Project the persisted fields into a snapshot. Pure.
    fn to_snapshot(&self) -> Self::Snapshot;

    /// Build the live entity that `target` describes, keeping the transient
    /// fields of `current` if it exists.
    fn merge_onto_live(current: Option<&Self>, target: &Self::Snapshot) -> Self;
}

// =============================================================================
// NODE SNAPSHOT
// =============================================================================

/// Persisted fields of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: String,
    pub position: Position,
    #[serde(default)]
    pub data: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
}

impl Snapshottable for LiveNode {
    type Id = NodeId;
    type Snapshot = NodeSnapshot;

    fn entity_id(&self) -> &NodeId {
        &self.id
    }

    fn to_snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            id: self.id.clone(),
            kind: self.kind.clone(),
            position: self.position,
            data: self.data.clone(),
            style: self.style.clone(),
            parent: self.parent.clone(),
        }
    }

    fn merge_onto_live(current: Option<&Self>, target: &NodeSnapshot) -> Self {
        let (selected, dragging, measured) = current
            .map(|live| (live.selected, live.dragging, live.measured))
            .unwrap_or((false, false, None));

        Self {
            id: target.id.clone(),
            kind: target.kind.clone(),
            position: target.position,
            data: target.data.clone(),
            style: target.style.clone(),
            parent: target.parent.clone(),
            selected,
            dragging,
            measured,
        }
    }
}

// =============================================================================
// EDGE SNAPSHOT
// =============================================================================

/// Persisted fields of an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSnapshot {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub data: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_end: Option<String>,
    #[serde(default)]
    pub animated: bool,
}

impl Snapshottable for LiveEdge {
    type Id = EdgeId;
    type Snapshot = EdgeSnapshot;

    fn entity_id(&self) -> &EdgeId {
        &self.id
    }

    fn to_snapshot(&self) -> EdgeSnapshot {
        EdgeSnapshot {
            id: self.id.clone(),
            source: self.source.clone(),
            target: self.target.clone(),
            source_handle: self.source_handle.clone(),
            target_handle: self.target_handle.clone(),
            kind: self.kind.clone(),
            label: self.label.clone(),
            data: self.data.clone(),
            style: self.style.clone(),
            marker_start: self.marker_start.clone(),
            marker_end: self.marker_end.clone(),
            animated: self.animated,
        }
    }

    fn merge_onto_live(current: Option<&Self>, target: &EdgeSnapshot) -> Self {
        Self {
            id: target.id.clone(),
            source: target.source.clone(),
            target: target.target.clone(),
            source_handle: target.source_handle.clone(),
            target_handle: target.target_handle.clone(),
            kind: target.kind.clone(),
            label: target.label.clone(),
            data: target.data.clone(),
            style: target.style.clone(),
            marker_start: target.marker_start.clone(),
            marker_end: target.marker_end.clone(),
            animated: target.animated,
            selected: current.is_some_and(|live| live.selected),
        }
    }
}

// =============================================================================
// ENTITY SNAPSHOT
// =============================================================================

/// A snapshot of either kind of graph entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "lowercase")]
pub enum EntitySnapshot {
    Node(NodeSnapshot),
    Edge(EdgeSnapshot),
}

impl EntitySnapshot {
    /// Identifier of the snapshotted entity.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Node(node) => node.id.as_str(),
            Self::Edge(edge) => edge.id.as_str(),
        }
    }
}

impl From<NodeSnapshot> for EntitySnapshot {
    fn from(node: NodeSnapshot) -> Self {
        Self::Node(node)
    }
}

impl From<EdgeSnapshot> for EntitySnapshot {
    fn from(edge: EdgeSnapshot) -> Self {
        Self::Edge(edge)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Dimensions;
    use serde_json::json;

    fn sample_node() -> LiveNode {
        let mut node = LiveNode::new("n1", "function", Position::new(10.0, 20.0))
            .with_data(json!({ "name": "parse", "outputs": 1 }));
        node.selected = true;
        node.dragging = true;
        node.measured = Some(Dimensions {
            width: 120.0,
            height: 40.0,
        });
        node
    }

    #[test]
    fn snapshot_strips_transient_fields() {
        let snap = sample_node().to_snapshot();
        let encoded = serde_json::to_value(&snap).expect("encode");

        assert_eq!(encoded["type"], "function");
        assert!(encoded.get("selected").is_none());
        assert!(encoded.get("dragging").is_none());
        assert!(encoded.get("measured").is_none());
    }

    #[test]
    fn snapshot_does_not_follow_later_edits() {
        let mut node = sample_node();
        let snap = node.to_snapshot();

        node.position = Position::new(99.0, 99.0);
        node.data["name"] = json!("renamed");

        assert_eq!(snap.position, Position::new(10.0, 20.0));
        assert_eq!(snap.data["name"], "parse");
    }

    #[test]
    fn merge_keeps_live_transient_fields() {
        let live = sample_node();
        let mut target = live.to_snapshot();
        target.position = Position::new(0.0, 0.0);

        let merged = LiveNode::merge_onto_live(Some(&live), &target);

        assert_eq!(merged.position, Position::new(0.0, 0.0));
        assert!(merged.selected);
        assert!(merged.dragging);
        assert_eq!(merged.measured, live.measured);
    }

    #[test]
    fn merge_without_live_defaults_transient_fields() {
        let snap = sample_node().to_snapshot();
        let promoted = LiveNode::merge_onto_live(None, &snap);

        assert!(!promoted.selected);
        assert!(!promoted.dragging);
        assert!(promoted.measured.is_none());
        assert_eq!(promoted.to_snapshot(), snap);
    }

    #[test]
    fn edge_merge_keeps_selection_only_when_live() {
        let mut live = LiveEdge::new("e1", NodeId::new("a"), NodeId::new("b"));
        live.selected = true;
        let mut target = live.to_snapshot();
        target.label = Some("ok".to_string());

        let merged = LiveEdge::merge_onto_live(Some(&live), &target);
        assert!(merged.selected);
        assert_eq!(merged.label.as_deref(), Some("ok"));

        let promoted = LiveEdge::merge_onto_live(None, &target);
        assert!(!promoted.selected);
    }

    #[test]
    fn edge_markers_survive_snapshot_and_merge() {
        let mut live = LiveEdge::new("e1", NodeId::new("a"), NodeId::new("b"));
        live.marker_start = Some("circle".to_string());
        live.marker_end = Some("arrow".to_string());

        let snap = live.to_snapshot();
        assert_eq!(snap.marker_start.as_deref(), Some("circle"));
        let encoded = serde_json::to_value(&snap).expect("encode");
        assert_eq!(encoded["markerStart"], "circle");
        assert_eq!(encoded["markerEnd"], "arrow");

        let restored = LiveEdge::merge_onto_live(None, &snap);
        assert_eq!(restored.marker_start.as_deref(), Some("circle"));
        assert_eq!(restored.marker_end.as_deref(), Some("arrow"));

        let bare = LiveEdge::new("e2", NodeId::new("a"), NodeId::new("b")).to_snapshot();
        let encoded = serde_json::to_value(&bare).expect("encode");
        assert!(encoded.get("markerStart").is_none());
    }

    #[test]
    fn entity_snapshot_is_tagged() {
        let edge = LiveEdge::new("e1", NodeId::new("a"), NodeId::new("b")).to_snapshot();
        let entity = EntitySnapshot::from(edge);
        let encoded = serde_json::to_value(&entity).expect("encode");

        assert_eq!(encoded["entity"], "edge");
        assert_eq!(entity.id(), "e1");
    }
}
