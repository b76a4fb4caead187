//! # Collaborator Stores
//!
//! The history engine never owns live state. It reads and replaces the
//! collections held by two collaborator stores:
//! - `GraphStore`: the node and edge collections of the canvas
//! - `AnnotationStore`: the auxiliary annotation list
//!
//! Both are accessed as read-all-then-write-all pairs. The engine holds no
//! reference into a store between calls.
//!
//! `Workspace` is the in-memory implementation of both, used by the CLI and
//! by tests. It also carries the editing helpers a canvas would perform
//! between capture and commit.

use crate::snapshot::{EdgeSnapshot, NodeSnapshot, Snapshottable};
use crate::types::{Annotation, EdgeId, HistoryError, LiveEdge, LiveNode, NodeId};
use serde::Serialize;
use std::collections::BTreeMap;

// =============================================================================
// STORE TRAITS
// =============================================================================

/// Borrowed view of the node and edge collections, in collection order.
#[derive(Debug, Clone, Copy)]
pub struct GraphState<'a> {
    pub nodes: &'a [LiveNode],
    pub edges: &'a [LiveEdge],
}

/// Node/edge container the engine reads and writes.
pub trait GraphStore {
    /// Read both collections.
    fn read_graph_state(&self) -> GraphState<'_>;

    /// Replace both collections in one step.
    fn replace_graph_state(&mut self, nodes: Vec<LiveNode>, edges: Vec<LiveEdge>);
}

/// Annotation container the engine reads and writes.
pub trait AnnotationStore {
    /// Read the annotation list.
    fn read_annotations(&self) -> &[Annotation];

    /// Replace the annotation list.
    fn replace_annotations(&mut self, annotations: Vec<Annotation>);
}

// =============================================================================
// PERSISTED STATE
// =============================================================================

/// Persisted projection of a whole workspace, keyed by id.
///
/// Two workspaces with equal persisted state differ at most in entity
/// order and transient fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistedState {
    pub nodes: BTreeMap<NodeId, NodeSnapshot>,
    pub edges: BTreeMap<EdgeId, EdgeSnapshot>,
    pub annotations: Vec<Annotation>,
}

// =============================================================================
// WORKSPACE
// =============================================================================

/// In-memory canvas state implementing both store traits.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    nodes: Vec<LiveNode>,
    edges: Vec<LiveEdge>,
    annotations: Vec<Annotation>,
}

impl Workspace {
    /// Create an empty workspace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a workspace from existing collections.
    #[must_use]
    pub fn with_graph(nodes: Vec<LiveNode>, edges: Vec<LiveEdge>) -> Self {
        Self {
            nodes,
            edges,
            annotations: Vec::new(),
        }
    }

    #[must_use]
    pub fn nodes(&self) -> &[LiveNode] {
        &self.nodes
    }

    #[must_use]
    pub fn edges(&self) -> &[LiveEdge] {
        &self.edges
    }

    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&LiveNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    #[must_use]
    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut LiveNode> {
        self.nodes.iter_mut().find(|n| &n.id == id)
    }

    #[must_use]
    pub fn edge(&self, id: &EdgeId) -> Option<&LiveEdge> {
        self.edges.iter().find(|e| &e.id == id)
    }

    #[must_use]
    pub fn edge_mut(&mut self, id: &EdgeId) -> Option<&mut LiveEdge> {
        self.edges.iter_mut().find(|e| &e.id == id)
    }

    /// Ids of edges attached to a node, in collection order.
    #[must_use]
    pub fn edges_touching(&self, node: &NodeId) -> Vec<EdgeId> {
        self.edges
            .iter()
            .filter(|e| e.touches(node))
            .map(|e| e.id.clone())
            .collect()
    }

    /// Insert a node, replacing any node with the same id in place.
    pub fn insert_node(&mut self, node: LiveNode) {
        match self.node_mut(&node.id) {
            Some(existing) => *existing = node,
            None => self.nodes.push(node),
        }
    }

    /// Remove a node and every edge attached to it.
    pub fn remove_node(&mut self, id: &NodeId) -> Result<LiveNode, HistoryError> {
        let index = self
            .nodes
            .iter()
            .position(|n| &n.id == id)
            .ok_or_else(|| HistoryError::UnknownEntity(id.to_string()))?;
        self.edges.retain(|e| !e.touches(id));
        Ok(self.nodes.remove(index))
    }

    /// Insert an edge, replacing any edge with the same id in place.
    ///
    /// Both endpoints must exist.
    pub fn insert_edge(&mut self, edge: LiveEdge) -> Result<(), HistoryError> {
        for endpoint in [&edge.source, &edge.target] {
            if self.node(endpoint).is_none() {
                return Err(HistoryError::UnknownEntity(endpoint.to_string()));
            }
        }
        match self.edge_mut(&edge.id) {
            Some(existing) => *existing = edge,
            None => self.edges.push(edge),
        }
        Ok(())
    }

    pub fn remove_edge(&mut self, id: &EdgeId) -> Result<LiveEdge, HistoryError> {
        let index = self
            .edges
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| HistoryError::UnknownEntity(id.to_string()))?;
        Ok(self.edges.remove(index))
    }

    /// Give a node a new id, rewriting edge endpoints and child parents.
    pub fn rename_node(&mut self, from: &NodeId, to: &NodeId) -> Result<(), HistoryError> {
        if self.node(to).is_some() {
            return Err(HistoryError::DuplicateEntity(to.to_string()));
        }
        let node = self
            .node_mut(from)
            .ok_or_else(|| HistoryError::UnknownEntity(from.to_string()))?;
        node.id = to.clone();

        for edge in &mut self.edges {
            if &edge.source == from {
                edge.source = to.clone();
            }
            if &edge.target == from {
                edge.target = to.clone();
            }
        }
        for node in &mut self.nodes {
            if node.parent.as_ref() == Some(from) {
                node.parent = Some(to.clone());
            }
        }
        Ok(())
    }

    /// Select exactly one node (transient, never recorded).
    pub fn select_only(&mut self, id: &NodeId) -> Result<(), HistoryError> {
        if self.node(id).is_none() {
            return Err(HistoryError::UnknownEntity(id.to_string()));
        }
        for node in &mut self.nodes {
            node.selected = &node.id == id;
        }
        for edge in &mut self.edges {
            edge.selected = false;
        }
        Ok(())
    }

    pub fn set_annotations(&mut self, annotations: Vec<Annotation>) {
        self.annotations = annotations;
    }

    /// Persisted projection of the current state.
    #[must_use]
    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            nodes: self
                .nodes
                .iter()
                .map(|n| (n.id.clone(), n.to_snapshot()))
                .collect(),
            edges: self
                .edges
                .iter()
                .map(|e| (e.id.clone(), e.to_snapshot()))
                .collect(),
            annotations: self.annotations.clone(),
        }
    }
}

impl GraphStore for Workspace {
    fn read_graph_state(&self) -> GraphState<'_> {
        GraphState {
            nodes: &self.nodes,
            edges: &self.edges,
        }
    }

    fn replace_graph_state(&mut self, nodes: Vec<LiveNode>, edges: Vec<LiveEdge>) {
        self.nodes = nodes;
        self.edges = edges;
    }
}

impl AnnotationStore for Workspace {
    fn read_annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn replace_annotations(&mut self, annotations: Vec<Annotation>) {
        self.annotations = annotations;
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Position;

    fn two_nodes() -> Workspace {
        let mut ws = Workspace::new();
        ws.insert_node(LiveNode::new("a", "task", Position::default()));
        ws.insert_node(LiveNode::new("b", "task", Position::default()));
        ws.insert_edge(LiveEdge::new("e1", NodeId::new("a"), NodeId::new("b")))
            .expect("edge");
        ws
    }

    #[test]
    fn remove_node_drops_attached_edges() {
        let mut ws = two_nodes();
        ws.remove_node(&NodeId::new("a")).expect("remove");

        assert_eq!(ws.nodes().len(), 1);
        assert!(ws.edges().is_empty());
    }

    #[test]
    fn remove_unknown_node_is_an_error() {
        let mut ws = two_nodes();
        let result = ws.remove_node(&NodeId::new("zz"));
        assert!(matches!(result, Err(HistoryError::UnknownEntity(_))));
    }

    #[test]
    fn edge_requires_both_endpoints() {
        let mut ws = two_nodes();
        let result = ws.insert_edge(LiveEdge::new("e2", NodeId::new("a"), NodeId::new("x")));
        assert!(result.is_err());
        assert_eq!(ws.edges().len(), 1);
    }

    #[test]
    fn rename_rewrites_edge_endpoints() {
        let mut ws = two_nodes();
        ws.rename_node(&NodeId::new("a"), &NodeId::new("c"))
            .expect("rename");

        assert!(ws.node(&NodeId::new("c")).is_some());
        let edge = ws.edge(&EdgeId::new("e1")).expect("edge");
        assert_eq!(edge.source, NodeId::new("c"));
    }

    #[test]
    fn rename_onto_existing_id_is_refused() {
        let mut ws = two_nodes();
        let result = ws.rename_node(&NodeId::new("a"), &NodeId::new("b"));
        assert!(matches!(result, Err(HistoryError::DuplicateEntity(_))));
    }

    #[test]
    fn select_only_changes_transient_state_only() {
        let mut ws = two_nodes();
        let before = ws.persisted_state();

        ws.select_only(&NodeId::new("b")).expect("select");

        assert!(ws.node(&NodeId::new("b")).is_some_and(|n| n.selected));
        assert_eq!(ws.persisted_state(), before);
    }

    #[test]
    fn replace_graph_state_swaps_both_collections() {
        let mut ws = two_nodes();
        ws.replace_graph_state(Vec::new(), Vec::new());

        let state = ws.read_graph_state();
        assert!(state.nodes.is_empty());
        assert!(state.edges.is_empty());
    }
}
