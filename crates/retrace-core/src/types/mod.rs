//! # Core Type Definitions
//!
//! This module contains the live-side types the history engine works with:
//! - Entity identifiers (`NodeId`, `EdgeId`)
//! - Geometry (`Position`, `Dimensions`)
//! - Live canvas entities (`LiveNode`, `LiveEdge`) and `Annotation`
//! - Error types (`HistoryError`)
//!
//! ## Persisted vs. Transient Fields
//!
//! Live entities carry two kinds of fields:
//! - Persisted fields: identity, geometry, payload, style. These are captured
//!   into snapshots and restored by undo/redo.
//! - Transient fields: `selected`, `dragging`, `measured`. These belong to the
//!   interaction layer and are never captured or restored.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a node on the canvas.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a new node identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an edge on the canvas.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Create a new edge identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// GEOMETRY
// =============================================================================

// Coordinates compare by bit pattern, so a NaN coordinate equals itself and
// an untouched entity is never reported as changed.

/// Canvas position of a node.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.x.to_bits() == other.x.to_bits() && self.y.to_bits() == other.y.to_bits()
    }
}

/// Size measured by the renderer after layout.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl PartialEq for Dimensions {
    fn eq(&self, other: &Self) -> bool {
        self.width.to_bits() == other.width.to_bits()
            && self.height.to_bits() == other.height.to_bits()
    }
}

// =============================================================================
// LIVE ENTITIES
// =============================================================================

/// A node as held by the graph store.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveNode {
    pub id: NodeId,
    /// Node type, selects the renderer and property form.
    pub kind: String,
    pub position: Position,
    /// Arbitrary node payload edited through property forms.
    pub data: JsonValue,
    pub style: Option<JsonValue>,
    /// Enclosing group node, if any.
    pub parent: Option<NodeId>,

    // transient
    pub selected: bool,
    pub dragging: bool,
    pub measured: Option<Dimensions>,
}

impl LiveNode {
    /// Create a node with empty payload and default interaction state.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: impl Into<String>, position: Position) -> Self {
        Self {
            id: NodeId::new(id),
            kind: kind.into(),
            position,
            data: JsonValue::Null,
            style: None,
            parent: None,
            selected: false,
            dragging: false,
            measured: None,
        }
    }

    /// Replace the payload.
    #[must_use]
    pub fn with_data(mut self, data: JsonValue) -> Self {
        self.data = data;
        self
    }
}

/// An edge as held by the graph store.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
    pub kind: Option<String>,
    pub label: Option<String>,
    pub data: JsonValue,
    pub style: Option<JsonValue>,
    pub marker_start: Option<String>,
    pub marker_end: Option<String>,
    pub animated: bool,

    // transient
    pub selected: bool,
}

impl LiveEdge {
    /// Create a plain edge between two nodes.
    #[must_use]
    pub fn new(id: impl Into<String>, source: NodeId, target: NodeId) -> Self {
        Self {
            id: EdgeId::new(id),
            source,
            target,
            source_handle: None,
            target_handle: None,
            kind: None,
            label: None,
            data: JsonValue::Null,
            style: None,
            marker_start: None,
            marker_end: None,
            animated: false,
            selected: false,
        }
    }

    /// Check whether the edge touches the given node.
    #[must_use]
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.source == node || &self.target == node
    }
}

/// Auxiliary metadata kept by the annotation store.
///
/// Annotations have no transient state; the whole list is captured and
/// restored as one value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    /// Entity the annotation is attached to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: JsonValue,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur around the history engine.
///
/// The interactive path (commit, undo, redo, batch) never surfaces these to
/// the caller; misuse is logged and ignored. The `try_*` entry points and the
/// host-side tooling return them.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// `begin_batch` was called while a batch was already open.
    #[error("Batch already open ({0} buffered change sets)")]
    BatchAlreadyOpen(usize),

    /// `end_batch` or `abort_batch` was called without an open batch.
    #[error("No open batch")]
    NoOpenBatch,

    /// The configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An edit referred to an entity that is not in the live state.
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    /// An edit tried to reuse an id that is already live.
    #[error("Duplicate entity: {0}")]
    DuplicateEntity(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
