//! # retrace-core
//!
//! Snapshot-based undo/redo for graph editors.
//!
//! The engine records value snapshots of the nodes, edges and annotations an
//! edit touches, coalesces the edits of one gesture into a single history
//! entry, and replays entries back onto the live stores without disturbing
//! selection, drag state or entity order.
//!
//! ## Usage
//!
//! ```
//! use retrace_core::{
//!     CaptureOptions, CommitOptions, HistoryEngine, LiveNode, NodeId, Position, Workspace,
//! };
//!
//! let mut ws = Workspace::new();
//! ws.insert_node(LiveNode::new("n1", "task", Position::new(0.0, 0.0)));
//!
//! let mut engine = HistoryEngine::default();
//! let session = engine.capture_snapshot(&ws, CaptureOptions::all());
//! if let Some(node) = ws.node_mut(&NodeId::new("n1")) {
//!     node.position = Position::new(10.0, 10.0);
//! }
//! engine.commit_change(&ws, session, "move", CommitOptions::default());
//!
//! assert!(engine.undo(&mut ws));
//! assert_eq!(ws.nodes()[0].position, Position::new(0.0, 0.0));
//! ```
//!
//! ## Architectural Constraints
//!
//! - Synchronous and single-actor: no async, no threads, no I/O
//! - History holds value copies only, never references into live state
//! - Live state is reached through the `GraphStore`/`AnnotationStore` traits
//!   and is read-all-then-written-all on every apply

// =============================================================================
// MODULES
// =============================================================================

pub mod apply;
pub mod batch;
pub mod capture;
pub mod changeset;
pub mod config;
pub mod engine;
pub mod history;
pub mod persist;
pub mod primitives;
pub mod snapshot;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Annotation, Dimensions, EdgeId, HistoryError, LiveEdge, LiveNode, NodeId, Position,
};

// =============================================================================
// RE-EXPORTS: Snapshots & Change Sets
// =============================================================================

pub use changeset::{
    ChangeMeta, ChangeSet, Direction, EdgeEntry, NodeEntry, Rename, SnapshotEntry,
};
pub use snapshot::{EdgeSnapshot, EntitySnapshot, NodeSnapshot, Snapshottable};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use apply::{ApplyPlan, apply_change_set, apply_entries};
pub use batch::BatchContext;
pub use capture::{CaptureOptions, CaptureSession, CommitOptions};
pub use config::HistoryConfig;
pub use engine::{CommitOutcome, HistoryEngine};
pub use history::HistoryStacks;
pub use persist::PersistHook;
pub use store::{AnnotationStore, GraphState, GraphStore, PersistedState, Workspace};
