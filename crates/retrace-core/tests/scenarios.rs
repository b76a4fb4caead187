//! # Scenario Tests
//!
//! End-to-end edit/undo/redo scenarios against an in-memory workspace.
//!
//! ## Groups
//! - S1: Single edits (move, deletion, creation)
//! - S2: Batching
//! - S3: History bounds and invalidation
//! - S4: Disabled engine and transient state

use retrace_core::{
    Annotation, CaptureOptions, ChangeMeta, CommitOptions, CommitOutcome, Direction, EdgeId,
    HistoryConfig, HistoryEngine, LiveEdge, LiveNode, NodeId, Position, Workspace,
};
use serde_json::json;

fn node(id: &str, x: f64, y: f64) -> LiveNode {
    LiveNode::new(id, "task", Position::new(x, y))
}

fn position_of(ws: &Workspace, id: &str) -> Option<Position> {
    ws.node(&NodeId::new(id)).map(|n| n.position)
}

fn move_node(engine: &mut HistoryEngine, ws: &mut Workspace, id: &str, to: Position) -> CommitOutcome {
    let session = engine.capture_snapshot(&*ws, CaptureOptions::all());
    if let Some(n) = ws.node_mut(&NodeId::new(id)) {
        n.position = to;
    }
    engine.commit_change(&*ws, session, "move", CommitOptions::default())
}

// =============================================================================
// S1: SINGLE EDITS
// =============================================================================

mod s1_single_edits {
    use super::*;

    /// S1.1: Move, undo, redo.
    #[test]
    fn move_round_trip() {
        let mut ws = Workspace::with_graph(vec![node("n1", 0.0, 0.0)], Vec::new());
        let mut engine = HistoryEngine::default();

        let outcome = move_node(&mut engine, &mut ws, "n1", Position::new(10.0, 10.0));
        assert_eq!(outcome, CommitOutcome::Recorded);
        assert_eq!(engine.past().len(), 1);

        let entry = engine.past()[0]
            .node_entry(&NodeId::new("n1"))
            .expect("entry for n1");
        assert_eq!(entry.before.as_ref().map(|n| n.position), Some(Position::new(0.0, 0.0)));
        assert_eq!(entry.after.as_ref().map(|n| n.position), Some(Position::new(10.0, 10.0)));

        assert!(engine.undo(&mut ws));
        assert_eq!(position_of(&ws, "n1"), Some(Position::new(0.0, 0.0)));
        assert_eq!(engine.past().len(), 0);
        assert_eq!(engine.future().len(), 1);

        assert!(engine.redo(&mut ws));
        assert_eq!(position_of(&ws, "n1"), Some(Position::new(10.0, 10.0)));
        assert_eq!(engine.past().len(), 1);
        assert_eq!(engine.future().len(), 0);
    }

    /// S1.2: Deletion is restored by undo and repeated by redo.
    #[test]
    fn deletion_round_trip() {
        let mut ws = Workspace::with_graph(vec![node("n1", 0.0, 0.0), node("n2", 5.0, 5.0)], Vec::new());
        let mut engine = HistoryEngine::default();

        let session = engine.capture_snapshot(
            &ws,
            CaptureOptions::default().with_nodes([NodeId::new("n2")]),
        );
        ws.remove_node(&NodeId::new("n2")).expect("remove n2");
        engine.commit_change(&ws, session, "delete", CommitOptions::default());

        let entry = engine.past()[0]
            .node_entry(&NodeId::new("n2"))
            .expect("entry for n2");
        assert!(entry.before.is_some());
        assert!(entry.after.is_none());

        engine.undo(&mut ws);
        assert_eq!(position_of(&ws, "n2"), Some(Position::new(5.0, 5.0)));

        engine.redo(&mut ws);
        assert!(ws.node(&NodeId::new("n2")).is_none());
        assert_eq!(ws.nodes().len(), 1);
    }

    /// S1.3: Deleting a node with edges restores both on undo.
    #[test]
    fn node_with_edges_restored_together() {
        let mut ws = Workspace::with_graph(vec![node("a", 0.0, 0.0), node("b", 1.0, 0.0)], Vec::new());
        ws.insert_edge(LiveEdge::new("e1", NodeId::new("a"), NodeId::new("b")))
            .expect("edge");
        let mut engine = HistoryEngine::default();

        let edges = ws.edges_touching(&NodeId::new("a"));
        let session = engine.capture_snapshot(
            &ws,
            CaptureOptions::default()
                .with_nodes([NodeId::new("a")])
                .with_edges(edges),
        );
        ws.remove_node(&NodeId::new("a")).expect("remove");
        engine.commit_change(&ws, session, "delete a", CommitOptions::default());

        let change = &engine.past()[0];
        assert_eq!(change.entry_count(), 2);
        assert!(change.edge_entry(&EdgeId::new("e1")).is_some_and(|e| e.is_deletion()));

        engine.undo(&mut ws);
        assert!(ws.node(&NodeId::new("a")).is_some());
        assert!(ws.edge(&EdgeId::new("e1")).is_some());
    }

    /// S1.4: Reintroduced entities are appended, survivors keep their slot.
    #[test]
    fn undo_appends_reintroduced_entities() {
        let mut ws = Workspace::with_graph(
            vec![node("a", 0.0, 0.0), node("b", 0.0, 0.0), node("c", 0.0, 0.0)],
            Vec::new(),
        );
        let mut engine = HistoryEngine::default();

        let session = engine.capture_snapshot(&ws, CaptureOptions::all());
        ws.remove_node(&NodeId::new("a")).expect("remove");
        ws.node_mut(&NodeId::new("c")).expect("c").position = Position::new(1.0, 1.0);
        engine.commit_change(&ws, session, "edit", CommitOptions::default());

        engine.undo(&mut ws);

        let order: Vec<_> = ws.nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
        assert_eq!(position_of(&ws, "c"), Some(Position::new(0.0, 0.0)));
    }

    /// S1.5: Annotations travel with the change set.
    #[test]
    fn annotation_edit_round_trip() {
        let mut ws = Workspace::new();
        let mut engine = HistoryEngine::default();
        let note = Annotation {
            id: "a1".to_string(),
            subject: Some("n1".to_string()),
            body: json!({ "text": "check retries" }),
        };

        let session = engine.capture_snapshot(&ws, CaptureOptions::default().with_annotations());
        ws.set_annotations(vec![note.clone()]);
        engine.commit_change(&ws, session, "annotate", CommitOptions::default());

        engine.undo(&mut ws);
        assert!(ws.annotations().is_empty());

        engine.redo(&mut ws);
        assert_eq!(ws.annotations(), &[note]);
    }

    /// S1.6: Rename meta is exposed in apply order.
    #[test]
    fn rename_meta_round_trip() {
        let mut ws = Workspace::with_graph(vec![node("old", 0.0, 0.0)], Vec::new());
        let mut engine = HistoryEngine::default();

        let session = engine.capture_snapshot(
            &ws,
            CaptureOptions::default()
                .with_nodes([NodeId::new("old"), NodeId::new("new")])
                .with_meta(ChangeMeta::rename("old", "new")),
        );
        ws.rename_node(&NodeId::new("old"), &NodeId::new("new"))
            .expect("rename");
        engine.commit_change(&ws, session, "rename", CommitOptions::default());

        let meta = engine.past()[0].meta.clone().expect("meta");
        let undo = meta.renames_for(Direction::Undo);
        assert_eq!(undo[0].from, "new");
        assert_eq!(undo[0].to, "old");

        engine.undo(&mut ws);
        assert!(ws.node(&NodeId::new("old")).is_some());
        assert!(ws.node(&NodeId::new("new")).is_none());
    }
}

// =============================================================================
// S2: BATCHING
// =============================================================================

mod s2_batching {
    use super::*;

    /// S2.1: A, B, A inside one batch yields one entry each.
    #[test]
    fn batch_coalesces_per_entity() {
        let mut ws = Workspace::with_graph(vec![node("A", 0.0, 0.0), node("B", 0.0, 0.0)], Vec::new());
        let mut engine = HistoryEngine::default();

        engine.begin_batch();
        move_node(&mut engine, &mut ws, "A", Position::new(1.0, 1.0));
        move_node(&mut engine, &mut ws, "B", Position::new(2.0, 2.0));
        move_node(&mut engine, &mut ws, "A", Position::new(3.0, 3.0));
        assert!(engine.end_batch());

        assert_eq!(engine.past().len(), 1);
        let change = &engine.past()[0];
        assert_eq!(change.node_entries.len(), 2);

        let a = change.node_entry(&NodeId::new("A")).expect("A");
        assert_eq!(a.before.as_ref().map(|n| n.position), Some(Position::new(0.0, 0.0)));
        assert_eq!(a.after.as_ref().map(|n| n.position), Some(Position::new(3.0, 3.0)));
        assert!(change.node_entry(&NodeId::new("B")).is_some());

        engine.undo(&mut ws);
        assert_eq!(position_of(&ws, "A"), Some(Position::new(0.0, 0.0)));
        assert_eq!(position_of(&ws, "B"), Some(Position::new(0.0, 0.0)));
    }

    /// S2.2: A single buffered change set is pushed as-is.
    #[test]
    fn single_buffered_change_pushed_as_is() {
        let mut ws = Workspace::with_graph(vec![node("A", 0.0, 0.0)], Vec::new());
        let mut engine = HistoryEngine::default();

        engine.begin_batch();
        move_node(&mut engine, &mut ws, "A", Position::new(4.0, 4.0));
        engine.end_batch();

        assert_eq!(engine.undo_description(), Some("move"));
        assert_eq!(engine.past()[0].entry_count(), 1);
    }

    /// S2.3: Batch persist flag is the OR of its commits.
    #[test]
    fn batch_persist_flag_is_or() {
        let mut ws = Workspace::with_graph(vec![node("A", 0.0, 0.0)], Vec::new());
        let mut engine = HistoryEngine::default();

        engine.begin_batch();
        let session = engine.capture_snapshot(&ws, CaptureOptions::all());
        ws.node_mut(&NodeId::new("A")).expect("A").position = Position::new(1.0, 0.0);
        engine.commit_change(&ws, session, "drag", CommitOptions::silent());
        move_node(&mut engine, &mut ws, "A", Position::new(2.0, 0.0));
        engine.end_batch();

        assert!(engine.past()[0].persist);
    }

    /// S2.4: Edits that cancel out inside a batch leave no history.
    #[test]
    fn cancelling_batch_leaves_no_history() {
        let mut ws = Workspace::with_graph(vec![node("A", 0.0, 0.0)], Vec::new());
        let mut engine = HistoryEngine::default();

        engine.begin_batch();
        move_node(&mut engine, &mut ws, "A", Position::new(9.0, 9.0));
        move_node(&mut engine, &mut ws, "A", Position::new(0.0, 0.0));
        assert!(!engine.end_batch());

        assert_eq!(engine.undo_count(), 0);
    }
}

// =============================================================================
// S3: BOUNDS & INVALIDATION
// =============================================================================

mod s3_bounds {
    use super::*;

    /// S3.1: More than capacity commits keeps the newest ones.
    #[test]
    fn capacity_drops_oldest() {
        let mut ws = Workspace::with_graph(vec![node("n1", 0.0, 0.0)], Vec::new());
        let mut engine = HistoryEngine::default();

        for step in 1..=60_i32 {
            let x = f64::from(step);
            move_node(&mut engine, &mut ws, "n1", Position::new(x, x));
        }

        assert_eq!(engine.undo_count(), 50);
        let oldest = engine.past()[0].node_entries[0]
            .before
            .as_ref()
            .map(|n| n.position);
        assert_eq!(oldest, Some(Position::new(10.0, 10.0)));
    }

    /// S3.2: A configured capacity is honoured.
    #[test]
    fn configured_capacity() {
        let mut ws = Workspace::with_graph(vec![node("n1", 0.0, 0.0)], Vec::new());
        let mut engine =
            HistoryEngine::new(HistoryConfig::default().with_capacity(3)).expect("engine");

        for step in 1..=5_i32 {
            let x = f64::from(step);
            move_node(&mut engine, &mut ws, "n1", Position::new(x, 0.0));
        }

        assert_eq!(engine.capacity(), 3);
        assert_eq!(engine.undo_count(), 3);
    }

    /// S3.3: A new edit after undo clears redo.
    #[test]
    fn new_edit_clears_future() {
        let mut ws = Workspace::with_graph(vec![node("n1", 0.0, 0.0)], Vec::new());
        let mut engine = HistoryEngine::default();

        move_node(&mut engine, &mut ws, "n1", Position::new(1.0, 1.0));
        move_node(&mut engine, &mut ws, "n1", Position::new(2.0, 2.0));
        engine.undo(&mut ws);
        assert_eq!(engine.redo_count(), 1);

        move_node(&mut engine, &mut ws, "n1", Position::new(5.0, 5.0));

        assert_eq!(engine.redo_count(), 0);
        assert!(!engine.can_redo());
        assert!(!engine.redo(&mut ws));
    }

    /// S3.4: A no-op commit after undo keeps redo available.
    #[test]
    fn noop_commit_keeps_future() {
        let mut ws = Workspace::with_graph(vec![node("n1", 0.0, 0.0)], Vec::new());
        let mut engine = HistoryEngine::default();

        move_node(&mut engine, &mut ws, "n1", Position::new(1.0, 1.0));
        engine.undo(&mut ws);
        let outcome = move_node(&mut engine, &mut ws, "n1", Position::new(0.0, 0.0));

        assert_eq!(outcome, CommitOutcome::Unchanged);
        assert_eq!(engine.redo_count(), 1);
    }
}

// =============================================================================
// S4: DISABLED ENGINE & TRANSIENT STATE
// =============================================================================

mod s4_disabled_and_transient {
    use super::*;

    /// S4.1: A disabled engine changes nothing.
    #[test]
    fn disabled_engine_is_inert() {
        let mut ws = Workspace::with_graph(vec![node("n1", 0.0, 0.0)], Vec::new());
        let mut engine = HistoryEngine::default();
        move_node(&mut engine, &mut ws, "n1", Position::new(1.0, 1.0));
        engine.undo(&mut ws);

        engine.set_enabled(false);
        let before = ws.persisted_state();

        assert_eq!(
            move_node(&mut engine, &mut ws, "n1", Position::new(1.0, 1.0)),
            CommitOutcome::Disabled
        );
        ws.node_mut(&NodeId::new("n1")).expect("n1").position = Position::new(0.0, 0.0);
        assert!(!engine.undo(&mut ws));
        assert!(!engine.redo(&mut ws));

        assert_eq!(ws.persisted_state(), before);
        assert_eq!(engine.undo_count(), 0);
        assert_eq!(engine.redo_count(), 1);
        assert!(!engine.can_redo());
    }

    /// S4.2: Selection made after a commit survives undo.
    #[test]
    fn selection_not_resurrected_or_cleared() {
        let mut ws = Workspace::with_graph(vec![node("n1", 0.0, 0.0), node("n2", 0.0, 0.0)], Vec::new());
        let mut engine = HistoryEngine::default();

        ws.select_only(&NodeId::new("n1")).expect("select");
        move_node(&mut engine, &mut ws, "n1", Position::new(3.0, 3.0));
        ws.select_only(&NodeId::new("n2")).expect("select");

        engine.undo(&mut ws);

        assert!(!ws.node(&NodeId::new("n1")).expect("n1").selected);
        assert!(ws.node(&NodeId::new("n2")).expect("n2").selected);
    }

    /// S4.3: A selection-only change is not an edit.
    #[test]
    fn selection_change_is_noop() {
        let mut ws = Workspace::with_graph(vec![node("n1", 0.0, 0.0)], Vec::new());
        let mut engine = HistoryEngine::default();

        let session = engine.capture_snapshot(&ws, CaptureOptions::all());
        ws.select_only(&NodeId::new("n1")).expect("select");
        let outcome = engine.commit_change(&ws, session, "select", CommitOptions::default());

        assert_eq!(outcome, CommitOutcome::Unchanged);
        assert_eq!(engine.undo_count(), 0);
    }
}
