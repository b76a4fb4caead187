//! # Script Replay
//!
//! Runs a scripted edit session against an in-memory `Workspace`.
//!
//! A script is a JSON array of steps tagged by `op`:
//!
//! ```json
//! [
//!   { "op": "add_node", "id": "n1", "x": 0, "y": 0 },
//!   { "op": "begin_batch" },
//!   { "op": "move_node", "id": "n1", "x": 40, "y": 10 },
//!   { "op": "move_node", "id": "n1", "x": 80, "y": 20 },
//!   { "op": "end_batch" },
//!   { "op": "undo" }
//! ]
//! ```
//!
//! Edit steps go through capture, mutate and commit exactly like an editor
//! gesture would. Control steps map onto the engine calls of the same name.

use retrace_core::{
    Annotation, CaptureOptions, ChangeMeta, CommitOptions, CommitOutcome, EdgeId, HistoryConfig,
    HistoryEngine, HistoryError, LiveEdge, LiveNode, NodeId, PersistHook, PersistedState,
    Position, Workspace,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Maximum number of steps accepted in one script.
pub const MAX_SCRIPT_STEPS: usize = 100_000;

fn default_kind() -> String {
    "default".to_string()
}

// =============================================================================
// SCRIPT STEPS
// =============================================================================

/// One step of an edit script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    AddNode {
        id: String,
        #[serde(default = "default_kind")]
        kind: String,
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
        #[serde(default)]
        data: JsonValue,
        #[serde(default)]
        parent: Option<String>,
    },
    MoveNode {
        id: String,
        x: f64,
        y: f64,
    },
    /// Replace a node's data payload.
    UpdateNode {
        id: String,
        data: JsonValue,
    },
    /// Remove a node together with its attached edges.
    RemoveNode {
        id: String,
    },
    AddEdge {
        id: String,
        source: String,
        target: String,
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        animated: bool,
    },
    RemoveEdge {
        id: String,
    },
    SetAnnotations {
        annotations: Vec<Annotation>,
    },
    /// Give a node a new id; recorded with rename metadata.
    RenameNode {
        from: String,
        to: String,
    },
    /// Transient selection, never recorded.
    SelectNode {
        id: String,
    },
    BeginBatch,
    EndBatch,
    AbortBatch,
    Undo,
    Redo,
    Clear,
    SetEnabled {
        enabled: bool,
    },
}

/// Parse a script from its JSON text.
pub fn parse_script(contents: &str) -> Result<Vec<ScriptStep>, HistoryError> {
    let steps: Vec<ScriptStep> = serde_json::from_str(contents)
        .map_err(|e| HistoryError::SerializationError(format!("Parse script: {}", e)))?;

    if steps.len() > MAX_SCRIPT_STEPS {
        return Err(HistoryError::SerializationError(format!(
            "Step count {} exceeds maximum allowed {}",
            steps.len(),
            MAX_SCRIPT_STEPS
        )));
    }
    Ok(steps)
}

// =============================================================================
// REPORT
// =============================================================================

/// Counters collected while replaying.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    pub steps: usize,
    /// Commits and batches that entered history.
    pub recorded: usize,
    pub buffered: usize,
    pub unchanged: usize,
    /// Commits dropped because the engine was disabled.
    pub disabled: usize,
    pub undone: usize,
    pub redone: usize,
    /// Undo/redo/batch calls that had no effect.
    pub ignored: usize,
}

impl ReplayStats {
    fn count(&mut self, outcome: CommitOutcome) {
        match outcome {
            CommitOutcome::Recorded => self.recorded += 1,
            CommitOutcome::Buffered => self.buffered += 1,
            CommitOutcome::Unchanged => self.unchanged += 1,
            CommitOutcome::Disabled => self.disabled += 1,
        }
    }
}

/// Final state of a replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub stats: ReplayStats,
    pub enabled: bool,
    pub batching: bool,
    /// Undo stack labels, oldest first.
    pub undo_stack: Vec<String>,
    /// Redo stack labels, nearest first.
    pub redo_stack: Vec<String>,
    pub state: PersistedState,
}

// =============================================================================
// REPLAYER
// =============================================================================

/// Engine plus workspace driven by script steps.
#[derive(Debug)]
pub struct Replayer {
    engine: HistoryEngine,
    workspace: Workspace,
    stats: ReplayStats,
}

impl Replayer {
    pub fn new(config: HistoryConfig) -> Result<Self, HistoryError> {
        Ok(Self {
            engine: HistoryEngine::new(config)?,
            workspace: Workspace::new(),
            stats: ReplayStats::default(),
        })
    }

    /// Create a replayer whose engine notifies `hook`.
    pub fn with_persist_hook(
        config: HistoryConfig,
        hook: impl PersistHook + 'static,
    ) -> Result<Self, HistoryError> {
        Ok(Self {
            engine: HistoryEngine::with_persist_hook(config, hook)?,
            workspace: Workspace::new(),
            stats: ReplayStats::default(),
        })
    }

    #[must_use]
    pub fn engine(&self) -> &HistoryEngine {
        &self.engine
    }

    #[must_use]
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    #[must_use]
    pub fn stats(&self) -> ReplayStats {
        self.stats
    }

    /// Run every step in order, stopping at the first failing edit.
    pub fn run(&mut self, steps: &[ScriptStep]) -> Result<(), HistoryError> {
        for (index, step) in steps.iter().enumerate() {
            if let Err(e) = self.step(step) {
                tracing::warn!(step = index, ?step, "Script step failed: {}", e);
                return Err(e);
            }
        }
        tracing::info!(
            steps = self.stats.steps,
            recorded = self.stats.recorded,
            undone = self.stats.undone,
            redone = self.stats.redone,
            "Script replayed"
        );
        Ok(())
    }

    /// Execute a single step.
    pub fn step(&mut self, step: &ScriptStep) -> Result<(), HistoryError> {
        self.stats.steps += 1;

        match step {
            ScriptStep::AddNode {
                id,
                kind,
                x,
                y,
                data,
                parent,
            } => {
                let node_id = NodeId::new(id.as_str());
                let mut node = LiveNode::new(id.as_str(), kind.as_str(), Position::new(*x, *y))
                    .with_data(data.clone());
                node.parent = parent.as_deref().map(NodeId::new);

                self.edit(
                    format!("Add node {}", id),
                    CaptureOptions::default().with_nodes([node_id.clone()]),
                    |ws| {
                        if ws.node(&node_id).is_some() {
                            return Err(HistoryError::DuplicateEntity(node_id.to_string()));
                        }
                        ws.insert_node(node);
                        Ok(())
                    },
                )
            }
            ScriptStep::MoveNode { id, x, y } => {
                let node_id = NodeId::new(id.as_str());
                let position = Position::new(*x, *y);
                self.edit(
                    format!("Move node {}", id),
                    CaptureOptions::default().with_nodes([node_id.clone()]),
                    |ws| {
                        let node = ws
                            .node_mut(&node_id)
                            .ok_or_else(|| HistoryError::UnknownEntity(node_id.to_string()))?;
                        node.position = position;
                        Ok(())
                    },
                )
            }
            ScriptStep::UpdateNode { id, data } => {
                let node_id = NodeId::new(id.as_str());
                let data = data.clone();
                self.edit(
                    format!("Update node {}", id),
                    CaptureOptions::default().with_nodes([node_id.clone()]),
                    |ws| {
                        let node = ws
                            .node_mut(&node_id)
                            .ok_or_else(|| HistoryError::UnknownEntity(node_id.to_string()))?;
                        node.data = data;
                        Ok(())
                    },
                )
            }
            ScriptStep::RemoveNode { id } => {
                let node_id = NodeId::new(id.as_str());
                let edges = self.workspace.edges_touching(&node_id);
                self.edit(
                    format!("Remove node {}", id),
                    CaptureOptions::default()
                        .with_nodes([node_id.clone()])
                        .with_edges(edges),
                    |ws| ws.remove_node(&node_id).map(|_| ()),
                )
            }
            ScriptStep::AddEdge {
                id,
                source,
                target,
                label,
                animated,
            } => {
                let edge_id = EdgeId::new(id.as_str());
                let mut edge =
                    LiveEdge::new(id.as_str(), NodeId::new(source.as_str()), NodeId::new(target.as_str()));
                edge.label.clone_from(label);
                edge.animated = *animated;

                self.edit(
                    format!("Connect {} to {}", source, target),
                    CaptureOptions::default().with_edges([edge_id.clone()]),
                    |ws| {
                        if ws.edge(&edge_id).is_some() {
                            return Err(HistoryError::DuplicateEntity(edge_id.to_string()));
                        }
                        ws.insert_edge(edge)
                    },
                )
            }
            ScriptStep::RemoveEdge { id } => {
                let edge_id = EdgeId::new(id.as_str());
                self.edit(
                    format!("Remove edge {}", id),
                    CaptureOptions::default().with_edges([edge_id.clone()]),
                    |ws| ws.remove_edge(&edge_id).map(|_| ()),
                )
            }
            ScriptStep::SetAnnotations { annotations } => {
                let annotations = annotations.clone();
                self.edit(
                    "Edit annotations".to_string(),
                    CaptureOptions::default().with_annotations(),
                    |ws| {
                        ws.set_annotations(annotations);
                        Ok(())
                    },
                )
            }
            ScriptStep::RenameNode { from, to } => {
                let from_id = NodeId::new(from.as_str());
                let to_id = NodeId::new(to.as_str());
                let children: Vec<NodeId> = self
                    .workspace
                    .nodes()
                    .iter()
                    .filter(|n| n.parent.as_ref() == Some(&from_id))
                    .map(|n| n.id.clone())
                    .collect();
                let edges = self.workspace.edges_touching(&from_id);

                self.edit(
                    format!("Rename {} to {}", from, to),
                    CaptureOptions::default()
                        .with_nodes([from_id.clone(), to_id.clone()])
                        .with_nodes(children)
                        .with_edges(edges)
                        .with_meta(ChangeMeta::rename(from.as_str(), to.as_str())),
                    |ws| ws.rename_node(&from_id, &to_id),
                )
            }
            ScriptStep::SelectNode { id } => self.workspace.select_only(&NodeId::new(id.as_str())),
            ScriptStep::BeginBatch => {
                let opened = self.engine.begin_batch();
                self.note_ignored(!opened);
                Ok(())
            }
            ScriptStep::EndBatch => {
                match self.engine.try_end_batch() {
                    Ok(outcome) => self.stats.count(outcome),
                    Err(e) => {
                        tracing::warn!("Ignored end_batch: {}", e);
                        self.stats.ignored += 1;
                    }
                }
                Ok(())
            }
            ScriptStep::AbortBatch => {
                let was_open = self.engine.is_batching();
                self.engine.abort_batch();
                self.note_ignored(!was_open);
                Ok(())
            }
            ScriptStep::Undo => {
                if self.engine.undo(&mut self.workspace) {
                    self.stats.undone += 1;
                } else {
                    self.note_ignored(true);
                }
                Ok(())
            }
            ScriptStep::Redo => {
                if self.engine.redo(&mut self.workspace) {
                    self.stats.redone += 1;
                } else {
                    self.note_ignored(true);
                }
                Ok(())
            }
            ScriptStep::Clear => {
                self.engine.clear_history();
                Ok(())
            }
            ScriptStep::SetEnabled { enabled } => {
                self.engine.set_enabled(*enabled);
                Ok(())
            }
        }
    }

    /// Capture, mutate, commit. A failed mutation records nothing.
    fn edit(
        &mut self,
        description: String,
        options: CaptureOptions,
        mutate: impl FnOnce(&mut Workspace) -> Result<(), HistoryError>,
    ) -> Result<(), HistoryError> {
        let session = self.engine.capture_snapshot(&self.workspace, options);
        mutate(&mut self.workspace)?;
        let outcome = self.engine.commit_change(
            &self.workspace,
            session,
            &description,
            CommitOptions::default(),
        );
        self.stats.count(outcome);
        Ok(())
    }

    fn note_ignored(&mut self, ignored: bool) {
        if ignored {
            self.stats.ignored += 1;
        }
    }

    /// Summarize the replay.
    #[must_use]
    pub fn report(&self) -> ReplayReport {
        ReplayReport {
            stats: self.stats,
            enabled: self.engine.is_enabled(),
            batching: self.engine.is_batching(),
            undo_stack: self
                .engine
                .past()
                .iter()
                .map(|c| c.description.clone())
                .collect(),
            redo_stack: self
                .engine
                .future()
                .iter()
                .map(|c| c.description.clone())
                .collect(),
            state: self.workspace.persisted_state(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
