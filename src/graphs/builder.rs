//! Node construction: column layout, compaction, centering, and expansion
//! of fan-out and compound stages.
//!
//! The builder walks the selected topology's columns in declared order.
//! Specialized topologies render every declared stage; the default topology
//! renders only stages with telemetry so the view is not flooded with
//! dozens of irrelevant nodes. Stage names observed in telemetry but absent
//! from the topology are appended in a synthetic trailing column and
//! classified through the central name heuristic rather than dropped.

use serde::Serialize;

use crate::registry::Topology;
use crate::resolver::StatusResolver;
use crate::telemetry::{RunSnapshot, StageExecutionRecord};
use crate::types::{StageClass, StageStatus};

use super::edges::{EdgeClass, EdgeKind, ResolvedEdge};

/// Rendered position of a node.
///
/// `column` is the compacted column rank (empty columns removed); `lane` is
/// a signed offset centered on 0 within the column, in logical units the
/// renderer scales to pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NodePosition {
    pub column: usize,
    pub lane: f32,
}

/// What a node represents within its stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum NodeRole {
    /// The stage's primary node.
    Primary,
    /// An additional fan-out execution beyond the primary.
    FanOutSibling { ordinal: usize },
    /// One sub-stage of a compound execution.
    SubStage { ordinal: usize },
}

/// One renderable node with its canonical resolved state.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedNode {
    /// Unique node id within the view.
    pub id: String,
    /// Stage name this node belongs to.
    pub stage: String,
    pub label: String,
    pub class: StageClass,
    pub status: StageStatus,
    pub is_inferred: bool,
    /// Fixed category color, independent of status.
    pub color: &'static str,
    pub retry_count: u32,
    pub was_executed: bool,
    pub position: NodePosition,
    pub role: NodeRole,
    /// Backing execution record id, when one exists.
    pub execution_id: Option<String>,
}

/// Builder output: nodes plus the sub-stage chain edges that belong to the
/// node pass rather than topology edge synthesis.
pub struct BuiltNodes {
    pub nodes: Vec<ResolvedNode>,
    pub chain_edges: Vec<ResolvedEdge>,
}

/// Walks topology columns and expands them into [`ResolvedNode`]s.
pub struct GraphBuilder<'a> {
    topology: &'a Topology,
    resolver: &'a StatusResolver<'a>,
    snapshot: &'a RunSnapshot,
}

// Lane spacing between a primary node and its expansion nodes.
const SIBLING_SPACING: f32 = 0.45;
const SUB_STAGE_SPACING: f32 = 0.35;

impl<'a> GraphBuilder<'a> {
    #[must_use]
    pub fn new(
        topology: &'a Topology,
        resolver: &'a StatusResolver<'a>,
        snapshot: &'a RunSnapshot,
    ) -> Self {
        Self {
            topology,
            resolver,
            snapshot,
        }
    }

    /// Build every visible node for this snapshot.
    #[must_use]
    pub fn build(&self) -> BuiltNodes {
        let mut nodes = Vec::new();
        let mut chain_edges = Vec::new();

        // Visible stages per declared column, before compaction.
        let mut columns: Vec<Vec<&str>> = self
            .topology
            .columns
            .iter()
            .map(|col| {
                col.iter()
                    .map(String::as_str)
                    .filter(|stage| self.topology.render_all || self.resolver.was_executed(stage))
                    .collect()
            })
            .collect();

        if let Some(extra) = self.undeclared_column() {
            columns.push(extra);
        }

        // Compaction: the rendered column index is the rank among non-empty
        // columns, not the raw registry index.
        let mut rendered_column = 0;
        for stages in columns.iter().filter(|c| !c.is_empty()) {
            let count = stages.len();
            for (row, stage) in stages.iter().enumerate() {
                // k stages are evenly spaced symmetric around the axis.
                let lane = row as f32 - (count as f32 - 1.0) / 2.0;
                self.expand_stage(stage, rendered_column, lane, &mut nodes, &mut chain_edges);
            }
            rendered_column += 1;
        }

        BuiltNodes { nodes, chain_edges }
    }

    /// Telemetry stage names the topology does not declare, ordered by
    /// earliest execution then name for determinism.
    fn undeclared_column(&self) -> Option<Vec<&'a str>> {
        let mut unknown: Vec<&str> = self
            .snapshot
            .observed_stage_names()
            .into_iter()
            .filter(|name| !self.topology.contains(name))
            .collect();
        if unknown.is_empty() {
            return None;
        }
        unknown.sort_by_key(|name| {
            (
                self.resolver
                    .primary_execution(name)
                    .and_then(|e| e.started_at),
                *name,
            )
        });
        tracing::debug!(
            topology = %self.topology.id,
            stages = ?unknown,
            "rendering undeclared stages via heuristic classification"
        );
        Some(unknown)
    }

    fn expand_stage(
        &self,
        stage: &str,
        column: usize,
        lane: f32,
        nodes: &mut Vec<ResolvedNode>,
        chain_edges: &mut Vec<ResolvedEdge>,
    ) {
        let resolved = self.resolver.resolve(stage);
        let class = self.topology.class_or_heuristic(stage);
        let primary_exec = self.resolver.primary_execution(stage);
        let primary_id = stage.to_string();

        nodes.push(ResolvedNode {
            id: primary_id.clone(),
            stage: stage.to_string(),
            label: self.display_label(stage),
            class,
            status: resolved.status,
            is_inferred: resolved.is_inferred,
            color: class.color(),
            retry_count: self.resolver.retry_count(stage),
            was_executed: self.resolver.was_executed(stage),
            position: NodePosition { column, lane },
            role: NodeRole::Primary,
            execution_id: primary_exec.map(|e| e.id.clone()),
        });

        if self.topology.is_fan_out(stage) {
            self.expand_fan_out(stage, column, lane, nodes);
        }

        if let Some(exec) = primary_exec
            && !exec.sub_stages.is_empty()
        {
            self.expand_sub_stages(exec, &primary_id, column, lane, nodes, chain_edges);
        }
    }

    /// Secondary nodes for a fan-out stage's additional executions.
    ///
    /// The group is already in chronological order, so index 0 is the
    /// primary (first-execution-wins) and everything after it becomes a
    /// sibling offset below it.
    fn expand_fan_out(
        &self,
        stage: &str,
        column: usize,
        lane: f32,
        nodes: &mut Vec<ResolvedNode>,
    ) {
        let Some(group) = self.resolver.executions().get(stage) else {
            return;
        };
        let class = self.topology.class_or_heuristic(stage);
        for (ordinal, exec) in group.iter().enumerate().skip(1) {
            let label = exec.fan_out_label(ordinal);
            nodes.push(ResolvedNode {
                id: format!("{stage}@{label}"),
                stage: stage.to_string(),
                label,
                class,
                status: exec.status,
                is_inferred: false,
                color: class.color(),
                retry_count: exec.retries,
                was_executed: true,
                position: NodePosition {
                    column,
                    lane: lane + ordinal as f32 * SIBLING_SPACING,
                },
                role: NodeRole::FanOutSibling { ordinal },
                execution_id: Some(exec.id.clone()),
            });
        }
    }

    /// Chain of sub-nodes for a compound execution, connected in sequence
    /// under the parent.
    fn expand_sub_stages(
        &self,
        exec: &StageExecutionRecord,
        parent_id: &str,
        column: usize,
        lane: f32,
        nodes: &mut Vec<ResolvedNode>,
        chain_edges: &mut Vec<ResolvedEdge>,
    ) {
        let mut previous = parent_id.to_string();
        for (ordinal, sub) in exec.sub_stages.iter().enumerate() {
            let label = sub.label(ordinal);
            let id = format!("{parent_id}/{ordinal}");
            nodes.push(ResolvedNode {
                id: id.clone(),
                stage: exec.stage.clone(),
                label,
                class: StageClass::Agent,
                status: sub.status,
                is_inferred: false,
                color: StageClass::Agent.color(),
                retry_count: 0,
                was_executed: true,
                position: NodePosition {
                    column,
                    lane: lane + (ordinal as f32 + 1.0) * SUB_STAGE_SPACING,
                },
                role: NodeRole::SubStage { ordinal },
                execution_id: Some(exec.id.clone()),
            });
            chain_edges.push(ResolvedEdge {
                from: previous,
                to: id.clone(),
                traversed: false,
                class: EdgeClass::Idle,
                from_anchor: None,
                to_anchor: None,
                kind: EdgeKind::SubStageChain,
            });
            previous = id;
        }
    }

    /// Display label: backend display metadata when present, else the stage
    /// name itself.
    fn display_label(&self, stage: &str) -> String {
        self.snapshot
            .dynamic_layout
            .as_ref()
            .and_then(|l| l.display.get(stage))
            .and_then(|d| d.label.clone())
            .unwrap_or_else(|| stage.to_string())
    }
}

/// Reconstruct the execution record behind a selected node.
///
/// Primary and fan-out nodes return their backing record; sub-stage nodes
/// return a synthetic execution-record-shaped value (parent run identity
/// plus the sub-stage's own status, duration, and metrics) so detail
/// consumers need no special-casing.
#[must_use]
pub fn select_node_record(
    snapshot: &RunSnapshot,
    node: &ResolvedNode,
) -> Option<StageExecutionRecord> {
    let exec_id = node.execution_id.as_deref()?;
    let exec = snapshot.all_executions().find(|e| e.id == exec_id)?;
    match &node.role {
        NodeRole::SubStage { ordinal } => exec.synthesize_sub_stage(*ordinal),
        _ => Some(exec.clone()),
    }
}
