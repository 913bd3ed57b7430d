//! Edge synthesis and visual classification.
//!
//! The default topology carries an explicit declared edge list (optionally
//! replaced by a backend-supplied list); specialized topologies generate a
//! full bipartite edge set between consecutive visible columns, which models
//! "all of phase N completes before phase N+1 starts" for simple per-phase
//! pipelines. Candidate edges with a missing endpoint are dropped.
//!
//! "Traversed" is read strictly from the execution path's traversed-edge
//! set keyed by the literal `(from, to)` pair. It is never inferred from
//! both endpoints being individually successful: two stages can both
//! succeed via disjoint branches or retries without the specific edge
//! between them ever having been taken.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::registry::{AnchorHint, DeclaredEdge, Topology};
use crate::resolver::StatusResolver;
use crate::telemetry::RunSnapshot;
use crate::types::StageStatus;

use super::builder::{NodeRole, ResolvedNode};

/// Visual classification of an edge, in priority order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum EdgeClass {
    /// Path toward a human-checkpoint stage (dashed, alert color).
    Escalation,
    /// Traversed and the target stage retried (dashed, warn color).
    TraversedRetry,
    /// Literally traversed; colored by the target's resolved status.
    Traversed { status: StageStatus },
    /// Not traversed, but telemetry exists for an endpoint (dimmed).
    Dimmed,
    /// Not traversed, no telemetry (default dim).
    Idle,
}

/// How the edge came to exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// From the topology's declared edge list.
    Declared,
    /// Generated column-to-column for a specialized topology.
    Generated,
    /// From a backend-supplied edge list.
    Backend,
    /// Sequencing edge inside a compound stage's sub-node chain.
    SubStageChain,
}

/// One renderable edge between two node ids.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedEdge {
    pub from: String,
    pub to: String,
    /// Strict membership in the execution path's traversed-edge set.
    pub traversed: bool,
    pub class: EdgeClass,
    pub from_anchor: Option<AnchorHint>,
    pub to_anchor: Option<AnchorHint>,
    pub kind: EdgeKind,
}

// AnchorHint crosses the output surface, so it serializes with the edges.
impl Serialize for AnchorHint {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let s = match self {
            AnchorHint::Top => "top",
            AnchorHint::Bottom => "bottom",
            AnchorHint::Left => "left",
            AnchorHint::Right => "right",
        };
        serializer.serialize_str(s)
    }
}

/// Synthesize and classify the topology edge set over the visible nodes.
#[must_use]
pub fn synthesize_edges(
    topology: &Topology,
    resolver: &StatusResolver<'_>,
    snapshot: &RunSnapshot,
    nodes: &[ResolvedNode],
) -> Vec<ResolvedEdge> {
    // Only primary nodes anchor topology edges; siblings and sub-nodes hang
    // off their stage's primary.
    let primaries: FxHashMap<&str, &ResolvedNode> = nodes
        .iter()
        .filter(|n| n.role == NodeRole::Primary)
        .map(|n| (n.stage.as_str(), n))
        .collect();

    let candidates = collect_candidates(topology, snapshot, nodes);
    let edges_taken = snapshot.edges_taken();

    let mut edges = Vec::with_capacity(candidates.len());
    for (declared, kind) in candidates {
        // Missing endpoints (filtered out elsewhere) drop the edge.
        let (Some(_), Some(target)) = (
            primaries.get(declared.from.as_str()),
            primaries.get(declared.to.as_str()),
        ) else {
            continue;
        };

        let traversed = edges_taken.contains(&(declared.from.as_str(), declared.to.as_str()));
        let source_executed = resolver.was_executed(&declared.from);

        let class = if declared.escalation {
            EdgeClass::Escalation
        } else if traversed && resolver.retry_count(&declared.to) > 0 {
            EdgeClass::TraversedRetry
        } else if traversed {
            EdgeClass::Traversed {
                status: target.status,
            }
        } else if source_executed || target.was_executed {
            EdgeClass::Dimmed
        } else {
            EdgeClass::Idle
        };

        edges.push(ResolvedEdge {
            from: declared.from,
            to: declared.to,
            traversed,
            class,
            from_anchor: declared.from_anchor,
            to_anchor: declared.to_anchor,
            kind,
        });
    }
    edges
}

/// The candidate edge list before endpoint filtering.
fn collect_candidates(
    topology: &Topology,
    snapshot: &RunSnapshot,
    nodes: &[ResolvedNode],
) -> Vec<(DeclaredEdge, EdgeKind)> {
    if topology.generated_edges {
        return bipartite_candidates(nodes);
    }

    // A backend-supplied edge list replaces the declared one when present.
    if let Some(layout) = &snapshot.dynamic_layout
        && !layout.edges.is_empty()
    {
        return layout
            .edges
            .iter()
            .map(|e| {
                (
                    DeclaredEdge::new(e.from.clone(), e.to.clone()),
                    EdgeKind::Backend,
                )
            })
            .collect();
    }

    topology
        .declared_edges
        .iter()
        .map(|e| (e.clone(), EdgeKind::Declared))
        .collect()
}

/// Full bipartite edges between consecutive visible columns.
fn bipartite_candidates(nodes: &[ResolvedNode]) -> Vec<(DeclaredEdge, EdgeKind)> {
    let mut columns: Vec<(usize, Vec<&ResolvedNode>)> = Vec::new();
    for node in nodes.iter().filter(|n| n.role == NodeRole::Primary) {
        match columns.iter_mut().find(|(col, _)| *col == node.position.column) {
            Some((_, members)) => members.push(node),
            None => columns.push((node.position.column, vec![node])),
        }
    }
    columns.sort_by_key(|(col, _)| *col);

    let mut candidates = Vec::new();
    for window in columns.windows(2) {
        let (_, sources) = &window[0];
        let (_, targets) = &window[1];
        for source in sources {
            for target in targets {
                candidates.push((
                    DeclaredEdge::new(source.stage.clone(), target.stage.clone()),
                    EdgeKind::Generated,
                ));
            }
        }
    }
    candidates
}
