//! Dynamic graph construction.
//!
//! Combines the selected topology, the status resolver, and raw telemetry
//! into a renderable node and edge set. The module is organised around
//! [`build_graph`], which runs the column layout and expansion passes in
//! [`builder`], then hands the visible node set to [`edges`] for edge
//! synthesis and visual classification. [`view`] wraps the result in the
//! [`ResolvedView`] artifact consumers hold on to, with a cache keyed by
//! snapshot revision for referential stability.

pub mod builder;
pub mod edges;
pub mod view;

#[cfg(test)]
mod tests;

pub use builder::{GraphBuilder, NodePosition, NodeRole, ResolvedNode, select_node_record};
pub use edges::{EdgeClass, EdgeKind, ResolvedEdge};
pub use view::{ResolvedView, ViewCache, resolve_view};

use crate::registry::Topology;
use crate::resolver::StatusResolver;
use crate::telemetry::RunSnapshot;

/// Build the full node and edge set for one snapshot under one topology.
///
/// Deterministic and idempotent: byte-identical inputs yield byte-identical
/// output, which the graph, timeline, and cluster views all rely on.
#[must_use]
pub fn build_graph(
    topology: &Topology,
    resolver: &StatusResolver<'_>,
    snapshot: &RunSnapshot,
) -> (Vec<ResolvedNode>, Vec<ResolvedEdge>) {
    let built = GraphBuilder::new(topology, resolver, snapshot).build();
    let mut all_edges = edges::synthesize_edges(topology, resolver, snapshot, &built.nodes);
    all_edges.extend(built.chain_edges);
    (built.nodes, all_edges)
}
