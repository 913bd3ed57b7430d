//! # Stagegraph: pipeline run reconciliation and graph construction
//!
//! Stagegraph turns race-prone, partially-stale telemetry about a
//! multi-stage agent pipeline run into one deterministic, renderable graph
//! description. Telemetry arrives piecemeal from overlapping sources —
//! per-stage execution records, an execution-path summary, the run-level
//! record, and a streamed update channel — and the sources may disagree at
//! any instant. The crate's job is to paper over that: select the right
//! topology, resolve exactly one canonical status per stage, expand
//! fan-out and compound stages, and synthesize a traversal-accurate edge
//! set, identically on every pass so the graph, timeline, and cluster
//! views can never drift apart.
//!
//! ## Core Concepts
//!
//! - **Topology**: a fixed named arrangement of stages into ordered
//!   columns, one per pipeline architecture variant ([`registry`])
//! - **Snapshot**: one immutable bundle of everything currently known
//!   about a run ([`telemetry`])
//! - **Resolution**: the priority-ordered collapse of conflicting sources
//!   into one canonical status per stage ([`resolver`])
//! - **View**: the resolved node/edge artifact all consumers render from
//!   ([`graphs`]), plus cluster and timeline regroupings ([`views`])
//! - **Session**: the async boundary that feeds fresh snapshots from a
//!   [`runtimes::TelemetryClient`] implementation ([`runtimes`])
//!
//! Resolution is synchronous, pure, and side-effect-free; all suspension
//! happens in the session layer. No failure in the core is fatal — the
//! worst case is a stale or coarsely-labeled graph, never a crash.
//!
//! ## Quick Start
//!
//! ```
//! use stagegraph::graphs::resolve_view;
//! use stagegraph::registry::TopologyRegistry;
//! use stagegraph::telemetry::{RunRecord, RunSnapshot, StageExecutionRecord};
//! use stagegraph::types::{RunStatus, StageStatus};
//! use uuid::Uuid;
//!
//! let registry = TopologyRegistry::builtin();
//!
//! let run_id = Uuid::new_v4();
//! let snapshot = RunSnapshot::default()
//!     .with_run(RunRecord::new(run_id, RunStatus::Running).with_preset("had"))
//!     .with_executions(vec![
//!         StageExecutionRecord::new(run_id, "zone_planner", StageStatus::Success),
//!         StageExecutionRecord::new(run_id, "game_orchestrator", StageStatus::Running),
//!     ]);
//!
//! let view = resolve_view(&registry, &snapshot);
//! assert_eq!(view.topology_id, "had");
//! // Declared but unexecuted stages still render on specialized topologies.
//! assert_eq!(
//!     view.node("output_orchestrator").unwrap().status,
//!     StageStatus::Pending
//! );
//! ```
//!
//! ## Determinism
//!
//! For a fixed snapshot, every derived artifact is referentially
//! transparent: resolving twice yields byte-identical output, and
//! [`graphs::ViewCache`] returns the same `Arc` for an unchanged snapshot
//! revision. The fan-out primary node always binds to the chronologically
//! first execution ([`telemetry::first_execution_wins`]), and an edge is
//! "traversed" only when literally present in the execution path's
//! traversed-edge set.

pub mod graphs;
pub mod registry;
pub mod resolver;
pub mod runtimes;
pub mod selector;
pub mod telemetry;
pub mod types;
pub mod views;

pub use graphs::{ResolvedEdge, ResolvedNode, ResolvedView, ViewCache, resolve_view};
pub use registry::{ClusterRegistry, TopologyRegistry};
pub use resolver::{ResolvedStatus, StatusResolver};
pub use selector::{SelectedTopology, SelectionSource, select_topology};
pub use telemetry::RunSnapshot;
pub use types::{RunStatus, StageClass, StageStatus};
