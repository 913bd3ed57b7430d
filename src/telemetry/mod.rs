//! Telemetry input model: wire records, stream events, and immutable
//! snapshots.
//!
//! Everything the reconciliation engine consumes enters through this module.
//! The records mirror backend JSON payloads; [`RunSnapshot`] bundles one
//! consistent-enough view of them for a single resolution pass.

pub mod records;
pub mod snapshot;
pub mod stream;

pub use records::{
    DecisionAnnotation, DynamicLayout, ExecutionPathRecord, NodeDisplay, PathStageEntry,
    RunConfig, RunRecord, RunTotals, StageExecutionRecord, StageMetrics, SubStageRecord,
    TraversedEdge,
};
pub use snapshot::{ConnectionHealth, RunSnapshot, execution_order, first_execution_wins};
pub use stream::{ReasoningStep, RunCompleted, StageUpdate, StreamEvent};
