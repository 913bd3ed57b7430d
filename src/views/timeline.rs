//! Timeline view: the resolved stages flattened into chronological order.
//!
//! When the execution path is present the timeline follows it exactly,
//! preserving actual branch choices and annotating the decision taken at
//! each recorded decision point. Without a path it falls back to declared
//! stage order under the same visibility policy as the graph.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::registry::Topology;
use crate::resolver::StatusResolver;
use crate::telemetry::RunSnapshot;
use crate::types::StageStatus;

/// One row of the timeline.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub stage: String,
    pub status: StageStatus,
    pub is_inferred: bool,
    pub retries: u32,
    pub duration_ms: Option<u64>,
    pub started_at: Option<DateTime<Utc>>,
    /// Branch annotation when this stage was a recorded decision point.
    pub decision: Option<String>,
}

/// Flatten the run into chronological timeline entries.
#[must_use]
pub fn timeline_entries(
    topology: &Topology,
    resolver: &StatusResolver<'_>,
    snapshot: &RunSnapshot,
) -> Vec<TimelineEntry> {
    if let Some(path) = &snapshot.path
        && !path.executed.is_empty()
    {
        return path
            .executed
            .iter()
            .map(|entry| {
                let resolved = resolver.resolve(&entry.stage);
                TimelineEntry {
                    stage: entry.stage.clone(),
                    status: resolved.status,
                    is_inferred: resolved.is_inferred,
                    retries: resolver.retry_count(&entry.stage),
                    duration_ms: entry.duration_ms,
                    started_at: entry.started_at,
                    decision: path
                        .decision_for(&entry.stage)
                        .map(|d| d.branch_taken.clone()),
                }
            })
            .collect();
    }

    // No path yet: declared order, same visibility policy as the graph.
    topology
        .declared_stages()
        .into_iter()
        .filter(|stage| topology.render_all || resolver.was_executed(stage))
        .map(|stage| {
            let resolved = resolver.resolve(stage);
            let exec = resolver.primary_execution(stage);
            TimelineEntry {
                stage: stage.to_string(),
                status: resolved.status,
                is_inferred: resolved.is_inferred,
                retries: resolver.retry_count(stage),
                duration_ms: exec.and_then(|e| e.duration_ms),
                started_at: exec.and_then(|e| e.started_at),
                decision: None,
            }
        })
        .collect()
}
