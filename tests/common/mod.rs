//! Shared fixtures for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use stagegraph::telemetry::{
    ExecutionPathRecord, PathStageEntry, RunRecord, RunSnapshot, StageExecutionRecord,
    TraversedEdge,
};
use stagegraph::types::{RunStatus, StageStatus};

/// Install a test subscriber honoring `RUST_LOG`; safe to call repeatedly.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn ts(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 1, hour, minute, 0).unwrap()
}

pub fn exec(run_id: Uuid, stage: &str, status: StageStatus) -> StageExecutionRecord {
    StageExecutionRecord::new(run_id, stage, status)
}

pub fn exec_at(run_id: Uuid, stage: &str, id: &str, hour: u32) -> StageExecutionRecord {
    let mut rec = exec(run_id, stage, StageStatus::Success);
    rec.id = id.to_string();
    rec.started_at = Some(ts(hour, 0));
    rec
}

pub fn path_entry(stage: &str, status: StageStatus) -> PathStageEntry {
    PathStageEntry {
        stage: stage.to_string(),
        status,
        retries: 0,
        duration_ms: None,
        started_at: None,
        finished_at: None,
    }
}

pub fn path_with_edges(edges: &[(&str, &str)]) -> ExecutionPathRecord {
    let mut path = ExecutionPathRecord::default();
    path.edges_taken = edges
        .iter()
        .map(|(from, to)| TraversedEdge::new(*from, *to))
        .collect();
    path
}

pub fn running_snapshot(run_id: Uuid) -> RunSnapshot {
    RunSnapshot::default().with_run(RunRecord::new(run_id, RunStatus::Running))
}
