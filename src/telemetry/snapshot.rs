//! Immutable telemetry snapshots.
//!
//! A [`RunSnapshot`] bundles everything the reconciliation engine consumes
//! in one pass: the run record, the raw execution list, the execution-path
//! summary, the known-executed set, and the optional backend layout. The
//! sources refresh at independent cadences and may be mutually inconsistent
//! at any instant; resolution papers over that rather than assuming
//! consistency, so a snapshot is never mutated — every refresh produces a
//! brand-new one with a bumped revision.

use std::cmp::Ordering;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::types::RunStatus;

use super::records::{
    DynamicLayout, ExecutionPathRecord, RunRecord, StageExecutionRecord,
};

/// Health of the telemetry connection feeding this snapshot.
///
/// `Reconnecting` signals that the stream dropped and the session is
/// re-fetching periodically; the snapshot itself still carries the last
/// known good data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionHealth {
    #[default]
    Live,
    Reconnecting,
}

/// One immutable view of everything known about a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSnapshot {
    /// Monotonically increasing per-session revision.
    pub revision: u64,
    pub run: Option<RunRecord>,
    /// Raw execution records in arbitrary arrival order.
    pub executions: Vec<StageExecutionRecord>,
    pub path: Option<ExecutionPathRecord>,
    /// Stage names seen in any stream update; feeds the resolver's
    /// recording-gap inference.
    pub known_executed: FxHashSet<String>,
    pub dynamic_layout: Option<DynamicLayout>,
    pub connection: ConnectionHealth,
}

impl RunSnapshot {
    pub fn with_run(mut self, run: RunRecord) -> Self {
        self.run = Some(run);
        self
    }

    pub fn with_executions(mut self, executions: Vec<StageExecutionRecord>) -> Self {
        self.executions = executions;
        self
    }

    pub fn with_path(mut self, path: ExecutionPathRecord) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_known_executed<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_executed = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_dynamic_layout(mut self, layout: DynamicLayout) -> Self {
        self.dynamic_layout = Some(layout);
        self
    }

    /// Run status, defaulting to pending before the run record arrives.
    #[must_use]
    pub fn run_status(&self) -> RunStatus {
        self.run.as_ref().map(|r| r.status).unwrap_or(RunStatus::Pending)
    }

    /// Whether the run may still produce telemetry.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.run_status().is_active()
    }

    /// All execution records: the embedded run-record list plus anything
    /// delivered separately, without deduplication (grouping handles that).
    pub fn all_executions(&self) -> impl Iterator<Item = &StageExecutionRecord> {
        self.run
            .iter()
            .flat_map(|r| r.stages.iter())
            .chain(self.executions.iter())
    }

    /// Group executions by stage name, each group sorted chronologically.
    ///
    /// Group order within a vec follows [`execution_order`], so index 0 is
    /// always the fan-out primary (see [`first_execution_wins`]).
    #[must_use]
    pub fn executions_by_stage(&self) -> FxHashMap<&str, Vec<&StageExecutionRecord>> {
        let mut by_stage: FxHashMap<&str, Vec<&StageExecutionRecord>> = FxHashMap::default();
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for exec in self.all_executions() {
            // Embedded and separately-fetched copies of the same execution
            // id count once.
            if !seen.insert(exec.id.as_str()) {
                continue;
            }
            by_stage.entry(exec.stage.as_str()).or_default().push(exec);
        }
        for group in by_stage.values_mut() {
            group.sort_by(|a, b| execution_order(a, b));
        }
        by_stage
    }

    /// Every stage name observed anywhere in telemetry.
    #[must_use]
    pub fn observed_stage_names(&self) -> FxHashSet<&str> {
        let mut names: FxHashSet<&str> = self.all_executions().map(|e| e.stage.as_str()).collect();
        if let Some(path) = &self.path {
            names.extend(path.executed.iter().map(|e| e.stage.as_str()));
        }
        names
    }

    /// Set of literally-traversed edges, keyed by `(from, to)`.
    #[must_use]
    pub fn edges_taken(&self) -> FxHashSet<(&str, &str)> {
        self.path
            .iter()
            .flat_map(|p| p.edges_taken.iter())
            .map(|e| (e.from.as_str(), e.to.as_str()))
            .collect()
    }

    /// Explicit preset id from the run's immutable config, if declared.
    #[must_use]
    pub fn preset(&self) -> Option<&str> {
        self.run.as_ref()?.config.preset.as_deref()
    }
}

/// Chronological ordering for executions of the same stage.
///
/// Timestamped executions sort before untimestamped ones; ties break on the
/// execution id so the order is total and stable across refreshes.
#[must_use]
pub fn execution_order(a: &StageExecutionRecord, b: &StageExecutionRecord) -> Ordering {
    match (a.started_at, b.started_at) {
        (Some(ta), Some(tb)) => ta.cmp(&tb).then_with(|| a.id.cmp(&b.id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    }
}

/// First-execution-wins: the primary record among a fan-out stage's
/// executions is the *chronologically first* one.
///
/// This is a distinct rule from the last-write-wins map construction used
/// for ordinary stages. Binding the primary node to the earliest execution
/// keeps the diagram stable across re-renders no matter what order records
/// arrive in; conflating the two rules is an easy mistake when extending the
/// stage set, hence the dedicated name.
#[must_use]
pub fn first_execution_wins<'a>(
    executions: &[&'a StageExecutionRecord],
) -> Option<&'a StageExecutionRecord> {
    executions
        .iter()
        .copied()
        .min_by(|a, b| execution_order(a, b))
}
