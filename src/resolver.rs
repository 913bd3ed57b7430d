//! Canonical status resolution.
//!
//! Several telemetry sources can disagree about a stage at any instant: a
//! direct execution record, the execution-path summary, the run-level
//! status, and the stream-fed known-executed set. [`StatusResolver`] applies
//! one fixed priority order and is the *sole* conflict-resolution contract:
//! every consumer (graph, timeline, cluster, edges) derives the status of a
//! stage through it, so all views agree for the same snapshot by
//! construction.
//!
//! Resolution is pure and referentially transparent: a fixed
//! `(stage, snapshot)` pair always yields the same [`ResolvedStatus`].

use rustc_hash::FxHashMap;

use crate::telemetry::{RunSnapshot, StageExecutionRecord, first_execution_wins};
use crate::types::{RunStatus, StageStatus};

/// The single canonical status assigned to a stage for one render pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedStatus {
    pub status: StageStatus,
    /// Set when the status was inferred from the known-executed set to
    /// paper over a recording gap, rather than read from a record.
    pub is_inferred: bool,
}

impl ResolvedStatus {
    fn direct(status: StageStatus) -> Self {
        Self {
            status,
            is_inferred: false,
        }
    }

    fn inferred(status: StageStatus) -> Self {
        Self {
            status,
            is_inferred: true,
        }
    }
}

/// Priority-ordered status resolution over one snapshot.
///
/// Borrowing the grouped execution map up front keeps repeated per-stage
/// lookups cheap; the resolver itself holds no mutable state.
pub struct StatusResolver<'a> {
    snapshot: &'a RunSnapshot,
    executions: FxHashMap<&'a str, Vec<&'a StageExecutionRecord>>,
}

impl<'a> StatusResolver<'a> {
    #[must_use]
    pub fn new(snapshot: &'a RunSnapshot) -> Self {
        Self {
            executions: snapshot.executions_by_stage(),
            snapshot,
        }
    }

    /// The grouped executions backing this resolver, for reuse by the
    /// graph builder (one grouping pass per refresh).
    #[must_use]
    pub fn executions(&self) -> &FxHashMap<&'a str, Vec<&'a StageExecutionRecord>> {
        &self.executions
    }

    /// The primary execution record for a stage, if any.
    ///
    /// For fan-out stages with several executions this is the
    /// chronologically first one (first-execution-wins), never the latest.
    #[must_use]
    pub fn primary_execution(&self, stage: &str) -> Option<&'a StageExecutionRecord> {
        self.executions
            .get(stage)
            .and_then(|group| first_execution_wins(group))
    }

    /// Resolve the canonical status for a stage name.
    ///
    /// Priority order, first match wins:
    ///
    /// 1. a direct execution record — its status verbatim
    /// 2. presence in the execution path's executed list — inherit
    /// 3. run succeeded, stage unrecorded — `skipped`, unless the stage is
    ///    in the known-executed set, then `success` with `is_inferred`
    /// 4. run failed, stage unrecorded — `skipped`, unless known-executed,
    ///    then `failed` with `is_inferred`
    /// 5. run still active — `pending`
    /// 6. otherwise `pending`
    #[must_use]
    pub fn resolve(&self, stage: &str) -> ResolvedStatus {
        if let Some(primary) = self.primary_execution(stage) {
            return ResolvedStatus::direct(primary.status);
        }

        if let Some(path) = &self.snapshot.path
            && let Some(entry) = path.entry(stage)
        {
            return ResolvedStatus::direct(entry.status);
        }

        let known_executed = self.snapshot.known_executed.contains(stage);
        match self.snapshot.run_status() {
            RunStatus::Success => {
                if known_executed {
                    ResolvedStatus::inferred(StageStatus::Success)
                } else {
                    ResolvedStatus::direct(StageStatus::Skipped)
                }
            }
            RunStatus::Failed => {
                if known_executed {
                    ResolvedStatus::inferred(StageStatus::Failed)
                } else {
                    ResolvedStatus::direct(StageStatus::Skipped)
                }
            }
            _ => ResolvedStatus::direct(StageStatus::Pending),
        }
    }

    /// Whether any telemetry source recorded the stage as executed.
    ///
    /// This feeds the `was_executed` node flag; it deliberately does not
    /// consult the known-executed set, which carries no displayable data.
    #[must_use]
    pub fn was_executed(&self, stage: &str) -> bool {
        if self.executions.contains_key(stage) {
            return true;
        }
        self.snapshot
            .path
            .as_ref()
            .is_some_and(|p| p.entry(stage).is_some())
    }

    /// Resolved retry count: the larger of the path-reported retries and
    /// directly-observed executions minus one.
    #[must_use]
    pub fn retry_count(&self, stage: &str) -> u32 {
        let from_path = self
            .snapshot
            .path
            .as_ref()
            .map(|p| p.retries_for(stage))
            .unwrap_or(0);
        let from_records = self.executions.get(stage).map_or(0, |group| {
            let observed = group.len().saturating_sub(1) as u32;
            let reported = group.iter().map(|e| e.retries).max().unwrap_or(0);
            observed.max(reported)
        });
        from_path.max(from_records)
    }
}
