//! Cluster view: the resolved stage list partitioned by the fixed cluster
//! registry, with one aggregate status per cluster.

use serde::Serialize;

use crate::registry::ClusterRegistry;
use crate::resolver::StatusResolver;
use crate::types::StageStatus;

/// One member stage of a cluster with its canonical status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClusterMember {
    pub stage: String,
    pub status: StageStatus,
    pub is_inferred: bool,
}

/// A cluster with its aggregate status and resolved members.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClusterSummary {
    pub id: String,
    pub label: String,
    pub color: String,
    pub status: StageStatus,
    pub members: Vec<ClusterMember>,
}

/// Partition the resolved stages into cluster summaries.
///
/// Aggregate status rule: running if any member is running; else failed if
/// any failed; else degraded if any degraded; else success if every member
/// is success or skipped; else pending.
#[must_use]
pub fn cluster_summaries(
    clusters: &ClusterRegistry,
    resolver: &StatusResolver<'_>,
) -> Vec<ClusterSummary> {
    clusters
        .clusters()
        .iter()
        .map(|cluster| {
            let members: Vec<ClusterMember> = cluster
                .stages
                .iter()
                .map(|stage| {
                    let resolved = resolver.resolve(stage);
                    ClusterMember {
                        stage: stage.clone(),
                        status: resolved.status,
                        is_inferred: resolved.is_inferred,
                    }
                })
                .collect();
            ClusterSummary {
                id: cluster.id.clone(),
                label: cluster.label.clone(),
                color: cluster.color.clone(),
                status: aggregate(&members),
                members,
            }
        })
        .collect()
}

fn aggregate(members: &[ClusterMember]) -> StageStatus {
    let any = |status: StageStatus| members.iter().any(|m| m.status == status);
    if any(StageStatus::Running) {
        StageStatus::Running
    } else if any(StageStatus::Failed) {
        StageStatus::Failed
    } else if any(StageStatus::Degraded) {
        StageStatus::Degraded
    } else if !members.is_empty()
        && members
            .iter()
            .all(|m| matches!(m.status, StageStatus::Success | StageStatus::Skipped))
    {
        StageStatus::Success
    } else {
        StageStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{RunRecord, RunSnapshot, StageExecutionRecord};
    use crate::types::RunStatus;
    use uuid::Uuid;

    fn snapshot(stages: &[(&str, StageStatus)], run: RunStatus) -> RunSnapshot {
        RunSnapshot::default()
            .with_run(RunRecord::new(Uuid::nil(), run))
            .with_executions(
                stages
                    .iter()
                    .map(|(name, status)| StageExecutionRecord::new(Uuid::nil(), *name, *status))
                    .collect(),
            )
    }

    fn summary_for<'a>(summaries: &'a [ClusterSummary], id: &str) -> &'a ClusterSummary {
        summaries.iter().find(|c| c.id == id).unwrap()
    }

    #[test]
    fn running_member_dominates() {
        let snapshot = snapshot(
            &[
                ("intake", StageStatus::Success),
                ("concept_planner", StageStatus::Running),
            ],
            RunStatus::Running,
        );
        let resolver = StatusResolver::new(&snapshot);
        let summaries = cluster_summaries(&ClusterRegistry::builtin(), &resolver);
        assert_eq!(
            summary_for(&summaries, "planning").status,
            StageStatus::Running
        );
    }

    #[test]
    fn failed_beats_degraded() {
        let snapshot = snapshot(
            &[
                ("balance_validator", StageStatus::Failed),
                ("playtest_validator", StageStatus::Degraded),
                ("human_review", StageStatus::Skipped),
            ],
            RunStatus::Failed,
        );
        let resolver = StatusResolver::new(&snapshot);
        let summaries = cluster_summaries(&ClusterRegistry::builtin(), &resolver);
        assert_eq!(
            summary_for(&summaries, "validation").status,
            StageStatus::Failed
        );
    }

    #[test]
    fn success_and_skipped_aggregate_to_success() {
        // Run concluded: everything unrecorded resolves to skipped, so a
        // cluster with one success and the rest skipped reads success.
        let snapshot = snapshot(
            &[("output_orchestrator", StageStatus::Success)],
            RunStatus::Success,
        );
        let resolver = StatusResolver::new(&snapshot);
        let summaries = cluster_summaries(&ClusterRegistry::builtin(), &resolver);
        assert_eq!(
            summary_for(&summaries, "delivery").status,
            StageStatus::Success
        );
    }

    #[test]
    fn active_run_with_no_telemetry_is_pending() {
        let snapshot = snapshot(&[], RunStatus::Running);
        let resolver = StatusResolver::new(&snapshot);
        let summaries = cluster_summaries(&ClusterRegistry::builtin(), &resolver);
        assert!(summaries.iter().all(|c| c.status == StageStatus::Pending));
    }
}
