//! Wire-level telemetry records.
//!
//! These types mirror the JSON payloads produced by the backend: per-stage
//! execution records, the execution-path summary, and the run-level record
//! with its immutable config snapshot. All fields that the backend may omit
//! carry `#[serde(default)]` so partially-populated payloads deserialize
//! rather than fail; the graph layer substitutes ordinal placeholders where
//! display data is missing.
//!
//! Records are plain data. Reconciliation logic lives in
//! [`crate::resolver`] and [`crate::graphs`]; nothing here mutates state.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::types::{RunStatus, StageStatus};

/// Model and spend metrics attached to a stage execution.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StageMetrics {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub cost_usd: Option<f64>,
    #[serde(default)]
    pub prompt_tokens: Option<u64>,
    #[serde(default)]
    pub completion_tokens: Option<u64>,
}

/// One embedded sub-stage of a compound stage execution.
///
/// Compound stages report an ordered list of these; the graph builder
/// expands them into a chain of sub-nodes under the parent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubStageRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub status: StageStatus,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub metrics: StageMetrics,
}

impl SubStageRecord {
    /// Display discriminator: name, then id, then an ordinal placeholder.
    #[must_use]
    pub fn label(&self, ordinal: usize) -> String {
        self.name
            .clone()
            .or_else(|| self.id.clone())
            .unwrap_or_else(|| format!("step {}", ordinal + 1))
    }
}

/// One recorded execution of a pipeline stage.
///
/// Fan-out-capable stages may produce several of these per run with the same
/// `stage` name; see [`crate::telemetry::first_execution_wins`] for how the
/// primary one is chosen.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageExecutionRecord {
    /// Backend identifier for this execution.
    pub id: String,
    pub run_id: Uuid,
    /// Stage name this execution belongs to.
    pub stage: String,
    pub status: StageStatus,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    /// Retries directly observed on this execution.
    #[serde(default)]
    pub retries: u32,
    #[serde(default)]
    pub metrics: StageMetrics,
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub output: Value,
    /// Fan-out discriminators, when the backend supplies them.
    #[serde(default)]
    pub scene_id: Option<String>,
    #[serde(default)]
    pub mechanic_id: Option<String>,
    /// Ordered sub-stages for compound executions.
    #[serde(default)]
    pub sub_stages: Vec<SubStageRecord>,
}

impl StageExecutionRecord {
    /// Create a minimal record; the remaining fields default to empty.
    pub fn new(run_id: Uuid, stage: impl Into<String>, status: StageStatus) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            run_id,
            stage: stage.into(),
            status,
            started_at: None,
            finished_at: None,
            duration_ms: None,
            retries: 0,
            metrics: StageMetrics::default(),
            input: Value::Null,
            output: Value::Null,
            scene_id: None,
            mechanic_id: None,
            sub_stages: Vec::new(),
        }
    }

    pub fn with_started_at(mut self, at: DateTime<Utc>) -> Self {
        self.started_at = Some(at);
        self
    }

    pub fn with_finished_at(mut self, at: DateTime<Utc>) -> Self {
        self.finished_at = Some(at);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_sub_stages(mut self, sub_stages: Vec<SubStageRecord>) -> Self {
        self.sub_stages = sub_stages;
        self
    }

    /// Fan-out discriminator: scene id, then mechanic id, then an ordinal
    /// placeholder. Malformed payloads therefore still label cleanly.
    #[must_use]
    pub fn fan_out_label(&self, ordinal: usize) -> String {
        self.scene_id
            .clone()
            .or_else(|| self.mechanic_id.clone())
            .unwrap_or_else(|| format!("#{}", ordinal + 1))
    }

    /// Reconstruct an execution-record-shaped value for a selected sub-stage.
    ///
    /// Detail consumers downstream expect a [`StageExecutionRecord`]; this
    /// stitches the parent's run identity and timestamps together with the
    /// sub-stage's own status, duration, and metrics so they need no
    /// special-casing for compound stages.
    #[must_use]
    pub fn synthesize_sub_stage(&self, ordinal: usize) -> Option<StageExecutionRecord> {
        let sub = self.sub_stages.get(ordinal)?;
        Some(StageExecutionRecord {
            id: format!("{}::{}", self.id, sub.label(ordinal)),
            run_id: self.run_id,
            stage: format!("{}/{}", self.stage, sub.label(ordinal)),
            status: sub.status,
            started_at: sub.started_at.or(self.started_at),
            finished_at: sub.finished_at.or(self.finished_at),
            duration_ms: sub.duration_ms,
            retries: 0,
            metrics: sub.metrics.clone(),
            input: Value::Null,
            output: Value::Null,
            scene_id: None,
            mechanic_id: None,
            sub_stages: Vec::new(),
        })
    }
}

/// One entry in the execution path's executed-stages list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathStageEntry {
    pub stage: String,
    pub status: StageStatus,
    #[serde(default)]
    pub retries: u32,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

/// A literally-traversed edge between two stages.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraversedEdge {
    pub from: String,
    pub to: String,
}

impl TraversedEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// A conditional decision recorded on the path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionAnnotation {
    pub stage: String,
    pub branch_taken: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Run-level totals reported by the execution-path summary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunTotals {
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub cost_usd: Option<f64>,
    #[serde(default)]
    pub prompt_tokens: Option<u64>,
    #[serde(default)]
    pub completion_tokens: Option<u64>,
}

/// The authoritative record of what one run actually traversed.
///
/// Edge traversal is read *strictly* from `edges_taken`; it is never
/// inferred from both endpoints having succeeded independently.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPathRecord {
    #[serde(default)]
    pub run_id: Option<Uuid>,
    /// Executed stages in traversal order.
    #[serde(default)]
    pub executed: Vec<PathStageEntry>,
    #[serde(default)]
    pub edges_taken: Vec<TraversedEdge>,
    #[serde(default)]
    pub decisions: Vec<DecisionAnnotation>,
    /// Per-stage retry aggregates across the whole run.
    #[serde(default)]
    pub retries: FxHashMap<String, u32>,
    #[serde(default)]
    pub totals: RunTotals,
}

impl ExecutionPathRecord {
    /// Look up the path entry for a stage name, if it was executed.
    #[must_use]
    pub fn entry(&self, stage: &str) -> Option<&PathStageEntry> {
        self.executed.iter().find(|e| e.stage == stage)
    }

    /// Path-reported retry count for a stage: the larger of the aggregate
    /// map and the per-entry count.
    #[must_use]
    pub fn retries_for(&self, stage: &str) -> u32 {
        let aggregate = self.retries.get(stage).copied().unwrap_or(0);
        let entry = self.entry(stage).map(|e| e.retries).unwrap_or(0);
        aggregate.max(entry)
    }

    /// The decision annotation recorded for a stage, if any.
    #[must_use]
    pub fn decision_for(&self, stage: &str) -> Option<&DecisionAnnotation> {
        self.decisions.iter().find(|d| d.stage == stage)
    }
}

/// Immutable configuration snapshot captured when the run started.
///
/// Config does not change mid-run, so topology selection based on it is
/// effectively final once the run record has been fetched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Explicit topology/preset identifier, when the run declared one.
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub extra: Value,
}

/// Run-level record with the embedded stage list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub status: RunStatus,
    #[serde(default)]
    pub config: RunConfig,
    #[serde(default)]
    pub stages: Vec<StageExecutionRecord>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RunRecord {
    pub fn new(id: Uuid, status: RunStatus) -> Self {
        Self {
            id,
            status,
            config: RunConfig::default(),
            stages: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.config.preset = Some(preset.into());
        self
    }

    pub fn with_stages(mut self, stages: Vec<StageExecutionRecord>) -> Self {
        self.stages = stages;
        self
    }
}

/// Backend-supplied dynamic graph description.
///
/// Only node display metadata and a candidate layout: it never overrides
/// resolved status, and it only wins topology selection when neither an
/// explicit preset nor a signature match applies.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamicLayout {
    /// Ordered columns of stage names.
    #[serde(default)]
    pub columns: Vec<Vec<String>>,
    /// Backend edge list, used verbatim for the default topology.
    #[serde(default)]
    pub edges: Vec<TraversedEdge>,
    /// Per-stage display metadata.
    #[serde(default)]
    pub display: FxHashMap<String, NodeDisplay>,
}

/// Display metadata for a single node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDisplay {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}
