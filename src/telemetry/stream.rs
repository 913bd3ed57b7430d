//! Streamed telemetry events.
//!
//! The backend pushes three kinds of events while a run is live. Only
//! [`StreamEvent::Update`] and [`StreamEvent::Completed`] participate in
//! status resolution; reasoning steps are ephemeral display data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{RunStatus, StageStatus};

use super::records::StageMetrics;

/// One event on the run's streaming channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental per-stage update (status, duration, tokens, cost).
    Update(StageUpdate),
    /// Ephemeral reasoning step; never part of status resolution.
    Reasoning(ReasoningStep),
    /// Run finished; the session performs one more full fetch on receipt.
    Completed(RunCompleted),
}

impl StreamEvent {
    pub fn update(run_id: Uuid, stage: impl Into<String>, status: StageStatus) -> Self {
        StreamEvent::Update(StageUpdate {
            run_id,
            stage: stage.into(),
            status,
            duration_ms: None,
            metrics: StageMetrics::default(),
            at: Utc::now(),
        })
    }

    pub fn completed(run_id: Uuid, status: RunStatus) -> Self {
        StreamEvent::Completed(RunCompleted { run_id, status })
    }

    /// The run this event belongs to, for stale-callback guarding.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        match self {
            StreamEvent::Update(u) => u.run_id,
            StreamEvent::Reasoning(r) => r.run_id,
            StreamEvent::Completed(c) => c.run_id,
        }
    }
}

/// Incremental status/metrics update for one stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageUpdate {
    pub run_id: Uuid,
    pub stage: String,
    pub status: StageStatus,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub metrics: StageMetrics,
    #[serde(default = "Utc::now")]
    pub at: DateTime<Utc>,
}

/// A streamed reasoning fragment from an agent stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub run_id: Uuid,
    pub stage: String,
    pub text: String,
    #[serde(default = "Utc::now")]
    pub at: DateTime<Utc>,
}

/// Terminal event carrying the run's final status.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunCompleted {
    pub run_id: Uuid,
    pub status: RunStatus,
}
