//! Core types for the stagegraph reconciliation engine.
//!
//! This module defines the fundamental vocabulary used throughout the crate:
//! the status enums shared by every telemetry source and the stage
//! classification scheme that drives node shape and color downstream.
//!
//! # Key Types
//!
//! - [`StageStatus`]: per-stage execution status as reported by telemetry
//! - [`RunStatus`]: aggregate status of a whole pipeline run
//! - [`StageClass`]: structural classification of a stage within a topology
//!
//! Classification is *declared* in the topology registry wherever possible;
//! [`classify_stage_name`] is the single heuristic fallback for names the
//! registry does not know.
//!
//! # Examples
//!
//! ```rust
//! use stagegraph::types::{StageStatus, StageClass, classify_stage_name};
//!
//! assert!(StageStatus::Success.is_terminal());
//! assert_eq!(classify_stage_name("balance_validator"), StageClass::Decision);
//! assert_eq!(StageClass::Merge.color(), "#8b5cf6");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution status of a single pipeline stage.
///
/// This is the shared status vocabulary across all telemetry sources
/// (stage execution records, execution-path entries, stream updates).
/// The [`crate::resolver`] collapses conflicting reports into exactly one
/// canonical `StageStatus` per stage per resolution pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Not yet started (or not yet observed).
    #[default]
    Pending,
    /// Currently executing.
    Running,
    /// Completed successfully.
    Success,
    /// Completed with a failure.
    Failed,
    /// Deliberately not executed on the taken path.
    Skipped,
    /// Completed, but with quality or partial-result caveats.
    Degraded,
}

impl StageStatus {
    /// Returns `true` once the stage can no longer change status on its own.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::Failed | Self::Skipped | Self::Degraded
        )
    }

    /// Returns `true` while the stage is doing (or waiting to do) work.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Degraded => "degraded",
        };
        write!(f, "{s}")
    }
}

/// Aggregate status of an entire pipeline run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Success,
    Failed,
    Cancelled,
    /// Paused at a human checkpoint stage awaiting approval.
    AwaitingReview,
}

impl RunStatus {
    /// Returns `true` while the run may still produce new telemetry.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Running | Self::AwaitingReview)
    }

    /// Returns `true` once the run has reached a final state.
    #[must_use]
    pub fn has_concluded(&self) -> bool {
        !self.is_active()
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::AwaitingReview => "awaiting_review",
        };
        write!(f, "{s}")
    }
}

/// Structural classification of a stage within a topology.
///
/// Classification affects node shape and the fixed category color; it never
/// affects status resolution. Stages present in the active topology carry an
/// explicit class from the registry; unknown names fall back to
/// [`classify_stage_name`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageClass {
    /// Ordinary agent stage doing a unit of pipeline work.
    Agent,
    /// Routing or gate node rendered as a diamond.
    Decision,
    /// Coordinator stage driving other stages.
    Orchestrator,
    /// Synchronization barrier joining fan-out results.
    Merge,
    /// Stage that may execute more than once per run (parallel workers).
    FanOut,
}

impl StageClass {
    /// Fixed category color, independent of resolved status.
    ///
    /// The mapping is deliberately static so that a stage keeps its color
    /// across refreshes regardless of what happened to it.
    #[must_use]
    pub fn color(&self) -> &'static str {
        match self {
            Self::Agent => "#3b82f6",
            Self::Decision => "#f59e0b",
            Self::Orchestrator => "#10b981",
            Self::Merge => "#8b5cf6",
            Self::FanOut => "#06b6d4",
        }
    }
}

impl fmt::Display for StageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Agent => "agent",
            Self::Decision => "decision",
            Self::Orchestrator => "orchestrator",
            Self::Merge => "merge",
            Self::FanOut => "fan_out",
        };
        write!(f, "{s}")
    }
}

/// Classify a stage name that the active topology registry does not declare.
///
/// This is the *only* name-based classification heuristic in the crate;
/// every caller that meets an unknown stage name routes through here so the
/// rules live in one place. Checks run in order:
///
/// 1. names containing `merge`, `barrier`, or `join` are [`StageClass::Merge`]
/// 2. names containing `validator`, `router`, or `decision` are
///    [`StageClass::Decision`]
/// 3. names containing `orchestrator` are [`StageClass::Orchestrator`]
/// 4. anything else is [`StageClass::Agent`]
///
/// Note: treating every `*validator*` as a decision diamond conflates
/// pass/fail gates with true routing decisions. The upstream intent is
/// ambiguous, so the rule is preserved as-is rather than reclassified; the
/// merge check running first keeps merge barriers out of it.
#[must_use]
pub fn classify_stage_name(name: &str) -> StageClass {
    let lowered = name.to_ascii_lowercase();
    if ["merge", "barrier", "join"]
        .iter()
        .any(|m| lowered.contains(m))
    {
        StageClass::Merge
    } else if ["validator", "router", "decision"]
        .iter()
        .any(|m| lowered.contains(m))
    {
        StageClass::Decision
    } else if lowered.contains("orchestrator") {
        StageClass::Orchestrator
    } else {
        StageClass::Agent
    }
}
