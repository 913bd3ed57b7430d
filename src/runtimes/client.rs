//! The telemetry transport seam.
//!
//! Network mechanics live outside this crate; implementors of
//! [`TelemetryClient`] supply the actual fetch/stream plumbing. The session
//! layer consumes the trait and never assumes more than the signatures
//! below.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::telemetry::{DynamicLayout, ExecutionPathRecord, RunRecord, StreamEvent};

/// Failures crossing the telemetry boundary.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("run {0} not found")]
    RunNotFound(Uuid),
    #[error("malformed payload: {0}")]
    Malformed(String),
    /// The backend rejected a retry request for a stage.
    #[error("retry rejected for stage {stage}: {reason}")]
    RetryRejected { stage: String, reason: String },
}

/// Backend access used by [`crate::runtimes::RunSession`].
///
/// All methods take the run id explicitly so implementations stay
/// stateless; the session guards every completion against its own run id.
#[async_trait]
pub trait TelemetryClient: Send + Sync {
    /// Fetch the run record with its embedded stage list.
    async fn fetch_run(&self, run_id: Uuid) -> Result<RunRecord, TelemetryError>;

    /// Fetch the execution-path summary for a run.
    async fn fetch_execution_path(
        &self,
        run_id: Uuid,
    ) -> Result<ExecutionPathRecord, TelemetryError>;

    /// Fetch the optional backend-supplied graph description.
    ///
    /// The default implementation reports none, for backends without the
    /// endpoint.
    async fn fetch_dynamic_layout(
        &self,
        _run_id: Uuid,
    ) -> Result<Option<DynamicLayout>, TelemetryError> {
        Ok(None)
    }

    /// Open the streaming channel for a run.
    async fn subscribe(&self, run_id: Uuid)
    -> Result<flume::Receiver<StreamEvent>, TelemetryError>;

    /// Request a retry of one stage.
    ///
    /// Failures must propagate to the initiator; the session never swallows
    /// them.
    async fn retry_stage(&self, run_id: Uuid, stage: &str) -> Result<(), TelemetryError>;
}
