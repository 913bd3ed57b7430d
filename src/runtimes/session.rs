//! Run session: the I/O boundary around the pure resolution core.
//!
//! A [`RunSession`] owns every asynchronous source for one run — the
//! streaming channel, the periodic execution-path poll, and reconnect
//! re-fetches — and publishes a fresh immutable [`RunSnapshot`] on every
//! telemetry delta. Resolution itself never suspends; consumers feed the
//! published snapshots through [`crate::graphs::ViewCache`] at their own
//! pace.
//!
//! Every stream event is guarded by run-id identity so a stale callback can
//! never write into a newer run's state, and dropping the session aborts
//! the driver task, tearing down the subscription and poll timer
//! completely.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, BoxStream};
use thiserror::Error;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::telemetry::{
    ConnectionHealth, RunSnapshot, StageExecutionRecord, StageMetrics, StageUpdate, StreamEvent,
    first_execution_wins,
};

use super::client::{TelemetryClient, TelemetryError};

/// Timing configuration for a session.
#[derive(Clone, Copy, Debug)]
pub struct SessionConfig {
    /// Interval for polling the execution-path summary while the run is
    /// active.
    pub path_poll_interval: Duration,
    /// Delay between reconnect attempts after a stream failure.
    pub reconnect_backoff: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path_poll_interval: Duration::from_secs(3),
            reconnect_backoff: Duration::from_secs(2),
        }
    }
}

/// Failure starting a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("initial run fetch failed: {0}")]
    InitialFetch(#[from] TelemetryError),
}

/// Live telemetry session for one run.
pub struct RunSession {
    run_id: Uuid,
    client: Arc<dyn TelemetryClient>,
    snapshots: flume::Receiver<Arc<RunSnapshot>>,
    driver: JoinHandle<()>,
}

impl RunSession {
    /// Fetch the initial state and start the background driver.
    ///
    /// The first snapshot is published before this returns, so a consumer
    /// subscribing immediately always sees state.
    pub async fn start(
        client: Arc<dyn TelemetryClient>,
        run_id: Uuid,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let (tx, rx) = flume::unbounded();
        let mut state = SessionState {
            current: RunSnapshot::default(),
        };

        state.current.run = Some(client.fetch_run(run_id).await?);

        match client.fetch_execution_path(run_id).await {
            Ok(path) => state.current.path = Some(path),
            Err(err) => {
                tracing::warn!(run = %run_id, error = %err, "initial path fetch failed");
            }
        }
        match client.fetch_dynamic_layout(run_id).await {
            Ok(layout) => state.current.dynamic_layout = layout,
            Err(err) => {
                tracing::debug!(run = %run_id, error = %err, "no dynamic layout available");
            }
        }

        let stream = match client.subscribe(run_id).await {
            Ok(stream) => Some(stream),
            Err(err) => {
                tracing::warn!(run = %run_id, error = %err, "stream subscribe failed, will retry");
                state.current.connection = ConnectionHealth::Reconnecting;
                None
            }
        };

        state.publish(&tx);

        let driver = tokio::task::spawn(drive(
            Arc::clone(&client),
            run_id,
            config,
            state,
            stream,
            tx,
        ));

        Ok(Self {
            run_id,
            client,
            snapshots: rx,
            driver,
        })
    }

    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Channel of published snapshots, newest last.
    #[must_use]
    pub fn snapshots(&self) -> flume::Receiver<Arc<RunSnapshot>> {
        self.snapshots.clone()
    }

    /// Published snapshots as an async stream, ending when the session
    /// winds down.
    #[must_use]
    pub fn snapshot_stream(&self) -> BoxStream<'static, Arc<RunSnapshot>> {
        let rx = self.snapshots.clone();
        Box::pin(stream::unfold(rx, |rx| async move {
            rx.recv_async().await.ok().map(|snapshot| (snapshot, rx))
        }))
    }

    /// Request a retry of one stage on this session's run.
    ///
    /// Errors propagate to the caller untouched so the initiator can
    /// surface them without losing its selection state.
    pub async fn retry_stage(&self, stage: &str) -> Result<(), TelemetryError> {
        self.client.retry_stage(self.run_id, stage).await
    }
}

impl Drop for RunSession {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

struct SessionState {
    current: RunSnapshot,
}

impl SessionState {
    /// Bump the revision and publish a fresh immutable snapshot.
    fn publish(&mut self, tx: &flume::Sender<Arc<RunSnapshot>>) -> bool {
        self.current.revision += 1;
        tx.send(Arc::new(self.current.clone())).is_ok()
    }

    /// Fold an incremental stage update into the snapshot.
    ///
    /// The delta lands on the stage's primary record wherever it lives —
    /// embedded in the run record, separately fetched, or the synthetic
    /// stream record — so fetched statuses keep moving between poll cycles.
    /// Updates carry no execution id, so fan-out siblings are left alone.
    /// The known-executed set records the stage either way.
    fn apply_update(&mut self, update: &StageUpdate) {
        self.current.known_executed.insert(update.stage.clone());

        let primary_id = self
            .current
            .executions_by_stage()
            .get(update.stage.as_str())
            .and_then(|group| first_execution_wins(group))
            .map(|e| e.id.clone());

        if let Some(id) = primary_id {
            let embedded = self
                .current
                .run
                .iter_mut()
                .flat_map(|r| r.stages.iter_mut());
            if let Some(rec) = embedded
                .chain(self.current.executions.iter_mut())
                .find(|e| e.id == id)
            {
                rec.status = update.status;
                rec.duration_ms = update.duration_ms.or(rec.duration_ms);
                merge_metrics(&mut rec.metrics, &update.metrics);
            }
            return;
        }

        let mut rec =
            StageExecutionRecord::new(update.run_id, update.stage.clone(), update.status);
        rec.id = format!("stream:{}", update.stage);
        rec.started_at = Some(update.at);
        rec.duration_ms = update.duration_ms;
        rec.metrics = update.metrics.clone();
        self.current.executions.push(rec);
    }
}

/// Field-wise metrics merge: a sparse update never wipes values a fetch
/// already delivered.
fn merge_metrics(dst: &mut StageMetrics, src: &StageMetrics) {
    if src.model.is_some() {
        dst.model = src.model.clone();
    }
    dst.cost_usd = src.cost_usd.or(dst.cost_usd);
    dst.prompt_tokens = src.prompt_tokens.or(dst.prompt_tokens);
    dst.completion_tokens = src.completion_tokens.or(dst.completion_tokens);
}

/// Background driver: one task owning the stream, the poll timer, and
/// reconnect attempts. All suspension lives here, never in resolution.
async fn drive(
    client: Arc<dyn TelemetryClient>,
    run_id: Uuid,
    config: SessionConfig,
    mut state: SessionState,
    mut stream: Option<flume::Receiver<StreamEvent>>,
    tx: flume::Sender<Arc<RunSnapshot>>,
) {
    let mut poll = tokio::time::interval(config.path_poll_interval);
    poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        match &stream {
            Some(rx) => {
                tokio::select! {
                    event = rx.recv_async() => match event {
                        Ok(event) => {
                            if event.run_id() != run_id {
                                tracing::warn!(
                                    run = %run_id,
                                    stale = %event.run_id(),
                                    "dropping stream event for a different run"
                                );
                                continue;
                            }
                            match event {
                                StreamEvent::Update(update) => {
                                    state.apply_update(&update);
                                    if !state.publish(&tx) {
                                        return;
                                    }
                                }
                                StreamEvent::Reasoning(step) => {
                                    // Ephemeral; never part of resolution.
                                    tracing::trace!(run = %run_id, stage = %step.stage, "reasoning step");
                                }
                                StreamEvent::Completed(done) => {
                                    final_fetch(&client, run_id, &mut state, done.status).await;
                                    state.publish(&tx);
                                    return;
                                }
                            }
                        }
                        Err(_) => {
                            tracing::warn!(run = %run_id, "stream closed, entering reconnect");
                            stream = None;
                            state.current.connection = ConnectionHealth::Reconnecting;
                            if !state.publish(&tx) {
                                return;
                            }
                        }
                    },
                    _ = poll.tick() => {
                        if !state.current.is_running() {
                            continue;
                        }
                        match client.fetch_execution_path(run_id).await {
                            Ok(path) => {
                                state.current.path = Some(path);
                                state.current.connection = ConnectionHealth::Live;
                            }
                            Err(err) => {
                                // Last-known state stays; only the health
                                // signal degrades.
                                tracing::warn!(run = %run_id, error = %err, "path poll failed");
                                state.current.connection = ConnectionHealth::Reconnecting;
                            }
                        }
                        if !state.publish(&tx) {
                            return;
                        }
                    }
                }
            }
            None => {
                tokio::time::sleep(config.reconnect_backoff).await;
                if let Ok(run) = client.fetch_run(run_id).await {
                    state.current.run = Some(run);
                }
                match client.subscribe(run_id).await {
                    Ok(rx) => {
                        tracing::debug!(run = %run_id, "stream resubscribed");
                        stream = Some(rx);
                        state.current.connection = ConnectionHealth::Live;
                    }
                    Err(err) => {
                        tracing::debug!(run = %run_id, error = %err, "resubscribe failed");
                    }
                }
                if !state.publish(&tx) {
                    return;
                }
                if state.current.run_status().has_concluded() {
                    return;
                }
            }
        }
    }
}

/// One more full fetch after the completion event, then the session winds
/// down.
async fn final_fetch(
    client: &Arc<dyn TelemetryClient>,
    run_id: Uuid,
    state: &mut SessionState,
    final_status: crate::types::RunStatus,
) {
    match client.fetch_run(run_id).await {
        Ok(mut run) => {
            // A lagging read can still report the run as active; the
            // completion event carries the authoritative terminal status.
            if run.status.is_active() {
                run.status = final_status;
            }
            state.current.run = Some(run);
        }
        Err(err) => {
            tracing::warn!(run = %run_id, error = %err, "final run fetch failed");
            if let Some(run) = &mut state.current.run {
                run.status = final_status;
            }
        }
    }
    if let Ok(path) = client.fetch_execution_path(run_id).await {
        state.current.path = Some(path);
    }
    state.current.connection = ConnectionHealth::Live;
}
