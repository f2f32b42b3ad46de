//! Background persistence of cleaning runs.
//!
//! Lifecycle transitions apply locally first and hand the resulting run to
//! a single writer task. Writes reach the remote store in submission order,
//! so a late step update can never overwrite a terminal status. A failed
//! write raises an alert and is not retried.

use std::sync::Arc;

use cleanflow_contracts::{Alert, AlertSink, GatewayResult, RemoteStore};
use cleanflow_model::CleaningRun;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use crate::alerts::titles;

/// Transition that produced a write, used for logging and alert wording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteIntent {
    Start,
    StepUpdate,
    Annotation,
    Completion,
    Cancellation,
}

impl WriteIntent {
    fn failure_alert(&self, area: &str, err: &dyn std::fmt::Display) -> Alert {
        match self {
            WriteIntent::Start => Alert::new(
                titles::SAVE_FAILED,
                format!("Could not save the new run for {}: {err}", area),
            ),
            WriteIntent::StepUpdate | WriteIntent::Annotation => Alert::new(
                titles::SAVE_FAILED,
                format!("Step progress for {} was not saved: {err}", area),
            ),
            WriteIntent::Completion => Alert::new(
                titles::RUN_COMPLETION_FAILED,
                format!(
                    "The run for {} is complete on this device but was not saved: {err}",
                    area
                ),
            ),
            WriteIntent::Cancellation => Alert::new(
                titles::SAVE_FAILED,
                format!("The cancelled run for {} was not saved: {err}", area),
            ),
        }
    }
}

enum WriteCommand {
    Save {
        run: CleaningRun,
        intent: WriteIntent,
        ack: Option<oneshot::Sender<GatewayResult<()>>>,
    },
    Flush(oneshot::Sender<()>),
}

/// Handle to the writer task. Cloning shares the same ordered queue.
#[derive(Clone)]
pub struct RunWriter {
    sender: mpsc::UnboundedSender<WriteCommand>,
}

impl std::fmt::Debug for RunWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunWriter")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

impl RunWriter {
    /// Spawn the writer task on the current runtime. The task ends once
    /// every handle is dropped and the queue is drained.
    pub fn spawn(store: Arc<dyn RemoteStore>, alerts: Arc<dyn AlertSink>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(store, alerts, receiver));
        Self { sender }
    }

    /// Queue a write without waiting for it.
    pub fn submit(&self, run: CleaningRun, intent: WriteIntent) {
        self.enqueue(run, intent, None);
    }

    /// Queue a write and wait for the store's answer. Failures are alerted
    /// by the writer either way.
    pub async fn save_and_wait(
        &self,
        run: CleaningRun,
        intent: WriteIntent,
    ) -> GatewayResult<()> {
        let (ack, outcome) = oneshot::channel();
        self.enqueue(run, intent, Some(ack));
        outcome.await.unwrap_or_else(|_| {
            Err(cleanflow_contracts::GatewayError::Internal(
                "run writer stopped before acknowledging".into(),
            ))
        })
    }

    /// Resolve once every write queued before this call has finished.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.sender.send(WriteCommand::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    fn enqueue(
        &self,
        run: CleaningRun,
        intent: WriteIntent,
        ack: Option<oneshot::Sender<GatewayResult<()>>>,
    ) {
        let run_id = run.id;
        if self
            .sender
            .send(WriteCommand::Save { run, intent, ack })
            .is_err()
        {
            error!(%run_id, ?intent, "run writer is gone, write dropped");
        }
    }
}

async fn run_writer(
    store: Arc<dyn RemoteStore>,
    alerts: Arc<dyn AlertSink>,
    mut receiver: mpsc::UnboundedReceiver<WriteCommand>,
) {
    while let Some(command) = receiver.recv().await {
        match command {
            WriteCommand::Save { run, intent, ack } => {
                let run_id = run.id;
                let area = run.area_name.clone();
                let outcome = store.save_cleaning_run(run).await;
                match &outcome {
                    Ok(()) => debug!(%run_id, ?intent, "run saved"),
                    Err(err) => {
                        error!(%run_id, ?intent, error = %err, "failed to save run");
                        alerts.raise(intent.failure_alert(&area, err));
                    }
                }
                if let Some(ack) = ack {
                    let _ = ack.send(outcome);
                }
            }
            WriteCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("run writer stopped");
}
