use super::{SchedulerError, SchedulerState};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Owner-side handle to a running flush worker.
#[derive(Debug)]
pub struct SchedulerHandle {
    cancel: CancellationToken,
    // None once the worker has been joined
    join: Option<JoinHandle<()>>,
    state: watch::Receiver<SchedulerState>,
    cycles: Arc<AtomicU64>,
}

impl SchedulerHandle {
    pub(super) fn new(
        cancel: CancellationToken,
        join: JoinHandle<()>,
        state: watch::Receiver<SchedulerState>,
        cycles: Arc<AtomicU64>,
    ) -> Self {
        Self {
            cancel,
            join: Some(join),
            state,
            cycles,
        }
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Watch state transitions (Idle / Flushing / Stopped).
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.clone()
    }

    /// Number of completed flush cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    pub(crate) fn cycle_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.cycles)
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Signal the worker to stop and wait for it, including its final flush.
    ///
    /// On `ShutdownTimeout` the worker is still running and still owned by
    /// this handle; calling `stop` again keeps waiting for it.
    pub async fn stop(&mut self, timeout: Duration) -> Result<(), SchedulerError> {
        info!("Stopping flush worker...");
        self.cancel.cancel();

        let Some(join) = self.join.as_mut() else {
            return Ok(());
        };

        match tokio::time::timeout(timeout, join).await {
            Ok(result) => {
                self.join = None;
                result.map_err(|e| {
                    error!("Flush worker terminated abnormally: {}", e);
                    SchedulerError::WorkerFailed(e.to_string())
                })
            }
            Err(_) => {
                error!("Flush worker did not stop within {:?}", timeout);
                Err(SchedulerError::ShutdownTimeout)
            }
        }
    }
}
