use super::handle::SchedulerHandle;
use super::{SchedulerConfig, SchedulerState};
use crate::buffer::EventBuffer;
use crate::domain::Session;
use crate::sender::{EventTransport, SharedEndpoint};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Outcome of one drain-and-deliver cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub drained: usize,
    pub delivered: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

/// Drains the buffer once per interval and delivers the drained events in order.
///
/// Runs as a single background task: cycles never overlap, the first cycle
/// starts immediately, and the next one starts `flush_interval` after the
/// previous one ended, whatever the delivery results were.
pub struct FlushScheduler<T: EventTransport> {
    buffer: Arc<EventBuffer>,
    transport: Arc<T>,
    session: Session,
    endpoint: SharedEndpoint,
    config: SchedulerConfig,
    state_tx: watch::Sender<SchedulerState>,
    cycles: Arc<AtomicU64>,
}

impl<T: EventTransport> FlushScheduler<T> {
    pub fn new(
        buffer: Arc<EventBuffer>,
        transport: Arc<T>,
        session: Session,
        endpoint: SharedEndpoint,
        config: SchedulerConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(SchedulerState::Idle);

        Self {
            buffer,
            transport,
            session,
            endpoint,
            config,
            state_tx,
            cycles: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Start the worker on `runtime`. The first cycle runs without delay.
    pub fn spawn(self, runtime: &Handle) -> SchedulerHandle {
        let cancel = CancellationToken::new();
        let state_rx = self.state_tx.subscribe();
        let cycles = Arc::clone(&self.cycles);

        let worker_cancel = cancel.clone();
        let join = runtime.spawn(async move {
            self.run(worker_cancel).await;
        });

        SchedulerHandle::new(cancel, join, state_rx, cycles)
    }

    async fn run(self, cancel: CancellationToken) {
        info!(
            "Starting flush worker (interval={:?}, capacity={})",
            self.config.flush_interval,
            self.buffer.capacity()
        );

        loop {
            self.run_cycle().await;

            // Stop is only observed between cycles; a running cycle always completes.
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.flush_interval) => {}
            }
        }

        if self.config.flush_on_shutdown {
            let report = self.run_cycle().await;
            info!(
                "Final flush delivered {}/{} events",
                report.delivered, report.drained
            );
        }

        self.state_tx.send_replace(SchedulerState::Stopped);
        info!("Flush worker stopped after {} cycles", self.cycles());
    }

    /// Drain the buffer and attempt delivery of every drained event, oldest first.
    pub async fn run_cycle(&self) -> CycleReport {
        self.state_tx.send_replace(SchedulerState::Flushing);
        let start = Instant::now();

        let events = self.buffer.drain_all();
        let mut report = CycleReport {
            drained: events.len(),
            ..CycleReport::default()
        };

        for event in &events {
            let endpoint = self.endpoint.get();
            let attempt = AssertUnwindSafe(self.transport.deliver(event, &self.session, &endpoint))
                .catch_unwind()
                .await;

            match attempt {
                Ok(Ok(_receipt)) => report.delivered += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    warn!(
                        event_id = %event.id(),
                        category = event.category(),
                        "Dropping event after failed delivery to {}: {}",
                        endpoint,
                        e
                    );
                }
                Err(_) => {
                    report.failed += 1;
                    error!(
                        event_id = %event.id(),
                        category = event.category(),
                        "Event transport panicked, dropping event"
                    );
                }
            }
        }

        report.elapsed = start.elapsed();
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.state_tx.send_replace(SchedulerState::Idle);

        if report.drained > 0 {
            info!(
                "Flush cycle sent {} events ({} failed) in {:?}",
                report.delivered, report.failed, report.elapsed
            );
        } else {
            debug!("Flush cycle found no events");
        }

        report
    }
}
