pub mod config;
pub mod logging_system;
pub mod shutdown;
pub mod tracker;

pub use config::{Cli, ConfigError, DEFAULT_ENDPOINT, LogLevel, TrackerConfig};
pub use logging_system::{LoggingError, LoggingSystem, setup_logging};
pub use shutdown::{ShutdownReason, wait_for_signal};
pub use tracker::{EventTracker, TrackerMetrics};

use crate::domain::{Payload, TrackerError};
use crate::sender::EventTransport;
use serde::Deserialize;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info, warn};

/// One line of host input: `{"event": "...", "data": {...}}`.
#[derive(Debug, Deserialize)]
struct InputEvent {
    event: String,
    #[serde(default)]
    data: Payload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub tracked: u64,
    pub rejected: u64,
    pub reason: ShutdownReason,
}

/// Demo host: feeds newline-delimited JSON events into a tracker until the
/// input ends or the process is asked to stop.
pub struct App<T: EventTransport = crate::sender::EventTransmitter> {
    tracker: Arc<EventTracker<T>>,
    api_key: String,
    device_uid: String,
}

impl App {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let tracker = EventTracker::new(cli.config)?;
        Ok(Self::with_tracker(tracker, cli.api_key, cli.device_uid))
    }
}

impl<T: EventTransport> App<T> {
    pub fn with_tracker(
        tracker: EventTracker<T>,
        api_key: impl Into<String>,
        device_uid: impl Into<String>,
    ) -> Self {
        Self {
            tracker: Arc::new(tracker),
            api_key: api_key.into(),
            device_uid: device_uid.into(),
        }
    }

    pub fn tracker(&self) -> Arc<EventTracker<T>> {
        Arc::clone(&self.tracker)
    }

    pub async fn run(self) -> Result<RunSummary, TrackerError> {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        self.run_with_input(stdin).await
    }

    pub async fn run_with_input<R>(self, input: R) -> Result<RunSummary, TrackerError>
    where
        R: AsyncBufRead + Unpin,
    {
        self.tracker.initialize(&*self.api_key, &*self.device_uid)?;
        info!("Starting rask-event-tracker v{}", crate::VERSION);

        let mut tracked = 0u64;
        let mut rejected = 0u64;
        let mut lines = input.lines();

        let signal = wait_for_signal();
        tokio::pin!(signal);

        let reason = loop {
            tokio::select! {
                reason = &mut signal => break reason,
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match self.track_line(&line) {
                            Ok(()) => tracked += 1,
                            Err(e) => {
                                rejected += 1;
                                warn!("Skipping input line: {}", e);
                            }
                        }
                    }
                    Ok(None) => break ShutdownReason::EndOfInput,
                    Err(e) => {
                        error!("Failed to read input: {}", e);
                        break ShutdownReason::EndOfInput;
                    }
                },
            }
        };

        self.tracker.shutdown().await?;

        let metrics = self.tracker.metrics();
        info!(
            "Stopped after {}: tracked={}, rejected={}, cycles={}",
            reason, tracked, rejected, metrics.cycles
        );
        if let Some(delivery) = metrics.delivery {
            info!(
                "Delivery: attempted={}, succeeded={}, failed={}",
                delivery.attempted, delivery.succeeded, delivery.failed
            );
        }

        Ok(RunSummary {
            tracked,
            rejected,
            reason,
        })
    }

    fn track_line(&self, line: &str) -> Result<(), LineError> {
        let input: InputEvent = serde_json::from_str(line)?;
        self.tracker.track(&input.event, input.data)?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
enum LineError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}
