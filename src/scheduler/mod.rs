pub mod flush;
pub mod handle;

pub use flush::{CycleReport, FlushScheduler};
pub use handle::SchedulerHandle;

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Shutdown timeout")]
    ShutdownTimeout,
    #[error("Flush worker failed: {0}")]
    WorkerFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    /// Waiting for the next cycle
    Idle,
    /// Draining and delivering
    Flushing,
    /// Worker has exited
    Stopped,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub flush_interval: Duration,
    /// Run one last drain-and-deliver cycle when stopped
    pub flush_on_shutdown: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_millis(10_000),
            flush_on_shutdown: true,
        }
    }
}
