use thiserror::Error;

/// Top-level error type surfaced by the tracker facade.
///
/// Delivery failures never appear here: they are recovered inside the flush
/// worker and only logged.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::app::ConfigError),

    #[error("Invalid event: {0}")]
    Event(#[from] super::EventError),

    #[error("Buffer error: {0}")]
    Buffer(#[from] crate::buffer::BufferError),

    #[error("Event tracker is not initialized")]
    NotInitialized,

    #[error("Event tracker is already initialized")]
    AlreadyInitialized,

    #[error("No tokio runtime available to start the flush worker")]
    NoRuntime,

    #[error("Event tracker has been shut down")]
    ShutDown,

    #[error("Shutdown timeout")]
    ShutdownTimeout,
}

impl From<super::SessionError> for TrackerError {
    fn from(err: super::SessionError) -> Self {
        TrackerError::Config(err.into())
    }
}
