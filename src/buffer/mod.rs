pub mod backpressure;
pub mod error;
pub mod event_buffer;
pub mod metrics;

pub use backpressure::AdmitOutcome;
pub use error::BufferError;
pub use event_buffer::{EventBuffer, MAX_CAPACITY};
pub use metrics::BufferMetrics;
