//! Domain layer for rask-event-tracker.
//!
//! Contains the canonical types shared across all modules:
//! - `Event`: the record buffered and delivered by the agent
//! - `Session`: the validated api key / device identifier pair
//! - `TrackerError`: Top-level error type

pub mod error;
pub mod event;
pub mod session;

pub use error::TrackerError;
pub use event::{Event, EventError, Payload};
pub use session::{Session, SessionError};
