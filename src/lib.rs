#![deny(rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
#![allow(
    clippy::cast_possible_truncation, // Durations and sizes stay within u64
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,      // Ratios for metrics only
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,  // e.g. BufferError in buffer module
    clippy::must_use_candidate,
    clippy::doc_markdown
)]

pub mod app;
pub mod buffer;
pub mod domain;
pub mod scheduler;
pub mod sender;
pub mod sources;

pub use app::{App, EventTracker, TrackerConfig, TrackerMetrics};
pub use domain::{Event, Payload, TrackerError};
pub use sources::{AppLifecycleAdapter, ConnectivityAdapter, EventSource};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
