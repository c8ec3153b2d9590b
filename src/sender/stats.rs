// Lock-free delivery statistics using atomic operations
//
// Updated by the flush worker on every delivery attempt and read by the host
// through `EventTracker::metrics` without taking any lock.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Lock-free delivery statistics
#[derive(Debug, Default)]
pub struct DeliveryStats {
    attempted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    bytes_sent: AtomicU64,
    // 0 means no response has been received yet
    last_status_code: AtomicU64,
    last_attempt_time: AtomicU64,
    total_latency_ms: AtomicU64,
}

impl DeliveryStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a delivery that got a 2xx response
    pub fn record_success(&self, status_code: u16, bytes: usize, latency: Duration) {
        self.record_attempt(latency);
        self.succeeded.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
        self.last_status_code
            .store(status_code as u64, Ordering::Relaxed);
    }

    /// Record a failed delivery; `status_code` is set when the endpoint answered
    pub fn record_failure(&self, status_code: Option<u16>, latency: Duration) {
        self.record_attempt(latency);
        self.failed.fetch_add(1, Ordering::Relaxed);
        if let Some(code) = status_code {
            self.last_status_code.store(code as u64, Ordering::Relaxed);
        }
    }

    fn record_attempt(&self, latency: Duration) {
        self.attempted.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms
            .fetch_add(latency.as_millis() as u64, Ordering::Relaxed);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.last_attempt_time.store(now, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics (lock-free)
    pub fn snapshot(&self) -> DeliverySnapshot {
        let last_status_code = match self.last_status_code.load(Ordering::Relaxed) {
            0 => None,
            code => Some(code as u16),
        };

        DeliverySnapshot {
            attempted: self.attempted.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            last_status_code,
            last_attempt_time: self.last_attempt_time.load(Ordering::Relaxed),
            total_latency_ms: self.total_latency_ms.load(Ordering::Relaxed),
        }
    }
}

/// Immutable snapshot of delivery statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverySnapshot {
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub bytes_sent: u64,
    pub last_status_code: Option<u16>,
    pub last_attempt_time: u64,
    pub total_latency_ms: u64,
}

impl DeliverySnapshot {
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            return 1.0;
        }
        self.succeeded as f64 / self.attempted as f64
    }

    pub fn average_latency(&self) -> Duration {
        if self.attempted == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(self.total_latency_ms / self.attempted)
    }
}
