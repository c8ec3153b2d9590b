use super::backpressure::AdmitOutcome;
use super::error::BufferError;
use super::metrics::BufferMetrics;
use crate::domain::Event;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::debug;

/// Upper bound on a single buffer's capacity, to keep the up-front allocation sane.
pub const MAX_CAPACITY: usize = 1_000_000;

/// Fixed-capacity FIFO of events with drop-oldest admission.
///
/// `admit` never blocks on I/O and never fails: at capacity the oldest
/// resident event is evicted to make room. `drain_all` atomically takes every
/// resident event, oldest first. Each admitted event leaves the buffer exactly
/// once, either through a drain or through an eviction.
pub struct EventBuffer {
    queue: Mutex<VecDeque<Event>>,
    capacity: usize,
    // Atomic metrics so snapshots never contend with producers
    admitted: AtomicU64,
    evicted: AtomicU64,
    drained: AtomicU64,
    drain_operations: AtomicU64,
    peak_len: AtomicUsize,
}

impl EventBuffer {
    pub fn new(capacity: usize) -> Result<Self, BufferError> {
        if capacity == 0 || capacity > MAX_CAPACITY {
            return Err(BufferError::InvalidCapacity { capacity });
        }

        Ok(Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            admitted: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
            drained: AtomicU64::new(0),
            drain_operations: AtomicU64::new(0),
            peak_len: AtomicUsize::new(0),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Admit an event, evicting the oldest residents while the buffer is at capacity.
    ///
    /// The eviction loop runs at most as many times as there were residents on entry.
    pub fn admit(&self, event: Event) -> AdmitOutcome {
        let mut evicted = Vec::new();

        let len = {
            let mut queue = self.queue.lock();
            let mut budget = queue.len();

            while queue.len() >= self.capacity && budget > 0 {
                match queue.pop_front() {
                    Some(oldest) => evicted.push(oldest),
                    None => break,
                }
                budget -= 1;
            }

            debug_assert!(queue.len() < self.capacity);
            queue.push_back(event);
            queue.len()
        };

        self.admitted.fetch_add(1, Ordering::Relaxed);
        self.peak_len.fetch_max(len, Ordering::Relaxed);

        if !evicted.is_empty() {
            self.evicted
                .fetch_add(evicted.len() as u64, Ordering::Relaxed);
            for dropped in &evicted {
                debug!(
                    event_id = %dropped.id(),
                    category = dropped.category(),
                    "Buffer full, evicted oldest event"
                );
            }
        }

        AdmitOutcome::new(evicted)
    }

    /// Remove and return every resident event, oldest first.
    pub fn drain_all(&self) -> Vec<Event> {
        let drained: Vec<Event> = {
            let mut queue = self.queue.lock();
            queue.drain(..).collect()
        };

        self.drain_operations.fetch_add(1, Ordering::Relaxed);
        self.drained
            .fetch_add(drained.len() as u64, Ordering::Relaxed);

        drained
    }

    pub fn metrics(&self) -> BufferMetrics {
        BufferMetrics {
            capacity: self.capacity,
            len: self.len(),
            admitted: self.admitted.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            drained: self.drained.load(Ordering::Relaxed),
            drain_operations: self.drain_operations.load(Ordering::Relaxed),
            peak_len: self.peak_len.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for EventBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBuffer")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Payload;
    use serde_json::json;

    fn event(seq: u64) -> Event {
        let mut payload = Payload::new();
        payload.insert("seq".to_string(), json!(seq));
        Event::new("test", payload).unwrap()
    }

    fn seq_of(event: &Event) -> u64 {
        event.payload()["seq"].as_u64().unwrap()
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(
            EventBuffer::new(0).unwrap_err(),
            BufferError::InvalidCapacity { capacity: 0 }
        );
    }

    #[test]
    fn test_excessive_capacity_rejected() {
        assert!(EventBuffer::new(MAX_CAPACITY + 1).is_err());
        assert!(EventBuffer::new(MAX_CAPACITY).is_ok());
    }

    #[test]
    fn test_admit_below_capacity_evicts_nothing() {
        let buffer = EventBuffer::new(3).unwrap();
        assert!(buffer.admit(event(1)).is_clean());
        assert!(buffer.admit(event(2)).is_clean());
        assert_eq!(buffer.len(), 2);
        assert!(!buffer.is_full());
    }

    #[test]
    fn test_admit_at_capacity_evicts_oldest() {
        let buffer = EventBuffer::new(2).unwrap();
        buffer.admit(event(1));
        buffer.admit(event(2));

        let outcome = buffer.admit(event(3));
        let evicted = outcome.into_evicted();
        assert_eq!(evicted.len(), 1);
        assert_eq!(seq_of(&evicted[0]), 1);

        let remaining: Vec<u64> = buffer.drain_all().iter().map(seq_of).collect();
        assert_eq!(remaining, vec![2, 3]);
    }

    #[test]
    fn test_capacity_one_always_keeps_latest() {
        let buffer = EventBuffer::new(1).unwrap();
        for seq in 0..10 {
            buffer.admit(event(seq));
            assert_eq!(buffer.len(), 1);
        }
        let remaining = buffer.drain_all();
        assert_eq!(seq_of(&remaining[0]), 9);
    }

    #[test]
    fn test_drain_empties_buffer() {
        let buffer = EventBuffer::new(4).unwrap();
        buffer.admit(event(1));
        buffer.admit(event(2));

        assert_eq!(buffer.drain_all().len(), 2);
        assert!(buffer.is_empty());
        assert!(buffer.drain_all().is_empty());
    }

    #[test]
    fn test_metrics_track_every_event() {
        let buffer = EventBuffer::new(3).unwrap();
        for seq in 0..5 {
            buffer.admit(event(seq));
        }
        buffer.drain_all();
        buffer.admit(event(5));

        let metrics = buffer.metrics();
        assert_eq!(metrics.capacity, 3);
        assert_eq!(metrics.admitted, 6);
        assert_eq!(metrics.evicted, 2);
        assert_eq!(metrics.drained, 3);
        assert_eq!(metrics.drain_operations, 1);
        assert_eq!(metrics.len, 1);
        assert_eq!(metrics.peak_len, 3);
        assert_eq!(
            metrics.admitted,
            metrics.evicted + metrics.drained + metrics.len as u64
        );
    }
}
