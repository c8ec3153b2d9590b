use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferMetrics {
    pub capacity: usize,
    pub len: usize,
    pub admitted: u64,
    pub evicted: u64,
    pub drained: u64,
    pub drain_operations: u64,
    pub peak_len: usize,
}

impl BufferMetrics {
    pub fn fill_ratio(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.len as f64 / self.capacity as f64
    }

    /// Share of admitted events that were evicted before they could be drained.
    pub fn eviction_ratio(&self) -> f64 {
        if self.admitted == 0 {
            return 0.0;
        }
        self.evicted as f64 / self.admitted as f64
    }
}
