use crate::domain::Event;

/// Result of admitting an event into a full or non-full buffer.
///
/// The buffer applies a drop-oldest policy: under sustained overload the most
/// recent events are kept and the oldest residents are handed back here.
#[derive(Debug, Default)]
#[must_use = "evicted events are lost unless inspected"]
pub struct AdmitOutcome {
    evicted: Vec<Event>,
}

impl AdmitOutcome {
    pub(crate) fn new(evicted: Vec<Event>) -> Self {
        Self { evicted }
    }

    /// True when the admission did not displace any resident event.
    pub fn is_clean(&self) -> bool {
        self.evicted.is_empty()
    }

    pub fn evicted_count(&self) -> usize {
        self.evicted.len()
    }

    pub fn evicted(&self) -> &[Event] {
        &self.evicted
    }

    pub fn into_evicted(self) -> Vec<Event> {
        self.evicted
    }
}
