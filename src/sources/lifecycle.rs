use super::{APP_CATEGORY, EventSource};
use crate::domain::Payload;
use serde_json::Value;
use tracing::debug;

/// Foreground/background transitions reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityState {
    Resumed,
    Paused,
}

impl ActivityState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityState::Resumed => "resumed",
            ActivityState::Paused => "paused",
        }
    }
}

/// Emits `app` events with `{"ActivityState": "resumed" | "paused"}`.
pub struct AppLifecycleAdapter<S: EventSource> {
    source: S,
}

impl<S: EventSource> AppLifecycleAdapter<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn on_activity(&self, state: ActivityState) {
        debug!("Activity {}", state.as_str());

        let mut payload = Payload::new();
        payload.insert(
            "ActivityState".to_string(),
            Value::String(state.as_str().to_string()),
        );
        self.source.on_signal(APP_CATEGORY, payload);
    }

    pub fn on_resumed(&self) {
        self.on_activity(ActivityState::Resumed);
    }

    pub fn on_paused(&self) {
        self.on_activity(ActivityState::Paused);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::testing::RecordingSource;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_resume_and_pause_are_tracked_in_order() {
        let source = Arc::new(RecordingSource::default());
        let adapter = AppLifecycleAdapter::new(Arc::clone(&source));

        adapter.on_resumed();
        adapter.on_paused();
        adapter.on_resumed();

        let signals = source.signals.lock();
        let states: Vec<&Value> = signals.iter().map(|(_, p)| &p["ActivityState"]).collect();
        assert_eq!(states, vec![&json!("resumed"), &json!("paused"), &json!("resumed")]);
        assert!(signals.iter().all(|(category, _)| category == "app"));
    }
}
