use super::config::{ConfigError, TrackerConfig, parse_endpoint};
use crate::buffer::{BufferMetrics, EventBuffer};
use crate::domain::{Event, Payload, Session, TrackerError};
use crate::scheduler::{FlushScheduler, SchedulerError, SchedulerHandle, SchedulerState};
use crate::sender::{DeliverySnapshot, EventTransmitter, EventTransport, HttpClient, SharedEndpoint};
use crate::sources::EventSource;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Point-in-time view of the tracker.
#[derive(Debug, Clone, Serialize)]
pub struct TrackerMetrics {
    pub buffer: Option<BufferMetrics>,
    pub delivery: Option<DeliverySnapshot>,
    pub cycles: u64,
    /// None until `initialize` has started the worker
    pub state: Option<SchedulerState>,
}

/// Everything that only exists after a successful `initialize`.
struct Active {
    buffer: Arc<EventBuffer>,
    state: watch::Receiver<SchedulerState>,
    cycles: Arc<AtomicU64>,
    // Held across the stop wait so concurrent shutdowns queue behind it
    scheduler: tokio::sync::Mutex<Option<SchedulerHandle>>,
}

/// The object a host application holds.
///
/// `initialize` validates the session and starts the flush worker; `track`
/// only touches the in-memory buffer and never waits on the network.
pub struct EventTracker<T: EventTransport = EventTransmitter> {
    config: TrackerConfig,
    transport: Arc<T>,
    endpoint: SharedEndpoint,
    init_lock: Mutex<()>,
    // Shared by admissions, exclusive while raising `shut_down`
    admission_gate: RwLock<()>,
    active: OnceLock<Active>,
    shut_down: AtomicBool,
}

impl EventTracker {
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        let client = HttpClient::new(config.client_config())
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        Self::with_transport(config, EventTransmitter::new(client))
    }
}

impl<T: EventTransport> EventTracker<T> {
    pub fn with_transport(mut config: TrackerConfig, transport: T) -> Result<Self, ConfigError> {
        config.post_process()?;
        config.validate()?;
        let endpoint = SharedEndpoint::new(config.endpoint_url()?);

        Ok(Self {
            config,
            transport: Arc::new(transport),
            endpoint,
            init_lock: Mutex::new(()),
            admission_gate: RwLock::new(()),
            active: OnceLock::new(),
            shut_down: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.active.get().is_some()
    }

    /// Validate the credentials, build the buffer and start the flush worker
    /// on the current tokio runtime. The first cycle runs immediately.
    pub fn initialize(
        &self,
        api_key: impl Into<String>,
        device_uid: impl Into<String>,
    ) -> Result<(), TrackerError> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(TrackerError::ShutDown);
        }

        let _guard = self.init_lock.lock();
        if self.active.get().is_some() {
            return Err(TrackerError::AlreadyInitialized);
        }

        let session = Session::new(
            api_key,
            device_uid,
            self.config.api_key_length,
            self.config.device_uid_length,
        )?;
        let runtime = Handle::try_current().map_err(|_| TrackerError::NoRuntime)?;
        let buffer = Arc::new(EventBuffer::new(self.config.buffer_capacity)?);

        let handle = FlushScheduler::new(
            Arc::clone(&buffer),
            Arc::clone(&self.transport),
            session,
            self.endpoint.clone(),
            self.config.scheduler_config(),
        )
        .spawn(&runtime);

        let active = Active {
            buffer,
            state: handle.subscribe(),
            cycles: handle.cycle_counter(),
            scheduler: tokio::sync::Mutex::new(Some(handle)),
        };
        if self.active.set(active).is_err() {
            return Err(TrackerError::AlreadyInitialized);
        }

        info!(
            "Event tracker initialized (endpoint={}, capacity={}, interval={:?})",
            self.endpoint.get(),
            self.config.buffer_capacity,
            self.config.flush_interval
        );
        Ok(())
    }

    /// Stamp an event with the current time and admit it to the buffer.
    pub fn track(&self, category: &str, payload: Payload) -> Result<(), TrackerError> {
        let _gate = self.admission_gate.read();
        let active = self.admission()?;
        self.admit(active, Event::new(category, payload)?);
        Ok(())
    }

    /// Like `track`, with any value that serializes to a JSON object as payload.
    pub fn track_serialize<P: Serialize + ?Sized>(
        &self,
        category: &str,
        payload: &P,
    ) -> Result<(), TrackerError> {
        let _gate = self.admission_gate.read();
        let active = self.admission()?;
        self.admit(active, Event::from_serializable(category, payload)?);
        Ok(())
    }

    fn admission(&self) -> Result<&Active, TrackerError> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(TrackerError::ShutDown);
        }
        self.active.get().ok_or(TrackerError::NotInitialized)
    }

    fn admit(&self, active: &Active, event: Event) {
        let category = event.category().to_string();
        let outcome = active.buffer.admit(event);

        if outcome.is_clean() {
            debug!(category = %category, "Event admitted");
        } else {
            warn!(
                category = %category,
                "Buffer full, evicted {} oldest event(s)",
                outcome.evicted_count()
            );
        }
    }

    /// Point later deliveries at `url`. A delivery already in flight may
    /// still use the previous value.
    pub fn set_endpoint(&self, url: &str) -> Result<(), ConfigError> {
        let parsed = parse_endpoint(url)?;
        info!("Delivery endpoint set to {}", parsed);
        self.endpoint.set(parsed);
        Ok(())
    }

    pub fn endpoint(&self) -> url::Url {
        self.endpoint.get()
    }

    /// Stop the flush worker and wait for it, including the final flush when
    /// enabled. Further `track` calls fail with `ShutDown`; every `track` that
    /// returned `Ok` before this call is part of the final flush.
    ///
    /// After `ShutdownTimeout` the worker is still running; calling
    /// `shutdown` again waits for it once more.
    pub async fn shutdown(&self) -> Result<(), TrackerError> {
        {
            let _gate = self.admission_gate.write();
            self.shut_down.store(true, Ordering::Release);
        }

        let Some(active) = self.active.get() else {
            return Ok(());
        };
        let mut scheduler = active.scheduler.lock().await;
        let Some(handle) = scheduler.as_mut() else {
            return Ok(());
        };

        match handle.stop(self.config.shutdown_timeout).await {
            Ok(()) => {
                *scheduler = None;
                info!("Event tracker shut down");
                Ok(())
            }
            Err(SchedulerError::ShutdownTimeout) => Err(TrackerError::ShutdownTimeout),
            Err(SchedulerError::WorkerFailed(e)) => {
                *scheduler = None;
                warn!("Flush worker failed during shutdown: {}", e);
                Ok(())
            }
        }
    }

    pub fn metrics(&self) -> TrackerMetrics {
        let delivery = self.transport.delivery_stats();

        let Some(active) = self.active.get() else {
            return TrackerMetrics {
                buffer: None,
                delivery,
                cycles: 0,
                state: None,
            };
        };

        TrackerMetrics {
            buffer: Some(active.buffer.metrics()),
            delivery,
            cycles: active.cycles.load(Ordering::Relaxed),
            state: Some(*active.state.borrow()),
        }
    }
}

impl<T: EventTransport> EventSource for EventTracker<T> {
    fn on_signal(&self, category: &str, payload: Payload) {
        if let Err(e) = self.track(category, payload) {
            warn!(category = category, "Dropping signal: {}", e);
        }
    }
}
