//! Adapters that turn host signals into tracked events.
//!
//! The host-specific registration (activity callbacks, network broadcasts)
//! lives outside this crate; the host forwards its signals to these adapters,
//! which post into any `EventSource`.

pub mod connectivity;
pub mod lifecycle;

pub use connectivity::{ConnectivityAdapter, LocalAddressProvider, UdpRouteAddress};
pub use lifecycle::{ActivityState, AppLifecycleAdapter};

use crate::domain::Payload;

pub const APP_CATEGORY: &str = "app";
pub const NETWORK_CATEGORY: &str = "network";

/// Capability to accept a signal as an event.
///
/// Implemented by the tracker facade; failures are handled by the implementer.
pub trait EventSource: Send + Sync {
    fn on_signal(&self, category: &str, payload: Payload);
}

impl<S: EventSource + ?Sized> EventSource for std::sync::Arc<S> {
    fn on_signal(&self, category: &str, payload: Payload) {
        (**self).on_signal(category, payload);
    }
}
