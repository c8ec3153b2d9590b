use super::{EventSource, NETWORK_CATEGORY};
use crate::domain::Payload;
use parking_lot::Mutex;
use serde_json::Value;
use std::net::{Ipv4Addr, UdpSocket};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Reports the device's current local IPv4 address, if any.
#[cfg_attr(test, automock)]
pub trait LocalAddressProvider: Send + Sync {
    fn local_ipv4(&self) -> Option<Ipv4Addr>;
}

/// Finds the address of the outbound interface by "connecting" a UDP socket.
///
/// UDP connect only selects a route; no packet leaves the host.
#[derive(Debug, Clone)]
pub struct UdpRouteAddress {
    route_target: String,
}

impl UdpRouteAddress {
    pub fn new(route_target: impl Into<String>) -> Self {
        Self {
            route_target: route_target.into(),
        }
    }
}

impl Default for UdpRouteAddress {
    fn default() -> Self {
        Self::new("8.8.8.8:80")
    }
}

impl LocalAddressProvider for UdpRouteAddress {
    fn local_ipv4(&self) -> Option<Ipv4Addr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
        socket.connect(&self.route_target).ok()?;

        match socket.local_addr().ok()?.ip() {
            std::net::IpAddr::V4(ip) if !ip.is_unspecified() => Some(ip),
            _ => None,
        }
    }
}

/// Emits `network` events with `{"NetworkStateOn": bool, "IPv4": string}`
/// whenever the observed connectivity differs from the last one reported.
///
/// The first observation is always reported; repeats are suppressed.
pub struct ConnectivityAdapter<S: EventSource, P: LocalAddressProvider> {
    source: S,
    addresses: P,
    last_known_connected: Mutex<Option<bool>>,
}

impl<S: EventSource> ConnectivityAdapter<S, UdpRouteAddress> {
    pub fn new(source: S) -> Self {
        Self::with_provider(source, UdpRouteAddress::default())
    }
}

impl<S: EventSource, P: LocalAddressProvider> ConnectivityAdapter<S, P> {
    pub fn with_provider(source: S, addresses: P) -> Self {
        Self {
            source,
            addresses,
            last_known_connected: Mutex::new(None),
        }
    }

    pub fn last_known_connected(&self) -> Option<bool> {
        *self.last_known_connected.lock()
    }

    /// Feed a connectivity observation. Returns true when an event was emitted.
    pub fn on_connectivity_changed(&self, connected: bool) -> bool {
        {
            let mut last = self.last_known_connected.lock();
            if *last == Some(connected) {
                return false;
            }
            *last = Some(connected);
        }

        debug!("Connectivity changed, connected={}", connected);

        let ipv4 = self
            .addresses
            .local_ipv4()
            .unwrap_or(Ipv4Addr::UNSPECIFIED);

        let mut payload = Payload::new();
        payload.insert("NetworkStateOn".to_string(), Value::Bool(connected));
        payload.insert("IPv4".to_string(), Value::String(ipv4.to_string()));
        self.source.on_signal(NETWORK_CATEGORY, payload);

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::testing::RecordingSource;
    use serde_json::json;
    use std::sync::Arc;

    fn adapter_with(
        ip: Option<Ipv4Addr>,
    ) -> (
        Arc<RecordingSource>,
        ConnectivityAdapter<Arc<RecordingSource>, MockLocalAddressProvider>,
    ) {
        let source = Arc::new(RecordingSource::default());
        let mut provider = MockLocalAddressProvider::new();
        provider.expect_local_ipv4().return_const(ip);
        let adapter = ConnectivityAdapter::with_provider(Arc::clone(&source), provider);
        (source, adapter)
    }

    #[test]
    fn test_repeated_connected_signal_tracked_once() {
        let (source, adapter) = adapter_with(Some(Ipv4Addr::new(192, 168, 1, 20)));

        assert!(adapter.on_connectivity_changed(true));
        assert!(!adapter.on_connectivity_changed(true));

        let signals = source.signals.lock();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].0, "network");
        assert_eq!(signals[0].1["NetworkStateOn"], json!(true));
        assert_eq!(signals[0].1["IPv4"], json!("192.168.1.20"));
    }

    #[test]
    fn test_every_change_is_tracked() {
        let (source, adapter) = adapter_with(None);

        for connected in [true, false, false, true, true, false] {
            adapter.on_connectivity_changed(connected);
        }

        let states: Vec<Value> = source
            .signals
            .lock()
            .iter()
            .map(|(_, p)| p["NetworkStateOn"].clone())
            .collect();
        assert_eq!(states, vec![json!(true), json!(false), json!(true), json!(false)]);
        assert_eq!(adapter.last_known_connected(), Some(false));
    }

    #[test]
    fn test_missing_address_reported_as_unspecified() {
        let (source, adapter) = adapter_with(None);
        adapter.on_connectivity_changed(false);
        assert_eq!(source.signals.lock()[0].1["IPv4"], json!("0.0.0.0"));
    }

    #[test]
    fn test_suppressed_signal_does_not_query_address() {
        let source = Arc::new(RecordingSource::default());
        let mut provider = MockLocalAddressProvider::new();
        provider
            .expect_local_ipv4()
            .times(1)
            .return_const(Some(Ipv4Addr::LOCALHOST));
        let adapter = ConnectivityAdapter::with_provider(Arc::clone(&source), provider);

        adapter.on_connectivity_changed(true);
        adapter.on_connectivity_changed(true);
        adapter.on_connectivity_changed(true);
    }

    #[test]
    fn test_udp_route_to_loopback_reports_loopback() {
        let addresses = UdpRouteAddress::new("127.0.0.1:9");
        assert_eq!(addresses.local_ipv4(), Some(Ipv4Addr::LOCALHOST));
    }

    #[test]
    fn test_unresolvable_route_yields_none() {
        let addresses = UdpRouteAddress::new("not an address");
        assert_eq!(addresses.local_ipv4(), None);
    }

    #[test]
    fn test_default_adapter_reports_a_parsable_address() {
        let source = Arc::new(RecordingSource::default());
        let adapter = ConnectivityAdapter::new(Arc::clone(&source));

        assert!(adapter.on_connectivity_changed(true));

        let signals = source.signals.lock();
        let ipv4 = signals[0].1["IPv4"].as_str().unwrap();
        // 0.0.0.0 when the host has no outbound route
        assert!(ipv4.parse::<Ipv4Addr>().is_ok());
    }
}
