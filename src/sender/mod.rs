pub mod client;
pub mod endpoint;
pub mod serialization;
pub mod stats;
pub mod transmission;

pub use client::{ClientConfig, ClientError, HttpClient};
pub use endpoint::SharedEndpoint;
pub use serialization::{EventSerializer, MAX_BODY_BYTES, SerializationError, WireEvent};
pub use stats::{DeliverySnapshot, DeliveryStats};
pub use transmission::{
    DeliveryError, DeliveryReceipt, EventTransmitter, JSON_CONTENT_TYPE,
};

use crate::domain::{Event, Session};
use std::future::Future;
use url::Url;

/// Delivery seam between the flush scheduler and the network.
///
/// One call is one delivery attempt for one event. Implementations report
/// failures through the returned error; the scheduler logs them and moves on.
pub trait EventTransport: Send + Sync + 'static {
    fn deliver(
        &self,
        event: &Event,
        session: &Session,
        endpoint: &Url,
    ) -> impl Future<Output = Result<DeliveryReceipt, DeliveryError>> + Send;

    /// Counters kept by the transport, if it keeps any.
    fn delivery_stats(&self) -> Option<DeliverySnapshot> {
        None
    }
}
