use super::EventTransport;
use super::client::HttpClient;
use super::serialization::{EventSerializer, SerializationError};
use super::stats::DeliveryStats;
use crate::domain::{Event, Session};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;
use url::Url;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Serialization failed: {0}")]
    Serialization(#[from] SerializationError),
    #[error("Request error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Endpoint responded with HTTP {status}")]
    Status { status: u16 },
}

impl DeliveryError {
    /// HTTP status returned by the endpoint, when the request got that far.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            DeliveryError::Status { status } => Some(*status),
            DeliveryError::Network(err) => err.status().map(|s| s.as_u16()),
            DeliveryError::Serialization(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    pub status_code: u16,
    pub latency: Duration,
    pub bytes_sent: usize,
}

/// Sends one event per HTTP POST to the endpoint it is handed.
#[derive(Debug, Clone)]
pub struct EventTransmitter {
    pub client: HttpClient,
    serializer: EventSerializer,
    headers: HeaderMap,
    stats: Arc<DeliveryStats>,
}

impl EventTransmitter {
    pub fn new(client: HttpClient) -> Self {
        Self::with_serializer(client, EventSerializer::new())
    }

    pub fn with_serializer(client: HttpClient, serializer: EventSerializer) -> Self {
        Self {
            client,
            serializer,
            headers: build_headers(),
            stats: Arc::new(DeliveryStats::new()),
        }
    }

    pub fn stats(&self) -> Arc<DeliveryStats> {
        Arc::clone(&self.stats)
    }

    async fn post(
        &self,
        body: Vec<u8>,
        endpoint: &Url,
        start: Instant,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let bytes_sent = body.len();

        let response = self
            .client
            .client
            .post(endpoint.clone())
            .headers(self.headers.clone())
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let latency = start.elapsed();

        if !status.is_success() {
            return Err(DeliveryError::Status {
                status: status.as_u16(),
            });
        }

        Ok(DeliveryReceipt {
            status_code: status.as_u16(),
            latency,
            bytes_sent,
        })
    }
}

impl EventTransport for EventTransmitter {
    async fn deliver(
        &self,
        event: &Event,
        session: &Session,
        endpoint: &Url,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let start = Instant::now();

        let result = match self.serializer.serialize(event, session) {
            Ok(body) => self.post(body, endpoint, start).await,
            Err(e) => Err(e.into()),
        };

        match &result {
            Ok(receipt) => {
                self.stats
                    .record_success(receipt.status_code, receipt.bytes_sent, receipt.latency);
                debug!(
                    event_id = %event.id(),
                    category = event.category(),
                    status = receipt.status_code,
                    "Delivered event in {:?}",
                    receipt.latency
                );
            }
            Err(e) => {
                self.stats.record_failure(e.status_code(), start.elapsed());
            }
        }

        result
    }

    fn delivery_stats(&self) -> Option<super::DeliverySnapshot> {
        Some(self.stats.snapshot())
    }
}

fn build_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

    headers.insert(
        HeaderName::from_static("x-tracker-version"),
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );

    headers
}
