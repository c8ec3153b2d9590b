use crate::domain::{Event, Payload, Session};
use serde::Serialize;
use thiserror::Error;

// Upper bound on a single request body
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("JSON serialization failed: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Serialized event is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
}

/// Logical shape of one delivered event.
#[derive(Debug, Serialize)]
pub struct WireEvent<'a> {
    #[serde(rename = "apiKey")]
    pub api_key: &'a str,
    #[serde(rename = "deviceUID")]
    pub device_uid: &'a str,
    pub event: &'a str,
    pub data: &'a Payload,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl<'a> WireEvent<'a> {
    pub fn new(event: &'a Event, session: &'a Session) -> Self {
        Self {
            api_key: session.api_key(),
            device_uid: session.device_uid(),
            event: event.category(),
            data: event.payload(),
            timestamp: event.timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSerializer {
    max_body_bytes: usize,
}

impl EventSerializer {
    pub fn new() -> Self {
        Self {
            max_body_bytes: MAX_BODY_BYTES,
        }
    }

    pub fn with_limit(max_body_bytes: usize) -> Self {
        Self { max_body_bytes }
    }

    pub fn serialize(&self, event: &Event, session: &Session) -> Result<Vec<u8>, SerializationError> {
        let body = serde_json::to_vec(&WireEvent::new(event, session))?;

        if body.len() > self.max_body_bytes {
            return Err(SerializationError::TooLarge {
                size: body.len(),
                limit: self.max_body_bytes,
            });
        }

        Ok(body)
    }
}

impl Default for EventSerializer {
    fn default() -> Self {
        Self::new()
    }
}
