use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Structured event payload: an unordered mapping of string keys to JSON values.
pub type Payload = Map<String, Value>;

#[derive(Error, Debug)]
pub enum EventError {
    #[error("Event category must not be empty")]
    EmptyCategory,
    #[error("Event payload must be a JSON object, got {kind}")]
    PayloadNotObject { kind: &'static str },
    #[error("Payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// An immutable record of something that happened in the host application.
///
/// Events are created by `track`, owned by a single buffer slot until they are
/// drained or evicted, and dropped after their one delivery attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    id: Uuid,
    category: String,
    payload: Payload,
    created_at: DateTime<Utc>,
}

impl Event {
    pub fn new(category: impl Into<String>, payload: Payload) -> Result<Self, EventError> {
        Self::with_timestamp(category, payload, Utc::now())
    }

    pub fn with_timestamp(
        category: impl Into<String>,
        payload: Payload,
        created_at: DateTime<Utc>,
    ) -> Result<Self, EventError> {
        let category = category.into();
        if category.is_empty() {
            return Err(EventError::EmptyCategory);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            category,
            payload,
            created_at,
        })
    }

    /// Build an event from any serializable value. The value must render as a JSON object.
    pub fn from_serializable<T: Serialize + ?Sized>(
        category: impl Into<String>,
        data: &T,
    ) -> Result<Self, EventError> {
        match serde_json::to_value(data)? {
            Value::Object(payload) => Self::new(category, payload),
            other => Err(EventError::PayloadNotObject {
                kind: value_kind(&other),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Creation time as milliseconds since the Unix epoch.
    pub fn timestamp_millis(&self) -> i64 {
        self.created_at.timestamp_millis()
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
