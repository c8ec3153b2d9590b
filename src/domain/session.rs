use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("{field} must not be empty")]
    Missing { field: &'static str },
    #[error("{field} must be exactly {expected} characters, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Identifiers attached to every delivered event.
///
/// Built once at initialization and never mutated afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    api_key: String,
    device_uid: String,
}

impl Session {
    pub fn new(
        api_key: impl Into<String>,
        device_uid: impl Into<String>,
        api_key_length: usize,
        device_uid_length: usize,
    ) -> Result<Self, SessionError> {
        let api_key = api_key.into();
        let device_uid = device_uid.into();

        check_token("apiKey", &api_key, api_key_length)?;
        check_token("deviceUID", &device_uid, device_uid_length)?;

        Ok(Self {
            api_key,
            device_uid,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn device_uid(&self) -> &str {
        &self.device_uid
    }
}

fn check_token(field: &'static str, value: &str, expected: usize) -> Result<(), SessionError> {
    if value.is_empty() {
        return Err(SessionError::Missing { field });
    }

    let actual = value.chars().count();
    if actual != expected {
        return Err(SessionError::InvalidLength {
            field,
            expected,
            actual,
        });
    }

    Ok(())
}

// The api key is a credential; keep it out of logs.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("api_key", &"<redacted>")
            .field("device_uid", &self.device_uid)
            .finish()
    }
}
