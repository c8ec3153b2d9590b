use super::{ConfigError, TrackerConfig};
use crate::buffer::MAX_CAPACITY;
use url::Url;

/// Parse a delivery endpoint, accepting only http and https URLs.
pub fn parse_endpoint(endpoint: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(endpoint).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid endpoint URL '{endpoint}': {e}"))
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl(format!(
            "Unsupported scheme '{other}' in endpoint '{endpoint}', expected http or https"
        ))),
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate endpoint URL
        parse_endpoint(&self.endpoint)?;

        // Validate buffer capacity
        if self.buffer_capacity == 0 || self.buffer_capacity > MAX_CAPACITY {
            return Err(ConfigError::InvalidConfig(format!(
                "Buffer capacity must be between 1 and {MAX_CAPACITY}, got {}",
                self.buffer_capacity
            )));
        }

        if self.flush_interval_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "Flush interval must be greater than 0".to_string(),
            ));
        }

        if self.api_key_length == 0 || self.device_uid_length == 0 {
            return Err(ConfigError::InvalidConfig(
                "Credential lengths must be greater than 0".to_string(),
            ));
        }

        // Validate timeouts
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.connection_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Connection timeout must be greater than 0".to_string(),
            ));
        }

        if self.shutdown_timeout_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "Shutdown timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
