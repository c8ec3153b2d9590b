use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connection_timeout: Duration,
    pub keep_alive_timeout: Duration,
    pub max_idle_connections: usize,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
            keep_alive_timeout: Duration::from_secs(60),
            max_idle_connections: 2,
            user_agent: format!("rask-event-tracker/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Pooled HTTP client shared by every delivery of one tracker.
#[derive(Debug, Clone)]
pub struct HttpClient {
    pub client: Client,
    pub config: ClientConfig,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.connection_timeout)
            .pool_max_idle_per_host(config.max_idle_connections)
            .pool_idle_timeout(config.keep_alive_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ClientError::InvalidConfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    pub fn user_agent(&self) -> &str {
        &self.config.user_agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_user_agent_carries_version() {
        let config = ClientConfig::default();
        assert!(config.user_agent.starts_with("rask-event-tracker/"));
        assert!(config.user_agent.ends_with(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_client_builds_from_default_config() {
        let client = HttpClient::new(ClientConfig::default()).unwrap();
        assert_eq!(client.config.timeout, Duration::from_secs(30));
    }
}
