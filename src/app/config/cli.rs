use super::serde_helpers::{load_env_path_opt, load_env_string, load_env_var};
use super::{ConfigError, LogLevel};
use crate::scheduler::SchedulerConfig;
use crate::sender::ClientConfig;
use clap::{Args, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:9600/v1/events";

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Collection endpoint URL that receives one POST per event
    #[arg(long, env = "EVENT_TRACKER_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Maximum number of buffered events before the oldest is evicted
    #[arg(long, env = "EVENT_TRACKER_BUFFER_CAPACITY", default_value = "10")]
    pub buffer_capacity: usize,

    /// Flush interval in milliseconds
    #[arg(long, env = "EVENT_TRACKER_FLUSH_INTERVAL_MS", default_value = "10000")]
    pub flush_interval_ms: u64,

    /// Required api key length in characters
    #[arg(long, env = "EVENT_TRACKER_API_KEY_LENGTH", default_value = "16")]
    pub api_key_length: usize,

    /// Required device identifier length in characters
    #[arg(long, env = "EVENT_TRACKER_DEVICE_UID_LENGTH", default_value = "16")]
    pub device_uid_length: usize,

    /// Per-request timeout in seconds
    #[arg(long, env = "EVENT_TRACKER_REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    /// Connection timeout in seconds
    #[arg(long, env = "EVENT_TRACKER_CONNECTION_TIMEOUT_SECS", default_value = "10")]
    pub connection_timeout_secs: u64,

    /// Time to wait for the flush worker on shutdown, in milliseconds
    #[arg(long, env = "EVENT_TRACKER_SHUTDOWN_TIMEOUT_MS", default_value = "4000")]
    pub shutdown_timeout_ms: u64,

    /// Deliver whatever is still buffered when shutting down
    #[arg(
        long,
        env = "EVENT_TRACKER_FLUSH_ON_SHUTDOWN",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub flush_on_shutdown: bool,

    /// Log level
    #[arg(long, env = "EVENT_TRACKER_LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Configuration file path (optional)
    #[arg(long, env = "EVENT_TRACKER_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Derived fields (not CLI arguments)
    #[serde(skip)]
    #[arg(skip)]
    pub flush_interval: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub request_timeout: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub connection_timeout: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub shutdown_timeout: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            buffer_capacity: 10,
            flush_interval_ms: 10_000,
            api_key_length: 16,
            device_uid_length: 16,
            request_timeout_secs: 30,
            connection_timeout_secs: 10,
            shutdown_timeout_ms: 4_000,
            flush_on_shutdown: true,
            log_level: LogLevel::Info,
            config_file: None,
            flush_interval: Duration::from_millis(10_000),
            request_timeout: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
            shutdown_timeout: Duration::from_millis(4_000),
        }
    }
}

impl TrackerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = TrackerConfig::default();

        load_env_string("EVENT_TRACKER_ENDPOINT", &mut config.endpoint);
        load_env_var("EVENT_TRACKER_BUFFER_CAPACITY", &mut config.buffer_capacity)?;
        load_env_var("EVENT_TRACKER_FLUSH_INTERVAL_MS", &mut config.flush_interval_ms)?;
        load_env_var("EVENT_TRACKER_API_KEY_LENGTH", &mut config.api_key_length)?;
        load_env_var("EVENT_TRACKER_DEVICE_UID_LENGTH", &mut config.device_uid_length)?;
        load_env_var(
            "EVENT_TRACKER_REQUEST_TIMEOUT_SECS",
            &mut config.request_timeout_secs,
        )?;
        load_env_var(
            "EVENT_TRACKER_CONNECTION_TIMEOUT_SECS",
            &mut config.connection_timeout_secs,
        )?;
        load_env_var(
            "EVENT_TRACKER_SHUTDOWN_TIMEOUT_MS",
            &mut config.shutdown_timeout_ms,
        )?;
        load_env_var("EVENT_TRACKER_FLUSH_ON_SHUTDOWN", &mut config.flush_on_shutdown)?;
        load_env_var("EVENT_TRACKER_LOG_LEVEL", &mut config.log_level)?;
        load_env_path_opt("EVENT_TRACKER_CONFIG_FILE", &mut config.config_file);

        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: TrackerConfig = toml::from_str(content)?;
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn post_process(&mut self) -> Result<(), ConfigError> {
        // Convert raw numbers to Durations
        self.flush_interval = Duration::from_millis(self.flush_interval_ms);
        self.request_timeout = Duration::from_secs(self.request_timeout_secs);
        self.connection_timeout = Duration::from_secs(self.connection_timeout_secs);
        self.shutdown_timeout = Duration::from_millis(self.shutdown_timeout_ms);
        Ok(())
    }

    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        super::validation::parse_endpoint(&self.endpoint)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: self.request_timeout,
            connection_timeout: self.connection_timeout,
            ..ClientConfig::default()
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            flush_interval: self.flush_interval,
            flush_on_shutdown: self.flush_on_shutdown,
        }
    }
}

/// Command line of the demo host binary.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Ships newline-delimited JSON events to a collection endpoint", long_about = None)]
pub struct Cli {
    /// Api key sent with every event
    #[arg(long, env = "EVENT_TRACKER_API_KEY")]
    pub api_key: String,

    /// Device identifier sent with every event
    #[arg(long, env = "EVENT_TRACKER_DEVICE_UID")]
    pub device_uid: String,

    #[command(flatten)]
    pub config: TrackerConfig,
}

impl Cli {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut cli = Cli::try_parse_from(args)
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        cli.resolve()?;
        Ok(cli)
    }

    /// A config file, when given, replaces the flag/env settings wholesale.
    pub fn resolve(&mut self) -> Result<(), ConfigError> {
        if let Some(config_file) = self.config.config_file.clone() {
            let mut from_file = TrackerConfig::from_file(&config_file)?;
            from_file.config_file = Some(config_file);
            self.config = from_file;
            return Ok(());
        }

        self.config.post_process()?;
        self.config.validate()
    }
}
