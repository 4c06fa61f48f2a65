//! Configuration types for nzb-direct-search

use crate::error::{Error, Result};
use crate::types::SelectionStrategy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Built-in maximum number of NNTP connections
pub const DEFAULT_CONNECTIONS: usize = 20;

/// Built-in lookback window in days
pub const DEFAULT_DAYS: u32 = 2;

/// Built-in maximum number of concurrently scanned chunks
pub const DEFAULT_SCANS: usize = 50;

/// Built-in number of articles per scan chunk
pub const DEFAULT_STEP: u64 = 20_000;

/// Main configuration for [`DirectSearch`](crate::DirectSearch)
///
/// Fields are organized into sub-configs:
/// - [`server`](ServerConfig): NNTP server and credentials
/// - [`search`](SearchConfig): default tunables applied to every request
/// - [`retry`](RetryConfig): backoff for transient connection failures
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// NNTP server configuration
    pub server: ServerConfig,

    /// Default search tunables (used when a request leaves a tunable at zero)
    #[serde(default)]
    pub search: SearchConfig,

    /// Retry behavior when opening group sessions
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Validate settings required to talk to a real server.
    ///
    /// Direct search needs authenticated access: both username and password
    /// must be present and non-empty.
    pub fn validate(&self) -> Result<()> {
        let has_username = self
            .server
            .username
            .as_deref()
            .is_some_and(|u| !u.is_empty());
        let has_password = self
            .server
            .password
            .as_deref()
            .is_some_and(|p| !p.is_empty());

        if !has_username || !has_password {
            return Err(Error::Config {
                message: "No or incomplete credentials for usenet server".to_string(),
                key: Some(if has_username { "password" } else { "username" }.to_string()),
            });
        }
        if self.server.host.is_empty() {
            return Err(Error::config("No usenet server host configured", "host"));
        }
        Ok(())
    }
}

/// NNTP server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server hostname
    pub host: String,

    /// Server port (typically 119 for unencrypted, 563 for TLS)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Use TLS (implicit TLS, not STARTTLS)
    #[serde(default = "default_true")]
    pub tls: bool,

    /// Username for authentication
    pub username: Option<String>,

    /// Password for authentication
    pub password: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            tls: true,
            username: None,
            password: None,
        }
    }
}

/// Default search tunables
///
/// Zero values are treated as unset and replaced by the built-in defaults
/// (20 connections, 2 days, 50 scans, 20000 articles per chunk).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum number of NNTP connections (default: 20)
    #[serde(default = "default_connections")]
    pub connections: usize,

    /// Lookback window before the target date, in days (default: 2)
    #[serde(default = "default_days")]
    pub days: u32,

    /// Maximum number of chunks scanned concurrently (default: 50)
    #[serde(default = "default_scans")]
    pub scans: usize,

    /// Number of articles per scan chunk (default: 20000)
    #[serde(default = "default_step")]
    pub step: u64,

    /// Which posting to return when a group holds several (default: first found)
    #[serde(default)]
    pub selection: SelectionStrategy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            connections: default_connections(),
            days: default_days(),
            scans: default_scans(),
            step: default_step(),
            selection: SelectionStrategy::default(),
        }
    }
}

impl SearchConfig {
    /// Copy of this config with every zero field replaced by its built-in default
    pub fn with_builtin_defaults(&self) -> Self {
        Self {
            connections: non_zero_or(self.connections, DEFAULT_CONNECTIONS),
            days: non_zero_or(self.days, DEFAULT_DAYS),
            scans: non_zero_or(self.scans, DEFAULT_SCANS),
            step: non_zero_or(self.step, DEFAULT_STEP),
            selection: self.selection,
        }
    }
}

/// Retry configuration for transient connection failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 2)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 10 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Retry config that never retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 0,
            ..Default::default()
        }
    }
}

pub(crate) fn non_zero_or<T: PartialEq + Default>(value: T, fallback: T) -> T {
    if value == T::default() {
        fallback
    } else {
        value
    }
}

fn default_port() -> u16 {
    563
}

fn default_true() -> bool {
    true
}

fn default_connections() -> usize {
    DEFAULT_CONNECTIONS
}

fn default_days() -> u32 {
    DEFAULT_DAYS
}

fn default_scans() -> usize {
    DEFAULT_SCANS
}

fn default_step() -> u64 {
    DEFAULT_STEP
}

fn default_max_attempts() -> u32 {
    2
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Conversion from our ServerConfig to nntp-rs's ServerConfig
impl From<ServerConfig> for nntp_rs::ServerConfig {
    fn from(config: ServerConfig) -> Self {
        nntp_rs::ServerConfig {
            host: config.host,
            port: config.port,
            tls: config.tls,
            allow_insecure_tls: false,
            username: config.username.unwrap_or_default(),
            password: config.password.unwrap_or_default(),
        }
    }
}
