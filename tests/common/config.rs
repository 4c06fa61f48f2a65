//! Test configuration helpers for loading .env credentials

use std::time::Duration;

use nzb_direct_search::{Config, RetryConfig, SearchConfig, ServerConfig};

/// Error type for test configuration
#[derive(Debug)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Config error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Load NNTP server configuration from environment variables
///
/// Required environment variables:
/// - `NNTP_HOST` - Server hostname
/// - `NNTP_USERNAME` - Authentication username
/// - `NNTP_PASSWORD` - Authentication password
///
/// Optional environment variables:
/// - `NNTP_PORT_SSL` - TLS port (default: 563)
pub fn load_server_config() -> Result<ServerConfig, ConfigError> {
    dotenvy::dotenv().ok();

    let host = std::env::var("NNTP_HOST")
        .map_err(|_| ConfigError("NNTP_HOST not set in environment".to_string()))?;

    let port: u16 = std::env::var("NNTP_PORT_SSL")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(563);

    let username = std::env::var("NNTP_USERNAME")
        .map_err(|_| ConfigError("NNTP_USERNAME not set in environment".to_string()))?;

    let password = std::env::var("NNTP_PASSWORD")
        .map_err(|_| ConfigError("NNTP_PASSWORD not set in environment".to_string()))?;

    Ok(ServerConfig {
        host,
        port,
        tls: true,
        username: Some(username),
        password: Some(password),
    })
}

/// Live search configuration
///
/// Optional environment variables:
/// - `NNTP_CONNECTIONS` - Number of connections (default: 4)
pub fn load_live_config() -> Result<Config, ConfigError> {
    let server = load_server_config()?;
    let connections: usize = std::env::var("NNTP_CONNECTIONS")
        .ok()
        .and_then(|c| c.parse().ok())
        .unwrap_or(4);

    Ok(Config {
        server,
        search: SearchConfig {
            connections,
            days: 1,
            ..Default::default()
        },
        ..Default::default()
    })
}

/// Group used by live tests (`NNTP_TEST_GROUP`, default `alt.binaries.test`)
pub fn live_test_group() -> String {
    dotenvy::dotenv().ok();
    std::env::var("NNTP_TEST_GROUP").unwrap_or_else(|_| "alt.binaries.test".to_string())
}

/// Check if live test credentials are available
pub fn has_live_credentials() -> bool {
    dotenvy::dotenv().ok();
    std::env::var("NNTP_HOST").is_ok()
        && std::env::var("NNTP_USERNAME").is_ok()
        && std::env::var("NNTP_PASSWORD").is_ok()
}

/// Search configuration for synthetic servers: fast retries, small chunks
pub fn synthetic_config() -> Config {
    Config {
        search: SearchConfig {
            connections: 4,
            days: 2,
            scans: 8,
            step: 4_000,
            ..Default::default()
        },
        retry: RetryConfig {
            max_attempts: 1,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
            jitter: false,
        },
        ..Default::default()
    }
}
