use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::error::ConfigError;
use crate::session::SubmissionDateSource;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
}

impl ServerConfig {
    pub fn new_from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://attendance.db?mode=rwc".to_string()),
            bind_addr: try_load("BIND_ADDR", "127.0.0.1:5000")?,
        })
    }
}

/// Where the REST server lives, for [`HttpBackend`](crate::client::HttpBackend).
#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn new_from_env() -> Result<Self, ConfigError> {
        let base_url =
            env::var("ATTENDANCE_API_URL").map_err(|_| ConfigError::Missing("ATTENDANCE_API_URL"))?;
        let timeout_ms: u64 = try_load("ATTENDANCE_HTTP_TIMEOUT_MS", "10000")?;

        Ok(Self {
            request_timeout: Duration::from_millis(timeout_ms),
            ..Self::new(base_url)
        })
    }
}

/// Commit and date policy of an [`AttendanceSession`](crate::session::AttendanceSession).
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub commit_timeout: Duration,
    /// Extra attempts after a transient commit failure.
    pub commit_retries: u32,
    pub retry_delay: Duration,
    pub date_source: SubmissionDateSource,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            commit_timeout: Duration::from_secs(10),
            commit_retries: 1,
            retry_delay: Duration::from_millis(250),
            date_source: SubmissionDateSource::ClientClock,
        }
    }
}

impl SessionConfig {
    pub fn new_from_env() -> Result<Self, ConfigError> {
        let timeout_ms: u64 = try_load("ATTENDANCE_COMMIT_TIMEOUT_MS", "10000")?;
        let retry_delay_ms: u64 = try_load("ATTENDANCE_RETRY_DELAY_MS", "250")?;

        Ok(Self {
            commit_timeout: Duration::from_millis(timeout_ms),
            commit_retries: try_load("ATTENDANCE_COMMIT_RETRIES", "1")?,
            retry_delay: Duration::from_millis(retry_delay_ms),
            date_source: try_load("ATTENDANCE_DATE_SOURCE", "client_clock")?,
        })
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.parse().map_err(|e| ConfigError::Invalid {
        key,
        value: format!("{value} ({e})"),
    })
}
