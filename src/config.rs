//! Client configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_SOCKET_URL: &str = "http://localhost:8080";
pub const DEFAULT_SOCKET_PATH: &str = "/ws/socket.io";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid boolean for {var}: {value}")]
    InvalidBool { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Timeouts {
    #[must_use]
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// REST base, including the `/api` prefix.
    pub api_url: String,
    /// HTTP origin of the realtime socket server.
    pub socket_url: String,
    /// Mount path of the socket.io endpoint on `socket_url`.
    pub socket_path: String,
    pub timeouts: Timeouts,
    /// Re-establish the realtime socket after an unexpected drop.
    pub reconnect: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            socket_url: DEFAULT_SOCKET_URL.to_owned(),
            socket_path: DEFAULT_SOCKET_PATH.to_owned(),
            timeouts: Timeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
            reconnect: true,
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `TESTDECK_API_URL`: default `http://localhost:8080/api`
    /// - `TESTDECK_SOCKET_URL`: default `http://localhost:8080`
    /// - `TESTDECK_SOCKET_PATH`: default `/ws/socket.io`
    /// - `TESTDECK_REQUEST_TIMEOUT_SECS`: default 30
    /// - `TESTDECK_CONNECT_TIMEOUT_SECS`: default 10
    /// - `TESTDECK_RECONNECT`: `true` (default) or `false`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBool`] when `TESTDECK_RECONNECT` is not a
    /// recognizable boolean.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = env_url("TESTDECK_API_URL", DEFAULT_API_URL);
        let socket_url = env_url("TESTDECK_SOCKET_URL", DEFAULT_SOCKET_URL);
        let socket_path = normalize_path(
            &std::env::var("TESTDECK_SOCKET_PATH").unwrap_or_else(|_| DEFAULT_SOCKET_PATH.to_owned()),
        );
        let timeouts = Timeouts {
            request_secs: env_parse_u64("TESTDECK_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("TESTDECK_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let reconnect = parse_bool("TESTDECK_RECONNECT", std::env::var("TESTDECK_RECONNECT").ok().as_deref())?;

        Ok(Self { api_url, socket_url, socket_path, timeouts, reconnect })
    }

    #[must_use]
    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.trim_end_matches('/').to_owned();
        self
    }

    #[must_use]
    pub fn with_socket_url(mut self, url: &str) -> Self {
        self.socket_url = url.trim_end_matches('/').to_owned();
        self
    }

    #[must_use]
    pub fn with_reconnect(mut self, reconnect: bool) -> Self {
        self.reconnect = reconnect;
        self
    }
}

fn env_url(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_owned())
        .trim_end_matches('/')
        .to_owned()
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn normalize_path(raw: &str) -> String {
    let trimmed = raw.trim_matches('/');
    format!("/{trimmed}")
}

fn parse_bool(var: &'static str, raw: Option<&str>) -> Result<bool, ConfigError> {
    match raw.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        None | Some("") => Ok(true),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(ConfigError::InvalidBool { var, value: other.to_owned() }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
