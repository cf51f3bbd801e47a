use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;

use crate::delivery::RetryPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub log_level: String,
    /// Where pushed payloads are posted.
    pub external_api: String,
    pub retry: RetryPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let listen_addr = std::env::var("UNITRACE_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3005".to_string())
            .parse()?;

        let log_level = std::env::var("UNITRACE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let external_api = std::env::var("EXTERNAL_API")
            .unwrap_or_else(|_| "https://external-endpoint/api".to_string());

        let defaults = RetryPolicy::default();
        let max_attempts = std::env::var("DELIVERY_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n: &u32| *n >= 1)
            .unwrap_or(defaults.max_attempts);
        let attempt_timeout = std::env::var("DELIVERY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.attempt_timeout);

        Ok(Self {
            listen_addr,
            log_level,
            external_api,
            retry: RetryPolicy {
                max_attempts,
                attempt_timeout,
                ..defaults
            },
        })
    }
}
