use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, Result};
use unitrace_db::{DbConfig, StoreBackend};

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub log_level: String,
    pub dev_mode: bool,
    pub store: StoreBackend,
    pub database: DbConfig,
    /// Base URL of the serialization service.
    pub serialization_url: String,
    /// Upper bound on each member validation call.
    pub validation_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let listen_addr = std::env::var("UNITRACE_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3004".to_string())
            .parse()?;

        let log_level = std::env::var("UNITRACE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let dev_mode = std::env::var("UNITRACE_DEV")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        let store = std::env::var("UNITRACE_STORE")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()
            .map_err(|e: String| anyhow!(e))?;

        let serialization_url = std::env::var("SERIALIZATION_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3001".to_string());

        let validation_timeout = std::env::var("VALIDATION_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));

        Ok(Self {
            listen_addr,
            log_level,
            dev_mode,
            store,
            database: DbConfig::from_env(),
            serialization_url,
            validation_timeout,
        })
    }
}
