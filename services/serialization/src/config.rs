use std::net::SocketAddr;

use anyhow::{anyhow, Result};
use unitrace_db::{DbConfig, StoreBackend};

use crate::allocator::AllocationStrategy;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub log_level: String,
    pub dev_mode: bool,
    pub store: StoreBackend,
    pub allocation: AllocationStrategy,
    pub database: DbConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let listen_addr = std::env::var("UNITRACE_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3001".to_string())
            .parse()?;

        let log_level = std::env::var("UNITRACE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let dev_mode = std::env::var("UNITRACE_DEV")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        let store = std::env::var("UNITRACE_STORE")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()
            .map_err(|e: String| anyhow!(e))?;

        let allocation = std::env::var("SERIAL_ALLOCATION")
            .unwrap_or_else(|_| "counter".to_string())
            .parse()
            .map_err(|e: String| anyhow!(e))?;

        let database = DbConfig::from_env();

        Ok(Self {
            listen_addr,
            log_level,
            dev_mode,
            store,
            allocation,
            database,
        })
    }
}
