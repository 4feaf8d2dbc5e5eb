//! Application configuration loaded from environment variables.
//!
//! | Variable             | Default                               |
//! |----------------------|---------------------------------------|
//! | `CONTRACT_ID`        | required                              |
//! | `RPC_URL`            | `https://soroban-testnet.stellar.org` |
//! | `DATABASE_URL`       | `sqlite:./crowdsale_events.db`        |
//! | `API_PORT`           | `3001`                                |
//! | `POLL_INTERVAL_SECS` | `5`                                   |
//! | `EVENTS_PER_PAGE`    | `100` (1..=10000)                     |
//! | `START_LEDGER`       | required, > 0                         |

use std::str::FromStr;

use crate::errors::{IndexerError, Result};

/// Soroban RPC rejects `getEvents` pages larger than this.
const MAX_EVENTS_PER_PAGE: u32 = 10_000;

#[derive(Debug, Clone)]
pub struct Config {
    /// Soroban RPC endpoint
    pub rpc_url: String,
    /// The crowdsale contract address (Strkey format)
    pub contract_id: String,
    /// SQLite database URL or file path
    pub database_url: String,
    /// Port for the REST API server
    pub api_port: u16,
    /// How often (in seconds) to poll the RPC for new events
    pub poll_interval_secs: u64,
    /// Maximum number of events to fetch per RPC request
    pub events_per_page: u32,
    /// Ledger to start from if no checkpoint is saved. Must lie inside the
    /// RPC node's retention window, so there is no usable default.
    pub start_ledger: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let contract_id = required_var("CONTRACT_ID")?;
        let start_ledger = required_var("START_LEDGER")?;
        let start_ledger = start_ledger.trim().parse().map_err(|_| {
            IndexerError::Config(format!("Invalid START_LEDGER: {start_ledger:?}"))
        })?;

        let config = Config {
            rpc_url: string_var("RPC_URL", "https://soroban-testnet.stellar.org"),
            contract_id,
            database_url: string_var("DATABASE_URL", "sqlite:./crowdsale_events.db"),
            api_port: parsed_var("API_PORT", 3001)?,
            poll_interval_secs: parsed_var("POLL_INTERVAL_SECS", 5)?,
            events_per_page: parsed_var("EVENTS_PER_PAGE", 100)?,
            start_ledger,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.contract_id.trim().is_empty() {
            return Err(IndexerError::Config("CONTRACT_ID is empty".to_string()));
        }
        if self.start_ledger == 0 {
            return Err(IndexerError::Config(
                "START_LEDGER must be at least 1".to_string(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(IndexerError::Config(
                "POLL_INTERVAL_SECS must be at least 1".to_string(),
            ));
        }
        if self.events_per_page == 0 || self.events_per_page > MAX_EVENTS_PER_PAGE {
            return Err(IndexerError::Config(format!(
                "EVENTS_PER_PAGE must be within 1..={MAX_EVENTS_PER_PAGE}"
            )));
        }
        Ok(())
    }
}

fn required_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| IndexerError::Config(format!("{key} environment variable is required")))
}

fn string_var(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_var<T: FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| IndexerError::Config(format!("Invalid {key}: {raw:?}"))),
        Err(_) => Ok(default),
    }
}
