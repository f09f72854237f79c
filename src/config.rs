//! Server configuration from environment variables

use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Offset, Utc};

use crate::event_store::EventStoreConfig;
use crate::types::{AppResult, MatchScope};
use crate::utils::offset_from_minutes;

pub const ENV_DATA_DIR: &str = "LEDGER_DATA_DIR";
pub const ENV_DIRECTORY_FILE: &str = "LEDGER_DIRECTORY_FILE";
pub const ENV_ADDR: &str = "LEDGER_ADDR";
pub const ENV_MATCH_SCOPE: &str = "LEDGER_MATCH_SCOPE";
pub const ENV_UTC_OFFSET_MINUTES: &str = "LEDGER_UTC_OFFSET_MINUTES";
pub const ENV_BROADCAST_CAPACITY: &str = "LEDGER_BROADCAST_CAPACITY";

/// Runtime configuration for the ledger server
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Directory holding `registers.jsonl`
    pub data_dir: PathBuf,
    /// Optional JSON seed for persons, sectors and companies
    pub directory_file: Option<PathBuf>,
    pub addr: SocketAddr,
    pub match_scope: MatchScope,
    /// Offset used to find the start of "today" for statistics
    pub utc_offset: FixedOffset,
    pub broadcast_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            directory_file: None,
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            match_scope: MatchScope::Person,
            utc_offset: Utc.fix(),
            broadcast_capacity: 1024,
        }
    }
}

impl LedgerConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> AppResult<Self> {
        let current_dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::from_lookup(&current_dir, |key| env::var(key).ok())
    }

    /// Build configuration from any key lookup. Relative paths are resolved
    /// against `base_dir`; invalid values are errors, unset ones default.
    pub fn from_lookup<F>(base_dir: &Path, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let resolve = |path: String| {
            let path = PathBuf::from(path);
            if path.is_absolute() {
                path
            } else {
                base_dir.join(path)
            }
        };

        config.data_dir = resolve(get(ENV_DATA_DIR).unwrap_or_else(|| "data".to_string()));
        config.directory_file = get(ENV_DIRECTORY_FILE).map(resolve);

        if let Some(addr) = get(ENV_ADDR) {
            config.addr = addr
                .parse()
                .map_err(|e| format!("{}: invalid address '{}': {}", ENV_ADDR, addr, e))?;
        }
        if let Some(scope) = get(ENV_MATCH_SCOPE) {
            config.match_scope = scope
                .parse()
                .map_err(|e| format!("{}: {}", ENV_MATCH_SCOPE, e))?;
        }
        if let Some(minutes) = get(ENV_UTC_OFFSET_MINUTES) {
            config.utc_offset = minutes
                .parse::<i32>()
                .ok()
                .and_then(offset_from_minutes)
                .ok_or_else(|| format!("{}: invalid offset '{}'", ENV_UTC_OFFSET_MINUTES, minutes))?;
        }
        if let Some(capacity) = get(ENV_BROADCAST_CAPACITY) {
            config.broadcast_capacity = match capacity.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(format!(
                        "{}: expected a positive integer, got '{}'",
                        ENV_BROADCAST_CAPACITY, capacity
                    )
                    .into())
                }
            };
        }

        Ok(config)
    }

    /// Store configuration backed by the journal in `data_dir`
    pub fn store_config(&self) -> EventStoreConfig {
        EventStoreConfig::new(&self.data_dir)
    }
}
