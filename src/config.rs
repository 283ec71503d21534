//! Server configuration loaded from the environment

use std::{net::SocketAddr, path::PathBuf, str::FromStr};

use crate::error::{BacklogError, Result};

/// Which persistence backend the server runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    File,
    Sqlite,
}

impl FromStr for StorageKind {
    type Err = BacklogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "file" => Ok(Self::File),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(BacklogError::ConfigError(format!(
                "Invalid storage backend '{}'. Valid backends: file, sqlite",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub storage: StorageKind,
    /// Root for the file backend
    pub data_dir: PathBuf,
    /// Database file for the sqlite backend
    pub database_path: PathBuf,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            storage: StorageKind::File,
            data_dir: PathBuf::from("."),
            database_path: PathBuf::from("backlog.db"),
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    pub const BIND_ADDR: &'static str = "BACKLOG_BIND_ADDR";
    pub const STORAGE: &'static str = "BACKLOG_STORAGE";
    pub const DATA_DIR: &'static str = "BACKLOG_DATA_DIR";
    pub const DATABASE_PATH: &'static str = "BACKLOG_DATABASE_PATH";
    pub const LOG_LEVEL: &'static str = "BACKLOG_LOG_LEVEL";

    /// Loads `.env` if present, then reads the process environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(addr) = lookup(Self::BIND_ADDR) {
            config.bind_addr = addr.parse().map_err(|_| {
                BacklogError::ConfigError(format!(
                    "{} is not a socket address: {}",
                    Self::BIND_ADDR,
                    addr
                ))
            })?;
        }
        if let Some(storage) = lookup(Self::STORAGE) {
            config.storage = storage.parse()?;
        }
        if let Some(dir) = lookup(Self::DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup(Self::DATABASE_PATH) {
            config.database_path = PathBuf::from(path);
        }
        if let Some(level) = lookup(Self::LOG_LEVEL) {
            config.log_level = level;
        }

        Ok(config)
    }
}
