// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure, immutable once the server starts
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Listen address as `host:port`
    pub addr: String,
    /// Directory exposed over HTTP
    pub root: PathBuf,
    /// Files served in place of a directory, tried in order
    pub index_files: Vec<String>,
    /// List directories without an index file (403 otherwise)
    pub directory_listing: bool,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// `combined`, `common`, `json` or a custom `$variable` pattern
    pub access_log_format: String,
}

/// Connection tuning
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// Seconds allowed for a client to send the request headers
    pub header_read_timeout: u64,
    pub keep_alive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: super::DEFAULT_ADDR.to_string(),
            root: PathBuf::from("."),
            index_files: vec!["index.html".to_string()],
            directory_listing: true,
            logging: LoggingConfig::default(),
            performance: PerformanceConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            access_log: true,
            access_log_format: "combined".to_string(),
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            header_read_timeout: 30,
            keep_alive: true,
        }
    }
}
