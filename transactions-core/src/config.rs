//! Configuration for the transactions core

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Transactions core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// RocksDB configuration
    pub rocksdb: RocksDBConfig,

    /// Discharge worker configuration
    pub discharge: DischargeConfig,

    /// Request path configuration
    pub service: ServiceConfig,

    /// Lookup cache configuration
    pub cache: CacheConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/transactions"),
            service_name: "transactions-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            rocksdb: RocksDBConfig::default(),
            discharge: DischargeConfig::default(),
            service: ServiceConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RocksDBConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksDBConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 4,
            max_background_jobs: 2,
            enable_statistics: false,
        }
    }
}

/// Discharge worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DischargeConfig {
    /// Number of worker actors; each account always lands on the same one
    pub workers: usize,

    /// Bounded mailbox size per worker
    pub mailbox_capacity: usize,

    /// Per-job timeout (milliseconds), 0 disables it
    pub job_timeout_ms: u64,

    /// Capacity of the report broadcast channel
    pub report_capacity: usize,
}

impl Default for DischargeConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            mailbox_capacity: 1000,
            job_timeout_ms: 30_000,
            report_capacity: 256,
        }
    }
}

impl DischargeConfig {
    /// Per-job timeout, `None` when unbounded
    pub fn job_timeout(&self) -> Option<Duration> {
        (self.job_timeout_ms > 0).then(|| Duration::from_millis(self.job_timeout_ms))
    }
}

/// Request path configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Deadline for validate + lookups + write (milliseconds)
    pub request_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 5_000,
        }
    }
}

impl ServiceConfig {
    /// Request deadline
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Lookup cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable caching of account and operation type lookups
    pub enabled: bool,

    /// Account entry TTL (seconds)
    pub account_ttl_secs: u64,

    /// Operation type entry TTL (seconds)
    pub operation_type_ttl_secs: u64,
}

impl CacheConfig {
    /// Account entry TTL
    pub fn account_ttl(&self) -> Duration {
        Duration::from_secs(self.account_ttl_secs)
    }

    /// Operation type entry TTL
    pub fn operation_type_ttl(&self) -> Duration {
        Duration::from_secs(self.operation_type_ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            account_ttl_secs: crate::cache::ttl::ACCOUNT,
            operation_type_ttl_secs: crate::cache::ttl::OPERATION_TYPE,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("TXN_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(workers) = std::env::var("TXN_DISCHARGE_WORKERS") {
            config.discharge.workers = parse_env("TXN_DISCHARGE_WORKERS", &workers)?;
        }

        if let Ok(timeout) = std::env::var("TXN_DISCHARGE_TIMEOUT_MS") {
            config.discharge.job_timeout_ms = parse_env("TXN_DISCHARGE_TIMEOUT_MS", &timeout)?;
        }

        if let Ok(timeout) = std::env::var("TXN_REQUEST_TIMEOUT_MS") {
            config.service.request_timeout_ms = parse_env("TXN_REQUEST_TIMEOUT_MS", &timeout)?;
        }

        if let Ok(enabled) = std::env::var("TXN_CACHE_ENABLED") {
            config.cache.enabled = parse_env("TXN_CACHE_ENABLED", &enabled)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the runtime cannot honour
    pub fn validate(&self) -> crate::Result<()> {
        if self.discharge.workers == 0 {
            return Err(crate::Error::Config(
                "discharge.workers must be at least 1".to_string(),
            ));
        }

        if self.discharge.mailbox_capacity == 0 || self.discharge.report_capacity == 0 {
            return Err(crate::Error::Config(
                "discharge channel capacities must be positive".to_string(),
            ));
        }

        if self.service.request_timeout_ms == 0 {
            return Err(crate::Error::Config(
                "service.request_timeout_ms must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> crate::Result<T> {
    value
        .parse()
        .map_err(|_| crate::Error::Config(format!("{} has invalid value {:?}", name, value)))
}
