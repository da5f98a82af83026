//! Configuration for the index pool.
//!
//! This module handles loading configuration from TOML files and
//! environment variables, with sensible defaults for all settings.
//! Per-index schema constructors are supplied separately, at pool
//! build time, because schemas are code rather than configuration.

use crate::error::{PoolError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub writer: WriterConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory under which each index gets its own subdirectory
    #[serde(default = "default_index_root")]
    pub index_root: PathBuf,
}

/// Writer coordination configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WriterConfig {
    /// Heap budget for each index writer, in megabytes
    #[serde(default = "default_heap_mb")]
    pub heap_mb: usize,

    /// Policy for write requests arriving while a writer is active
    #[serde(default)]
    pub backpressure: BackpressurePolicy,

    /// Maximum time to wait for write exclusivity, in milliseconds.
    /// Zero means wait indefinitely. Only meaningful under the
    /// `queue` policy; ignored under `reject`.
    #[serde(default)]
    pub acquire_timeout_ms: u64,
}

/// Backpressure policy for concurrent write requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackpressurePolicy {
    /// Queue behind the active writer until exclusivity is granted
    #[default]
    Queue,
    /// Fail immediately with `WriterBusy` if a writer is active
    Reject,
}

// Default value functions
fn default_index_root() -> PathBuf {
    PathBuf::from("./data")
}

fn default_heap_mb() -> usize {
    50
}

/// Minimum writer heap Tantivy will accept without degrading
const MIN_HEAP_MB: usize = 15;

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            index_root: default_index_root(),
        }
    }
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            heap_mb: default_heap_mb(),
            backpressure: BackpressurePolicy::default(),
            acquire_timeout_ms: 0,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| PoolError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load config with priority: env vars > TOML > defaults
    ///
    /// Reads the file named by `SEARCHPOOL_CONFIG` if set, then applies
    /// `SEARCHPOOL_*` environment overrides and validates the result.
    pub fn load() -> Result<Self> {
        let mut config = if let Ok(config_path) = env::var("SEARCHPOOL_CONFIG") {
            Self::from_file(config_path)?
        } else {
            Self::default()
        };

        config.merge_env();
        config.validate()?;

        Ok(config)
    }

    /// Merge configuration with environment variables
    pub fn merge_env(&mut self) {
        if let Ok(root) = env::var("SEARCHPOOL_INDEX_ROOT") {
            self.storage.index_root = PathBuf::from(root);
        }

        if let Ok(heap) = env::var("SEARCHPOOL_WRITER_HEAP_MB") {
            if let Ok(mb) = heap.parse() {
                self.writer.heap_mb = mb;
            }
        }

        if let Ok(policy) = env::var("SEARCHPOOL_BACKPRESSURE") {
            match policy.to_lowercase().as_str() {
                "queue" => self.writer.backpressure = BackpressurePolicy::Queue,
                "reject" => self.writer.backpressure = BackpressurePolicy::Reject,
                _ => {}
            }
        }

        if let Ok(timeout) = env::var("SEARCHPOOL_ACQUIRE_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                self.writer.acquire_timeout_ms = ms;
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.writer.heap_mb < MIN_HEAP_MB {
            return Err(PoolError::ConfigError(format!(
                "Writer heap must be at least {MIN_HEAP_MB} MB (got {})",
                self.writer.heap_mb
            )));
        }

        if self.storage.index_root.as_os_str().is_empty() {
            return Err(PoolError::ConfigError(
                "Index root must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Writer heap budget in bytes
    pub fn writer_heap_bytes(&self) -> usize {
        self.writer.heap_mb * 1_000_000
    }

    /// Log configuration
    pub fn log_config(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Index root: {:?}", self.storage.index_root);
        tracing::info!("  Writer heap: {} MB", self.writer.heap_mb);
        tracing::info!("  Backpressure: {:?}", self.writer.backpressure);
        tracing::info!(
            "  Acquire timeout: {}",
            if self.writer.acquire_timeout_ms == 0 {
                "unbounded".to_string()
            } else {
                format!("{} ms", self.writer.acquire_timeout_ms)
            }
        );
    }
}
