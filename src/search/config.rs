//! Search configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Where index data is kept
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IndexStorage {
    /// One directory per index under `index_path`
    Disk,
    /// Volatile, process-local indexes
    Memory,
}

/// Search service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Root directory holding one sub-directory per index
    pub index_path: PathBuf,

    /// Storage backend for the indexes
    pub storage: IndexStorage,

    /// Index writer heap size in bytes, per index (default: 20MB)
    pub writer_heap_size: usize,

    /// Number of indexing threads per index writer
    pub indexing_threads: usize,

    /// Page size used when a caller does not ask for one
    pub default_limit: usize,

    /// Largest page a caller may request
    pub max_limit: usize,

    /// Deepest `offset + limit` a caller may page to
    pub max_result_window: usize,

    /// Deadline for a whole fan-out search, in milliseconds
    pub query_timeout_ms: u64,

    /// Directory of extra `<index>.json` mappings registered at bootstrap
    pub extra_mappings_dir: Option<PathBuf>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("./data/search_index"),
            storage: IndexStorage::Disk,
            writer_heap_size: 20_000_000, // 20MB
            indexing_threads: 1,
            default_limit: 20,
            max_limit: 100,
            max_result_window: 10_000,
            query_timeout_ms: 3_000,
            extra_mappings_dir: None,
        }
    }
}

impl SearchConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

/// Sync consumer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Topic carrying change events
    pub topic: String,

    /// First retry delay after a failed subscribe or a nack, in milliseconds
    pub backoff_base_ms: u64,

    /// Upper bound of the retry delay, in milliseconds
    pub backoff_cap_ms: u64,

    /// Consecutive failed subscribes before the consumer gives up
    pub max_subscribe_attempts: u32,

    /// Dead-letter a message after this many consecutive engine failures
    pub dead_letter_after: Option<u32>,

    /// Topic receiving dead-lettered messages
    pub dead_letter_topic: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            topic: "search_sync_event".to_string(),
            backoff_base_ms: 1_000,
            backoff_cap_ms: 30_000,
            max_subscribe_attempts: 10,
            dead_letter_after: None,
            dead_letter_topic: "search_sync_event_dlq".to_string(),
        }
    }
}

impl SyncConfig {
    /// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`, capped
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let millis = self
            .backoff_base_ms
            .saturating_mul(1u64 << exponent)
            .min(self.backoff_cap_ms);
        Duration::from_millis(millis)
    }
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn index_path(mut self, path: PathBuf) -> Self {
        self.config.index_path = path;
        self
    }

    pub fn in_memory(mut self) -> Self {
        self.config.storage = IndexStorage::Memory;
        self
    }

    pub fn writer_heap_size(mut self, size: usize) -> Self {
        self.config.writer_heap_size = size;
        self
    }

    pub fn indexing_threads(mut self, threads: usize) -> Self {
        self.config.indexing_threads = threads;
        self
    }

    pub fn default_limit(mut self, limit: usize) -> Self {
        self.config.default_limit = limit;
        self
    }

    pub fn max_limit(mut self, limit: usize) -> Self {
        self.config.max_limit = limit;
        self
    }

    pub fn max_result_window(mut self, window: usize) -> Self {
        self.config.max_result_window = window;
        self
    }

    pub fn query_timeout_ms(mut self, millis: u64) -> Self {
        self.config.query_timeout_ms = millis;
        self
    }

    pub fn extra_mappings_dir(mut self, dir: PathBuf) -> Self {
        self.config.extra_mappings_dir = Some(dir);
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
