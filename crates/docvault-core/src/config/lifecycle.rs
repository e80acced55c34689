//! Lifecycle coordinator configuration.

use serde::{Deserialize, Serialize};

/// Settings governing the document lifecycle coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Version assigned to the first stored revision of a document.
    #[serde(default = "default_start_version")]
    pub start_version: String,
    /// How many times the background version writer polls the record
    /// store for the owning document before abandoning the write.
    #[serde(default = "default_version_write_attempts")]
    pub version_write_max_attempts: u32,
    /// Milliseconds between existence polls of the background version
    /// writer. Together with the attempt budget this bounds the
    /// consistency window (default ~100 seconds).
    #[serde(default = "default_version_write_interval")]
    pub version_write_interval_ms: u64,
    /// When true, a document whose content extraction fails is durably
    /// excluded from the index instead of being retried forever.
    #[serde(default)]
    pub index_skip_on_error: bool,
    /// Storage tier used when neither a folder nor one of its ancestors
    /// pins one.
    #[serde(default = "default_write_tier")]
    pub default_tier: i32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            start_version: default_start_version(),
            version_write_max_attempts: default_version_write_attempts(),
            version_write_interval_ms: default_version_write_interval(),
            index_skip_on_error: false,
            default_tier: default_write_tier(),
        }
    }
}

fn default_start_version() -> String {
    "1.0".to_string()
}

fn default_version_write_attempts() -> u32 {
    100
}

fn default_version_write_interval() -> u64 {
    1000
}

fn default_write_tier() -> i32 {
    1
}
