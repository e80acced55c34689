//! Content store configuration.

use serde::{Deserialize, Serialize};

/// Top-level content store configuration.
///
/// The content store is organized in numbered tiers (fast local disk,
/// slow archival volume, and so on). Folders may pin a tier; documents
/// without a pin land in [`StorageConfig::write_tier`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// The tier new content is written to when no folder pins one.
    #[serde(default = "default_write_tier")]
    pub write_tier: i32,
    /// The configured storage tiers.
    #[serde(default = "default_tiers")]
    pub tiers: Vec<TierConfig>,
}

/// A single storage tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierConfig {
    /// Numeric tier identifier referenced by folder pins.
    pub id: i32,
    /// Root directory of this tier on the local filesystem.
    pub root_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            write_tier: default_write_tier(),
            tiers: default_tiers(),
        }
    }
}

fn default_write_tier() -> i32 {
    1
}

fn default_tiers() -> Vec<TierConfig> {
    vec![TierConfig {
        id: 1,
        root_path: "./data/store".to_string(),
    }]
}
