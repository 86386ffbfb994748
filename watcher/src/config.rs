use crate::error::Result;
use crate::error::WatcherError;
use serde::Deserialize;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a watch session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Root directory to watch recursively.
    pub root_dir: PathBuf,

    /// File extensions (without dot) that are dispatched; everything else is
    /// dropped silently.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Window within which repeated modify events for one path are dropped.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Fall back to a polling watch when the native watch cannot start.
    #[serde(default = "default_true")]
    pub poll_fallback: bool,

    /// Poll interval used by the polling strategy.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_extensions() -> Vec<String> {
    ["py", "ts", "rs", "tsx", "jsx", "js"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

fn default_debounce_ms() -> u64 {
    1_000
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_true() -> bool {
    true
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            extensions: default_extensions(),
            debounce_ms: default_debounce_ms(),
            poll_fallback: default_true(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl WatcherConfig {
    pub fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(WatcherError::InvalidConfig(
                "extension allow-list must not be empty".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(WatcherError::InvalidConfig(
                "poll interval must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
