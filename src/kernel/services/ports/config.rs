use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub respect_gitignore: bool,
    pub include_hidden: bool,
    pub follow_links: bool,
    pub skip_binary: bool,
    pub progress_interval: usize,
    pub status_timeout_ms: u64,
    pub error_timeout_ms: u64,
    pub history_limit: usize,
    pub default_masks: Vec<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            respect_gitignore: true,
            include_hidden: false,
            follow_links: false,
            skip_binary: true,
            progress_interval: 1,
            status_timeout_ms: 30_000,
            error_timeout_ms: 5_000,
            history_limit: 20,
            default_masks: Vec::new(),
        }
    }
}

impl SearchSettings {
    pub fn progress_step(&self) -> usize {
        self.progress_interval.max(1)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_millis(self.status_timeout_ms)
    }

    pub fn error_timeout(&self) -> Duration {
        Duration::from_millis(self.error_timeout_ms)
    }
}
