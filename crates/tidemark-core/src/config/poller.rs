use serde::{Deserialize, Serialize};

/// Configuration for the change poller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Interval between poll cycles (milliseconds)
    /// Default: 5000ms
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Wait after a failed cycle before retrying (milliseconds)
    /// Default: 5000ms
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,

    /// Maximum number of changes processed per cycle (scanning is not
    /// capped, so non-matching runs never stall a cycle)
    /// Default: 1000
    #[serde(default = "default_batch_max")]
    pub batch_max: usize,
}

fn default_poll_interval_ms() -> u64 {
    5000
}

fn default_error_backoff_ms() -> u64 {
    5000
}

fn default_batch_max() -> usize {
    1000
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            error_backoff_ms: default_error_backoff_ms(),
            batch_max: default_batch_max(),
        }
    }
}

impl PollerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn with_error_backoff_ms(mut self, ms: u64) -> Self {
        self.error_backoff_ms = ms;
        self
    }

    pub fn with_batch_max(mut self, max: usize) -> Self {
        self.batch_max = max;
        self
    }
}
