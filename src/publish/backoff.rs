//! Retry schedule for batch delivery.

use std::time::Duration;

use rand::Rng;

use crate::config::PublisherConfig;

/// Doubling delay between delivery attempts, capped at `max_delay`, with up
/// to 10% random jitter on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &PublisherConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }

    /// Whether a batch already retried `retries` times may be sent again.
    pub fn allows(&self, retries: u32) -> bool {
        retries < self.max_retries
    }

    /// Delay before retry number `retry` (1-based). The first attempt has none.
    pub fn delay(&self, retry: u32) -> Duration {
        let Some(doublings) = retry.checked_sub(1) else {
            return Duration::ZERO;
        };
        let scale = 1u32.checked_shl(doublings).unwrap_or(u32::MAX);
        let delay = self.base_delay.saturating_mul(scale).min(self.max_delay);
        delay + jitter(delay)
    }
}

fn jitter(delay: Duration) -> Duration {
    let range_ms = u64::try_from(delay.as_millis() / 10).unwrap_or(u64::MAX);
    if range_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..range_ms))
}
