//! # Retry Backoff
//!
//! Exponential backoff for failed saves: the n-th retry waits
//! `base * 2^(n-1)`, never longer than `cap`. Once `max_retries` retries
//! have failed the policy gives up and the caller must surface the failure.

use std::time::Duration;

use crate::client::config::SaveSchedulerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base: Duration,
    cap: Duration,
    max_retries: u32,
}

impl BackoffPolicy {
    pub fn new(base: Duration, cap: Duration, max_retries: u32) -> Self {
        Self {
            base,
            cap: cap.max(base),
            max_retries,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        self.base
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.cap)
            .min(self.cap)
    }

    /// Delay before retry number `retry`, or `None` once retries are exhausted
    pub fn next_delay(&self, retry: u32) -> Option<Duration> {
        (retry <= self.max_retries).then(|| self.delay_for(retry))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from(&SaveSchedulerConfig::default())
    }
}

impl From<&SaveSchedulerConfig> for BackoffPolicy {
    fn from(config: &SaveSchedulerConfig) -> Self {
        Self::new(config.backoff_base, config.backoff_cap, config.max_retries)
    }
}
