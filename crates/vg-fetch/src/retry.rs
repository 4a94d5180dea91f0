//! Retry policy: capped exponential backoff plus player-client rotation.

use std::time::Duration;

use vg_core::config::FetchConfig;

/// Backoff schedule and client permutation for extraction attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    player_clients: Vec<String>,
}

impl RetryPolicy {
    /// Build a policy from the fetch configuration.
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            player_clients: config.player_clients.clone(),
        }
    }

    /// Total number of attempts before giving up.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to sleep after the given (0-based) failed attempt.
    ///
    /// Doubles per attempt from the base delay, capped at the maximum.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        let delay = self.base_delay.saturating_mul(factor);
        delay.min(self.max_delay)
    }

    /// Player client to use for the given (0-based) attempt.
    ///
    /// Rotates through the configured clients; `None` when no clients are
    /// configured, leaving the extractor's default in place.
    pub fn player_client(&self, attempt: u32) -> Option<&str> {
        if self.player_clients.is_empty() {
            return None;
        }
        let idx = attempt as usize % self.player_clients.len();
        Some(self.player_clients[idx].as_str())
    }
}
