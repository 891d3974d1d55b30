//! Retry strategy.
//!
//! This module configures how transient server failures are retried.

use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;

/// Creates an exponential backoff retry strategy.
///
/// Returns a retry strategy configured with:
/// - Initial delay: `RETRY_INITIAL_DELAY_MS` milliseconds
/// - Backoff factor: `RETRY_FACTOR` (doubles delay each retry)
/// - Maximum delay: `RETRY_MAX_DELAY_SECS` seconds
///
/// The iterator is unbounded; callers cap it with `.take(n)`.
pub fn get_retry_strategy() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(crate::config::RETRY_INITIAL_DELAY_MS)
        .factor(crate::config::RETRY_FACTOR) // Double the delay with each retry
        .max_delay(Duration::from_secs(crate::config::RETRY_MAX_DELAY_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_strategy_grows_and_caps() {
        let delays: Vec<Duration> = get_retry_strategy().take(8).collect();
        assert_eq!(delays.len(), 8);
        for pair in delays.windows(2) {
            assert!(pair[1] >= pair[0], "delays should not shrink: {:?}", delays);
        }
        let cap = Duration::from_secs(crate::config::RETRY_MAX_DELAY_SECS);
        assert!(delays.iter().all(|d| *d <= cap));
    }

    #[test]
    fn test_retry_strategy_first_delay_nonzero() {
        let first = get_retry_strategy().next().unwrap();
        assert!(first > Duration::ZERO);
    }
}
