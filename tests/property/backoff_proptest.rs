//! Property-based tests for save retry backoff

use std::time::Duration;

use notecollab::client::{BackoffPolicy, SaveSchedulerConfig};
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_retry_budget_matches_config(max_retries in 0u32..10) {
        let config = SaveSchedulerConfig::default().with_max_retries(max_retries);
        let policy = BackoffPolicy::from(&config);

        for retry in 1..=max_retries {
            prop_assert!(policy.next_delay(retry).is_some());
        }
        prop_assert!(policy.next_delay(max_retries + 1).is_none());
    }

    #[test]
    fn test_default_delays_stay_within_bounds(retry in 1u32..100) {
        let delay = BackoffPolicy::default().delay_for(retry);
        prop_assert!(delay >= Duration::from_secs(1));
        prop_assert!(delay <= Duration::from_secs(10));
    }
}
