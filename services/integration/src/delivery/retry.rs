use std::time::Duration;

/// Bounded exponential backoff.
///
/// The delay after failed attempt `k` (1-based) is `base_delay * 2^k`, so the
/// defaults wait 2s before attempt 2 and 4s before attempt 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Applies to each attempt on its own, not to the whole delivery.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after `attempt` failed, or `None` if it was the last one.
    pub fn backoff_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        Some(self.base_delay.saturating_mul(factor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, Some(2))]
    #[case(2, Some(4))]
    #[case(3, None)]
    fn test_default_backoff(#[case] attempt: u32, #[case] secs: Option<u64>) {
        assert_eq!(
            RetryPolicy::default().backoff_after(attempt),
            secs.map(Duration::from_secs)
        );
    }

    #[test]
    fn test_large_attempt_counts_saturate() {
        let policy = RetryPolicy {
            max_attempts: 100,
            ..Default::default()
        };
        assert!(policy.backoff_after(64).is_some());
    }
}
