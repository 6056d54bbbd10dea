use rand::Rng;
use std::time::Duration;

/// Delay between polls: the fixed interval while healthy, capped exponential
/// growth plus jitter after consecutive failures.
#[derive(Debug, Clone)]
pub struct Backoff {
    interval: Duration,
    max_delay: Duration,
    jitter: Duration,
}

impl Backoff {
    pub fn new(interval: Duration, max_delay: Duration, jitter: Duration) -> Self {
        Self {
            interval,
            max_delay: max_delay.max(interval),
            jitter,
        }
    }

    /// Delay without jitter after `failures` consecutive failed polls.
    pub fn base_delay(&self, failures: u32) -> Duration {
        if failures == 0 {
            return self.interval;
        }
        let factor = 2u32.saturating_pow(failures - 1);
        self.interval
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    pub fn next_delay(&self, failures: u32) -> Duration {
        let base = self.base_delay(failures);
        if failures == 0 || self.jitter.is_zero() {
            return base;
        }
        let jitter_ms = self.jitter.as_millis().min(u64::MAX as u128) as u64;
        base + Duration::from_millis(rand::thread_rng().gen_range(0..jitter_ms))
    }
}
