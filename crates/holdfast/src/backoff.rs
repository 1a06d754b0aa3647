//! Delay-before-next-attempt calculation.

use std::time::Duration;

use rand::Rng;

/// Computes the delay before the next attempt.
///
/// With no jitter the delay is returned unchanged, so retries are
/// deterministic. A positive jitter adds a uniform random extra in
/// `[0, jitter)` to spread out retries across concurrently waited checks.
pub(crate) fn next_delay(delay: Duration, jitter: Duration) -> Duration {
    if jitter.is_zero() {
        return delay;
    }

    // Jitter beyond what fits in u64 nanoseconds is clamped, and the sum
    // saturates, so extreme configurations cannot panic here.
    let nanos = u64::try_from(jitter.as_nanos()).unwrap_or(u64::MAX);
    let extra = rand::thread_rng().gen_range(0..nanos);
    delay.saturating_add(Duration::from_nanos(extra))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_jitter_is_deterministic() {
        let delay = Duration::from_millis(250);
        for _ in 0..10 {
            assert_eq!(next_delay(delay, Duration::ZERO), delay);
        }
    }

    #[test]
    fn jittered_delay_stays_in_range() {
        let delay = Duration::from_millis(100);
        let jitter = Duration::from_millis(50);
        for _ in 0..1000 {
            let d = next_delay(delay, jitter);
            assert!(d >= delay, "{d:?} below base delay");
            assert!(d < delay + jitter, "{d:?} at or above delay + jitter");
        }
    }

    #[test]
    fn extreme_durations_saturate_instead_of_panicking() {
        assert_eq!(next_delay(Duration::MAX, Duration::MAX), Duration::MAX);
        let d = next_delay(Duration::from_secs(1), Duration::MAX);
        assert!(d >= Duration::from_secs(1));
    }

    #[test]
    fn zero_delay_with_jitter() {
        let jitter = Duration::from_millis(10);
        let d = next_delay(Duration::ZERO, jitter);
        assert!(d < jitter);
    }
}
