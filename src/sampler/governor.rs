use std::time::{Duration, Instant};

/// Residual sleep that keeps a cycle close to `period`. Overruns yield zero;
/// missed periods are never caught up.
pub fn next_delay(period: Duration, cycle_elapsed: Duration) -> Duration {
    period.saturating_sub(cycle_elapsed)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateGovernor {
    period: Duration,
}

impl RateGovernor {
    pub fn new(period: Duration) -> Self {
        RateGovernor { period }
    }

    /// Builds a governor from a rate in seconds. Negative, NaN and infinite
    /// rates clamp to zero (sample as fast as possible).
    pub fn from_rate_secs(rate: f64) -> Self {
        let period = if rate.is_finite() && rate > 0.0 {
            Duration::try_from_secs_f64(rate).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };
        RateGovernor { period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn delay_for(&self, cycle_start: Instant) -> Duration {
        next_delay(self.period, cycle_start.elapsed())
    }

    /// Blocks the current thread for the rest of the cycle.
    pub fn pace(&self, cycle_start: Instant) {
        let delay = self.delay_for(cycle_start);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn residual_delay_fills_the_period() {
        let delay = next_delay(Duration::from_millis(100), Duration::from_millis(30));
        assert_eq!(delay, Duration::from_millis(70));
    }

    #[test]
    fn overrun_yields_zero() {
        let delay = next_delay(Duration::from_millis(10), Duration::from_millis(25));
        assert_eq!(delay, Duration::ZERO);
    }

    #[test]
    fn invalid_rates_clamp_to_zero() {
        assert_eq!(RateGovernor::from_rate_secs(-1.0).period(), Duration::ZERO);
        assert_eq!(RateGovernor::from_rate_secs(f64::NAN).period(), Duration::ZERO);
        assert_eq!(
            RateGovernor::from_rate_secs(f64::INFINITY).period(),
            Duration::ZERO
        );
        assert_eq!(
            RateGovernor::from_rate_secs(0.01).period(),
            Duration::from_millis(10)
        );
    }

    #[test]
    fn pace_sleeps_at_least_the_residual() {
        let governor = RateGovernor::new(Duration::from_millis(20));
        let start = Instant::now();
        governor.pace(start);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    proptest! {
        #[test]
        fn delay_never_exceeds_period(period_us in 0u64..1_000_000, elapsed_us in 0u64..2_000_000) {
            let period = Duration::from_micros(period_us);
            let elapsed = Duration::from_micros(elapsed_us);
            let delay = next_delay(period, elapsed);
            prop_assert!(delay <= period);
            if elapsed >= period {
                prop_assert_eq!(delay, Duration::ZERO);
            } else {
                prop_assert_eq!(delay + elapsed, period);
            }
        }
    }
}
