//! Fixed-rate tick pacing.

use crate::error::{Error, Result};
use std::thread;
use std::time::{Duration, Instant};

/// Sleeps to absolute deadlines so per-tick work does not accumulate drift
///
/// When a tick overruns its deadline the schedule is re-based on the
/// current time instead of bursting to catch up.
#[derive(Debug)]
pub struct Rate {
    period: Duration,
    next: Instant,
    overruns: u64,
}

impl Rate {
    pub fn new(hz: f64) -> Result<Self> {
        if !(hz.is_finite() && hz > 0.0) {
            return Err(Error::Config(format!("rate must be positive, got {}", hz)));
        }
        let period = Duration::try_from_secs_f64(1.0 / hz)
            .map_err(|e| Error::Config(format!("rate {} Hz has no usable period: {}", hz, e)))?;
        Ok(Self {
            period,
            next: Instant::now() + period,
            overruns: 0,
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Ticks that missed their deadline
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Block until the next deadline; returns false if it was already missed
    pub fn sleep(&mut self) -> bool {
        let now = Instant::now();
        if now >= self.next {
            log::debug!(
                "Tick overran by {:?}",
                now.duration_since(self.next)
            );
            self.overruns += 1;
            self.next = now + self.period;
            return false;
        }
        thread::sleep(self.next - now);
        self.next += self.period;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period() {
        let rate = Rate::new(10.0).unwrap();
        assert_eq!(rate.period(), Duration::from_millis(100));
    }

    #[test]
    fn test_rejects_non_positive() {
        assert!(Rate::new(0.0).is_err());
        assert!(Rate::new(-1.0).is_err());
        assert!(Rate::new(f64::NAN).is_err());
    }

    #[test]
    fn test_rejects_unrepresentable_period() {
        assert!(matches!(Rate::new(1e-30), Err(Error::Config(_))));
        assert!(Rate::new(f64::MIN_POSITIVE).is_err());
    }

    #[test]
    fn test_sleep_paces_ticks() {
        let mut rate = Rate::new(100.0).unwrap();
        let start = Instant::now();
        for _ in 0..5 {
            rate.sleep();
        }
        assert!(start.elapsed() >= Duration::from_millis(45));
    }

    #[test]
    fn test_overrun_rebases() {
        let mut rate = Rate::new(1000.0).unwrap();
        thread::sleep(Duration::from_millis(5));
        assert!(!rate.sleep());
        assert_eq!(rate.overruns(), 1);
    }
}
