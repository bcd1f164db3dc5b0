//! Manually driven clock.

use chrono::{DateTime, Duration, FixedOffset};

use super::Shared;
use crate::traits::Clock;

/// [`Clock`] whose time only moves when told to.
///
/// Clones share the same time, so a test can keep one clone and hand the
/// other to the component under test.
///
/// # Examples
///
/// ```
/// use chrono::{DateTime, Duration};
/// use dawnlock_platform::mock::ManualClock;
/// use dawnlock_platform::traits::Clock;
///
/// let start = DateTime::parse_from_rfc3339("2025-03-10T06:59:00+01:00").unwrap();
/// let clock = ManualClock::new(start);
/// clock.advance(Duration::minutes(1));
/// assert_eq!(clock.now().format("%H:%M").to_string(), "07:00");
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Shared<DateTime<FixedOffset>>,
}

impl ManualClock {
    /// Create a clock frozen at `now`.
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Shared::new(now),
        }
    }

    /// Jump to `now`.
    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.now.lock() = now;
    }

    /// Move forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock();
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_time() {
        let start = DateTime::parse_from_rfc3339("2025-03-10T23:59:30+00:00").unwrap();
        let clock = ManualClock::new(start);
        let observer = clock.clone();

        clock.advance(Duration::seconds(45));
        assert_eq!(observer.now().to_rfc3339(), "2025-03-11T00:00:15+00:00");

        observer.set(start);
        assert_eq!(clock.now(), start);
    }
}
