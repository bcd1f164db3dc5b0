//! Optional timers polled inside `select!`.

use std::future;
use std::pin::Pin;

use tokio::time::{self, Duration, Instant, Interval, MissedTickBehavior, Sleep};

/// Interval whose first tick is one `period` from now.
pub(crate) fn periodic(period: Duration) -> Interval {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Next tick of `interval`, or never when disarmed.
pub(crate) async fn next_interval(interval: Option<&mut Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending().await,
    }
}

/// Completion of `sleep`, or never when disarmed.
pub(crate) async fn next_sleep(sleep: Option<&mut Pin<Box<Sleep>>>) {
    match sleep {
        Some(sleep) => sleep.as_mut().await,
        None => future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_period() {
        let start = Instant::now();
        let mut interval = periodic(Duration::from_secs(5));

        next_interval(Some(&mut interval)).await;
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarmed_timers_never_fire() {
        let none = time::timeout(Duration::from_secs(3_600), next_interval(None)).await;
        assert!(none.is_err());
        let none = time::timeout(Duration::from_secs(3_600), next_sleep(None)).await;
        assert!(none.is_err());
    }
}
