//! Wake trigger scheduling.
//!
//! The scheduler owns the relationship with the platform's exact-timer
//! service. It computes the next occurrence of the configured wall-clock time
//! (today or tomorrow) or the snooze offset and arms a single trigger
//! identity, so a new registration always replaces the previous one.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime};
use dawnlock_core::{AlarmTime, TriggerId};
use dawnlock_platform::ExactTimer;
use dawnlock_storage::{PreferenceStore, Preferences};
use tracing::{debug, info, warn};

use crate::config::SchedulerTiming;
use crate::error::AlarmResult;

/// Next instant strictly after `now` at which the wall clock reads `time`.
///
/// The same-day instant is used when it is after `now`; otherwise the
/// result is exactly one day (24 hours) later.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use dawnlock_alarm::scheduler::next_alarm_instant;
/// use dawnlock_core::AlarmTime;
///
/// let now = DateTime::parse_from_rfc3339("2025-03-10T06:45:00+01:00").unwrap();
/// let next = next_alarm_instant(now, AlarmTime::new(6, 30).unwrap());
/// assert_eq!(next.to_rfc3339(), "2025-03-11T06:30:00+01:00");
/// ```
pub fn next_alarm_instant(now: DateTime<FixedOffset>, time: AlarmTime) -> DateTime<FixedOffset> {
    let offset = *now.offset();
    let wall = NaiveTime::from_hms_opt(u32::from(time.hour()), u32::from(time.minute()), 0)
        .unwrap_or(NaiveTime::MIN);
    let local = now.date_naive().and_time(wall);
    let utc = local - Duration::seconds(i64::from(offset.local_minus_utc()));
    let candidate = DateTime::from_naive_utc_and_offset(utc, offset);

    if candidate > now {
        candidate
    } else {
        candidate + Duration::days(1)
    }
}

/// Instant a snooze armed at `now` fires.
pub fn snooze_instant(now: DateTime<FixedOffset>, snooze: Duration) -> DateTime<FixedOffset> {
    now + snooze
}

/// Arms and cancels the wake trigger.
#[derive(Debug)]
pub struct Scheduler<T> {
    timer: T,
    identity: TriggerId,
    snooze: Duration,
}

impl<T: ExactTimer> Scheduler<T> {
    pub fn new(timer: T, timing: &SchedulerTiming) -> Self {
        Self {
            timer,
            identity: TriggerId::WAKE,
            snooze: timing.snooze(),
        }
    }

    /// Arm the next occurrence of the saved alarm time.
    ///
    /// Returns the armed instant, or `None` when nothing was armed: the
    /// alarm is disabled or unset, or the host denies exact triggers.
    pub async fn schedule_alarm<S: PreferenceStore>(
        &mut self,
        prefs: &Preferences<S>,
        now: DateTime<FixedOffset>,
    ) -> AlarmResult<Option<DateTime<FixedOffset>>> {
        let config = prefs.alarm_config().await?;
        let Some(time) = config.armable_time() else {
            debug!(?config, "Alarm disabled or unset, nothing to schedule");
            return Ok(None);
        };

        let at = next_alarm_instant(now, time);
        self.arm(at).await
    }

    /// Arm the snooze trigger, independent of the saved alarm time.
    pub async fn schedule_snooze(
        &mut self,
        now: DateTime<FixedOffset>,
    ) -> AlarmResult<Option<DateTime<FixedOffset>>> {
        self.arm(snooze_instant(now, self.snooze)).await
    }

    /// Remove any armed trigger. Idempotent.
    pub async fn cancel_alarm(&mut self) -> AlarmResult<()> {
        self.timer.cancel(self.identity).await?;
        info!(trigger = %self.identity, "Alarm cancelled");
        Ok(())
    }

    /// Instant currently armed, if any.
    pub fn pending(&self) -> Option<DateTime<FixedOffset>> {
        self.timer.pending(self.identity)
    }

    pub fn can_schedule_exact(&self) -> bool {
        self.timer.can_schedule_exact()
    }

    pub fn snooze_interval(&self) -> Duration {
        self.snooze
    }

    pub fn identity(&self) -> TriggerId {
        self.identity
    }

    async fn arm(&mut self, at: DateTime<FixedOffset>) -> AlarmResult<Option<DateTime<FixedOffset>>> {
        if !self.timer.can_schedule_exact() {
            warn!("Exact alarm permission missing, trigger not armed");
            return Ok(None);
        }

        match self.timer.arm(self.identity, at).await {
            Ok(()) => {
                info!(trigger = %self.identity, at = %at, "Trigger armed");
                Ok(Some(at))
            }
            Err(e) if e.is_permission_denied() => {
                warn!(error = %e, "Exact alarm permission revoked, trigger not armed");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
