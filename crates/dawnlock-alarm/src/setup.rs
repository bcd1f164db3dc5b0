//! Alarm setup operations behind the home screen.

use chrono::{DateTime, FixedOffset};
use dawnlock_core::{AlarmConfig, AlarmTime};
use dawnlock_platform::ExactTimer;
use dawnlock_storage::{PreferenceStore, Preferences};
use tracing::{info, warn};

use crate::error::AlarmResult;
use crate::scheduler::{Scheduler, next_alarm_instant};

/// Result of saving or re-enabling the alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    /// Trigger armed; `message` is the confirmation toast.
    Scheduled {
        at: DateTime<FixedOffset>,
        message: String,
    },
    /// Exact scheduling is not permitted; the user must grant it first.
    PermissionRequired,
    /// No saved time to enable.
    NothingToEnable,
}

/// What the home screen shows about the saved alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmStatus {
    pub time: Option<AlarmTime>,
    pub enabled: bool,
    /// `HH:MM`, or `--:--` when unset.
    pub saved_time: String,
    /// `Rings in {h}hr {m}min`, or `No alarm set`.
    pub countdown: String,
}

/// Save, enable, disable and describe the single alarm.
pub struct AlarmSetup<'a, T, S> {
    scheduler: &'a mut Scheduler<T>,
    prefs: &'a Preferences<S>,
}

impl<'a, T, S> AlarmSetup<'a, T, S>
where
    T: ExactTimer,
    S: PreferenceStore,
{
    pub fn new(scheduler: &'a mut Scheduler<T>, prefs: &'a Preferences<S>) -> Self {
        Self { scheduler, prefs }
    }

    /// Save `time` as the enabled alarm and arm it.
    ///
    /// Nothing is saved when exact scheduling is not permitted.
    pub async fn configure(
        &mut self,
        time: AlarmTime,
        now: DateTime<FixedOffset>,
    ) -> AlarmResult<SetupOutcome> {
        if !self.scheduler.can_schedule_exact() {
            warn!("Exact alarm permission required before saving");
            return Ok(SetupOutcome::PermissionRequired);
        }

        self.prefs.save_alarm_config(&AlarmConfig::enabled_at(time)).await?;
        self.prefs.reset_dismissal_flags().await?;
        info!(%time, "Alarm saved");

        self.arm(now).await
    }

    /// Re-arm the saved time.
    pub async fn enable(&mut self, now: DateTime<FixedOffset>) -> AlarmResult<SetupOutcome> {
        let config = self.prefs.alarm_config().await?;
        let Some(time) = config.time else {
            return Ok(SetupOutcome::NothingToEnable);
        };
        if !self.scheduler.can_schedule_exact() {
            warn!("Exact alarm permission required before enabling");
            return Ok(SetupOutcome::PermissionRequired);
        }

        self.prefs.set_alarm_enabled(true).await?;
        self.prefs.reset_dismissal_flags().await?;
        info!(%time, "Alarm enabled");

        self.arm(now).await
    }

    /// Cancel the trigger. The saved time is kept.
    pub async fn disable(&mut self) -> AlarmResult<()> {
        self.scheduler.cancel_alarm().await?;
        self.prefs.set_alarm_enabled(false).await?;
        info!("Alarm disabled");
        Ok(())
    }

    pub async fn status(&self, now: DateTime<FixedOffset>) -> AlarmResult<AlarmStatus> {
        let config = self.prefs.alarm_config().await?;
        let saved_time = config
            .time
            .map_or_else(|| "--:--".to_string(), |time| time.to_string());
        let countdown = match config.armable_time() {
            Some(time) => {
                let (hours, mins) = time_until(now, next_alarm_instant(now, time));
                format!("Rings in {hours}hr {mins}min")
            }
            None => "No alarm set".to_string(),
        };

        Ok(AlarmStatus {
            time: config.time,
            enabled: config.enabled,
            saved_time,
            countdown,
        })
    }

    async fn arm(&mut self, now: DateTime<FixedOffset>) -> AlarmResult<SetupOutcome> {
        match self.scheduler.schedule_alarm(self.prefs, now).await? {
            Some(at) => Ok(SetupOutcome::Scheduled {
                at,
                message: time_remaining_message(now, at),
            }),
            None => Ok(SetupOutcome::PermissionRequired),
        }
    }
}

/// Whole hours and leftover minutes from `now` until `at`.
pub fn time_until(now: DateTime<FixedOffset>, at: DateTime<FixedOffset>) -> (i64, i64) {
    let diff = at - now;
    (diff.num_hours(), diff.num_minutes() % 60)
}

/// Confirmation toast after arming.
pub fn time_remaining_message(now: DateTime<FixedOffset>, at: DateTime<FixedOffset>) -> String {
    match time_until(now, at) {
        (0, mins) => format!("Alarm set for {mins} min from now"),
        (hours, mins) => format!("Alarm set for {hours} hr {mins} min from now"),
    }
}
