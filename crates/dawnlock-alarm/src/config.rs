//! Runtime configuration.
//!
//! Every value defaults to the constants in [`dawnlock_core::constants`];
//! the simulator overlays an optional TOML file on top. Durations are
//! expressed in milliseconds in the file format.
//!
//! ```
//! use dawnlock_alarm::config::RuntimeConfig;
//!
//! let config: RuntimeConfig = toml::from_str(
//!     r#"
//!     [session]
//!     grace_period_ms = 10000
//!
//!     [database]
//!     database_path = "/tmp/alarm.db"
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.session.grace_period().as_secs(), 10);
//! assert_eq!(config.dismissal.emergency_total_ticks, 600);
//! ```

use std::time::Duration;

use dawnlock_core::VibrationPattern;
use dawnlock_core::constants::*;
use dawnlock_storage::DatabaseConfig;
use serde::Deserialize;

use crate::error::{AlarmError, AlarmResult};

/// Timing and levels of the ringing session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionTiming {
    pub initial_volume: f32,
    pub max_volume: f32,
    pub fade_step: f32,
    pub fade_interval_ms: u64,
    pub watchdog_interval_ms: u64,
    pub grace_period_ms: u64,
    pub vibration_pattern_ms: Vec<u64>,
    pub vibration_repeat: Option<usize>,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            initial_volume: INITIAL_VOLUME,
            max_volume: MAX_VOLUME,
            fade_step: FADE_STEP,
            fade_interval_ms: FADE_INTERVAL_MS,
            watchdog_interval_ms: WATCHDOG_INTERVAL_MS,
            grace_period_ms: GRACE_PERIOD_MS,
            vibration_pattern_ms: VIBRATION_PATTERN_MS.to_vec(),
            vibration_repeat: Some(VIBRATION_REPEAT_INDEX),
        }
    }
}

impl SessionTiming {
    pub fn fade_interval(&self) -> Duration {
        Duration::from_millis(self.fade_interval_ms)
    }

    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_millis(self.watchdog_interval_ms)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    /// Set the grace period
    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace_period_ms = saturating_millis(grace);
        self
    }

    /// Set the fade-in step and interval
    pub fn with_fade(mut self, step: f32, interval: Duration) -> Self {
        self.fade_step = step;
        self.fade_interval_ms = saturating_millis(interval);
        self
    }

    /// Validated vibration waveform.
    pub fn vibration_pattern(&self) -> AlarmResult<VibrationPattern> {
        Ok(VibrationPattern::new(
            self.vibration_pattern_ms.clone(),
            self.vibration_repeat,
        )?)
    }

    fn validate(&self) -> AlarmResult<()> {
        let in_range = |v: f32| (0.0..=1.0).contains(&v);
        if !in_range(self.initial_volume) || !in_range(self.max_volume) {
            return Err(AlarmError::invalid_config("volumes must be within 0.0..=1.0"));
        }
        if self.initial_volume > self.max_volume {
            return Err(AlarmError::invalid_config(
                "initial volume exceeds maximum volume",
            ));
        }
        if self.fade_step <= 0.0 {
            return Err(AlarmError::invalid_config("fade step must be positive"));
        }
        if self.fade_interval_ms == 0 || self.watchdog_interval_ms == 0 {
            return Err(AlarmError::invalid_config(
                "fade and watchdog intervals must be non-zero",
            ));
        }
        self.vibration_pattern()?;
        Ok(())
    }
}

/// Timing of the dismissal surface.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DismissalTiming {
    pub clock_tick_ms: u64,
    pub emergency_tick_ms: u64,
    pub emergency_total_ticks: u16,
    pub emergency_ticks_per_second: u16,
    pub grace_countdown_secs: u32,
}

impl Default for DismissalTiming {
    fn default() -> Self {
        Self {
            clock_tick_ms: CLOCK_TICK_MS,
            emergency_tick_ms: EMERGENCY_TICK_MS,
            emergency_total_ticks: EMERGENCY_TOTAL_TICKS,
            emergency_ticks_per_second: EMERGENCY_TICKS_PER_SECOND,
            grace_countdown_secs: GRACE_COUNTDOWN_SECS,
        }
    }
}

impl DismissalTiming {
    pub fn clock_tick(&self) -> Duration {
        Duration::from_millis(self.clock_tick_ms)
    }

    pub fn emergency_tick(&self) -> Duration {
        Duration::from_millis(self.emergency_tick_ms)
    }

    fn validate(&self) -> AlarmResult<()> {
        if self.clock_tick_ms == 0 || self.emergency_tick_ms == 0 {
            return Err(AlarmError::invalid_config("tick intervals must be non-zero"));
        }
        if self.emergency_total_ticks == 0 || self.emergency_ticks_per_second == 0 {
            return Err(AlarmError::invalid_config(
                "emergency tick counts must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Scheduler offsets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SchedulerTiming {
    pub snooze_minutes: i64,
}

impl Default for SchedulerTiming {
    fn default() -> Self {
        Self {
            snooze_minutes: SNOOZE_MINUTES,
        }
    }
}

impl SchedulerTiming {
    pub fn snooze(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.snooze_minutes)
    }
}

/// Trigger handler settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TriggerTiming {
    pub screen_on_ms: u64,
}

impl Default for TriggerTiming {
    fn default() -> Self {
        Self {
            screen_on_ms: SCREEN_ON_MS,
        }
    }
}

impl TriggerTiming {
    pub fn screen_on(&self) -> Duration {
        Duration::from_millis(self.screen_on_ms)
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub session: SessionTiming,
    pub dismissal: DismissalTiming,
    pub scheduler: SchedulerTiming,
    pub trigger: TriggerTiming,
    pub database: DatabaseConfig,
}

impl RuntimeConfig {
    /// Set the session timing
    pub fn with_session(mut self, session: SessionTiming) -> Self {
        self.session = session;
        self
    }

    /// Set the dismissal timing
    pub fn with_dismissal(mut self, dismissal: DismissalTiming) -> Self {
        self.dismissal = dismissal;
        self
    }

    /// Set the database path
    pub fn with_database_path(mut self, path: impl Into<String>) -> Self {
        self.database.database_path = path.into();
        self
    }

    /// Check every section for values the runtime cannot work with.
    pub fn validate(&self) -> AlarmResult<()> {
        self.session.validate()?;
        self.dismissal.validate()?;
        if self.scheduler.snooze_minutes <= 0 {
            return Err(AlarmError::invalid_config("snooze must be positive"));
        }
        Ok(())
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_match_constants() {
        let config = RuntimeConfig::default();

        assert_eq!(config.session.fade_interval(), Duration::from_secs(1));
        assert_eq!(config.session.watchdog_interval(), Duration::from_secs(5));
        assert_eq!(config.session.grace_period(), Duration::from_secs(30));
        assert_eq!(config.dismissal.emergency_tick(), Duration::from_millis(100));
        assert_eq!(config.scheduler.snooze(), chrono::Duration::minutes(3));
        assert_eq!(config.trigger.screen_on(), Duration::from_secs(30));
        assert_eq!(config.database.database_path, "dawnlock.db");
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: RuntimeConfig = toml::from_str(
            r#"
            [scheduler]
            snooze_minutes = 5

            [dismissal]
            emergency_total_ticks = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.scheduler.snooze_minutes, 5);
        assert_eq!(config.dismissal.emergency_total_ticks, 50);
        assert_eq!(config.dismissal.emergency_tick_ms, 100);
        assert_eq!(config.session, SessionTiming::default());
    }

    #[test]
    fn test_builders() {
        let config = RuntimeConfig::default()
            .with_session(
                SessionTiming::default()
                    .with_grace_period(Duration::from_secs(5))
                    .with_fade(0.1, Duration::from_millis(500)),
            )
            .with_database_path("alarm.db");

        assert_eq!(config.session.grace_period_ms, 5_000);
        assert_eq!(config.session.fade_interval_ms, 500);
        assert_eq!(config.database.database_path, "alarm.db");
    }

    #[test]
    fn test_oversized_durations_saturate() {
        let session = SessionTiming::default()
            .with_grace_period(Duration::MAX)
            .with_fade(0.1, Duration::MAX);

        assert_eq!(session.grace_period_ms, u64::MAX);
        assert_eq!(session.fade_interval_ms, u64::MAX);
    }

    #[rstest]
    #[case(SessionTiming { initial_volume: 1.5, ..SessionTiming::default() })]
    #[case(SessionTiming { initial_volume: 0.8, max_volume: 0.5, ..SessionTiming::default() })]
    #[case(SessionTiming { fade_step: 0.0, ..SessionTiming::default() })]
    #[case(SessionTiming { watchdog_interval_ms: 0, ..SessionTiming::default() })]
    #[case(SessionTiming { vibration_pattern_ms: vec![], ..SessionTiming::default() })]
    fn test_invalid_session_timing(#[case] session: SessionTiming) {
        let config = RuntimeConfig::default().with_session(session);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_snooze() {
        let mut config = RuntimeConfig::default();
        config.scheduler.snooze_minutes = 0;
        assert!(matches!(
            config.validate(),
            Err(AlarmError::InvalidConfig(_))
        ));
    }
}
