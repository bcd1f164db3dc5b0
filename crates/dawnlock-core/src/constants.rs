//! Core constants for the alarm lifecycle.
//!
//! This module defines the preference keys of the durable store and the
//! timing values that drive the ringing session and the dismissal surface.
//! Runtime configuration starts from these values; see the `RuntimeConfig`
//! type in `dawnlock-alarm` for the overridable copies.
//!
//! # Persisted Layout
//!
//! Every key lives in one namespaced key/value store:
//!
//! | Key | Type | Meaning |
//! |-----|------|---------|
//! | `ALARM_HOUR` | int | Wake hour (0-23), `-1` when unset |
//! | `ALARM_MINUTE` | int | Wake minute (0-59), `-1` when unset |
//! | `ALARM_ENABLED` | bool | A trigger is armed for the wake time |
//! | `SAVED_TAG_ID` | string | Registered tag, colon-separated hex |
//! | `ALARM_INTERACTED` | bool | User unlocked the dismissal surface |
//! | `ALARM_RINGING` | bool | Durable session marker |
//! | `SNOOZE_USED` | bool | Snooze consumed for this alarm |
//!
//! # Usage
//!
//! ```
//! use dawnlock_core::constants::*;
//!
//! assert_eq!(KEY_ALARM_RINGING, "ALARM_RINGING");
//! assert_eq!(EMERGENCY_TOTAL_TICKS, 600);
//! assert_eq!(EMERGENCY_TICK_MS * EMERGENCY_TOTAL_TICKS as u64, 60_000);
//! ```

// ============================================================================
// Preference Store
// ============================================================================

/// Namespace all preference keys are stored under.
pub const PREFERENCES_NAMESPACE: &str = "dawnlock";

/// Wake hour (int, `-1` when unset).
pub const KEY_ALARM_HOUR: &str = "ALARM_HOUR";

/// Wake minute (int, `-1` when unset).
pub const KEY_ALARM_MINUTE: &str = "ALARM_MINUTE";

/// Whether the daily trigger is armed (bool).
pub const KEY_ALARM_ENABLED: &str = "ALARM_ENABLED";

/// Registered tag identifier (string).
pub const KEY_SAVED_TAG_ID: &str = "SAVED_TAG_ID";

/// Whether the user has interacted with the dismissal surface (bool).
pub const KEY_ALARM_INTERACTED: &str = "ALARM_INTERACTED";

/// Durable session marker (bool).
///
/// Any entry path that finds this set routes straight to the dismissal
/// surface instead of the home screen.
pub const KEY_ALARM_RINGING: &str = "ALARM_RINGING";

/// Whether snooze has been consumed (bool).
pub const KEY_SNOOZE_USED: &str = "SNOOZE_USED";

/// Sentinel stored for an unset hour or minute.
pub const UNSET_TIME_SENTINEL: i64 = -1;

// ============================================================================
// Scheduler
// ============================================================================

/// Offset applied by snooze, in minutes.
pub const SNOOZE_MINUTES: i64 = 3;

// ============================================================================
// Trigger Handler
// ============================================================================

/// How long the trigger handler forces the display on, in milliseconds.
pub const SCREEN_ON_MS: u64 = 30_000;

// ============================================================================
// Session Controller
// ============================================================================

/// Volume playback starts at (5%).
pub const INITIAL_VOLUME: f32 = 0.05;

/// Volume playback fades up to, and resumes at after the grace period.
pub const MAX_VOLUME: f32 = 1.0;

/// Volume added on every fade tick (2%).
pub const FADE_STEP: f32 = 0.02;

/// Interval between fade ticks, in milliseconds.
pub const FADE_INTERVAL_MS: u64 = 1_000;

/// Interval between watchdog re-presentations, in milliseconds.
pub const WATCHDOG_INTERVAL_MS: u64 = 5_000;

/// Length of the grace-period sound pause, in milliseconds.
pub const GRACE_PERIOD_MS: u64 = 30_000;

/// Vibration pattern: initial delay, then alternating on/off durations (ms).
pub const VIBRATION_PATTERN_MS: [u64; 3] = [0, 1_000, 1_000];

/// Index the vibration pattern repeats from.
pub const VIBRATION_REPEAT_INDEX: usize = 0;

// ============================================================================
// Dismissal Surface
// ============================================================================

/// Lock-state re-evaluation and clock tick interval, in milliseconds.
pub const CLOCK_TICK_MS: u64 = 1_000;

/// Emergency override tick interval, in milliseconds.
pub const EMERGENCY_TICK_MS: u64 = 100;

/// Emergency override ticks per second.
pub const EMERGENCY_TICKS_PER_SECOND: u16 = 10;

/// Ticks required to complete the emergency override (60 seconds held).
pub const EMERGENCY_TOTAL_TICKS: u16 = 600;

/// Seconds shown by the grace countdown when it starts.
pub const GRACE_COUNTDOWN_SECS: u32 = 30;

// ============================================================================
// Tag Identifiers
// ============================================================================

/// Separator between hex-encoded bytes of a tag identifier.
pub const TAG_ID_SEPARATOR: char = ':';

/// Minimum tag UID length in bytes (ISO 14443).
pub const MIN_TAG_UID_LENGTH: usize = 4;

/// Maximum tag UID length in bytes (ISO 14443).
pub const MAX_TAG_UID_LENGTH: usize = 10;
