use crate::{
    Result,
    constants::{
        MAX_TAG_UID_LENGTH, MIN_TAG_UID_LENGTH, TAG_ID_SEPARATOR, UNSET_TIME_SENTINEL,
        VIBRATION_PATTERN_MS, VIBRATION_REPEAT_INDEX,
    },
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Wall-clock wake time (hour 0-23, minute 0-59).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlarmTime {
    hour: u8,
    minute: u8,
}

impl AlarmTime {
    /// Create a new alarm time with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidAlarmTime` if hour is not 0-23 or minute is not 0-59.
    pub fn new(hour: u8, minute: u8) -> Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(Error::InvalidAlarmTime {
                hour: i64::from(hour),
                minute: i64::from(minute),
            });
        }
        Ok(Self { hour, minute })
    }

    /// Rebuild an alarm time from its persisted pair.
    ///
    /// The pair is either both unset (the `-1` sentinel) or both valid; a
    /// half-set or out-of-range pair reads back as unset.
    #[must_use]
    pub fn from_stored(hour: i64, minute: i64) -> Option<Self> {
        if hour == UNSET_TIME_SENTINEL || minute == UNSET_TIME_SENTINEL {
            return None;
        }
        let hour = u8::try_from(hour).ok()?;
        let minute = u8::try_from(minute).ok()?;
        Self::new(hour, minute).ok()
    }

    /// Hour of day (0-23).
    #[must_use]
    pub fn hour(&self) -> u8 {
        self.hour
    }

    /// Minute of hour (0-59).
    #[must_use]
    pub fn minute(&self) -> u8 {
        self.minute
    }
}

impl fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl std::str::FromStr for AlarmTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (hour, minute) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| Error::InvalidTimeFormat(format!("expected HH:MM, got '{s}'")))?;

        let hour: u8 = hour
            .parse()
            .map_err(|_| Error::InvalidTimeFormat(format!("invalid hour in '{s}'")))?;
        let minute: u8 = minute
            .parse()
            .map_err(|_| Error::InvalidTimeFormat(format!("invalid minute in '{s}'")))?;

        AlarmTime::new(hour, minute)
    }
}

/// Persisted alarm configuration.
///
/// `enabled == true` with a saved time means a trigger is armed with the
/// scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlarmConfig {
    /// Saved wake time, `None` when never configured.
    pub time: Option<AlarmTime>,

    /// Whether the daily trigger should be armed.
    pub enabled: bool,
}

impl AlarmConfig {
    /// Create an enabled configuration for the given time.
    #[must_use]
    pub fn enabled_at(time: AlarmTime) -> Self {
        Self {
            time: Some(time),
            enabled: true,
        }
    }

    /// The wake time to arm, if the alarm is both set and enabled.
    #[must_use]
    pub fn armable_time(&self) -> Option<AlarmTime> {
        if self.enabled { self.time } else { None }
    }
}

/// Registered NFC tag identifier.
///
/// Stored and displayed as lower-case hex bytes joined with `:`
/// (e.g. `04:a2:2b:9c`).
///
/// # Security
/// Equality is constant-time so that comparing a scanned tag against the
/// registered credential does not leak how many leading bytes matched.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct TagId(Vec<u8>);

impl TagId {
    /// Create a tag identifier from raw UID bytes.
    ///
    /// # Errors
    /// Returns `Error::InvalidTagId` if the UID is not 4-10 bytes long.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let len = bytes.len();
        if !(MIN_TAG_UID_LENGTH..=MAX_TAG_UID_LENGTH).contains(&len) {
            return Err(Error::InvalidTagId(format!(
                "UID must be {MIN_TAG_UID_LENGTH}-{MAX_TAG_UID_LENGTH} bytes, got {len}"
            )));
        }
        Ok(TagId(bytes))
    }

    /// Raw UID bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Colon-separated lower-case hex encoding.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>()
            .join(&TAG_ID_SEPARATOR.to_string())
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for TagId {
    type Err = Error;

    /// Parse a colon-separated hex identifier. Upper-case digits are accepted.
    fn from_str(s: &str) -> Result<Self> {
        let bytes = s
            .trim()
            .split(TAG_ID_SEPARATOR)
            .map(|part| {
                if part.len() != 2 {
                    return Err(Error::InvalidTagId(format!("bad byte '{part}' in '{s}'")));
                }
                u8::from_str_radix(part, 16)
                    .map_err(|_| Error::InvalidTagId(format!("bad byte '{part}' in '{s}'")))
            })
            .collect::<Result<Vec<u8>>>()?;

        TagId::from_bytes(bytes)
    }
}

impl PartialEq for TagId {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_slice().ct_eq(other.0.as_slice()).into()
    }
}

impl std::hash::Hash for TagId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// Durable per-session flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionFlags {
    /// Durable session marker; set while an alarm is sounding.
    pub ringing: bool,

    /// User reached the unlocked dismissal view; suppresses re-presentation.
    pub interacted: bool,

    /// Snooze consumed; permits snooze at most once.
    pub snooze_used: bool,
}

/// Identity of a platform trigger.
///
/// The daily alarm and the snooze share one identity, so arming either
/// replaces the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerId(u32);

impl TriggerId {
    /// The single wake trigger identity.
    pub const WAKE: TriggerId = TriggerId(0);

    /// Create a trigger identity.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        TriggerId(id)
    }

    /// Raw identity value.
    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "trigger#{}", self.0)
    }
}

/// Identifier of one ringing session.
///
/// Timer messages carry the session they were armed for so that a tick
/// arriving after the session ended is recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a fresh session identifier.
    #[must_use]
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Vibration pattern: a delay followed by alternating on/off durations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VibrationPattern {
    timings_ms: Vec<u64>,
    repeat: Option<usize>,
}

impl VibrationPattern {
    /// Create a vibration pattern.
    ///
    /// # Errors
    /// Returns `Error::InvalidVibrationPattern` if the timings are empty or the
    /// repeat index is out of range.
    pub fn new(timings_ms: Vec<u64>, repeat: Option<usize>) -> Result<Self> {
        if timings_ms.is_empty() {
            return Err(Error::InvalidVibrationPattern(
                "pattern needs at least one timing".to_string(),
            ));
        }
        if let Some(index) = repeat
            && index >= timings_ms.len()
        {
            return Err(Error::InvalidVibrationPattern(format!(
                "repeat index {index} out of range for {} timings",
                timings_ms.len()
            )));
        }
        Ok(Self { timings_ms, repeat })
    }

    /// Delay and on/off durations in milliseconds.
    #[must_use]
    pub fn timings_ms(&self) -> &[u64] {
        &self.timings_ms
    }

    /// Index the pattern repeats from, `None` for one-shot.
    #[must_use]
    pub fn repeat(&self) -> Option<usize> {
        self.repeat
    }
}

impl Default for VibrationPattern {
    fn default() -> Self {
        Self {
            timings_ms: VIBRATION_PATTERN_MS.to_vec(),
            repeat: Some(VIBRATION_REPEAT_INDEX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("06:30", 6, 30)]
    #[case("00:00", 0, 0)]
    #[case("23:59", 23, 59)]
    #[case(" 7:05 ", 7, 5)]
    fn test_alarm_time_parse(#[case] input: &str, #[case] hour: u8, #[case] minute: u8) {
        let time: AlarmTime = input.parse().unwrap();
        assert_eq!(time.hour(), hour);
        assert_eq!(time.minute(), minute);
    }

    #[rstest]
    #[case("24:00")]
    #[case("12:60")]
    #[case("1230")]
    #[case("ab:cd")]
    fn test_alarm_time_parse_invalid(#[case] input: &str) {
        let result: Result<AlarmTime> = input.parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_alarm_time_display() {
        assert_eq!(AlarmTime::new(6, 5).unwrap().to_string(), "06:05");
    }

    #[rstest]
    #[case(-1, -1, None)]
    #[case(6, -1, None)]
    #[case(-1, 30, None)]
    #[case(24, 0, None)]
    #[case(6, 30, Some((6, 30)))]
    fn test_alarm_time_from_stored(
        #[case] hour: i64,
        #[case] minute: i64,
        #[case] expected: Option<(u8, u8)>,
    ) {
        let time = AlarmTime::from_stored(hour, minute).map(|t| (t.hour(), t.minute()));
        assert_eq!(time, expected);
    }

    #[test]
    fn test_alarm_config_armable_time() {
        let time = AlarmTime::new(6, 30).unwrap();
        assert_eq!(AlarmConfig::enabled_at(time).armable_time(), Some(time));

        let disabled = AlarmConfig {
            time: Some(time),
            enabled: false,
        };
        assert_eq!(disabled.armable_time(), None);

        let unset = AlarmConfig {
            time: None,
            enabled: true,
        };
        assert_eq!(unset.armable_time(), None);
    }

    #[test]
    fn test_tag_id_hex_encoding() {
        let tag = TagId::from_bytes(vec![0x04, 0xA2, 0x2B, 0x9C]).unwrap();
        assert_eq!(tag.to_hex(), "04:a2:2b:9c");
        assert_eq!(tag.to_string(), "04:a2:2b:9c");
    }

    #[test]
    fn test_tag_id_parse_accepts_upper_case() {
        let tag: TagId = "04:A2:2B:9C".parse().unwrap();
        assert_eq!(tag.as_bytes(), &[0x04, 0xA2, 0x2B, 0x9C]);
    }

    #[rstest]
    #[case("04:a2:2b")] // too short
    #[case("04:a2:2b:9c:01:02:03:04:05:06:07")] // too long
    #[case("04:a2:2b:zz")] // not hex
    #[case("4:a2:2b:9c")] // single digit byte
    #[case("")]
    fn test_tag_id_parse_invalid(#[case] input: &str) {
        let result: Result<TagId> = input.parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_tag_id_equality() {
        let a = TagId::from_bytes(vec![1, 2, 3, 4]).unwrap();
        let b = TagId::from_bytes(vec![1, 2, 3, 4]).unwrap();
        let c = TagId::from_bytes(vec![1, 2, 3, 5]).unwrap();
        let d = TagId::from_bytes(vec![1, 2, 3, 4, 5]).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_trigger_id_wake() {
        assert_eq!(TriggerId::WAKE.as_u32(), 0);
        assert_eq!(TriggerId::WAKE.to_string(), "trigger#0");
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn test_default_vibration_pattern() {
        let pattern = VibrationPattern::default();
        assert_eq!(pattern.timings_ms(), &[0, 1_000, 1_000]);
        assert_eq!(pattern.repeat(), Some(0));
    }

    #[test]
    fn test_vibration_pattern_invalid() {
        assert!(VibrationPattern::new(vec![], None).is_err());
        assert!(VibrationPattern::new(vec![0, 500], Some(2)).is_err());
        assert!(VibrationPattern::new(vec![0, 500], Some(1)).is_ok());
    }

    proptest! {
        #[test]
        fn prop_tag_id_hex_parses_back(bytes in proptest::collection::vec(any::<u8>(), 4..=10)) {
            let tag = TagId::from_bytes(bytes.clone()).unwrap();
            let parsed: TagId = tag.to_hex().parse().unwrap();
            prop_assert_eq!(parsed.as_bytes(), bytes.as_slice());
        }
    }
}
