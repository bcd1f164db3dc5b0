//! Visible countdown mirroring the grace-period timer.

use dawnlock_core::constants::GRACE_COUNTDOWN_SECS;

/// Text shown once the countdown has run out.
pub const RESUMED_TEXT: &str = "Sound Resumed!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraceCountdown {
    total_secs: u32,
    remaining: Option<u32>,
}

impl GraceCountdown {
    pub fn new(total_secs: u32) -> Self {
        Self {
            total_secs,
            remaining: None,
        }
    }

    /// Begin at the full count. Ignored when already started.
    pub fn start(&mut self) -> bool {
        if self.remaining.is_some() {
            return false;
        }
        self.remaining = Some(self.total_secs);
        true
    }

    /// Count down one second. Returns whether the countdown is still running.
    pub fn tick(&mut self) -> bool {
        match self.remaining {
            Some(secs) if secs > 0 => {
                self.remaining = Some(secs - 1);
                secs > 1
            }
            _ => false,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.remaining, Some(secs) if secs > 0)
    }

    pub fn remaining(&self) -> Option<u32> {
        self.remaining
    }

    /// `Sound resumes in {s}s`, then `Sound Resumed!`; `None` before start.
    pub fn text(&self) -> Option<String> {
        self.remaining.map(|secs| match secs {
            0 => RESUMED_TEXT.to_string(),
            secs => format!("Sound resumes in {secs}s"),
        })
    }
}

impl Default for GraceCountdown {
    fn default() -> Self {
        Self::new(GRACE_COUNTDOWN_SECS)
    }
}
