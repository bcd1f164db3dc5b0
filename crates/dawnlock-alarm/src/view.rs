//! Dismissal surface view model.
//!
//! [`DismissalView`] is a plain snapshot of everything the alarm screen
//! shows. The dismissal controller rebuilds it after every change and
//! publishes it on a `watch` channel; renderers only read it. The text
//! helpers at the bottom lay the snapshot out as fixed-width lines for
//! terminal front ends.
//!
//! # Examples
//!
//! ```
//! use dawnlock_alarm::view::{align_text, Alignment};
//!
//! assert_eq!(align_text("06:30", 9, Alignment::Center), "  06:30  ");
//! assert_eq!(align_text("Snooze", 8, Alignment::Right), "  Snooze");
//! ```

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::emergency::IDLE_LABEL;

/// Label of an unused snooze button.
pub const SNOOZE_LABEL: &str = "Snooze";

/// Label of a consumed snooze button.
pub const SNOOZE_USED_LABEL: &str = "Snooze Used";

/// Instruction shown after a wrong tag.
pub const WRONG_TAG_TEXT: &str = "WRONG TAG!";

/// Display mode, derived purely from the device lock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Clock, snooze and unlock prompt; no scanning.
    #[default]
    Locked,
    /// Tag scanning and emergency override.
    Unlocked,
}

impl DisplayMode {
    pub fn status_text(&self) -> &'static str {
        match self {
            DisplayMode::Locked => "Unlock to dismiss",
            DisplayMode::Unlocked => "Looking for tag...",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayMode::Locked => write!(f, "Locked"),
            DisplayMode::Unlocked => write!(f, "Unlocked"),
        }
    }
}

/// Transient message shown over the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    Dismissed,
    NoCredential,
    WrongTag,
    EmergencyOverride,
    Snoozing { minutes: i64 },
}

impl Notice {
    pub fn text(&self) -> Cow<'static, str> {
        match self {
            Notice::Dismissed => "ALARM DISMISSED!".into(),
            Notice::NoCredential => "No tag registered! Closing alarm.".into(),
            Notice::WrongTag => WRONG_TAG_TEXT.into(),
            Notice::EmergencyOverride => "Emergency Override Activated".into(),
            Notice::Snoozing { minutes: 1 } => "Snoozing for 1 minute...".into(),
            Notice::Snoozing { minutes } => format!("Snoozing for {minutes} minutes...").into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnoozeButton {
    pub visible: bool,
    pub enabled: bool,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmergencyView {
    pub visible: bool,
    pub label: String,
    /// Accumulated ticks while held, `None` hides the progress bar.
    pub progress: Option<u16>,
    pub total: u16,
}

/// Everything the dismissal surface shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DismissalView {
    pub open: bool,
    pub mode: DisplayMode,
    /// `HH:MM`
    pub clock: String,
    /// `EEE, dd MMM`
    pub date: String,
    pub status: &'static str,
    pub scan_instruction: Option<&'static str>,
    pub snooze: SnoozeButton,
    pub dismiss_visible: bool,
    pub emergency: EmergencyView,
    pub grace: Option<String>,
    pub notice: Option<Notice>,
}

impl DismissalView {
    /// Snapshot of a freshly opened surface in `mode` at `now`.
    pub fn new(mode: DisplayMode, now: &DateTime<FixedOffset>, total_ticks: u16) -> Self {
        let mut view = Self {
            open: true,
            mode,
            clock: String::new(),
            date: String::new(),
            status: mode.status_text(),
            scan_instruction: None,
            snooze: SnoozeButton {
                visible: mode == DisplayMode::Locked,
                enabled: true,
                label: SNOOZE_LABEL,
            },
            dismiss_visible: mode == DisplayMode::Locked,
            emergency: EmergencyView {
                visible: mode == DisplayMode::Unlocked,
                label: IDLE_LABEL.to_string(),
                progress: None,
                total: total_ticks,
            },
            grace: None,
            notice: None,
        };
        view.set_time(now);
        view
    }

    /// Closed surface, as published before the first session.
    pub fn closed() -> Self {
        Self {
            open: false,
            mode: DisplayMode::Locked,
            clock: String::new(),
            date: String::new(),
            status: DisplayMode::Locked.status_text(),
            scan_instruction: None,
            snooze: SnoozeButton {
                visible: false,
                enabled: false,
                label: SNOOZE_LABEL,
            },
            dismiss_visible: false,
            emergency: EmergencyView {
                visible: false,
                label: IDLE_LABEL.to_string(),
                progress: None,
                total: 0,
            },
            grace: None,
            notice: None,
        }
    }

    pub fn set_time(&mut self, now: &DateTime<FixedOffset>) {
        self.clock = now.format("%H:%M").to_string();
        self.date = now.format("%a, %d %b").to_string();
    }

    /// Switch the mode-dependent affordances.
    pub fn set_mode(&mut self, mode: DisplayMode) {
        self.mode = mode;
        self.status = mode.status_text();
        let locked = mode == DisplayMode::Locked;
        self.snooze.visible = locked;
        self.dismiss_visible = locked;
        self.emergency.visible = !locked;
    }

    pub fn set_snooze_used(&mut self, used: bool) {
        self.snooze.enabled = !used;
        self.snooze.label = if used { SNOOZE_USED_LABEL } else { SNOOZE_LABEL };
    }

    /// Lay the view out as centered lines of `width` characters.
    pub fn render_lines(&self, width: usize) -> Vec<String> {
        let mut lines = vec![
            align_text(&self.clock, width, Alignment::Center),
            align_text(&self.date, width, Alignment::Center),
            align_text(self.status, width, Alignment::Center),
        ];

        if let Some(instruction) = self.scan_instruction {
            lines.push(align_text(instruction, width, Alignment::Center));
        }
        if let Some(grace) = &self.grace {
            lines.push(align_text(grace, width, Alignment::Center));
        }

        match self.mode {
            DisplayMode::Locked => {
                let buttons = format!("[{}]  [Dismiss]", self.snooze.label);
                lines.push(align_text(&buttons, width, Alignment::Center));
            }
            DisplayMode::Unlocked => {
                lines.push(align_text(&self.emergency.label, width, Alignment::Center));
                if let Some(progress) = self.emergency.progress {
                    lines.push(progress_bar(progress, self.emergency.total, width));
                }
            }
        }

        if let Some(notice) = self.notice {
            lines.push(align_text(&notice.text(), width, Alignment::Center));
        }

        lines
    }
}

impl Default for DismissalView {
    fn default() -> Self {
        Self::closed()
    }
}

/// Text alignment within a fixed-width line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    /// Extra space goes on the right when the padding is odd.
    Center,
    Right,
}

/// Keep at most `max_chars` characters.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Pad `text` to exactly `width` characters, truncating longer text.
pub fn align_text(text: &str, width: usize, alignment: Alignment) -> String {
    let char_count = text.chars().count();
    if char_count >= width {
        return truncate_text(text, width);
    }

    let padding = width - char_count;

    match alignment {
        Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
        Alignment::Right => format!("{}{}", " ".repeat(padding), text),
        Alignment::Center => {
            let left_pad = padding / 2;
            let right_pad = padding - left_pad;
            format!("{}{}{}", " ".repeat(left_pad), text, " ".repeat(right_pad))
        }
    }
}

fn progress_bar(progress: u16, total: u16, width: usize) -> String {
    let inner = width.saturating_sub(2);
    let filled = if total == 0 {
        0
    } else {
        inner * usize::from(progress.min(total)) / usize::from(total)
    };
    format!("[{}{}]", "#".repeat(filled), "-".repeat(inner - filled))
}
