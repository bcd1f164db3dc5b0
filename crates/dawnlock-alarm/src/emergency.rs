//! Emergency override accumulator.
//!
//! Holding the emergency affordance accumulates one tick per 100 ms. Letting
//! go before the total is reached discards all progress; reaching the total
//! dismisses the alarm without a credential.

use dawnlock_core::constants::{EMERGENCY_TICKS_PER_SECOND, EMERGENCY_TOTAL_TICKS};
use tracing::{debug, info};

/// Label shown while the override is not held.
pub const IDLE_LABEL: &str = "Lost Tag?";

/// Outcome of one accumulator step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmergencyStep {
    /// Not held, nothing accumulated.
    Idle,
    /// Held with this many ticks accumulated.
    Progress(u16),
    /// The hold reached the total. Terminal until the next press.
    Completed,
}

#[derive(Debug, Clone)]
pub struct EmergencyOverride {
    total_ticks: u16,
    ticks_per_second: u16,
    progress: u16,
    held: bool,
}

impl EmergencyOverride {
    pub fn new(total_ticks: u16, ticks_per_second: u16) -> Self {
        Self {
            total_ticks,
            ticks_per_second: ticks_per_second.max(1),
            progress: 0,
            held: false,
        }
    }

    /// Start a hold from zero.
    pub fn press(&mut self) {
        self.progress = 0;
        self.held = true;
        debug!("Emergency override held");
    }

    /// Let go. Any partial progress is lost.
    pub fn release(&mut self) {
        if self.held {
            debug!(progress = self.progress, "Emergency override released");
        }
        self.progress = 0;
        self.held = false;
    }

    /// Advance one tick while held.
    pub fn tick(&mut self) -> EmergencyStep {
        if !self.held {
            return EmergencyStep::Idle;
        }

        self.progress = self.progress.saturating_add(1).min(self.total_ticks);
        if self.progress >= self.total_ticks {
            info!("Emergency override completed");
            self.held = false;
            return EmergencyStep::Completed;
        }

        EmergencyStep::Progress(self.progress)
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn progress(&self) -> u16 {
        self.progress
    }

    pub fn total_ticks(&self) -> u16 {
        self.total_ticks
    }

    /// Affordance text: `Lost Tag?` when idle, otherwise the whole seconds
    /// still to hold.
    pub fn label(&self) -> String {
        if !self.held {
            return IDLE_LABEL.to_string();
        }
        let remaining = self.total_ticks.saturating_sub(self.progress) / self.ticks_per_second;
        format!("Keep holding: {remaining}s")
    }
}

impl Default for EmergencyOverride {
    fn default() -> Self {
        Self::new(EMERGENCY_TOTAL_TICKS, EMERGENCY_TICKS_PER_SECOND)
    }
}
