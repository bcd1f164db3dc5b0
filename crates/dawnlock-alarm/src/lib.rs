//! Alarm lifecycle for the Dawnlock tag-dismissed alarm clock.
//!
//! This crate holds the stateful core: computing and arming the wake trigger,
//! the ringing session (sound, vibration, fade-in, grace pause, watchdog) and
//! the dismissal surface (lock-aware modes, tag verification, emergency
//! override, snooze). [`AlarmRuntime`] owns all of it and runs it on a single
//! task.
//!
//! Platform services come from [`dawnlock_platform`], durable state from
//! [`dawnlock_storage`].

#![allow(async_fn_in_trait)]

pub mod config;
pub mod dismissal;
pub mod emergency;
pub mod error;
pub mod grace;
pub mod launch;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod setup;
pub mod trigger;
pub mod verification;
pub mod view;

mod ticker;

pub use config::{DismissalTiming, RuntimeConfig, SchedulerTiming, SessionTiming, TriggerTiming};
pub use dismissal::{DismissalController, DismissalInput, Directive, StopReason};
pub use emergency::{EmergencyOverride, EmergencyStep};
pub use error::{AlarmError, AlarmResult};
pub use grace::GraceCountdown;
pub use launch::{LaunchRouter, Route};
pub use runtime::{AlarmRuntime, AppEvent, RuntimeHandle};
pub use scheduler::{Scheduler, next_alarm_instant, snooze_instant};
pub use session::{SessionController, SessionSnapshot, SessionState, SessionTick};
pub use setup::{AlarmSetup, AlarmStatus, SetupOutcome};
pub use trigger::TriggerHandler;
pub use verification::{TagVerdict, verify_tag};
pub use view::{DismissalView, DisplayMode, Notice};
