//! Shared harness for runtime integration tests.
//!
//! Every test runs the runtime and a script future on one task with
//! `tokio::join!`, under paused time. The script drives the mocks through
//! their handles and sends host events; [`settle`] lets the runtime drain
//! everything already queued before the script asserts.

#![allow(dead_code)]

use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use dawnlock_alarm::{AlarmRuntime, AppEvent, RuntimeConfig, RuntimeHandle};
use dawnlock_core::{AlarmConfig, AlarmTime, TagId};
use dawnlock_platform::LockStatus;
use dawnlock_platform::mock::{ManualClock, MockHandles, MockPlatform, mock_services};
use dawnlock_storage::{MemoryPreferenceStore, Preferences};

pub type Runtime = AlarmRuntime<MockPlatform<ManualClock>, MemoryPreferenceStore>;

/// Monday morning, the minute the alarm is set for.
pub const ALARM_INSTANT: &str = "2025-03-10T06:30:00+00:00";
/// Same time one day later.
pub const NEXT_ALARM_INSTANT: &str = "2025-03-11T06:30:00+00:00";
/// The registered credential.
pub const REGISTERED_TAG: &str = "04:a2:2b:91";
pub const OTHER_TAG: &str = "de:ad:be:ef";

pub struct Harness {
    pub prefs: Preferences<MemoryPreferenceStore>,
    pub devices: MockHandles,
    pub clock: ManualClock,
    pub app: RuntimeHandle,
}

impl Harness {
    pub async fn send(&self, event: AppEvent) {
        self.app.send(event).await.unwrap();
        settle().await;
    }

    pub async fn scan(&self, tag: &str) -> bool {
        let delivered = self.devices.tag_reader.present(tag_id(tag)).await.unwrap();
        settle().await;
        delivered
    }

    pub async fn unlock(&self) {
        self.devices.lock_screen.unlock();
        settle().await;
    }

    pub async fn lock(&self) {
        self.devices.lock_screen.lock();
        settle().await;
    }

    pub async fn shutdown(&self) {
        self.app.send(AppEvent::Shutdown).await.unwrap();
    }
}

pub fn instant(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

pub fn tag_id(s: &str) -> TagId {
    s.parse().unwrap()
}

/// Give the runtime a chance to process everything already queued.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Runtime with the alarm saved for 06:30 and the clock at 06:30.
pub async fn harness(lock: LockStatus, registered: Option<&str>) -> (Runtime, Harness) {
    harness_with(lock, registered, RuntimeConfig::default()).await
}

pub async fn harness_with(
    lock: LockStatus,
    registered: Option<&str>,
    config: RuntimeConfig,
) -> (Runtime, Harness) {
    let clock = ManualClock::new(instant(ALARM_INSTANT));
    let (services, devices) = mock_services(clock.clone(), lock);
    let prefs = Preferences::new(MemoryPreferenceStore::new());

    prefs
        .save_alarm_config(&AlarmConfig::enabled_at(AlarmTime::new(6, 30).unwrap()))
        .await
        .unwrap();
    if let Some(tag) = registered {
        prefs.register_tag(&tag_id(tag)).await.unwrap();
    }

    let (runtime, app) = AlarmRuntime::new(services, prefs.clone(), config).unwrap();
    let harness = Harness {
        prefs,
        devices,
        clock,
        app,
    };
    (runtime, harness)
}
