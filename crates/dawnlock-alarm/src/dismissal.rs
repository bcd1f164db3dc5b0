//! Dismissal UI controller.
//!
//! Drives the full-screen alarm surface: picks the display mode from the
//! lock state, scans tags while unlocked, runs the emergency-override hold
//! and the grace countdown, and decides when the session ends. It never
//! touches sound or vibration itself. Instead every operation returns the
//! [`Directive`]s the runtime must apply to the session and the scheduler.
//!
//! Mode re-evaluation always happens before a scan is judged, so a tag read
//! just as the device locks again is ignored rather than accepted.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use dawnlock_platform::{LockScreen, PlatformError, TagReader, TagScan};
use dawnlock_storage::{PreferenceStore, Preferences};
use tokio::sync::watch;
use tokio::time::{Duration, Interval};
use tracing::{debug, info, warn};

use crate::config::DismissalTiming;
use crate::emergency::{EmergencyOverride, EmergencyStep};
use crate::error::AlarmResult;
use crate::grace::GraceCountdown;
use crate::ticker::{next_interval, periodic};
use crate::verification::{TagVerdict, verify_tag};
use crate::view::{DismissalView, DisplayMode, Notice, WRONG_TAG_TEXT};

const GRACE_TICK: Duration = Duration::from_secs(1);

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TagMatched,
    NoCredential,
    EmergencyOverride,
    Snoozed,
    Explicit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            StopReason::TagMatched => "tag matched",
            StopReason::NoCredential => "no credential registered",
            StopReason::EmergencyOverride => "emergency override",
            StopReason::Snoozed => "snoozed",
            StopReason::Explicit => "explicit stop",
        };
        f.write_str(reason)
    }
}

/// Instruction for the session controller or the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Enter the grace period.
    PauseSound,
    /// End the ringing session.
    StopSession(StopReason),
    /// Re-arm the next daily occurrence.
    ScheduleNext,
    /// Arm the snooze trigger.
    ScheduleSnooze,
    /// Hide the surface.
    Exit,
}

/// Something the surface reacts to.
#[derive(Debug)]
pub enum DismissalInput {
    ClockTick,
    EmergencyTick,
    GraceTick,
    Scan(TagScan),
    ReaderError(PlatformError),
}

pub struct DismissalController<L, R> {
    lock_screen: L,
    reader: R,
    timing: DismissalTiming,
    view: DismissalView,
    view_tx: watch::Sender<DismissalView>,
    active: bool,
    mode: Option<DisplayMode>,
    emergency: EmergencyOverride,
    grace: GraceCountdown,
    clock_tick: Option<Interval>,
    emergency_tick: Option<Interval>,
    grace_tick: Option<Interval>,
}

impl<L, R> DismissalController<L, R>
where
    L: LockScreen,
    R: TagReader,
{
    pub fn new(lock_screen: L, reader: R, timing: DismissalTiming) -> Self {
        let (view_tx, _) = watch::channel(DismissalView::closed());
        Self {
            lock_screen,
            reader,
            emergency: EmergencyOverride::new(
                timing.emergency_total_ticks,
                timing.emergency_ticks_per_second,
            ),
            grace: GraceCountdown::new(timing.grace_countdown_secs),
            timing,
            view: DismissalView::closed(),
            view_tx,
            active: false,
            mode: None,
            clock_tick: None,
            emergency_tick: None,
            grace_tick: None,
        }
    }

    /// Receive every published view snapshot.
    pub fn subscribe(&self) -> watch::Receiver<DismissalView> {
        self.view_tx.subscribe()
    }

    pub fn view(&self) -> &DismissalView {
        &self.view
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn mode(&self) -> Option<DisplayMode> {
        self.mode
    }

    pub fn lock_screen(&self) -> &L {
        &self.lock_screen
    }

    /// Open the surface for a ringing session.
    ///
    /// Opening an already open surface only re-evaluates the mode.
    pub async fn open<S: PreferenceStore>(
        &mut self,
        prefs: &Preferences<S>,
        now: DateTime<FixedOffset>,
    ) -> AlarmResult<Vec<Directive>> {
        if self.active {
            return self.evaluate_mode(prefs).await;
        }

        self.active = true;
        self.mode = None;
        self.emergency.release();
        self.grace = GraceCountdown::new(self.timing.grace_countdown_secs);
        self.view = DismissalView::new(DisplayMode::Locked, &now, self.emergency.total_ticks());
        self.view.set_snooze_used(prefs.snooze_used().await?);
        self.clock_tick = Some(periodic(self.timing.clock_tick()));
        info!("Dismissal surface opened");

        self.evaluate_mode(prefs).await
    }

    /// Wait for the next input.
    ///
    /// Pending forever while closed. Tags are only read in unlocked mode.
    /// Cancel-safe.
    pub async fn next_input(&mut self) -> DismissalInput {
        if !self.active {
            return std::future::pending().await;
        }
        let scanning = self.mode == Some(DisplayMode::Unlocked) && self.reader.is_enabled();

        tokio::select! {
            _ = next_interval(self.clock_tick.as_mut()) => DismissalInput::ClockTick,
            _ = next_interval(self.emergency_tick.as_mut()) => DismissalInput::EmergencyTick,
            _ = next_interval(self.grace_tick.as_mut()) => DismissalInput::GraceTick,
            scan = self.reader.read_tag(), if scanning => match scan {
                Ok(scan) => DismissalInput::Scan(scan),
                Err(e) => DismissalInput::ReaderError(e),
            },
        }
    }

    /// Apply one input.
    pub async fn handle_input<S: PreferenceStore>(
        &mut self,
        input: DismissalInput,
        prefs: &Preferences<S>,
        now: DateTime<FixedOffset>,
    ) -> AlarmResult<Vec<Directive>> {
        if !self.active {
            debug!(?input, "Input after surface closed ignored");
            return Ok(Vec::new());
        }

        match input {
            DismissalInput::ClockTick => {
                self.view.set_time(&now);
                self.evaluate_mode(prefs).await
            }
            DismissalInput::EmergencyTick => self.emergency_step(prefs).await,
            DismissalInput::GraceTick => {
                if !self.grace.tick() {
                    self.grace_tick = None;
                }
                self.view.grace = self.grace.text();
                self.publish();
                Ok(Vec::new())
            }
            DismissalInput::Scan(scan) => self.judge_scan(scan, prefs).await,
            DismissalInput::ReaderError(e) => {
                warn!(error = %e, "Tag reader failed, scanning suspended until next tick");
                if let Err(e) = self.reader.disable().await {
                    warn!(error = %e, "Failed to disable tag reader");
                }
                Ok(Vec::new())
            }
        }
    }

    /// The lock state changed.
    pub async fn on_lock_changed<S: PreferenceStore>(
        &mut self,
        prefs: &Preferences<S>,
    ) -> AlarmResult<Vec<Directive>> {
        if !self.active {
            return Ok(Vec::new());
        }
        self.evaluate_mode(prefs).await
    }

    /// Start the emergency hold. Only available in unlocked mode.
    pub fn press_emergency(&mut self) -> bool {
        if !self.active || self.mode != Some(DisplayMode::Unlocked) {
            debug!(mode = ?self.mode, "Emergency press ignored");
            return false;
        }

        self.emergency.press();
        self.emergency_tick = Some(periodic(self.timing.emergency_tick()));
        self.view.emergency.label = self.emergency.label();
        self.view.emergency.progress = Some(0);
        self.publish();
        true
    }

    /// End the emergency hold, discarding progress.
    pub fn release_emergency(&mut self) {
        self.emergency.release();
        self.emergency_tick = None;
        self.view.emergency.label = self.emergency.label();
        self.view.emergency.progress = None;
        self.publish();
    }

    /// Snooze for `minutes`: locked mode only, once per alarm.
    pub async fn snooze<S: PreferenceStore>(
        &mut self,
        prefs: &Preferences<S>,
        minutes: i64,
    ) -> AlarmResult<Vec<Directive>> {
        if !self.active {
            return Ok(Vec::new());
        }
        let mut directives = self.evaluate_mode(prefs).await?;
        if self.mode != Some(DisplayMode::Locked) {
            debug!("Snooze ignored, device unlocked");
            return Ok(directives);
        }
        if prefs.snooze_used().await? {
            debug!("Snooze ignored, already used");
            return Ok(directives);
        }

        prefs.set_snooze_used(true).await?;
        prefs.set_interacted(false).await?;
        self.view.set_snooze_used(true);
        self.view.notice = Some(Notice::Snoozing { minutes });
        info!(minutes, "Alarm snoozed");
        self.teardown().await;

        directives.extend([
            Directive::ScheduleSnooze,
            Directive::StopSession(StopReason::Snoozed),
            Directive::Exit,
        ]);
        Ok(directives)
    }

    /// Locked-mode dismiss button: ask the platform for the unlock prompt.
    ///
    /// A successful unlock arrives later as a lock-state change.
    pub async fn dismiss_button(&mut self) -> AlarmResult<()> {
        if !self.active || self.mode != Some(DisplayMode::Locked) {
            return Ok(());
        }
        if let Err(e) = self.lock_screen.request_unlock().await {
            warn!(error = %e, "Unlock prompt unavailable");
        }
        Ok(())
    }

    /// Close without a decision, as after an explicit stop.
    pub async fn close(&mut self) {
        if self.active {
            self.teardown().await;
        }
    }

    async fn evaluate_mode<S: PreferenceStore>(
        &mut self,
        prefs: &Preferences<S>,
    ) -> AlarmResult<Vec<Directive>> {
        let mode = if self.lock_screen.is_locked() {
            DisplayMode::Locked
        } else {
            DisplayMode::Unlocked
        };
        let changed = self.mode != Some(mode);
        self.mode = Some(mode);
        let mut directives = Vec::new();

        match mode {
            DisplayMode::Locked => {
                if self.reader.is_enabled()
                    && let Err(e) = self.reader.disable().await
                {
                    warn!(error = %e, "Failed to disable tag reader");
                }
                if self.emergency.is_held() {
                    self.release_emergency();
                }
            }
            DisplayMode::Unlocked => {
                if !self.reader.is_enabled()
                    && let Err(e) = self.reader.enable().await
                {
                    warn!(error = %e, "Tag reader unavailable");
                }
                if !prefs.interacted().await? {
                    prefs.set_interacted(true).await?;
                    if self.grace.start() {
                        directives.push(Directive::PauseSound);
                        self.grace_tick = Some(periodic(GRACE_TICK));
                        self.view.grace = self.grace.text();
                    }
                }
            }
        }

        if changed {
            info!(%mode, "Dismissal surface mode");
            self.view.set_mode(mode);
        }
        self.publish();

        Ok(directives)
    }

    async fn emergency_step<S: PreferenceStore>(
        &mut self,
        prefs: &Preferences<S>,
    ) -> AlarmResult<Vec<Directive>> {
        match self.emergency.tick() {
            EmergencyStep::Idle => {
                self.emergency_tick = None;
                Ok(Vec::new())
            }
            EmergencyStep::Progress(progress) => {
                self.view.emergency.label = self.emergency.label();
                self.view.emergency.progress = Some(progress);
                self.publish();
                Ok(Vec::new())
            }
            EmergencyStep::Completed => {
                self.view.notice = Some(Notice::EmergencyOverride);
                self.finish(StopReason::EmergencyOverride, prefs).await
            }
        }
    }

    async fn judge_scan<S: PreferenceStore>(
        &mut self,
        scan: TagScan,
        prefs: &Preferences<S>,
    ) -> AlarmResult<Vec<Directive>> {
        let mut directives = self.evaluate_mode(prefs).await?;
        if self.mode != Some(DisplayMode::Unlocked) {
            debug!(tag = %scan.tag_id, "Scan while locked ignored");
            return Ok(directives);
        }

        let registered = prefs.registered_tag().await?;
        match verify_tag(registered.as_ref(), &scan.tag_id) {
            TagVerdict::NoCredential => {
                info!(tag = %scan.tag_id, "No tag registered, closing alarm");
                self.view.notice = Some(Notice::NoCredential);
                directives.extend(self.finish(StopReason::NoCredential, prefs).await?);
            }
            TagVerdict::Match => {
                info!("Registered tag scanned, alarm dismissed");
                self.view.notice = Some(Notice::Dismissed);
                directives.extend(self.finish(StopReason::TagMatched, prefs).await?);
            }
            TagVerdict::Mismatch => {
                info!(tag = %scan.tag_id, "Wrong tag scanned");
                self.view.scan_instruction = Some(WRONG_TAG_TEXT);
                self.view.notice = Some(Notice::WrongTag);
                self.publish();
            }
        }

        Ok(directives)
    }

    async fn finish<S: PreferenceStore>(
        &mut self,
        reason: StopReason,
        prefs: &Preferences<S>,
    ) -> AlarmResult<Vec<Directive>> {
        info!(%reason, "Alarm dismissed");
        self.teardown().await;
        if let Err(e) = prefs.reset_dismissal_flags().await {
            warn!(error = %e, "Failed to reset dismissal flags");
        }

        Ok(vec![
            Directive::StopSession(reason),
            Directive::ScheduleNext,
            Directive::Exit,
        ])
    }

    async fn teardown(&mut self) {
        self.active = false;
        self.mode = None;
        self.clock_tick = None;
        self.emergency_tick = None;
        self.grace_tick = None;
        self.emergency.release();
        if self.reader.is_enabled()
            && let Err(e) = self.reader.disable().await
        {
            warn!(error = %e, "Failed to disable tag reader");
        }
        self.view.open = false;
        self.view.emergency.progress = None;
        self.publish();
        debug!("Dismissal surface closed");
    }

    fn publish(&mut self) {
        self.view_tx.send_replace(self.view.clone());
    }
}

impl<L, R> fmt::Debug for DismissalController<L, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DismissalController")
            .field("active", &self.active)
            .field("mode", &self.mode)
            .field("emergency", &self.emergency)
            .field("grace", &self.grace)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dawnlock_core::TagId;
    use dawnlock_platform::LockStatus;
    use dawnlock_platform::mock::{
        MockLockScreen, MockLockScreenHandle, MockTagReader, MockTagReaderHandle,
    };
    use dawnlock_storage::MemoryPreferenceStore;
    use tokio::time::{self, Instant};

    type Controller = DismissalController<MockLockScreen, MockTagReader>;

    struct Fixture {
        ui: Controller,
        prefs: Preferences<MemoryPreferenceStore>,
        lock: MockLockScreenHandle,
        reader: MockTagReaderHandle,
        now: DateTime<FixedOffset>,
    }

    impl Fixture {
        async fn step(&mut self) -> Vec<Directive> {
            let input = self.ui.next_input().await;
            self.ui.handle_input(input, &self.prefs, self.now).await.unwrap()
        }
    }

    async fn fixture(initial: LockStatus) -> Fixture {
        let (lock_screen, lock) = MockLockScreen::new(initial);
        let (tag_reader, reader) = MockTagReader::new();
        let mut ui = DismissalController::new(lock_screen, tag_reader, DismissalTiming::default());
        let prefs = Preferences::new(MemoryPreferenceStore::new());
        let now = DateTime::parse_from_rfc3339("2025-03-10T06:30:00+00:00").unwrap();
        ui.open(&prefs, now).await.unwrap();
        Fixture {
            ui,
            prefs,
            lock,
            reader,
            now,
        }
    }

    fn tag(s: &str) -> TagId {
        s.parse().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_locked_surface() {
        let f = fixture(LockStatus::Locked).await;
        let view = f.ui.subscribe().borrow().clone();

        assert!(view.open);
        assert_eq!(view.mode, DisplayMode::Locked);
        assert_eq!(view.status, "Unlock to dismiss");
        assert!(!f.reader.is_enabled());
        assert!(!f.prefs.interacted().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_unlock_starts_grace() {
        let mut f = fixture(LockStatus::Locked).await;
        f.lock.unlock();

        let directives = f.ui.on_lock_changed(&f.prefs).await.unwrap();

        assert_eq!(directives, vec![Directive::PauseSound]);
        assert!(f.prefs.interacted().await.unwrap());
        assert!(f.reader.is_enabled());
        assert_eq!(f.ui.view().grace.as_deref(), Some("Sound resumes in 30s"));

        // Locking and unlocking again does not restart it.
        f.lock.lock();
        f.ui.on_lock_changed(&f.prefs).await.unwrap();
        assert!(!f.reader.is_enabled());
        f.lock.unlock();
        assert!(f.ui.on_lock_changed(&f.prefs).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_grace_countdown_reaches_resumed() {
        let mut f = fixture(LockStatus::Unlocked).await;
        let start = Instant::now();

        while f.ui.view().grace.as_deref() != Some("Sound Resumed!") {
            f.step().await;
        }

        assert_eq!(start.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_matching_tag_dismisses() {
        let mut f = fixture(LockStatus::Unlocked).await;
        f.prefs.register_tag(&tag("04:a2:2b:91")).await.unwrap();

        f.reader.present(tag("04:a2:2b:91")).await.unwrap();
        let directives = f.step().await;

        assert_eq!(
            directives,
            vec![
                Directive::StopSession(StopReason::TagMatched),
                Directive::ScheduleNext,
                Directive::Exit
            ]
        );
        assert!(!f.ui.is_active());
        assert_eq!(f.ui.view().notice, Some(Notice::Dismissed));
        assert!(!f.prefs.interacted().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_tag_keeps_surface() {
        let mut f = fixture(LockStatus::Unlocked).await;
        f.prefs.register_tag(&tag("04:a2:2b:91")).await.unwrap();

        for _ in 0..5 {
            f.reader.present(tag("de:ad:be:ef")).await.unwrap();
            assert!(f.step().await.is_empty());
        }

        assert!(f.ui.is_active());
        assert_eq!(f.ui.view().scan_instruction, Some("WRONG TAG!"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_without_credential_closes() {
        let mut f = fixture(LockStatus::Unlocked).await;

        f.reader.present(tag("01:02:03:04")).await.unwrap();
        let directives = f.step().await;

        assert_eq!(directives[0], Directive::StopSession(StopReason::NoCredential));
        assert_eq!(f.ui.view().notice, Some(Notice::NoCredential));
    }

    #[tokio::test(start_paused = true)]
    async fn test_match_dismisses_when_flag_reset_fails() {
        let mut f = fixture(LockStatus::Unlocked).await;
        f.prefs.register_tag(&tag("04:a2:2b:91")).await.unwrap();
        f.prefs
            .store()
            .fail_writes_to(dawnlock_core::constants::KEY_ALARM_INTERACTED)
            .await;

        f.reader.present(tag("04:a2:2b:91")).await.unwrap();
        let directives = f.step().await;

        assert_eq!(
            directives,
            vec![
                Directive::StopSession(StopReason::TagMatched),
                Directive::ScheduleNext,
                Directive::Exit
            ]
        );
        assert!(!f.ui.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_after_relock_is_ignored() {
        let mut f = fixture(LockStatus::Unlocked).await;
        f.lock.lock();
        let directives = f
            .ui
            .handle_input(
                DismissalInput::Scan(TagScan::new(tag("01:02:03:04"))),
                &f.prefs,
                f.now,
            )
            .await
            .unwrap();

        assert!(directives.is_empty());
        assert!(f.ui.is_active());
        assert_eq!(f.ui.mode(), Some(DisplayMode::Locked));
    }

    #[tokio::test(start_paused = true)]
    async fn test_emergency_hold_completes_after_sixty_seconds() {
        let mut f = fixture(LockStatus::Unlocked).await;
        f.prefs.register_tag(&tag("04:a2:2b:91")).await.unwrap();
        let start = Instant::now();

        assert!(f.ui.press_emergency());
        let directives = loop {
            let directives = f.step().await;
            if !directives.is_empty() {
                break directives;
            }
        };

        assert_eq!(start.elapsed(), Duration::from_secs(60));
        assert_eq!(directives[0], Directive::StopSession(StopReason::EmergencyOverride));
        assert_eq!(f.ui.view().notice, Some(Notice::EmergencyOverride));
    }

    #[tokio::test(start_paused = true)]
    async fn test_emergency_release_resets() {
        let mut f = fixture(LockStatus::Unlocked).await;
        f.ui.press_emergency();

        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            f.step().await;
        }
        assert_eq!(f.ui.view().emergency.label, "Keep holding: 50s");
        f.ui.release_emergency();

        let view = f.ui.view();
        assert_eq!(view.emergency.label, "Lost Tag?");
        assert_eq!(view.emergency.progress, None);
        assert!(f.ui.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_emergency_unavailable_when_locked() {
        let mut f = fixture(LockStatus::Locked).await;
        assert!(!f.ui.press_emergency());
    }

    #[tokio::test(start_paused = true)]
    async fn test_snooze_once_when_locked() {
        let mut f = fixture(LockStatus::Locked).await;

        let directives = f.ui.snooze(&f.prefs, 3).await.unwrap();
        assert_eq!(
            directives,
            vec![
                Directive::ScheduleSnooze,
                Directive::StopSession(StopReason::Snoozed),
                Directive::Exit
            ]
        );
        assert!(f.prefs.snooze_used().await.unwrap());
        assert_eq!(f.ui.view().notice, Some(Notice::Snoozing { minutes: 3 }));

        f.ui.open(&f.prefs, f.now).await.unwrap();
        assert_eq!(f.ui.view().snooze.label, "Snooze Used");
        assert!(f.ui.snooze(&f.prefs, 3).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_snooze_unavailable_when_unlocked() {
        let mut f = fixture(LockStatus::Unlocked).await;
        let directives = f.ui.snooze(&f.prefs, 3).await.unwrap();

        assert!(!directives.contains(&Directive::ScheduleSnooze));
        assert!(!f.prefs.snooze_used().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_button_requests_unlock_only() {
        let mut f = fixture(LockStatus::Locked).await;
        f.lock.set_unlock_on_request(true);

        f.ui.dismiss_button().await.unwrap();

        assert_eq!(f.lock.unlock_requests(), 1);
        assert!(f.ui.is_active());
        // The next tick picks up the unlock.
        f.step().await;
        assert_eq!(f.ui.mode(), Some(DisplayMode::Unlocked));
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_surface_never_yields_input() {
        let mut f = fixture(LockStatus::Unlocked).await;
        f.ui.close().await;

        let input = time::timeout(Duration::from_secs(600), f.ui.next_input()).await;
        assert!(input.is_err());
        assert!(!f.reader.is_enabled());
    }
}
