//! Single-owner event loop.
//!
//! [`AlarmRuntime`] owns the scheduler, the session controller and the
//! dismissal controller and is the only place their operations are invoked.
//! Session timers, dismissal inputs, lock-state changes and host events are
//! multiplexed in one `select!` loop, so no two callbacks ever mutate session
//! state concurrently. Hosts talk to it through a [`RuntimeHandle`].
//!
//! # Examples
//!
//! ```
//! use dawnlock_alarm::{AlarmRuntime, AppEvent, RuntimeConfig};
//! use dawnlock_core::TriggerId;
//! use dawnlock_platform::mock::mock_services;
//! use dawnlock_platform::{LockStatus, SystemClock};
//! use dawnlock_storage::{MemoryPreferenceStore, Preferences};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (services, handles) = mock_services(SystemClock, LockStatus::Locked);
//! let prefs = Preferences::new(MemoryPreferenceStore::new());
//! let (runtime, handle) = AlarmRuntime::new(services, prefs, RuntimeConfig::default())?;
//!
//! let script = async {
//!     handle.send(AppEvent::TriggerFired(TriggerId::WAKE)).await?;
//!     handle.send(AppEvent::StopRequested).await?;
//!     handle.send(AppEvent::Shutdown).await
//! };
//! let (ran, sent) = tokio::join!(runtime.run(), script);
//! ran?;
//! sent?;
//! assert!(!handles.audio.is_playing());
//! # Ok(())
//! # }
//! ```

use dawnlock_core::TriggerId;
use dawnlock_platform::{Clock, LockScreen, LockStatus, Platform, Presenter, Services};
use dawnlock_storage::{PreferenceStore, Preferences};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::RuntimeConfig;
use crate::dismissal::{DismissalController, Directive, StopReason};
use crate::error::{AlarmError, AlarmResult};
use crate::launch::{LaunchRouter, Route};
use crate::scheduler::Scheduler;
use crate::session::{SessionController, SessionSnapshot};
use crate::trigger::TriggerHandler;
use crate::view::DismissalView;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Events delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// An armed trigger's instant arrived.
    TriggerFired(TriggerId),
    /// The app was opened from any entry point.
    Launch,
    /// Locked-mode dismiss button.
    DismissPressed,
    SnoozePressed,
    EmergencyPressed,
    EmergencyReleased,
    /// Stop action from the ongoing notification.
    StopRequested,
    Shutdown,
}

/// Host side of a running [`AlarmRuntime`].
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    events: mpsc::Sender<AppEvent>,
    view: watch::Receiver<DismissalView>,
    session: watch::Receiver<SessionSnapshot>,
}

impl RuntimeHandle {
    pub async fn send(&self, event: AppEvent) -> AlarmResult<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| AlarmError::ChannelClosed("runtime events"))
    }

    /// Receiver of every dismissal view snapshot.
    pub fn views(&self) -> watch::Receiver<DismissalView> {
        self.view.clone()
    }

    pub fn view(&self) -> DismissalView {
        self.view.borrow().clone()
    }

    pub fn sessions(&self) -> watch::Receiver<SessionSnapshot> {
        self.session.clone()
    }

    pub fn session(&self) -> SessionSnapshot {
        *self.session.borrow()
    }
}

type Session<P> = SessionController<
    <P as Platform>::Audio,
    <P as Platform>::Vibrator,
    <P as Platform>::Presenter,
>;
type Dismissal<P> = DismissalController<<P as Platform>::LockScreen, <P as Platform>::TagReader>;

/// The alarm lifecycle, driven by one task.
pub struct AlarmRuntime<P: Platform, S> {
    prefs: Preferences<S>,
    clock: P::Clock,
    scheduler: Scheduler<P::Timer>,
    trigger: TriggerHandler,
    session: Session<P>,
    dismissal: Dismissal<P>,
    events: mpsc::Receiver<AppEvent>,
    session_tx: watch::Sender<SessionSnapshot>,
    lock_rx: Option<watch::Receiver<LockStatus>>,
}

impl<P, S> AlarmRuntime<P, S>
where
    P: Platform,
    S: PreferenceStore,
{
    /// Wire the runtime over `services`.
    ///
    /// # Errors
    ///
    /// Fails when `config` is inconsistent.
    pub fn new(
        services: Services<P>,
        prefs: Preferences<S>,
        config: RuntimeConfig,
    ) -> AlarmResult<(Self, RuntimeHandle)> {
        config.validate()?;

        let Services {
            timer,
            lock_screen,
            audio,
            vibrator,
            presenter,
            tag_reader,
            clock,
        } = services;

        let session = SessionController::new(audio, vibrator, presenter, config.session)?;
        let dismissal = DismissalController::new(lock_screen, tag_reader, config.dismissal);
        let (events_tx, events) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (session_tx, session_rx) = watch::channel(session.snapshot());

        let handle = RuntimeHandle {
            events: events_tx,
            view: dismissal.subscribe(),
            session: session_rx,
        };
        let runtime = Self {
            prefs,
            clock,
            scheduler: Scheduler::new(timer, &config.scheduler),
            trigger: TriggerHandler::new(&config.trigger),
            session,
            dismissal,
            events,
            session_tx,
            lock_rx: None,
        };

        Ok((runtime, handle))
    }

    /// Run until [`AppEvent::Shutdown`] or until every handle is dropped.
    ///
    /// A ringing marker left by a previous process restarts the session
    /// first. Failures inside the loop are logged and never end it.
    pub async fn run(mut self) -> AlarmResult<()> {
        info!("Alarm runtime started");
        if let Err(e) = self.recover().await {
            warn!(error = %e, "Session recovery failed");
        }
        self.publish_session();

        loop {
            tokio::select! {
                tick = self.session.next_tick() => {
                    if let Err(e) = self.session.handle_tick(tick, &self.prefs).await {
                        warn!(?tick, error = %e, "Session tick failed");
                    }
                }
                input = self.dismissal.next_input() => {
                    let now = self.clock.now();
                    match self.dismissal.handle_input(input, &self.prefs, now).await {
                        Ok(directives) => self.apply(directives).await,
                        Err(e) => warn!(error = %e, "Dismissal input failed"),
                    }
                }
                changed = lock_changed(self.lock_rx.as_mut()) => match changed {
                    Some(status) => self.on_lock_status(status).await,
                    None => self.lock_rx = None,
                },
                event = self.events.recv() => match event {
                    None | Some(AppEvent::Shutdown) => break,
                    Some(event) => {
                        if let Err(e) = self.handle_event(event).await {
                            warn!(?event, error = %e, "Event handling failed");
                        }
                    }
                },
            }
            self.publish_session();
        }

        info!("Alarm runtime stopped");
        Ok(())
    }

    async fn recover(&mut self) -> AlarmResult<()> {
        if self.prefs.is_ringing().await? {
            info!("Ringing marker found, resuming interrupted session");
            self.session.start(&self.prefs).await?;
            self.open_surface().await?;
        }
        Ok(())
    }

    async fn handle_event(&mut self, event: AppEvent) -> AlarmResult<()> {
        debug!(?event, "Host event");
        match event {
            AppEvent::TriggerFired(id) => {
                if id != self.scheduler.identity() {
                    warn!(trigger = %id, "Unknown trigger ignored");
                    return Ok(());
                }
                self.trigger.fire(&mut self.session, &self.prefs).await?;
                self.open_surface().await?;
            }
            AppEvent::Launch => {
                if LaunchRouter::resolve(&self.prefs).await? == Route::Dismissal {
                    self.session.start(&self.prefs).await?;
                    self.open_surface().await?;
                }
            }
            AppEvent::DismissPressed => self.dismissal.dismiss_button().await?,
            AppEvent::SnoozePressed => {
                let minutes = self.scheduler.snooze_interval().num_minutes();
                let directives = self.dismissal.snooze(&self.prefs, minutes).await?;
                self.apply(directives).await;
            }
            AppEvent::EmergencyPressed => {
                self.dismissal.press_emergency();
            }
            AppEvent::EmergencyReleased => self.dismissal.release_emergency(),
            AppEvent::StopRequested => {
                if !self.session.is_active() && !self.dismissal.is_active() {
                    debug!("Stop requested with nothing ringing");
                    return Ok(());
                }
                self.dismissal.close().await;
                if let Err(e) = self.prefs.reset_dismissal_flags().await {
                    warn!(error = %e, "Failed to reset dismissal flags");
                }
                self.apply(vec![
                    Directive::StopSession(StopReason::Explicit),
                    Directive::ScheduleNext,
                    Directive::Exit,
                ])
                .await;
            }
            AppEvent::Shutdown => {}
        }
        Ok(())
    }

    async fn open_surface(&mut self) -> AlarmResult<()> {
        let lock_rx = self.dismissal.lock_screen().subscribe();
        self.lock_rx = Some(lock_rx);
        let directives = self.dismissal.open(&self.prefs, self.clock.now()).await?;
        self.apply(directives).await;
        Ok(())
    }

    async fn on_lock_status(&mut self, status: LockStatus) {
        debug!(?status, "Lock state changed");
        if !status.is_locked()
            && let Err(e) = self.session.on_unlocked(&self.prefs).await
        {
            warn!(error = %e, "Unlock handling failed");
        }
        match self.dismissal.on_lock_changed(&self.prefs).await {
            Ok(directives) => self.apply(directives).await,
            Err(e) => warn!(error = %e, "Mode re-evaluation failed"),
        }
    }

    async fn apply(&mut self, directives: Vec<Directive>) {
        for directive in directives {
            if let Err(e) = self.apply_one(directive).await {
                warn!(?directive, error = %e, "Directive failed");
            }
        }
    }

    async fn apply_one(&mut self, directive: Directive) -> AlarmResult<()> {
        match directive {
            Directive::PauseSound => {
                self.session.pause_for_grace().await?;
            }
            Directive::StopSession(reason) => {
                self.lock_rx = None;
                if self.session.stop(&self.prefs).await? {
                    info!(%reason, "Session ended");
                }
            }
            Directive::ScheduleNext => {
                let now = self.clock.now();
                match self.scheduler.schedule_alarm(&self.prefs, now).await? {
                    Some(at) => info!(%at, "Next alarm armed"),
                    None => info!("No next alarm armed"),
                }
            }
            Directive::ScheduleSnooze => {
                let now = self.clock.now();
                if let Some(at) = self.scheduler.schedule_snooze(now).await? {
                    info!(%at, "Snooze armed");
                }
            }
            Directive::Exit => {
                self.session
                    .presenter_mut()
                    .hide()
                    .await
                    .map_err(AlarmError::from)?;
            }
        }
        Ok(())
    }

    fn publish_session(&self) {
        let snapshot = self.session.snapshot();
        self.session_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

/// Next lock status, `None` once the sender is gone. Never resolves while
/// nothing is subscribed.
async fn lock_changed(rx: Option<&mut watch::Receiver<LockStatus>>) -> Option<LockStatus> {
    match rx {
        Some(rx) => {
            rx.changed().await.ok()?;
            Some(*rx.borrow_and_update())
        }
        None => std::future::pending().await,
    }
}
