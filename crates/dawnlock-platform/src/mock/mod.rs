//! Mock platform services for testing and simulation.
//!
//! Every mock is created as a `(service, handle)` pair. The service half is
//! handed to the alarm runtime; the handle half stays with the test or the
//! simulator and can inject events (keyguard changes, tag reads, failures)
//! and observe what the runtime asked the host to do.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::services::{Platform, Services};
use crate::traits::Clock;
use crate::types::LockStatus;

pub mod audio;
pub mod clock;
pub mod lock_screen;
pub mod presenter;
pub mod tag_reader;
pub mod timer;
pub mod vibrator;

pub use audio::{AudioCall, MockAudio, MockAudioHandle};
pub use clock::ManualClock;
pub use lock_screen::{MockLockScreen, MockLockScreenHandle};
pub use presenter::{MockPresenter, MockPresenterHandle};
pub use tag_reader::{MockTagReader, MockTagReaderHandle};
pub use timer::{MockTimer, MockTimerHandle};
pub use vibrator::{MockVibrator, MockVibratorHandle};

/// State shared between a mock service and its handle.
#[derive(Debug, Default)]
pub(crate) struct Shared<T>(Arc<Mutex<T>>);

impl<T> Shared<T> {
    pub(crate) fn new(value: T) -> Self {
        Self(Arc::new(Mutex::new(value)))
    }

    /// Lock the state. A panic in another holder does not poison mocks.
    pub(crate) fn lock(&self) -> MutexGuard<'_, T> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

/// [`Platform`] made of the mock services, with a caller-chosen clock.
#[derive(Debug)]
pub struct MockPlatform<C>(PhantomData<C>);

impl<C: Clock> Platform for MockPlatform<C> {
    type Timer = MockTimer;
    type LockScreen = MockLockScreen;
    type Audio = MockAudio;
    type Vibrator = MockVibrator;
    type Presenter = MockPresenter;
    type TagReader = MockTagReader;
    type Clock = C;
}

/// Handles for every service created by [`mock_services`].
#[derive(Debug, Clone)]
pub struct MockHandles {
    pub timer: MockTimerHandle,
    pub lock_screen: MockLockScreenHandle,
    pub audio: MockAudioHandle,
    pub vibrator: MockVibratorHandle,
    pub presenter: MockPresenterHandle,
    pub tag_reader: MockTagReaderHandle,
}

/// Create a full set of mock services around `clock`.
///
/// # Examples
///
/// ```
/// use dawnlock_platform::mock::mock_services;
/// use dawnlock_platform::{LockStatus, SystemClock};
///
/// let (services, handles) = mock_services(SystemClock, LockStatus::Locked);
/// handles.lock_screen.unlock();
/// # drop(services);
/// ```
pub fn mock_services<C: Clock>(
    clock: C,
    initial_lock: LockStatus,
) -> (Services<MockPlatform<C>>, MockHandles) {
    let (timer, timer_handle) = MockTimer::new();
    let (lock_screen, lock_handle) = MockLockScreen::new(initial_lock);
    let (audio, audio_handle) = MockAudio::new();
    let (vibrator, vibrator_handle) = MockVibrator::new();
    let (presenter, presenter_handle) = MockPresenter::new();
    let (tag_reader, reader_handle) = MockTagReader::new();

    let services = Services {
        timer,
        lock_screen,
        audio,
        vibrator,
        presenter,
        tag_reader,
        clock,
    };
    let handles = MockHandles {
        timer: timer_handle,
        lock_screen: lock_handle,
        audio: audio_handle,
        vibrator: vibrator_handle,
        presenter: presenter_handle,
        tag_reader: reader_handle,
    };

    (services, handles)
}
