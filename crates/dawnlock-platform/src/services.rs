//! Bundling of the platform services one host provides.

use crate::traits::{AudioOutput, Clock, ExactTimer, LockScreen, Presenter, TagReader, Vibrator};

/// The set of service implementations a host provides.
///
/// Components that need several services are generic over one `Platform`
/// instead of one parameter per service.
pub trait Platform {
    type Timer: ExactTimer;
    type LockScreen: LockScreen;
    type Audio: AudioOutput;
    type Vibrator: Vibrator;
    type Presenter: Presenter;
    type TagReader: TagReader;
    type Clock: Clock;
}

/// Owned instances of every service of a [`Platform`].
pub struct Services<P: Platform> {
    pub timer: P::Timer,
    pub lock_screen: P::LockScreen,
    pub audio: P::Audio,
    pub vibrator: P::Vibrator,
    pub presenter: P::Presenter,
    pub tag_reader: P::TagReader,
    pub clock: P::Clock,
}
