//! Platform service abstraction layer for the Dawnlock alarm clock.
//!
//! This crate provides trait-based abstractions for the host capabilities an
//! alarm needs: exact wall-clock triggers, the keyguard, sound, vibration,
//! the dismissal window and an NFC tag reader. The alarm lifecycle in
//! `dawnlock-alarm` is generic over these traits, so the same state machine
//! runs against real host bindings and the mocks in [`mock`].
//!
//! # Design Philosophy
//!
//! - **Async-first**: All I/O operations are asynchronous using native `async fn`
//!   in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Thread-safe**: All traits require `Send + Sync` for use with Tokio.
//! - **Error-aware**: All operations return `Result<T>`; a withheld host
//!   capability is reported as [`PlatformError::PermissionDenied`] so callers
//!   can degrade instead of failing.
//!
//! # Example
//!
//! ```no_run
//! use dawnlock_platform::traits::{LockScreen, TagReader};
//! use dawnlock_platform::Result;
//!
//! async fn first_tag_after_unlock<L: LockScreen, R: TagReader>(
//!     lock: &L,
//!     reader: &mut R,
//! ) -> Result<String> {
//!     let mut status = lock.subscribe();
//!     while status.borrow_and_update().is_locked() {
//!         if status.changed().await.is_err() {
//!             break;
//!         }
//!     }
//!     reader.enable().await?;
//!     let scan = reader.read_tag().await?;
//!     reader.disable().await?;
//!     Ok(scan.tag_id.to_hex())
//! }
//! ```

pub mod error;
pub mod mock;
pub mod services;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{Capability, PlatformError, Result};
pub use traits::{
    AudioOutput, Clock, ExactTimer, LockScreen, Presenter, SystemClock, TagReader, Vibrator,
};
pub use services::{Platform, Services};
pub use types::{LockStatus, PlaybackState, TagScan};
