//! Core domain types for the Dawnlock tag-dismissed alarm clock.
//!
//! This crate holds the value types shared by every other crate in the
//! workspace: the configured wake time, the registered tag credential, the
//! durable session flags and trigger identities, together with the preference
//! keys and timing constants the alarm lifecycle is built on. It performs no
//! I/O.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
