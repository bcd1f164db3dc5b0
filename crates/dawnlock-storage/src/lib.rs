//! Durable preference storage for the Dawnlock alarm clock.
//!
//! All persisted alarm state lives in one namespaced key/value table in
//! SQLite: the wake time, the enabled flag, the registered tag and the
//! session flags. The `ALARM_RINGING` marker in particular must survive
//! process death, so every write is committed before the call returns.
//!
//! # Quick Start
//!
//! ```no_run
//! use dawnlock_storage::{Database, DatabaseConfig, Preferences};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("dawnlock.db")).await?;
//! let prefs = Preferences::new(db.preference_store());
//!
//! if prefs.is_ringing().await? {
//!     println!("alarm still ringing from a previous run");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Layers
//!
//! - [`Database`]: connection pool and embedded migrations.
//! - [`PreferenceStore`]: raw string/bool/int access; [`SqlitePreferenceStore`]
//!   for the real table and [`MemoryPreferenceStore`] for tests.
//! - [`Preferences`]: typed accessors over any store.
//!
//! # SQL Injection Prevention
//!
//! All queries use parameterized statements via SQLx.

pub mod connection;
pub mod error;
pub mod preferences;
pub mod repositories;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use preferences::Preferences;
pub use repositories::{MemoryPreferenceStore, PreferenceStore, SqlitePreferenceStore};
