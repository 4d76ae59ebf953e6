//! Sync orchestration for a BLE-connected GPS fitness watch, built on
//! `wristlink-protocol`'s file-transfer engine: preferences, activities,
//! and the GPS assistance blob, run in the order the watch expects.

#[cfg(feature = "assistance-fetch")]
pub mod assistance;
pub mod error;
pub mod watch;

#[cfg(feature = "assistance-fetch")]
pub use assistance::{fetch_assistance_data, QUICKFIX_URL};
pub use error::SyncError;
pub use watch::{run_full_sync, SyncReport, SyncSink, Watch};
