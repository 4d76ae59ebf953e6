//! Error types for sync orchestration

use thiserror::Error;
use wristlink_protocol::ProtocolError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("local I/O failure: {0}")]
    Io(String),

    #[cfg(feature = "assistance-fetch")]
    #[error("failed to fetch GPS assistance data: {0}")]
    Http(String),
}
