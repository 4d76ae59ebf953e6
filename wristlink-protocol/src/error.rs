//! Error types for the transport and protocol layers

use thiserror::Error;

/// Errors from the raw transport (BLE I/O)
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("BLE I/O failure: {0}")]
    Io(String),

    #[error("device disconnected")]
    Disconnected,

    #[error("characteristic not found for handle 0x{0:02x}")]
    UnknownHandle(u16),
}

/// Errors from the protocol state machine (command channel, file transfer,
/// pairing). Wraps [`TransportError`] since any protocol step can fail at
/// the transport level.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("timed out waiting for a notification on handle {0:?}")]
    Timeout(Option<u16>),

    #[error(
        "unexpected notification: expected handle={expected_handle:?} integer={expected_integer:?}, \
         got handle=0x{got_handle:02x} data={got_data:?} integer={got_integer:?}"
    )]
    UnexpectedNotification {
        expected_handle: Option<u16>,
        expected_integer: Option<u64>,
        got_handle: u16,
        got_data: Vec<u8>,
        got_integer: Option<u64>,
    },

    #[error("CRC mismatch in transfer window")]
    CrcMismatch,

    #[error("command rejected after {0} attempts")]
    CommandRejected(u32),

    #[error("pairing rejected by device")]
    PairingRejected,

    #[error("invalid file id 0x{0:08x}: top byte must be zero")]
    InvalidFileId(u32),

    #[error("malformed list-sub-files response: {0}")]
    MalformedListing(String),
}
