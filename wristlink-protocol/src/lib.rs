//! Device file-transfer protocol core for a BLE-connected GPS fitness watch
//!
//! This crate provides the wire protocol a paired host uses to talk to the
//! watch over its custom GATT service: a CRC-16/MODBUS checker, a
//! notification demultiplexer, a retrying command channel, a windowed
//! file-transfer engine (read/write/list/delete), and the pairing
//! handshake — layered on top of any [`Transport`] implementation.

pub mod ble;
pub mod command;
pub mod crc;
pub mod error;
pub mod fileid;
pub mod notification;
pub mod pairing;
pub mod protocol;
pub mod session;
pub mod transfer;
pub mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use ble::BleTransport;
pub use command::send_command;
pub use crc::{crc16_modbus, Crc16};
pub use error::{ProtocolError, TransportError};
pub use fileid::{Command, FileId};
pub use notification::{IntegerForm, Notification, NotificationLatch};
pub use pairing::{pair, PairingMode};
pub use session::Session;
pub use transfer::{delete_file, list_sub_files, read_file, write_file, ByteSink, ByteSource, SliceSource};
pub use transport::{BoxedTransport, Transport};
