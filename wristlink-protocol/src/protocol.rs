//! Wire-level constants for the device file-transfer protocol:
//! GATT attribute handles, command opcodes, timing, and well-known file IDs.

use std::time::Duration;

/// BLE GATT attribute handles (bit-exact, see external interface table).
pub mod handle {
    /// Command channel: write 4-byte command, notify 1-byte status.
    pub const COMMAND: u16 = 0x25;
    /// Notification-enable descriptor, armed right before the pairing code.
    pub const NOTIFY_ENABLE: u16 = 0x26;
    /// Transfer length, 4 bytes little-endian.
    pub const LENGTH: u16 = 0x28;
    /// Notification-enable descriptor used only during new-pairing.
    pub const DESC_29: u16 = 0x29;
    /// Data chunks, up to [`crate::protocol::MTU`] bytes.
    pub const DATA: u16 = 0x2b;
    /// Notification-enable descriptor used only during new-pairing.
    pub const DESC_2C: u16 = 0x2c;
    /// Pacing counter (4 bytes LE) or early-termination sentinel.
    pub const PACING: u16 = 0x2e;
    /// Notification-enable descriptor used only during new-pairing.
    pub const DESC_2F: u16 = 0x2f;
    /// Pairing code (4 bytes LE) / response (1 byte).
    pub const PAIRING_CODE: u16 = 0x32;
    /// Session-initialization write, first step of both pairing modes.
    pub const SESSION_INIT: u16 = 0x33;
    /// Session-initialization write that registers notification interest.
    pub const NOTIFY_REGISTER: u16 = 0x35;
}

/// Command opcodes carried in the first byte of a 4-byte [`crate::Command`].
pub mod op {
    pub const WRITE: u8 = 0x00;
    pub const READ: u8 = 0x01;
    pub const LIST: u8 = 0x03;
    pub const DELETE: u8 = 0x04;
}

/// Maximum payload bytes per BLE notification/write.
pub const MTU: usize = 20;

/// Pacing window: data bytes per window before a counter echo is required.
/// `256 chunks * 20 bytes - 2 bytes reserved for the CRC trailer`.
pub const WINDOW: usize = 256 * MTU - 2;

/// Timing constants observed against the device.
pub mod timing {
    use super::Duration;

    /// Timeout for command-channel acks and most single notifications.
    pub const NORMAL_TIMEOUT: Duration = Duration::from_secs(1);
    /// Timeout for pacing echoes and delete replies (large-file tolerant).
    pub const SLOW_TIMEOUT: Duration = Duration::from_secs(20);
    /// Maximum `send_command` attempts before giving up.
    pub const COMMAND_RETRIES: u32 = 10;
    /// Sleep between failed `send_command` attempts.
    pub const COMMAND_RETRY_DELAY: Duration = Duration::from_secs(1);
}

/// Well-known file IDs in the device's 24-bit namespace.
pub mod file {
    /// Status string shown on the watch face during sync.
    pub const STATUS: u32 = 0x00020002;
    /// Device preferences, read as XML.
    pub const PREFERENCES: u32 = 0x00F20000;
    /// Base ID for activity recordings; enumerate with `list_sub_files`.
    pub const ACTIVITY_BASE: u32 = 0x00910000;
    /// GPS assistance ("quick fix") blob.
    pub const ASSISTANCE: u32 = 0x00010100;
    /// Informational: registry of codes the device will accept for pairing.
    pub const PAIRING_REGISTRY: u32 = 0x000F0000;
    /// Informational: per-pair code storage.
    pub const PAIRING_CODES_BASE: u32 = 0x000F2000;
}
