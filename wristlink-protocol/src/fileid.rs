//! 24-bit device file identifiers and the 4-byte command packets built from them.

use crate::error::ProtocolError;
use crate::protocol::op;

/// A 24-bit device file identifier. The top 8 bits of the backing `u32` are
/// always zero; constructing one from a value that violates this is a
/// programmer error surfaced as [`ProtocolError::InvalidFileId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(u32);

impl FileId {
    pub fn new(value: u32) -> Result<Self, ProtocolError> {
        if value >> 24 != 0 {
            return Err(ProtocolError::InvalidFileId(value));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// The 3 bytes that follow the opcode in a command packet.
    ///
    /// The device's own textual notation `0x00AABBCC` is transmitted as
    /// `AA CC BB` — i.e. bits 16-23, then bits 0-7, then bits 8-15 — an
    /// ordering quirk preserved bit-exact from the original tool.
    pub fn wire_suffix(self) -> [u8; 3] {
        let v = self.0;
        [
            ((v >> 16) & 0xFF) as u8,
            (v & 0xFF) as u8,
            ((v >> 8) & 0xFF) as u8,
        ]
    }

    /// Keep the middle byte (bits 16-23) of this ID and add an offset —
    /// the `list_sub_files` base-ID combination rule. Parenthesized as
    /// `(base & 0x00FF0000) + offset`, not `base & (0x00FF0000 + offset)`;
    /// an earlier version of the source code mixed this up.
    pub fn with_offset(self, offset: u16) -> Self {
        Self((self.0 & 0x00FF_0000) + offset as u32)
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl TryFrom<u32> for FileId {
    type Error = ProtocolError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A 4-byte command record: `[op, fileId_high, fileId_low, fileId_mid]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub op: u8,
    pub file: FileId,
}

impl Command {
    pub fn read(file: FileId) -> Self {
        Self { op: op::READ, file }
    }

    pub fn write(file: FileId) -> Self {
        Self { op: op::WRITE, file }
    }

    pub fn list(file: FileId) -> Self {
        Self { op: op::LIST, file }
    }

    pub fn delete(file: FileId) -> Self {
        Self { op: op::DELETE, file }
    }

    pub fn to_bytes(self) -> [u8; 4] {
        let [s0, s1, s2] = self.file.wire_suffix();
        [self.op, s0, s1, s2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_suffix_matches_spec_vector() {
        let id = FileId::new(0x00AABBCC).unwrap();
        assert_eq!(id.wire_suffix(), [0xAA, 0xCC, 0xBB]);
    }

    #[test]
    fn wire_suffix_matches_second_vector() {
        let id = FileId::new(0x001234AB).unwrap();
        assert_eq!(id.wire_suffix(), [0x12, 0xAB, 0x34]);
    }

    #[test]
    fn rejects_nonzero_top_byte() {
        assert!(matches!(
            FileId::new(0xFF001234),
            Err(ProtocolError::InvalidFileId(0xFF001234))
        ));
    }

    #[test]
    fn with_offset_keeps_middle_byte_only() {
        let base = FileId::new(0x00910000).unwrap();
        assert_eq!(base.with_offset(1).value(), 0x00910001);
        assert_eq!(base.with_offset(0x00FF).value(), 0x009100FF);
    }

    #[test]
    fn command_bytes_include_opcode() {
        let cmd = Command::read(FileId::new(0x00020002).unwrap());
        assert_eq!(cmd.to_bytes()[0], op::READ);
    }
}
