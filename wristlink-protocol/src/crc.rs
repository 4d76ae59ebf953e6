//! CRC-16/MODBUS: polynomial 0xA001 reflected, init 0xFFFF, no final XOR.
//!
//! Exposes both a streaming accumulator (used by the transfer engine, which
//! needs to feed bytes as they arrive off the wire) and a one-shot function
//! (used by tests and anything that already has the whole buffer).

const POLY: u16 = 0xA001;
const INIT: u16 = 0xFFFF;

/// Streaming CRC-16/MODBUS accumulator.
///
/// Feeding a byte stream followed by its own little-endian CRC trailer
/// brings `digest()` back to zero — that's the integrity check the
/// transfer engine relies on per window.
#[derive(Debug, Clone, Copy)]
pub struct Crc16 {
    value: u16,
}

impl Crc16 {
    pub fn new() -> Self {
        Self { value: INIT }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.value ^= b as u16;
            for _ in 0..8 {
                self.value = if self.value & 1 != 0 {
                    (self.value >> 1) ^ POLY
                } else {
                    self.value >> 1
                };
            }
        }
    }

    pub fn digest(&self) -> u16 {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = INIT;
    }
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot CRC-16/MODBUS over a full buffer.
pub fn crc16_modbus(bytes: &[u8]) -> u16 {
    let mut crc = Crc16::new();
    crc.update(bytes);
    crc.digest()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_value_ascii_digits() {
        assert_eq!(crc16_modbus(b"123456789"), 0x4B37);
    }

    #[test]
    fn empty_input_is_init_value() {
        assert_eq!(crc16_modbus(&[]), 0xFFFF);
    }

    #[test]
    fn known_byte_vector() {
        assert_eq!(crc16_modbus(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x0A]), 0xC5CD);
    }

    #[test]
    fn closure_law_data_plus_own_trailer_digests_to_zero() {
        for input in [
            &b""[..],
            &b"x"[..],
            &b"123456789"[..],
            &[0u8; 5118][..],
            &[0xAA; 37][..],
        ] {
            let crc = crc16_modbus(input);
            let mut combined = input.to_vec();
            combined.extend_from_slice(&crc.to_le_bytes());
            assert_eq!(crc16_modbus(&combined), 0, "input len {}", input.len());
        }
    }

    #[test]
    fn streaming_matches_one_shot() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let whole = crc16_modbus(data);

        let mut streamed = Crc16::new();
        for chunk in data.chunks(7) {
            streamed.update(chunk);
        }
        assert_eq!(streamed.digest(), whole);
    }

    #[test]
    fn reset_returns_to_init() {
        let mut crc = Crc16::new();
        crc.update(b"whatever");
        assert_ne!(crc.digest(), 0xFFFF);
        crc.reset();
        assert_eq!(crc.digest(), 0xFFFF);
    }
}
