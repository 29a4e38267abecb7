//! Sub-byte packing for indexed formats.
//!
//! Pixels fill each byte from the least significant bit upward, so the first
//! pixel of a pair in I4 lands in the low nibble. Rows never share a byte:
//! `flush` is called at the end of every row and pads the partial byte with
//! zero bits.

/// Per-row bit accumulator
#[derive(Debug, Default, Clone)]
pub struct BitPacker {
    current_byte: u8,
    bits_in_byte: u8,
}

impl BitPacker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `width` bits of `value`. Returns the completed byte once 8 bits
    /// have been collected.
    ///
    /// `width` must be 1, 2, 4 or 8 so that pixels never straddle bytes.
    #[inline]
    pub fn pack(&mut self, value: u8, width: u8) -> Option<u8> {
        debug_assert!(matches!(width, 1 | 2 | 4 | 8), "unsupported bit width {}", width);

        let mask = ((1u16 << width) - 1) as u8;
        self.current_byte |= (value & mask) << self.bits_in_byte;
        self.bits_in_byte += width;

        if self.bits_in_byte >= 8 {
            let byte = self.current_byte;
            self.current_byte = 0;
            self.bits_in_byte = 0;
            Some(byte)
        } else {
            None
        }
    }

    /// Emit the zero-padded partial byte, if any, and reset for the next row
    #[inline]
    pub fn flush(&mut self) -> Option<u8> {
        if self.bits_in_byte == 0 {
            return None;
        }
        let byte = self.current_byte;
        self.current_byte = 0;
        self.bits_in_byte = 0;
        Some(byte)
    }

    /// True when no bits are pending
    pub fn is_empty(&self) -> bool {
        self.bits_in_byte == 0
    }
}

/// Bytes produced by one row of `width` pixels at `bits` per pixel
pub fn packed_row_len(width: usize, bits: u8) -> usize {
    (width * bits as usize + 7) / 8
}

/// Pack one row of values, appending its bytes to `output`
pub fn pack_row(values: &[u8], bits: u8, output: &mut Vec<u8>) {
    let mut packer = BitPacker::new();
    for &value in values {
        if let Some(byte) = packer.pack(value, bits) {
            output.push(byte);
        }
    }
    if let Some(byte) = packer.flush() {
        output.push(byte);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_nibble_row() {
        let mut out = Vec::new();
        pack_row(&[0x5], 4, &mut out);
        assert_eq!(out, vec![0x05]);
    }

    #[test]
    fn test_lsb_first_order() {
        let mut out = Vec::new();
        pack_row(&[3, 5], 4, &mut out);
        assert_eq!(out, vec![0x53]);

        // I2: 1, 2, 3, 0 -> 0b00_11_10_01
        let mut out = Vec::new();
        pack_row(&[1, 2, 3, 0], 2, &mut out);
        assert_eq!(out, vec![0b0011_1001]);

        // I1: first pixel is bit 0
        let mut out = Vec::new();
        pack_row(&[1, 0, 0, 0, 0, 0, 0, 1, 1], 1, &mut out);
        assert_eq!(out, vec![0x81, 0x01]);
    }

    #[test]
    fn test_values_are_masked() {
        let mut out = Vec::new();
        pack_row(&[0xFF, 0x00], 4, &mut out);
        assert_eq!(out, vec![0x0F]);
    }

    #[test]
    fn test_width8_emits_immediately() {
        let mut packer = BitPacker::new();
        assert_eq!(packer.pack(0xAB, 8), Some(0xAB));
        assert!(packer.is_empty());
        assert_eq!(packer.flush(), None);
    }

    #[test]
    fn test_row_lengths() {
        for bits in [1u8, 2, 4] {
            for width in 0..20usize {
                let values = vec![1u8; width];
                let mut out = Vec::new();
                pack_row(&values, bits, &mut out);
                assert_eq!(out.len(), (width * bits as usize + 7) / 8);
                assert_eq!(out.len(), packed_row_len(width, bits));
            }
        }
    }

    #[test]
    fn test_rows_do_not_share_bytes() {
        // Two 3-pixel I4 rows: each row pads to 2 bytes independently
        let mut out = Vec::new();
        pack_row(&[1, 2, 3], 4, &mut out);
        pack_row(&[4, 5, 6], 4, &mut out);
        assert_eq!(out, vec![0x21, 0x03, 0x54, 0x06]);
    }
}
