//! D2 image header.
//!
//! Layout (little-endian, no padding):
//!
//! | offset | size | field  |
//! |--------|------|--------|
//! | 0      | 2    | "D2"   |
//! | 2      | 2    | width  |
//! | 4      | 2    | height |
//! | 6      | 1    | flags  |
//! | 7      | 1    | type   |
//! | 8      | 2    | mode   |
//! | 10     | 4    | length |

use byteorder_lite::{ByteOrder, LittleEndian};
use std::io::{self, Write};

use super::color_mode::ColorMode;
use crate::error::{ConvertError, Result};

/// Magic bytes at the start of every header
pub const MAGIC: [u8; 2] = *b"D2";

/// Serialized header size in bytes
pub const HEADER_LEN: usize = 14;

/// Fixed-size header preceding the pixel payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub width: u16,
    pub height: u16,
    pub flags: u8,
    pub image_type: u8,
    pub mode: u16,
    /// Payload length in bytes (after RLE, if any)
    pub length: u32,
}

fn check_field(field: &'static str, value: u64, max: u64) -> Result<u64> {
    if value > max {
        return Err(ConvertError::HeaderFieldOverflow { field, value, max });
    }
    Ok(value)
}

impl Header {
    /// Build a header, rejecting values that do not fit their fields
    pub fn new(
        width: u32,
        height: u32,
        flags: u8,
        image_type: u8,
        mode: ColorMode,
        payload_len: usize,
    ) -> Result<Self> {
        Self::from_raw(width, height, flags, image_type, mode.value() as u32, payload_len)
    }

    fn from_raw(
        width: u32,
        height: u32,
        flags: u8,
        image_type: u8,
        mode: u32,
        payload_len: usize,
    ) -> Result<Self> {
        let max16 = u16::MAX as u64;
        Ok(Header {
            width: check_field("width", width as u64, max16)? as u16,
            height: check_field("height", height as u64, max16)? as u16,
            flags,
            image_type,
            mode: check_field("mode", mode as u64, max16)? as u16,
            length: check_field("length", payload_len as u64, u32::MAX as u64)? as u32,
        })
    }

    /// Decoded color mode, if the mode field holds a known value
    pub fn color_mode(&self) -> Option<ColorMode> {
        ColorMode::from_value(self.mode)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..2].copy_from_slice(&MAGIC);
        LittleEndian::write_u16(&mut bytes[2..4], self.width);
        LittleEndian::write_u16(&mut bytes[4..6], self.height);
        bytes[6] = self.flags;
        bytes[7] = self.image_type;
        LittleEndian::write_u16(&mut bytes[8..10], self.mode);
        LittleEndian::write_u32(&mut bytes[10..14], self.length);
        bytes
    }

    /// Parse a header from the start of `data`
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(ConvertError::MalformedHeader(format!(
                "need {} bytes, got {}",
                HEADER_LEN,
                data.len()
            )));
        }
        if data[..2] != MAGIC {
            return Err(ConvertError::MalformedHeader(format!(
                "bad magic {:02X} {:02X}",
                data[0], data[1]
            )));
        }

        Ok(Header {
            width: LittleEndian::read_u16(&data[2..4]),
            height: LittleEndian::read_u16(&data[4..6]),
            flags: data[6],
            image_type: data[7],
            mode: LittleEndian::read_u16(&data[8..10]),
            length: LittleEndian::read_u32(&data[10..14]),
        })
    }
}

/// Serialize a header from raw field values.
///
/// `mode` is the already combined 16-bit mode value.
pub fn write_header(
    width: u32,
    height: u32,
    flags: u8,
    image_type: u8,
    mode: u32,
    payload_len: usize,
) -> Result<[u8; HEADER_LEN]> {
    Ok(Header::from_raw(width, height, flags, image_type, mode, payload_len)?.to_bytes())
}
