//! D2 color mode table.
//!
//! A color mode is one of sixteen base codes plus two flag bits. The
//! serialized form is a single `u16`: `base | RLE | CLUT`.

use std::fmt;

use crate::error::{ConvertError, Result};

/// Flag bit set when the payload is RLE compressed.
pub const MODE_FLAG_RLE: u16 = 16;
/// Flag bit set when pixels index a 256-entry CLUT.
pub const MODE_FLAG_CLUT: u16 = 32;

const NAME_PREFIX: &str = "d2_mode_";

/// Base pixel format codes understood by the accelerator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BaseMode {
    Alpha8 = 0,
    Rgb565 = 1,
    Argb8888 = 2,
    Argb4444 = 3,
    Argb1555 = 4,
    Ai44 = 5,
    Rgba8888 = 6,
    Rgba4444 = 7,
    Rgba5551 = 8,
    I8 = 9,
    I4 = 10,
    I2 = 11,
    I1 = 12,
    Alpha4 = 13,
    Alpha2 = 14,
    Alpha1 = 15,
}

impl BaseMode {
    /// All base modes in code order
    pub const ALL: [BaseMode; 16] = [
        BaseMode::Alpha8,
        BaseMode::Rgb565,
        BaseMode::Argb8888,
        BaseMode::Argb4444,
        BaseMode::Argb1555,
        BaseMode::Ai44,
        BaseMode::Rgba8888,
        BaseMode::Rgba4444,
        BaseMode::Rgba5551,
        BaseMode::I8,
        BaseMode::I4,
        BaseMode::I2,
        BaseMode::I1,
        BaseMode::Alpha4,
        BaseMode::Alpha2,
        BaseMode::Alpha1,
    ];

    /// Numeric code (0-15)
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Suffix after `d2_mode_`, e.g. "argb8888"
    pub fn short_name(self) -> &'static str {
        match self {
            BaseMode::Alpha8 => "alpha8",
            BaseMode::Rgb565 => "rgb565",
            BaseMode::Argb8888 => "argb8888",
            BaseMode::Argb4444 => "argb4444",
            BaseMode::Argb1555 => "argb1555",
            BaseMode::Ai44 => "ai44",
            BaseMode::Rgba8888 => "rgba8888",
            BaseMode::Rgba4444 => "rgba4444",
            BaseMode::Rgba5551 => "rgba5551",
            BaseMode::I8 => "i8",
            BaseMode::I4 => "i4",
            BaseMode::I2 => "i2",
            BaseMode::I1 => "i1",
            BaseMode::Alpha4 => "alpha4",
            BaseMode::Alpha2 => "alpha2",
            BaseMode::Alpha1 => "alpha1",
        }
    }

    /// Full symbolic name, e.g. "d2_mode_argb8888"
    pub fn name(self) -> String {
        format!("{}{}", NAME_PREFIX, self.short_name())
    }

    /// Parse a symbolic name. The `d2_mode_` prefix is optional and matching
    /// ignores ASCII case, so "d2_mode_i4", "I4" and "i4" are equivalent.
    pub fn parse(name: &str) -> Result<Self> {
        let lower = name.trim().to_ascii_lowercase();
        let short = lower.strip_prefix(NAME_PREFIX).unwrap_or(&lower);

        Self::ALL
            .iter()
            .copied()
            .find(|mode| mode.short_name() == short)
            .ok_or_else(|| ConvertError::UnknownFormat(name.to_string()))
    }

    /// True for modes whose pixels reference the CLUT (AI44 and I8..I1)
    pub fn uses_clut(self) -> bool {
        self == BaseMode::Ai44 || (BaseMode::I8.code()..=BaseMode::I1.code()).contains(&self.code())
    }

    /// Bits per palette index for the pure indexed modes
    pub fn index_bits(self) -> Option<u8> {
        match self {
            BaseMode::I8 => Some(8),
            BaseMode::I4 => Some(4),
            BaseMode::I2 => Some(2),
            BaseMode::I1 => Some(1),
            _ => None,
        }
    }
}

impl fmt::Display for BaseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", NAME_PREFIX, self.short_name())
    }
}

/// Orthogonal mode flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ModeFlags {
    pub rle: bool,
    pub clut: bool,
}

impl ModeFlags {
    pub fn bits(self) -> u16 {
        let mut bits = 0;
        if self.rle {
            bits |= MODE_FLAG_RLE;
        }
        if self.clut {
            bits |= MODE_FLAG_CLUT;
        }
        bits
    }
}

/// Resolved color mode: base format plus flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorMode {
    pub base: BaseMode,
    pub flags: ModeFlags,
}

impl ColorMode {
    /// Build a mode from its base, forcing CLUT on for indexed bases
    pub fn new(base: BaseMode, use_rle: bool) -> Self {
        ColorMode {
            base,
            flags: ModeFlags {
                rle: use_rle,
                clut: base.uses_clut(),
            },
        }
    }

    /// Look up a symbolic format name and derive its flags.
    ///
    /// Fails with `UnknownFormat` when the name is not one of the sixteen
    /// `d2_mode_*` names.
    pub fn resolve(name: &str, use_rle: bool) -> Result<Self> {
        Ok(Self::new(BaseMode::parse(name)?, use_rle))
    }

    /// Serialized 16-bit mode value
    pub fn value(self) -> u16 {
        self.base.code() as u16 | self.flags.bits()
    }

    /// Inverse of `value`. Returns None for unknown base codes or stray bits.
    pub fn from_value(value: u16) -> Option<Self> {
        if value & !(0x0F | MODE_FLAG_RLE | MODE_FLAG_CLUT) != 0 {
            return None;
        }
        let base = BaseMode::from_code((value & 0x0F) as u8)?;
        Some(ColorMode {
            base,
            flags: ModeFlags {
                rle: value & MODE_FLAG_RLE != 0,
                clut: value & MODE_FLAG_CLUT != 0,
            },
        })
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        if self.flags.clut {
            write!(f, " | clut")?;
        }
        if self.flags.rle {
            write!(f, " | rle")?;
        }
        Ok(())
    }
}
