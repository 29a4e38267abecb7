//! D2 pixel format handling.
//!
//! This module contains:
//! - `color_mode`: Mode names, codes and CLUT/RLE flags
//! - `pixel`: Per-pixel encoding into direct and indexed formats
//! - `bit_packer`: Sub-byte packing for I4/I2/I1
//! - `rle`: Run-length codec for compressed payloads
//! - `header`: The 14-byte "D2" header
//! - `palette`: Palette containers, `.pal` sidecars and LUT previews

pub mod bit_packer;
pub mod color_mode;
pub mod header;
pub mod palette;
pub mod pixel;
pub mod rle;

// Re-export commonly used types at the format level
pub use bit_packer::BitPacker;
pub use color_mode::{BaseMode, ColorMode, ModeFlags};
pub use header::{Header, HEADER_LEN};
pub use palette::{Palette, PaletteColor, PaletteFormat};
pub use pixel::{EncodedPixel, IndexedPixel, Pixel};
