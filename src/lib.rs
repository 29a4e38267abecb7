//! Conversion of PNG images into packed pixel formats for the D2 2D
//! rendering accelerator.
//!
//! The output is `[optional header][payload]`, where the payload is the image
//! packed row by row in the selected color mode and optionally RLE
//! compressed. Palettes of indexed sources can be exported as `.pal`
//! sidecars and LUT preview images.

pub mod convert;
pub mod decode;
pub mod error;
pub mod format;

pub use convert::{convert, encode_pixels, ConvertOptions, ConvertedImage, HeaderOptions};
pub use decode::{load_mask_from_path, load_source_from_path, AlphaMask, SourceImage, SourcePixels};
pub use error::{ConvertError, Result};
pub use format::{BaseMode, ColorMode, Header, Palette, PaletteFormat};
