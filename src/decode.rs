//! Source and mask image loading.
//!
//! Source images are read with the `png` crate directly so palette-indexed
//! PNGs keep their indices (the `image` crate would expand them to RGB).
//! Masks go through `image` since only their alpha channel matters.

use image::{DynamicImage, ImageReader};
use log::debug;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};
use crate::format::palette::Palette;
use crate::format::pixel::{IndexedPixel, Pixel};

// ============================================================================
// Source image
// ============================================================================

/// Decoded pixel storage, row-major with no padding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcePixels {
    /// One palette index per byte
    Indexed { indices: Vec<u8>, palette: Palette },
    /// RGBRGB...
    Rgb(Vec<u8>),
    /// RGBARGBA...
    Rgba(Vec<u8>),
}

/// A fully decoded source image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub width: u32,
    pub height: u32,
    pub pixels: SourcePixels,
}

fn check_len(layout: &str, len: usize, width: u32, height: u32, bytes_per_pixel: usize) -> Result<()> {
    let expected = width as usize * height as usize * bytes_per_pixel;
    if len != expected {
        return Err(ConvertError::UnsupportedSourcePixelLayout(format!(
            "{} buffer has {} bytes, expected {} for {}x{}",
            layout, len, expected, width, height
        )));
    }
    Ok(())
}

impl SourceImage {
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        check_len("RGB", data.len(), width, height, 3)?;
        Ok(SourceImage { width, height, pixels: SourcePixels::Rgb(data) })
    }

    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        check_len("RGBA", data.len(), width, height, 4)?;
        Ok(SourceImage { width, height, pixels: SourcePixels::Rgba(data) })
    }

    pub fn from_indexed(width: u32, height: u32, indices: Vec<u8>, palette: Palette) -> Result<Self> {
        check_len("indexed", indices.len(), width, height, 1)?;
        Ok(SourceImage {
            width,
            height,
            pixels: SourcePixels::Indexed { indices, palette },
        })
    }

    /// Short layout name for diagnostics
    pub fn layout_name(&self) -> &'static str {
        match self.pixels {
            SourcePixels::Indexed { .. } => "indexed",
            SourcePixels::Rgb(_) => "RGB",
            SourcePixels::Rgba(_) => "RGBA",
        }
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self.pixels, SourcePixels::Indexed { .. })
    }

    pub fn palette(&self) -> Option<&Palette> {
        match &self.pixels {
            SourcePixels::Indexed { palette, .. } => Some(palette),
            _ => None,
        }
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// RGB(A) value at (x, y). Indexed sources are resolved through their
    /// palette; tRNS alpha counts as a real alpha channel.
    pub fn direct_pixel(&self, x: u32, y: u32) -> Result<Pixel> {
        let i = self.offset(x, y);
        match &self.pixels {
            SourcePixels::Rgb(data) => Ok(Pixel::rgb(data[i * 3], data[i * 3 + 1], data[i * 3 + 2])),
            SourcePixels::Rgba(data) => Ok(Pixel::rgba(
                data[i * 4],
                data[i * 4 + 1],
                data[i * 4 + 2],
                data[i * 4 + 3],
            )),
            SourcePixels::Indexed { indices, palette } => {
                let index = indices[i];
                let c = palette.get(index).ok_or_else(|| {
                    ConvertError::MalformedPaletteSource(format!(
                        "pixel ({}, {}) uses index {} but palette has {} entries",
                        x,
                        y,
                        index,
                        palette.len()
                    ))
                })?;
                Ok(Pixel {
                    r: c.r,
                    g: c.g,
                    b: c.b,
                    a: palette.has_alpha.then_some(c.a),
                })
            }
        }
    }

    /// Palette index at (x, y). Only indexed sources have one.
    pub fn indexed_pixel(&self, x: u32, y: u32) -> Result<IndexedPixel> {
        match &self.pixels {
            SourcePixels::Indexed { indices, palette } => {
                let index = indices[self.offset(x, y)];
                let alpha = if palette.has_alpha {
                    palette.get(index).map(|c| c.a)
                } else {
                    None
                };
                Ok(IndexedPixel { index, alpha })
            }
            _ => Err(ConvertError::UnsupportedSourcePixelLayout(format!(
                "indexed output needs a palette-indexed source, got {}",
                self.layout_name()
            ))),
        }
    }
}

/// Load a PNG source image from a file path
pub fn load_source_from_path<P: AsRef<Path>>(path: P) -> Result<SourceImage> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ConvertError::io(path, e))?;
    let image = load_source(BufReader::new(file))?;
    debug!(
        "Loaded {} ({}x{}, {})",
        path.display(),
        image.width,
        image.height,
        image.layout_name()
    );
    Ok(image)
}

/// Load a PNG source image from memory
pub fn load_source_from_bytes(data: &[u8]) -> Result<SourceImage> {
    load_source(data)
}

fn load_source<R: Read>(reader: R) -> Result<SourceImage> {
    let mut decoder = png::Decoder::new(reader);
    decoder.set_transformations(png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;

    let mut buf = vec![0u8; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut buf)?;
    let (width, height) = (frame.width, frame.height);
    buf.truncate(frame.buffer_size());

    match frame.color_type {
        png::ColorType::Indexed => {
            let info = reader.info();
            let plte = info.palette.as_ref().ok_or_else(|| {
                ConvertError::MalformedPaletteSource("indexed PNG has no PLTE chunk".to_string())
            })?;
            let palette = Palette::from_png_chunks(plte, info.trns.as_ref().map(|t| t.as_ref()))?;
            let indices = unpack_indices(&buf, width, height, frame.line_size, frame.bit_depth as u8);
            SourceImage::from_indexed(width, height, indices, palette)
        }
        png::ColorType::Rgb => SourceImage::from_rgb(width, height, buf),
        png::ColorType::Rgba => SourceImage::from_rgba(width, height, buf),
        other => Err(ConvertError::UnsupportedSourcePixelLayout(format!(
            "{:?} {}-bit PNG",
            other, frame.bit_depth as u8
        ))),
    }
}

/// Expand packed PNG index rows (MSB-first within each byte) to one index per byte
fn unpack_indices(buf: &[u8], width: u32, height: u32, line_size: usize, bit_depth: u8) -> Vec<u8> {
    let width = width as usize;
    let depth = bit_depth as usize;
    let mask = ((1u16 << bit_depth) - 1) as u8;
    let mut indices = Vec::with_capacity(width * height as usize);

    for row in buf.chunks(line_size).take(height as usize) {
        for x in 0..width {
            let bit = x * depth;
            let shift = 8 - depth - (bit % 8);
            indices.push((row[bit / 8] >> shift) & mask);
        }
    }

    indices
}

// ============================================================================
// Alpha mask
// ============================================================================

/// Alpha channel taken from a companion RGBA image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaMask {
    pub width: u32,
    pub height: u32,
    alpha: Vec<u8>,
}

impl AlphaMask {
    pub fn from_alpha(width: u32, height: u32, alpha: Vec<u8>) -> Result<Self> {
        if alpha.len() != width as usize * height as usize {
            return Err(ConvertError::MaskUnavailableOrInvalid(format!(
                "alpha buffer has {} bytes, expected {}x{}",
                alpha.len(),
                width,
                height
            )));
        }
        Ok(AlphaMask { width, height, alpha })
    }

    /// Take the alpha channel of an 8-bit RGBA image; other layouts are rejected
    pub fn from_image(image: DynamicImage) -> Result<Self> {
        match image {
            DynamicImage::ImageRgba8(rgba) => {
                let (width, height) = rgba.dimensions();
                let alpha = rgba.pixels().map(|p| p[3]).collect();
                Ok(AlphaMask { width, height, alpha })
            }
            other => Err(ConvertError::MaskUnavailableOrInvalid(format!(
                "mask must be 8-bit RGBA, got {:?}",
                other.color()
            ))),
        }
    }

    #[inline]
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.alpha[y as usize * self.width as usize + x as usize]
    }
}

/// `<input stem>_mask.png` next to the input
pub fn mask_path_for(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    input.with_file_name(format!("{}_mask.png", stem))
}

/// Load a mask image from a file path
pub fn load_mask_from_path<P: AsRef<Path>>(path: P) -> Result<AlphaMask> {
    let path = path.as_ref();
    let image = ImageReader::open(path)
        .map_err(|e| ConvertError::MaskUnavailableOrInvalid(format!("failed to open {}: {}", path.display(), e)))?
        .with_guessed_format()
        .map_err(|e| ConvertError::MaskUnavailableOrInvalid(format!("failed to detect format: {}", e)))?
        .decode()
        .map_err(|e| ConvertError::MaskUnavailableOrInvalid(format!("failed to decode {}: {}", path.display(), e)))?;
    AlphaMask::from_image(image)
}

/// Load a mask image from memory
pub fn load_mask_from_bytes(data: &[u8]) -> Result<AlphaMask> {
    let image = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ConvertError::MaskUnavailableOrInvalid(format!("failed to detect format: {}", e)))?
        .decode()
        .map_err(|e| ConvertError::MaskUnavailableOrInvalid(format!("failed to decode mask: {}", e)))?;
    AlphaMask::from_image(image)
}
