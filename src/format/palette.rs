//! Palettes: reading from indexed PNG and ACT files, writing `.pal` sidecars
//! and LUT preview images.

use image::{ImageBuffer, Rgba};
use log::{debug, warn};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::color_mode::BaseMode;
use super::pixel::encode_rgb565;
use crate::error::{ConvertError, Result};

/// Size of the RGB table at the start of an ACT file
const ACT_TABLE_LEN: usize = 256 * 3;
/// ACT table plus the optional count/transparency trailer
const ACT_EXTENDED_LEN: usize = ACT_TABLE_LEN + 4;

/// One palette slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl PaletteColor {
    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        PaletteColor { r, g, b, a: 255 }
    }
}

/// Color lookup table with optional per-entry alpha
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    pub colors: Vec<PaletteColor>,
    /// True when alpha values came from a transparency table (PNG tRNS)
    pub has_alpha: bool,
    /// Slot flagged as transparent by the container, if any
    pub transparent_index: Option<u8>,
}

/// Layout of entries in a `.pal` sidecar file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteFormat {
    /// u32 little-endian `0x00RRGGBB`
    Xrgb8888,
    /// u16 little-endian RGB565
    Rgb565,
}

impl PaletteFormat {
    /// Resolve a palette format name. 32-bit names (argb8888, rgba8888)
    /// both select the `0x00RRGGBB` layout.
    pub fn parse(name: &str) -> Result<Self> {
        match BaseMode::parse(name)? {
            BaseMode::Argb8888 | BaseMode::Rgba8888 => Ok(PaletteFormat::Xrgb8888),
            BaseMode::Rgb565 => Ok(PaletteFormat::Rgb565),
            _ => Err(ConvertError::UnknownFormat(format!(
                "{} (palette formats: d2_mode_argb8888, d2_mode_rgba8888, d2_mode_rgb565)",
                name
            ))),
        }
    }

    /// Bytes per sidecar entry
    pub fn entry_size(self) -> usize {
        match self {
            PaletteFormat::Xrgb8888 => 4,
            PaletteFormat::Rgb565 => 2,
        }
    }
}

impl Palette {
    /// Build a palette from raw PLTE and tRNS chunk contents
    pub fn from_png_chunks(plte: &[u8], trns: Option<&[u8]>) -> Result<Self> {
        let num_colors = plte.len() / 3;
        if plte.len() % 3 != 0 || num_colors == 0 || num_colors > 256 {
            return Err(ConvertError::MalformedPaletteSource(format!(
                "invalid PLTE length {}",
                plte.len()
            )));
        }

        let colors = plte
            .chunks_exact(3)
            .enumerate()
            .map(|(i, rgb)| PaletteColor {
                r: rgb[0],
                g: rgb[1],
                b: rgb[2],
                a: trns.and_then(|t| t.get(i).copied()).unwrap_or(255),
            })
            .collect::<Vec<_>>();

        let transparent_index = colors.iter().position(|c| c.a == 0).map(|i| i as u8);

        Ok(Palette {
            colors,
            has_alpha: trns.is_some(),
            transparent_index,
        })
    }

    /// Read the palette of an indexed PNG
    pub fn from_png_reader<R: Read>(reader: R) -> Result<Self> {
        let decoder = png::Decoder::new(reader);
        let reader = decoder.read_info()?;
        let info = reader.info();

        if info.color_type != png::ColorType::Indexed {
            return Err(ConvertError::MalformedPaletteSource(format!(
                "PNG is not palette-indexed ({:?})",
                info.color_type
            )));
        }

        let plte = info
            .palette
            .as_ref()
            .ok_or_else(|| ConvertError::MalformedPaletteSource("PNG has no PLTE chunk".to_string()))?;
        let trns = info.trns.as_ref().map(|t| t.as_ref());

        Self::from_png_chunks(plte, trns)
    }

    /// Parse an Adobe Color Table.
    ///
    /// 256 RGB triplets, optionally followed by a big-endian color count and
    /// transparent index (0xFFFF for none).
    pub fn from_act(data: &[u8]) -> Result<Self> {
        if data.len() < ACT_TABLE_LEN {
            return Err(ConvertError::MalformedPaletteSource(format!(
                "ACT file has {} bytes, expected at least {}",
                data.len(),
                ACT_TABLE_LEN
            )));
        }

        let mut colors: Vec<PaletteColor> = data[..ACT_TABLE_LEN]
            .chunks_exact(3)
            .map(|rgb| PaletteColor::opaque(rgb[0], rgb[1], rgb[2]))
            .collect();
        let mut transparent_index = None;

        if data.len() >= ACT_EXTENDED_LEN {
            let count = u16::from_be_bytes([data[ACT_TABLE_LEN], data[ACT_TABLE_LEN + 1]]) as usize;
            let transparent = u16::from_be_bytes([data[ACT_TABLE_LEN + 2], data[ACT_TABLE_LEN + 3]]);

            if (1..=256).contains(&count) {
                colors.truncate(count);
            } else {
                warn!("ACT color count {} out of range, using 256 entries", count);
            }
            if (transparent as usize) < colors.len() {
                transparent_index = Some(transparent as u8);
            }
        }

        Ok(Palette {
            colors,
            has_alpha: false,
            transparent_index,
        })
    }

    /// Load a palette from a `.act` or indexed `.png` file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let palette = match extension.as_str() {
            "act" => {
                let data = std::fs::read(path).map_err(|e| ConvertError::io(path, e))?;
                Self::from_act(&data)?
            }
            "png" => {
                let file = File::open(path).map_err(|e| ConvertError::io(path, e))?;
                Self::from_png_reader(BufReader::new(file))?
            }
            other => {
                return Err(ConvertError::MalformedPaletteSource(format!(
                    "unsupported palette container '.{}'",
                    other
                )));
            }
        };

        debug!("Loaded {} palette entries from {}", palette.len(), path.display());
        Ok(palette)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, index: u8) -> Option<PaletteColor> {
        self.colors.get(index as usize).copied()
    }

    /// Serialize all entries in the given sidecar layout
    pub fn encode(&self, format: PaletteFormat) -> Vec<u8> {
        let mut output = Vec::with_capacity(self.colors.len() * format.entry_size());
        for c in &self.colors {
            match format {
                PaletteFormat::Xrgb8888 => {
                    let rgb = (c.r as u32) << 16 | (c.g as u32) << 8 | c.b as u32;
                    output.extend_from_slice(&rgb.to_le_bytes());
                }
                PaletteFormat::Rgb565 => {
                    output.extend_from_slice(&encode_rgb565(c.r, c.g, c.b).to_le_bytes());
                }
            }
        }
        output
    }

    /// Write a `.pal` sidecar file
    pub fn write_sidecar<P: AsRef<Path>>(&self, path: P, format: PaletteFormat) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.encode(format)).map_err(|e| ConvertError::io(path, e))
    }

    /// N x 1 preview image with one opaque pixel per entry
    pub fn lut_image(&self) -> ImageBuffer<Rgba<u8>, Vec<u8>> {
        ImageBuffer::from_fn(self.colors.len() as u32, 1, |x, _| {
            let c = self.colors[x as usize];
            Rgba([c.r, c.g, c.b, 255])
        })
    }

    /// Save the LUT preview as PNG
    pub fn write_lut<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if self.is_empty() {
            return Err(ConvertError::MalformedPaletteSource(
                "cannot write LUT for an empty palette".to_string(),
            ));
        }
        self.lut_image().save(path.as_ref())?;
        Ok(())
    }
}

/// `<output stem>.pal` next to the output file
pub fn sidecar_path_for(output: &Path) -> PathBuf {
    output.with_extension("pal")
}

/// `<input stem>_lut.png` next to the input file
pub fn lut_path_for(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("palette");
    input.with_file_name(format!("{}_lut.png", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn act_bytes(trailer: Option<(u16, u16)>) -> Vec<u8> {
        let mut data = Vec::with_capacity(ACT_EXTENDED_LEN);
        for i in 0..256u32 {
            data.extend_from_slice(&[i as u8, (255 - i) as u8, 0x10]);
        }
        if let Some((count, transparent)) = trailer {
            data.extend_from_slice(&count.to_be_bytes());
            data.extend_from_slice(&transparent.to_be_bytes());
        }
        data
    }

    #[test]
    fn test_act_plain() {
        let palette = Palette::from_act(&act_bytes(None)).unwrap();
        assert_eq!(palette.len(), 256);
        assert_eq!(palette.get(3), Some(PaletteColor::opaque(3, 252, 0x10)));
        assert_eq!(palette.transparent_index, None);
    }

    #[test]
    fn test_act_trailer() {
        let palette = Palette::from_act(&act_bytes(Some((16, 2)))).unwrap();
        assert_eq!(palette.len(), 16);
        assert_eq!(palette.transparent_index, Some(2));

        let palette = Palette::from_act(&act_bytes(Some((16, 0xFFFF)))).unwrap();
        assert_eq!(palette.transparent_index, None);

        let palette = Palette::from_act(&act_bytes(Some((0, 0xFFFF)))).unwrap();
        assert_eq!(palette.len(), 256);
    }

    #[test]
    fn test_act_truncated() {
        let data = vec![0u8; 500];
        assert!(matches!(
            Palette::from_act(&data),
            Err(ConvertError::MalformedPaletteSource(_))
        ));
    }

    #[test]
    fn test_png_chunks() {
        let plte = [255, 0, 0, 0, 255, 0, 0, 0, 255];
        let palette = Palette::from_png_chunks(&plte, Some(&[0, 128])).unwrap();
        assert!(palette.has_alpha);
        assert_eq!(palette.get(0), Some(PaletteColor { r: 255, g: 0, b: 0, a: 0 }));
        assert_eq!(palette.get(1).map(|c| c.a), Some(128));
        assert_eq!(palette.get(2).map(|c| c.a), Some(255));
        assert_eq!(palette.transparent_index, Some(0));

        assert!(Palette::from_png_chunks(&[1, 2], None).is_err());
        assert!(Palette::from_png_chunks(&[], None).is_err());
    }

    #[test]
    fn test_png_not_indexed() {
        let mut png_bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_bytes, 1, 1);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[1, 2, 3]).unwrap();
        }
        assert!(matches!(
            Palette::from_png_reader(png_bytes.as_slice()),
            Err(ConvertError::MalformedPaletteSource(_))
        ));
    }

    #[test]
    fn test_png_palette() {
        let mut png_bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_bytes, 2, 1);
            encoder.set_color(png::ColorType::Indexed);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_palette(vec![10, 20, 30, 40, 50, 60]);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[0, 1]).unwrap();
        }
        let palette = Palette::from_png_reader(png_bytes.as_slice()).unwrap();
        assert_eq!(palette.colors, vec![PaletteColor::opaque(10, 20, 30), PaletteColor::opaque(40, 50, 60)]);
        assert!(!palette.has_alpha);
    }

    #[test]
    fn test_sidecar_encoding() {
        let palette = Palette {
            colors: vec![PaletteColor::opaque(0x12, 0x34, 0x56), PaletteColor::opaque(255, 255, 255)],
            ..Default::default()
        };
        assert_eq!(
            palette.encode(PaletteFormat::Xrgb8888),
            vec![0x56, 0x34, 0x12, 0x00, 0xFF, 0xFF, 0xFF, 0x00]
        );
        assert_eq!(palette.encode(PaletteFormat::Rgb565), vec![0x8A, 0x11, 0xFF, 0xFF]);
    }

    #[test]
    fn test_palette_format_names() {
        assert_eq!(PaletteFormat::parse("d2_mode_argb8888").unwrap(), PaletteFormat::Xrgb8888);
        assert_eq!(PaletteFormat::parse("d2_mode_rgba8888").unwrap(), PaletteFormat::Xrgb8888);
        assert_eq!(PaletteFormat::parse("d2_mode_rgb565").unwrap(), PaletteFormat::Rgb565);
        assert!(matches!(PaletteFormat::parse("d2_mode_i4"), Err(ConvertError::UnknownFormat(_))));
        assert!(matches!(PaletteFormat::parse("bogus"), Err(ConvertError::UnknownFormat(_))));
    }

    #[test]
    fn test_lut_image() {
        let palette = Palette {
            colors: vec![PaletteColor { r: 1, g: 2, b: 3, a: 0 }, PaletteColor::opaque(4, 5, 6)],
            ..Default::default()
        };
        let lut = palette.lut_image();
        assert_eq!(lut.dimensions(), (2, 1));
        assert_eq!(lut.get_pixel(0, 0), &Rgba([1, 2, 3, 255]));
        assert_eq!(lut.get_pixel(1, 0), &Rgba([4, 5, 6, 255]));
    }

    #[test]
    fn test_output_paths() {
        assert_eq!(sidecar_path_for(Path::new("out/logo.bin")), PathBuf::from("out/logo.pal"));
        assert_eq!(lut_path_for(Path::new("in/logo.act")), PathBuf::from("in/logo_lut.png"));
    }
}
