//! d2conv - PNG to D2 packed pixel data converter
//!
//! Pipeline: resolve formats -> load palette (if requested) -> load image and
//! mask -> encode -> write output, palette sidecar and LUT.
//!
//! Nothing is written until every input has been read and encoded.

mod args;

use args::Args;
use clap::Parser;
use log::{info, Level, LevelFilter, Log, Metadata, Record};
use std::path::Path;

use d2conv::decode::{load_mask_from_path, load_source_from_path, mask_path_for};
use d2conv::format::palette::{lut_path_for, sidecar_path_for};
use d2conv::{convert, ColorMode, ConvertError, ConvertOptions, ConvertedImage, Palette, PaletteFormat};

// ============================================================================
// Logging
// ============================================================================

/// Writes log records to stderr; warnings get a "Warning: " prefix
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Error => eprintln!("Error: {}", record.args()),
            Level::Warn => eprintln!("Warning: {}", record.args()),
            _ => eprintln!("{}", record.args()),
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: bool) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if verbose { LevelFilter::Debug } else { LevelFilter::Info });
    }
}

// ============================================================================
// Conversion
// ============================================================================

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Load the input image (and mask) and encode it
fn encode_image(args: &Args, mode: ColorMode) -> Result<ConvertedImage, ConvertError> {
    if args.verbose {
        eprintln!("Loading: {}", args.input.display());
    }
    let image = load_source_from_path(&args.input)?;

    let mask = if args.mask {
        let mask_path = args.mask_path.clone().unwrap_or_else(|| mask_path_for(&args.input));
        if args.verbose {
            eprintln!("Loading mask: {}", mask_path.display());
        }
        Some(load_mask_from_path(&mask_path)?)
    } else {
        None
    };

    let mut options = ConvertOptions::new(mode);
    if args.header {
        options = options.with_header(args.flags, args.r#type);
    }

    convert(&image, mask.as_ref(), &options)
}

fn run(args: &Args) -> Result<(), ConvertError> {
    // Resolve names first so typos fail before any file is touched
    let mode = ColorMode::resolve(&args.color_format, args.rle)?;
    let palette_format = args
        .palette_format
        .as_deref()
        .map(PaletteFormat::parse)
        .transpose()?;

    let palette_only = has_extension(&args.input, "act");
    if palette_only && palette_format.is_none() {
        return Err(ConvertError::UnsupportedSourcePixelLayout(
            "ACT input only holds a palette; pass -p <palette_format>".to_string(),
        ));
    }

    let palette = match palette_format {
        Some(format) => Some((Palette::load(&args.input)?, format)),
        None => None,
    };

    if !palette_only {
        let converted = encode_image(args, mode)?;
        if args.verbose {
            eprintln!(
                "Encoded {}x{} as {} ({} bytes packed, {} bytes written)",
                converted.width,
                converted.height,
                converted.mode,
                converted.unpacked_len,
                converted.len()
            );
        }
        converted.save(&args.output)?;
        info!(
            "File \"{}\" converted to \"{}\" with color mode: {}",
            args.input.display(),
            args.output.display(),
            mode.base
        );
    }

    if let Some((palette, format)) = palette {
        let sidecar = sidecar_path_for(&args.output);
        palette.write_sidecar(&sidecar, format)?;
        info!(
            "Palette file \"{}\" generated with format: {:?} ({} entries)",
            sidecar.display(),
            format,
            palette.len()
        );

        if args.lut {
            let lut = lut_path_for(&args.input);
            palette.write_lut(&lut)?;
            info!("LUT file \"{}\" generated.", lut.display());
        }
    }

    Ok(())
}

fn main() -> Result<(), String> {
    let args = Args::parse();
    init_logging(args.verbose);

    run(&args).map_err(|e| e.to_string())
}
