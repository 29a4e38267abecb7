//! Command-line argument definitions

use clap::{ArgAction, Parser};
use std::path::PathBuf;

// ============================================================================
// Command Line Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "d2conv")]
#[command(author, version, about = "Convert PNG images to D2 packed pixel data", long_about = None)]
#[command(disable_help_flag = true)]
pub struct Args {
    /// Input image (.png), or a palette (.act) when only -p output is wanted
    pub input: PathBuf,

    /// Output binary file path
    pub output: PathBuf,

    /// Color format of the pixel data
    ///
    /// Supported: d2_mode_argb8888, d2_mode_rgba8888, d2_mode_rgb565,
    /// d2_mode_ai44, d2_mode_i8, d2_mode_i4, d2_mode_i2, d2_mode_i1
    #[arg(short = 'c', long, value_name = "MODE", default_value = "d2_mode_argb8888")]
    pub color_format: String,

    /// Also write the input's palette to <output>.pal in this format
    ///
    /// Supported: d2_mode_argb8888 (0x00RRGGBB), d2_mode_rgb565
    #[arg(short = 'p', long, value_name = "MODE")]
    pub palette_format: Option<String>,

    /// Add a header ('D', '2', u16 width, u16 height, u8 flags, u8 type, u16 mode, u32 length)
    #[arg(short = 'h', long)]
    pub header: bool,

    /// Flags value to place in the header
    #[arg(short = 'f', long, default_value_t = 0, requires = "header")]
    pub flags: u8,

    /// Type value to place in the header
    #[arg(short = 't', long = "type", default_value_t = 0, requires = "header")]
    pub r#type: u8,

    /// Output a LUT png of the palette (<input>_lut.png)
    #[arg(short = 'l', long, requires = "palette_format")]
    pub lut: bool,

    /// RLE encode the pixel data
    #[arg(short = 'r', long)]
    pub rle: bool,

    /// Use the alpha channel of <input>_mask.png for AI44 output
    #[arg(short = 'm', long)]
    pub mask: bool,

    /// Mask file to use instead of <input>_mask.png
    #[arg(long, value_name = "PATH", requires = "mask")]
    pub mask_path: Option<PathBuf>,

    /// Print progress and sizes
    #[arg(short, long)]
    pub verbose: bool,

    /// Print help (-h is taken by --header)
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_short_flags() {
        let args = Args::try_parse_from([
            "d2conv", "in.png", "out.bin", "-c", "d2_mode_i4", "-p", "d2_mode_rgb565", "-h", "-f", "3", "-t", "7",
            "-l", "-r", "-m",
        ])
        .unwrap();
        assert_eq!(args.color_format, "d2_mode_i4");
        assert_eq!(args.palette_format.as_deref(), Some("d2_mode_rgb565"));
        assert!(args.header && args.lut && args.rle && args.mask);
        assert_eq!((args.flags, args.r#type), (3, 7));
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["d2conv", "in.png", "out.bin"]).unwrap();
        assert_eq!(args.color_format, "d2_mode_argb8888");
        assert!(!args.header && !args.rle && args.palette_format.is_none());
        assert_eq!(args.flags, 0);
    }

    #[test]
    fn test_dependent_flags() {
        assert!(Args::try_parse_from(["d2conv", "in.png", "out.bin", "-f", "1"]).is_err());
        assert!(Args::try_parse_from(["d2conv", "in.png", "out.bin", "-l"]).is_err());
        assert!(Args::try_parse_from(["d2conv", "in.png", "out.bin", "-h", "-f", "256"]).is_err());
    }
}
