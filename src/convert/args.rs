//! Transcoder argument vectors.
//!
//! These functions describe *what* to run, not *how*: they build the exact
//! argument list for one conversion and never touch the filesystem, so the
//! contract can be tested without ffmpeg.
//!
//! ```text
//! -i <input> -vf scale=<w>:<h> <format flags...> -y <output>
//! ```
//!
//! | Format | Flags |
//! |---|---|
//! | jpg, jpeg | `-q:v <jpeg_qscale>` |
//! | png | `-compression_level <png_compression>` |
//! | webp | `-quality <webp_quality>` |
//! | bmp, tiff, ico | none |

use crate::config::EncodingConfig;
use crate::types::{ImageFormat, Size};
use std::ffi::OsString;
use std::path::PathBuf;

/// Full specification of a single conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub size: Size,
    pub format: ImageFormat,
}

/// Format-specific encoder flags.
pub fn format_flags(format: ImageFormat, encoding: &EncodingConfig) -> Vec<String> {
    match format {
        ImageFormat::Jpg | ImageFormat::Jpeg => {
            vec!["-q:v".to_string(), encoding.jpeg_qscale.to_string()]
        }
        ImageFormat::Png => vec![
            "-compression_level".to_string(),
            encoding.png_compression.to_string(),
        ],
        ImageFormat::Webp => vec!["-quality".to_string(), encoding.webp_quality.to_string()],
        ImageFormat::Bmp | ImageFormat::Tiff | ImageFormat::Ico => Vec::new(),
    }
}

/// The `-vf` scale filter for `size`.
pub fn scale_filter(size: Size) -> String {
    format!("scale={}:{}", size.width, size.height)
}

/// Build the argument vector: input first, output last, overwrite forced.
pub fn build_args(params: &TranscodeParams, encoding: &EncodingConfig) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-i".into(),
        params.source.clone().into_os_string(),
        "-vf".into(),
        scale_filter(params.size).into(),
    ];
    args.extend(format_flags(params.format, encoding).into_iter().map(OsString::from));
    args.push("-y".into());
    args.push(params.output.clone().into_os_string());
    args
}
