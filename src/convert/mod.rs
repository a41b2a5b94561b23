//! Conversion of a single variant through an external transcoder.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `args` | Pure argument-vector construction |
//! | `transcoder` | Process and filesystem seams (`Transcoder`, `FileProbe`) |
//! | `engine` | `ConversionEngine`: run, classify failures, check size bounds |

pub mod args;
pub mod engine;
pub mod transcoder;

pub use args::{TranscodeParams, build_args};
pub use engine::{
    ConversionEngine, ConversionError, ConversionResult, Converted, SizeBound, SizeCheck,
};
pub use transcoder::{FfmpegTranscoder, FileProbe, FsProbe, TranscodeOutput, Transcoder};
