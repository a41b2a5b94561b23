//! One variant, one transcoder run.
//!
//! [`ConversionEngine::convert`] is the only place that touches the
//! transcoder. Every failure becomes a [`ConversionError`] value: nothing
//! panics, nothing is retried, and a failure never affects other variants.
//!
//! ## Steps
//!
//! 1. Create the destination directory (and parents) if missing.
//! 2. Output path = `destination/<name>.<format>`.
//! 3. Run the transcoder with the argument vector from [`build_args`].
//! 4. Non-zero exit → [`ConversionError::Transcode`] carrying stderr.
//! 5. With size bounds set, probe the output. An unreadable probe fails
//!    open ([`SizeCheck::Unverifiable`]); an out-of-bounds size fails with
//!    [`ConversionError::SizeConstraint`] and the file is left in place.

use super::args::{TranscodeParams, build_args};
use super::transcoder::{FfmpegTranscoder, FileProbe, FsProbe, Transcoder};
use crate::config::{Config, EncodingConfig};
use crate::types::Variant;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Which size bound an output violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeBound {
    Min,
    Max,
}

impl fmt::Display for SizeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeBound::Min => f.write_str("below the minimum"),
            SizeBound::Max => f.write_str("above the maximum"),
        }
    }
}

/// Outcome of the post-conversion size check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum SizeCheck {
    /// The variant has no size bounds.
    NotRequired,
    /// Size was read and is within bounds.
    Satisfied { kb: f64 },
    /// Size could not be read; the conversion is still reported as a success.
    Unverifiable,
}

/// A successful conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Converted {
    pub output_path: PathBuf,
    pub size_check: SizeCheck,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("could not create output directory {}: {reason}", path.display())]
    DirectoryCreation { path: PathBuf, reason: String },
    #[error("could not start {program}: {reason}")]
    Spawn { program: String, reason: String },
    #[error("{stderr}")]
    Transcode { stderr: String },
    #[error("output is {actual_kb:.1} KB, {bound} of {limit_kb} KB")]
    SizeConstraint {
        bound: SizeBound,
        actual_kb: f64,
        limit_kb: u32,
    },
}

pub type ConversionResult = Result<Converted, ConversionError>;

/// Converts single variants with a [`Transcoder`] and checks their size with
/// a [`FileProbe`].
pub struct ConversionEngine<T = FfmpegTranscoder, P = FsProbe> {
    transcoder: T,
    probe: P,
    encoding: EncodingConfig,
}

impl ConversionEngine {
    /// Production engine: the configured ffmpeg program and the real
    /// filesystem.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            FfmpegTranscoder::new(&config.transcoder.program),
            FsProbe,
            config.encoding,
        )
    }
}

impl<T: Transcoder, P: FileProbe> ConversionEngine<T, P> {
    pub fn new(transcoder: T, probe: P, encoding: EncodingConfig) -> Self {
        Self {
            transcoder,
            probe,
            encoding,
        }
    }

    pub fn transcoder(&self) -> &T {
        &self.transcoder
    }

    /// Convert `source` into `variant` inside `destination`.
    pub fn convert(
        &self,
        source: &Path,
        variant: &Variant,
        destination: &Path,
    ) -> ConversionResult {
        std::fs::create_dir_all(destination).map_err(|e| ConversionError::DirectoryCreation {
            path: destination.to_path_buf(),
            reason: e.to_string(),
        })?;

        let params = TranscodeParams {
            source: source.to_path_buf(),
            output: destination.join(variant.file_name()),
            size: variant.size(),
            format: variant.format,
        };
        let args = build_args(&params, &self.encoding);
        debug!(program = self.transcoder.program(), ?args, "running transcoder");

        let output = self
            .transcoder
            .run(&args)
            .map_err(|e| ConversionError::Spawn {
                program: self.transcoder.program().to_string(),
                reason: e.to_string(),
            })?;

        if !output.success() {
            let stderr = output.stderr.trim_end();
            warn!(variant = %variant.name, exit_code = ?output.exit_code, "transcoder failed");
            let stderr = if stderr.is_empty() {
                match output.exit_code {
                    Some(code) => format!(
                        "{} conversion failed (exit code {})",
                        self.transcoder.program(),
                        code
                    ),
                    None => format!(
                        "{} conversion failed (terminated by signal)",
                        self.transcoder.program()
                    ),
                }
            } else {
                stderr.to_string()
            };
            return Err(ConversionError::Transcode { stderr });
        }

        let size_check = self.check_size(&params.output, variant.min_size, variant.max_size)?;
        Ok(Converted {
            output_path: params.output,
            size_check,
        })
    }

    /// Enforce the KB bounds on a produced file. A bound of zero counts as
    /// unset.
    fn check_size(
        &self,
        path: &Path,
        min_kb: Option<u32>,
        max_kb: Option<u32>,
    ) -> Result<SizeCheck, ConversionError> {
        let min_kb = min_kb.filter(|&kb| kb > 0);
        let max_kb = max_kb.filter(|&kb| kb > 0);
        if min_kb.is_none() && max_kb.is_none() {
            return Ok(SizeCheck::NotRequired);
        }

        let bytes = match self.probe.byte_size(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "cannot read output size, accepting it unverified"
                );
                return Ok(SizeCheck::Unverifiable);
            }
        };
        let kb = bytes as f64 / 1024.0;

        if let Some(limit) = min_kb
            && kb < limit as f64
        {
            return Err(ConversionError::SizeConstraint {
                bound: SizeBound::Min,
                actual_kb: kb,
                limit_kb: limit,
            });
        }
        if let Some(limit) = max_kb
            && kb > limit as f64
        {
            return Err(ConversionError::SizeConstraint {
                bound: SizeBound::Max,
                actual_kb: kb,
                limit_kb: limit,
            });
        }
        Ok(SizeCheck::Satisfied { kb })
    }
}
