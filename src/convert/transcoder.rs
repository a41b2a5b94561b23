//! External process seams.
//!
//! The [`Transcoder`] trait runs the external tool with a prepared argument
//! vector and reports its exit code and stderr. The [`FileProbe`] trait
//! reads an output file's byte size. Production implementations are
//! [`FfmpegTranscoder`] and [`FsProbe`]; tests swap in mocks so the engine's
//! failure handling can be exercised without ffmpeg installed.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// What the engine consumes from a finished transcoder process.
///
/// Stdout is never captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stderr: String,
}

impl TranscodeOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs the external transcoder.
///
/// `Err` means the process could not be started at all; a process that ran
/// and failed is an `Ok` with a non-zero exit code.
pub trait Transcoder: Sync {
    /// Program name used in diagnostics.
    fn program(&self) -> &str;

    fn run(&self, args: &[OsString]) -> io::Result<TranscodeOutput>;
}

/// Reads the byte size of a produced file.
pub trait FileProbe: Sync {
    fn byte_size(&self, path: &Path) -> io::Result<u64>;
}

/// Spawns ffmpeg (or any program honoring the same argument contract).
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: PathBuf,
    label: String,
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let label = program.to_string_lossy().into_owned();
        Self { program, label }
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Transcoder for FfmpegTranscoder {
    fn program(&self) -> &str {
        &self.label
    }

    fn run(&self, args: &[OsString]) -> io::Result<TranscodeOutput> {
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()?;
        Ok(TranscodeOutput {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// File size via `std::fs::metadata`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl FileProbe for FsProbe {
    fn byte_size(&self, path: &Path) -> io::Result<u64> {
        Ok(std::fs::metadata(path)?.len())
    }
}
