//! Shared types: output formats, sizes, variants and their status.
//!
//! These are the records every other module passes around. The session owns
//! them, the presets and size parsers produce them, and the conversion engine
//! consumes them. All of them serialize with serde so `--json` output and
//! session snapshots share one representation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Output formats the transcoder is asked to produce.
///
/// The set is closed: anything else is rejected at parse time. The file
/// extension is always the lowercase variant name, so `Jpg` and `Jpeg` are
/// distinct formats that only differ in the extension they write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpg,
    Jpeg,
    Webp,
    Bmp,
    Tiff,
    Ico,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 7] = [
        ImageFormat::Png,
        ImageFormat::Jpg,
        ImageFormat::Jpeg,
        ImageFormat::Webp,
        ImageFormat::Bmp,
        ImageFormat::Tiff,
        ImageFormat::Ico,
    ];

    /// File extension written for this format (no leading dot).
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Webp => "webp",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Ico => "ico",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown image format '{0}' (expected png, jpg, jpeg, webp, bmp, tiff or ico)")]
pub struct UnknownFormat(pub String);

impl FromStr for ImageFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ImageFormat::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

/// A concrete pixel size. Both edges are always non-zero when built with
/// [`Size::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    /// Square size with both edges equal to `edge`.
    pub fn square(edge: u32) -> Option<Self> {
        Self::new(edge, edge)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Lifecycle of a single variant.
///
/// ```text
/// idle ──► converting ──► success
///              ▲    └───► error
///              └── re-run from success / error
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantStatus {
    #[default]
    Idle,
    Converting,
    Success,
    Error,
}

impl VariantStatus {
    pub fn can_transition_to(self, next: VariantStatus) -> bool {
        use VariantStatus::*;
        matches!(
            (self, next),
            (Idle, Converting)
                | (Converting, Success)
                | (Converting, Error)
                | (Success, Converting)
                | (Error, Converting)
        )
    }
}

impl fmt::Display for VariantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VariantStatus::Idle => "idle",
            VariantStatus::Converting => "converting",
            VariantStatus::Success => "success",
            VariantStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Everything a variant needs except identity and run state.
///
/// Presets and the custom size generator produce templates; the session
/// turns them into [`Variant`]s by assigning ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantTemplate {
    pub name: String,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    /// Lower bound on the output size, in KB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<u32>,
    /// Upper bound on the output size, in KB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u32>,
}

impl VariantTemplate {
    pub fn new(name: impl Into<String>, format: ImageFormat, size: Size) -> Self {
        Self {
            name: name.into(),
            format,
            width: size.width,
            height: size.height,
            min_size: None,
            max_size: None,
        }
    }

    pub fn with_bounds(mut self, min_size: Option<u32>, max_size: Option<u32>) -> Self {
        self.min_size = min_size;
        self.max_size = max_size;
        self
    }

    /// Output file name: `<name>.<extension>`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.format.extension())
    }
}

/// One named, sized, formatted output of a source image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: String,
    pub name: String,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u32>,
    #[serde(default)]
    pub status: VariantStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("variant {field} must be a positive integer")]
    ZeroDimension { field: &'static str },
    #[error("variant name must not be empty")]
    EmptyName,
}

/// A partial edit of a variant's user-editable fields.
///
/// `None` leaves a field untouched. The size bounds use a nested option so a
/// patch can clear a bound (`Some(None)`) as well as set one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantPatch {
    pub name: Option<String>,
    pub format: Option<ImageFormat>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub min_size: Option<Option<u32>>,
    pub max_size: Option<Option<u32>>,
}

impl Variant {
    pub fn from_template(id: impl Into<String>, template: &VariantTemplate) -> Self {
        Self {
            id: id.into(),
            name: template.name.clone(),
            format: template.format,
            width: template.width,
            height: template.height,
            min_size: template.min_size,
            max_size: template.max_size,
            status: VariantStatus::Idle,
            output_path: None,
            error_message: None,
        }
    }

    pub fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }

    /// Output file name: `<name>.<extension>`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.format.extension())
    }

    /// Return a new record with `patch` applied. The receiver is untouched.
    pub fn patched(&self, patch: &VariantPatch) -> Result<Variant, PatchError> {
        let mut next = self.clone();
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(PatchError::EmptyName);
            }
            next.name = name.clone();
        }
        if let Some(format) = patch.format {
            next.format = format;
        }
        if let Some(width) = patch.width {
            if width == 0 {
                return Err(PatchError::ZeroDimension { field: "width" });
            }
            next.width = width;
        }
        if let Some(height) = patch.height {
            if height == 0 {
                return Err(PatchError::ZeroDimension { field: "height" });
            }
            next.height = height;
        }
        if let Some(min_size) = patch.min_size {
            next.min_size = min_size;
        }
        if let Some(max_size) = patch.max_size {
            next.max_size = max_size;
        }
        Ok(next)
    }
}
