//! Size-spec mini-language.
//!
//! Three terse notations turn into concrete pixel sizes:
//!
//! | Kind | Text | Sizes |
//! |------|------|-------|
//! | `square` | `16,32,64` | 16x16, 32x32, 64x64 |
//! | `dimension` | `1920x1080` | 1920x1080 |
//! | `aspect` | `16:9@1920` | 1920x1080 (width = base, height from ratio) |
//!
//! Parsing never fails. Malformed text yields no sizes, and callers treat an
//! empty expansion as "nothing to generate". In a `square` list each token
//! stands alone: `16,foo,32` still yields two sizes.
//!
//! All numbers are trimmed before parsing and use `.` as the decimal point.

use crate::types::Size;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which notation a piece of size text is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeSpecKind {
    Square,
    Dimension,
    #[serde(rename = "aspect")]
    AspectRatio,
}

impl fmt::Display for SizeSpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SizeSpecKind::Square => "square",
            SizeSpecKind::Dimension => "dimension",
            SizeSpecKind::AspectRatio => "aspect",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeSpecSyntaxError {
    #[error("unknown size kind '{0}' (expected square, dimension or aspect)")]
    UnknownKind(String),
    #[error("size spec '{0}' must look like KIND:TEXT, e.g. square:16,32 or aspect:16:9@1920")]
    MissingKind(String),
}

impl FromStr for SizeSpecKind {
    type Err = SizeSpecSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "square" => Ok(SizeSpecKind::Square),
            "dimension" | "dim" => Ok(SizeSpecKind::Dimension),
            "aspect" | "aspect-ratio" | "ratio" => Ok(SizeSpecKind::AspectRatio),
            _ => Err(SizeSpecSyntaxError::UnknownKind(s.to_string())),
        }
    }
}

/// A kind plus its raw text, as typed on the command line (`square:16,32`).
///
/// Only the first `:` separates the kind, so `aspect:16:9@1920` keeps its
/// ratio colon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSizeSpec {
    pub kind: SizeSpecKind,
    pub text: String,
}

impl FromStr for RawSizeSpec {
    type Err = SizeSpecSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, text) = s
            .split_once(':')
            .ok_or_else(|| SizeSpecSyntaxError::MissingKind(s.to_string()))?;
        Ok(RawSizeSpec {
            kind: kind.parse()?,
            text: text.to_string(),
        })
    }
}

impl RawSizeSpec {
    pub fn parse(&self) -> Option<SizeSpecification> {
        SizeSpecification::parse(self.kind, &self.text)
    }
}

/// A parsed size spec.
#[derive(Debug, Clone, PartialEq)]
pub enum SizeSpecification {
    /// Square edges, in input order.
    Square(Vec<u32>),
    Dimension { width: u32, height: u32 },
    AspectRatio { ratio_w: f64, ratio_h: f64, base: u32 },
}

impl SizeSpecification {
    /// Parse `raw` as the notation named by `kind`.
    ///
    /// Returns `None` when the text yields no valid size.
    pub fn parse(kind: SizeSpecKind, raw: &str) -> Option<Self> {
        match kind {
            SizeSpecKind::Square => {
                let edges: Vec<u32> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .filter_map(parse_positive_int)
                    .collect();
                (!edges.is_empty()).then_some(SizeSpecification::Square(edges))
            }
            SizeSpecKind::Dimension => {
                let parts: Vec<&str> = raw.split('x').collect();
                let [w, h] = parts.as_slice() else {
                    return None;
                };
                Some(SizeSpecification::Dimension {
                    width: parse_positive_int(w)?,
                    height: parse_positive_int(h)?,
                })
            }
            SizeSpecKind::AspectRatio => {
                let parts: Vec<&str> = raw.split('@').collect();
                let [ratio, base] = parts.as_slice() else {
                    return None;
                };
                let ratio_parts: Vec<&str> = ratio.split(':').collect();
                let [w, h] = ratio_parts.as_slice() else {
                    return None;
                };
                let spec = SizeSpecification::AspectRatio {
                    ratio_w: parse_positive_real(w)?,
                    ratio_h: parse_positive_real(h)?,
                    base: parse_positive_int(base)?,
                };
                // Reject ratios whose height cannot be represented
                spec.aspect_size()?;
                Some(spec)
            }
        }
    }

    /// Expand into concrete sizes, in order.
    pub fn sizes(&self) -> Vec<Size> {
        match self {
            SizeSpecification::Square(edges) => {
                edges.iter().filter_map(|&e| Size::square(e)).collect()
            }
            SizeSpecification::Dimension { width, height } => {
                Size::new(*width, *height).into_iter().collect()
            }
            SizeSpecification::AspectRatio { .. } => self.aspect_size().into_iter().collect(),
        }
    }

    /// Ratio as a filename-safe label (`16:9` → `16-9`). `None` for
    /// non-aspect specs.
    pub fn ratio_label(&self) -> Option<String> {
        match self {
            SizeSpecification::AspectRatio {
                ratio_w, ratio_h, ..
            } => Some(format!("{}-{}", ratio_w, ratio_h)),
            _ => None,
        }
    }

    fn aspect_size(&self) -> Option<Size> {
        let SizeSpecification::AspectRatio {
            ratio_w,
            ratio_h,
            base,
        } = *self
        else {
            return None;
        };
        // f64::round rounds half away from zero
        let height = (base as f64 * ratio_h / ratio_w).round();
        if !height.is_finite() || height <= 0.0 || height > u32::MAX as f64 {
            return None;
        }
        Size::new(base, height as u32)
    }
}

/// Parse and expand in one step. Malformed input yields an empty list.
pub fn parse_sizes(kind: SizeSpecKind, raw: &str) -> Vec<Size> {
    SizeSpecification::parse(kind, raw)
        .map(|spec| spec.sizes())
        .unwrap_or_default()
}

fn parse_positive_int(text: &str) -> Option<u32> {
    text.trim().parse::<u32>().ok().filter(|&n| n > 0)
}

fn parse_positive_real(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}
