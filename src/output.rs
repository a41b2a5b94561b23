//! CLI output formatting.
//!
//! Every listing follows the same two-level pattern: a header line with a
//! positional index and the entity's identity, then indented context lines.
//!
//! # Output Format
//!
//! ## Presets
//!
//! ```text
//! 001 app-icons: App Icons (8 variants)
//!     Standard app icon sizes for desktop and mobile
//! ```
//!
//! ## Plan
//!
//! ```text
//! 001 logo.png (6 variants)
//!     Source: /home/me/logo.png
//!     favicon.ico 32x32
//!     favicon-16x16.png 16x16
//!     thumb_small.jpg 150x150 max 20 KB
//! ```
//!
//! ## Convert
//!
//! One line per finished unit, in delivery order, then a summary:
//!
//! ```text
//! logo.png: favicon.ico → out/favicon.ico
//! logo.png: thumb_small.jpg → out/thumb_small.jpg (14.2 KB)
//! logo.png: broken.png failed: Invalid data found when processing input
//! 5 converted, 1 failed (6 total)
//! ```
//!
//! # Architecture
//!
//! Each `format_*` function is pure and returns lines for testability; the
//! `print_*` wrappers write them to stdout.

use crate::batch::BatchSummary;
use crate::convert::{ConversionResult, SizeCheck};
use crate::presets::Preset;
use crate::session::SourceImage;
use crate::types::Variant;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

/// Human label for a variant's KB bounds, if any are set.
fn bounds_label(min_kb: Option<u32>, max_kb: Option<u32>) -> Option<String> {
    match (min_kb.filter(|&k| k > 0), max_kb.filter(|&k| k > 0)) {
        (Some(min), Some(max)) => Some(format!("{}-{} KB", min, max)),
        (Some(min), None) => Some(format!("min {} KB", min)),
        (None, Some(max)) => Some(format!("max {} KB", max)),
        (None, None) => None,
    }
}

fn variant_line(variant: &Variant) -> String {
    let mut line = format!("{} {}", variant.file_name(), variant.size());
    if let Some(bounds) = bounds_label(variant.min_size, variant.max_size) {
        line.push(' ');
        line.push_str(&bounds);
    }
    line
}

// ============================================================================
// Presets
// ============================================================================

pub fn format_presets(presets: &[Preset]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, preset) in presets.iter().enumerate() {
        lines.push(format!(
            "{} {}: {} ({})",
            format_index(i + 1),
            preset.id,
            preset.name,
            plural(preset.variants.len(), "variant")
        ));
        lines.push(format!("{}{}", indent(1), preset.description));
    }
    lines
}

pub fn print_presets(presets: &[Preset]) {
    for line in format_presets(presets) {
        println!("{}", line);
    }
}

// ============================================================================
// Plan
// ============================================================================

pub fn format_plan(images: &[SourceImage]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, image) in images.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            image.display_name,
            plural(image.variants.len(), "variant")
        ));
        lines.push(format!("{}Source: {}", indent(1), image.path.display()));
        if let Some(sub) = &image.output_subdirectory {
            lines.push(format!("{}Subdirectory: {}/", indent(1), sub));
        }
        for variant in image.variants.iter() {
            lines.push(format!("{}{}", indent(1), variant_line(variant)));
        }
    }
    lines
}

pub fn print_plan(images: &[SourceImage]) {
    for line in format_plan(images) {
        println!("{}", line);
    }
}

// ============================================================================
// Convert
// ============================================================================

/// One completed unit.
pub fn format_unit(image_name: &str, variant: &Variant, result: &ConversionResult) -> String {
    match result {
        Ok(converted) => {
            let mut line = format!(
                "{}: {} → {}",
                image_name,
                variant.file_name(),
                converted.output_path.display()
            );
            match converted.size_check {
                SizeCheck::NotRequired => {}
                SizeCheck::Satisfied { kb } => line.push_str(&format!(" ({:.1} KB)", kb)),
                SizeCheck::Unverifiable => line.push_str(" (size unverified)"),
            }
            line
        }
        Err(e) => format!("{}: {} failed: {}", image_name, variant.file_name(), e),
    }
}

pub fn print_unit(image_name: &str, variant: &Variant, result: &ConversionResult) {
    println!("{}", format_unit(image_name, variant, result));
}

pub fn format_summary(summary: &BatchSummary) -> String {
    summary.to_string()
}

pub fn print_summary(summary: &BatchSummary) {
    println!("{}", format_summary(summary));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{ConversionError, Converted, SizeBound};
    use crate::presets;
    use crate::types::{ImageFormat, Size, VariantTemplate};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn variant(name: &str, format: ImageFormat, max: Option<u32>) -> Variant {
        let t = VariantTemplate::new(name, format, Size::new(150, 150).unwrap())
            .with_bounds(None, max);
        Variant::from_template("v1", &t)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn format_index_pads_to_three() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn bounds_label_variants() {
        assert_eq!(bounds_label(None, None), None);
        assert_eq!(bounds_label(Some(0), Some(0)), None);
        assert_eq!(bounds_label(Some(5), None).as_deref(), Some("min 5 KB"));
        assert_eq!(bounds_label(None, Some(20)).as_deref(), Some("max 20 KB"));
        assert_eq!(bounds_label(Some(5), Some(20)).as_deref(), Some("5-20 KB"));
    }

    #[test]
    fn plural_handles_one() {
        assert_eq!(plural(1, "variant"), "1 variant");
        assert_eq!(plural(3, "variant"), "3 variants");
    }

    // =========================================================================
    // Listings
    // =========================================================================

    #[test]
    fn presets_listing() {
        let favicon = presets::find("favicon").unwrap();
        let lines = format_presets(std::slice::from_ref(favicon));
        assert_eq!(
            lines,
            vec![
                "001 favicon: Favicon Set (6 variants)",
                "    Complete favicon package for websites",
            ]
        );
    }

    #[test]
    fn plan_lists_variants_under_image() {
        let image = SourceImage {
            id: "img-1".into(),
            path: PathBuf::from("/photos/logo.png"),
            display_name: "logo.png".into(),
            output_subdirectory: Some("icons".into()),
            variants: Arc::new(vec![
                variant("thumb_small", ImageFormat::Jpg, Some(20)),
                variant("plain", ImageFormat::Png, None),
            ]),
        };
        let lines = format_plan(&[image]);
        assert_eq!(
            lines,
            vec![
                "001 logo.png (2 variants)",
                "    Source: /photos/logo.png",
                "    Subdirectory: icons/",
                "    thumb_small.jpg 150x150 max 20 KB",
                "    plain.png 150x150",
            ]
        );
    }

    // =========================================================================
    // Units
    // =========================================================================

    #[test]
    fn unit_success_lines() {
        let v = variant("thumb", ImageFormat::Jpg, Some(20));
        let mut converted = Converted {
            output_path: PathBuf::from("out/thumb.jpg"),
            size_check: SizeCheck::NotRequired,
        };
        assert_eq!(
            format_unit("logo.png", &v, &Ok(converted.clone())),
            "logo.png: thumb.jpg → out/thumb.jpg"
        );

        converted.size_check = SizeCheck::Satisfied { kb: 14.2 };
        assert!(format_unit("logo.png", &v, &Ok(converted.clone())).ends_with("(14.2 KB)"));

        converted.size_check = SizeCheck::Unverifiable;
        assert!(format_unit("logo.png", &v, &Ok(converted)).ends_with("(size unverified)"));
    }

    #[test]
    fn unit_failure_line_carries_error() {
        let v = variant("thumb", ImageFormat::Jpg, Some(20));
        let err = ConversionError::SizeConstraint {
            bound: SizeBound::Max,
            actual_kb: 31.0,
            limit_kb: 20,
        };
        assert_eq!(
            format_unit("logo.png", &v, &Err(err)),
            "logo.png: thumb.jpg failed: output is 31.0 KB, above the maximum of 20 KB"
        );
    }

    #[test]
    fn summary_line() {
        let summary = BatchSummary {
            total: 6,
            succeeded: 5,
            failed: 1,
            unverified: 1,
        };
        assert_eq!(
            format_summary(&summary),
            "5 converted, 1 failed (6 total), 1 size-unverified"
        );
    }
}
