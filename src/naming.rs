//! Deterministic variant names.
//!
//! Two ways to name a generated variant:
//!
//! - **Suffixed**: `<base>_<w>x<h>`, with the ratio appended for aspect specs
//!   (`banner_1920x1080_16-9`).
//! - **Composed**: literal name parts with the resolution token spliced in at
//!   a 1-based position, joined without separators:
//!   `["Square_", "Logo", "Tauri"]` at position 2 → `Square_16x16LogoTauri`.
//!
//! Names never include the extension; the format adds it at write time.

use crate::size_spec::{RawSizeSpec, SizeSpecification};
use crate::types::{ImageFormat, Size, VariantTemplate};

/// Insert `"<w>x<h>"` before the part at 1-based `position` and concatenate.
///
/// Position 0 behaves like 1. Positions past the end append the token.
pub fn compose_name<S: AsRef<str>>(parts: &[S], position: usize, size: Size) -> String {
    let token = size.to_string();
    let at = position.saturating_sub(1).min(parts.len());
    let mut name = String::new();
    for part in &parts[..at] {
        name.push_str(part.as_ref());
    }
    name.push_str(&token);
    for part in &parts[at..] {
        name.push_str(part.as_ref());
    }
    name
}

/// How generated variants are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingScheme {
    Suffixed { base: String },
    Composed { parts: Vec<String>, position: usize },
}

impl Default for NamingScheme {
    fn default() -> Self {
        NamingScheme::Suffixed {
            base: "custom".to_string(),
        }
    }
}

impl NamingScheme {
    /// Name for one size produced by `spec`.
    pub fn name_for(&self, spec: &SizeSpecification, size: Size) -> String {
        match self {
            NamingScheme::Suffixed { base } => match spec.ratio_label() {
                Some(ratio) => format!("{}_{}_{}", base, size, ratio),
                None => format!("{}_{}", base, size),
            },
            NamingScheme::Composed { parts, position } => compose_name(parts, *position, size),
        }
    }
}

/// Expand size specs into variant templates, in spec order.
///
/// Specs whose text is malformed contribute nothing; an empty result means
/// there is nothing to generate.
pub fn custom_variants(
    scheme: &NamingScheme,
    format: ImageFormat,
    specs: &[RawSizeSpec],
) -> Vec<VariantTemplate> {
    specs
        .iter()
        .filter_map(RawSizeSpec::parse)
        .flat_map(|spec| {
            spec.sizes()
                .into_iter()
                .map(|size| VariantTemplate::new(scheme.name_for(&spec, size), format, size))
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sz(w: u32, h: u32) -> Size {
        Size::new(w, h).unwrap()
    }

    #[test]
    fn compose_inserts_token_at_position() {
        let name = compose_name(&["Square_", "Logo", "Tauri"], 2, sz(16, 16));
        assert_eq!(name, "Square_16x16LogoTauri");
    }

    #[test]
    fn compose_position_one_prepends() {
        let name = compose_name(&["_icon"], 1, sz(32, 32));
        assert_eq!(name, "32x32_icon");
    }

    #[test]
    fn compose_position_zero_behaves_like_one() {
        let name = compose_name(&["a", "b"], 0, sz(8, 4));
        assert_eq!(name, "8x4ab");
    }

    #[test]
    fn compose_position_after_last_appends() {
        assert_eq!(compose_name(&["icon-"], 2, sz(64, 64)), "icon-64x64");
    }

    #[test]
    fn compose_position_far_beyond_end_appends() {
        assert_eq!(compose_name(&["a", "b"], 99, sz(1, 2)), "ab1x2");
    }

    #[test]
    fn compose_with_no_parts_is_just_token() {
        let parts: [&str; 0] = [];
        assert_eq!(compose_name(&parts, 3, sz(10, 20)), "10x20");
    }

    #[test]
    fn suffixed_scheme_for_square_and_dimension() {
        let scheme = NamingScheme::Suffixed {
            base: "icon".to_string(),
        };
        let specs: Vec<RawSizeSpec> = vec![
            "square:16,32".parse().unwrap(),
            "dimension:800x600".parse().unwrap(),
        ];
        let names: Vec<String> = custom_variants(&scheme, ImageFormat::Png, &specs)
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["icon_16x16", "icon_32x32", "icon_800x600"]);
    }

    #[test]
    fn suffixed_scheme_appends_ratio_for_aspect() {
        let scheme = NamingScheme::Suffixed {
            base: "banner".to_string(),
        };
        let specs: Vec<RawSizeSpec> = vec!["aspect:16:9@1920".parse().unwrap()];
        let templates = custom_variants(&scheme, ImageFormat::Webp, &specs);
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].name, "banner_1920x1080_16-9");
        assert_eq!(templates[0].file_name(), "banner_1920x1080_16-9.webp");
    }

    #[test]
    fn composed_scheme_uses_parts() {
        let scheme = NamingScheme::Composed {
            parts: vec!["Square_".into(), "Logo".into()],
            position: 2,
        };
        let specs: Vec<RawSizeSpec> = vec!["square:30,44".parse().unwrap()];
        let names: Vec<String> = custom_variants(&scheme, ImageFormat::Png, &specs)
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Square_30x30Logo", "Square_44x44Logo"]);
    }

    #[test]
    fn malformed_specs_generate_nothing() {
        let specs: Vec<RawSizeSpec> = vec![
            "dimension:1920".parse().unwrap(),
            "square:foo".parse().unwrap(),
        ];
        assert!(custom_variants(&NamingScheme::default(), ImageFormat::Png, &specs).is_empty());
    }

    #[test]
    fn custom_variants_carry_format_and_size() {
        let specs: Vec<RawSizeSpec> = vec!["dimension:300x200".parse().unwrap()];
        let t = &custom_variants(&NamingScheme::default(), ImageFormat::Jpg, &specs)[0];
        assert_eq!(t.format, ImageFormat::Jpg);
        assert_eq!((t.width, t.height), (300, 200));
        assert_eq!(t.min_size, None);
        assert_eq!(t.max_size, None);
    }
}
