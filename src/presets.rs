//! Built-in preset catalog.
//!
//! A preset is a named list of variant templates. Applying one to an image
//! replaces that image's variant list wholesale (see
//! [`Session::apply_preset`](crate::session::Session::apply_preset)).
//!
//! | Id | Contents |
//! |----|----------|
//! | `app-icons` | PNG squares 16–1024 |
//! | `web-responsive` | WebP breakpoints with max-size caps |
//! | `social-media` | JPG banner/post sizes for major platforms |
//! | `favicon` | ICO + PNG favicon package |
//! | `thumbnails` | Small/medium/large JPG squares |
//! | `product-images` | E-commerce JPG squares |
//! | `print-ready` | TIFF pages at 300 dpi |

use crate::types::ImageFormat::{Ico, Jpg, Png, Tiff, Webp};
use crate::types::{ImageFormat, VariantTemplate};
use serde::Serialize;

/// One entry of a preset, in static form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PresetVariant {
    pub name: &'static str,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Preset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub variants: &'static [PresetVariant],
}

impl Preset {
    /// Owned templates, in catalog order.
    pub fn templates(&self) -> Vec<VariantTemplate> {
        self.variants
            .iter()
            .map(|v| VariantTemplate {
                name: v.name.to_string(),
                format: v.format,
                width: v.width,
                height: v.height,
                min_size: v.min_size,
                max_size: v.max_size,
            })
            .collect()
    }
}

const fn v(name: &'static str, format: ImageFormat, width: u32, height: u32) -> PresetVariant {
    PresetVariant {
        name,
        format,
        width,
        height,
        min_size: None,
        max_size: None,
    }
}

const fn capped(
    name: &'static str,
    format: ImageFormat,
    width: u32,
    height: u32,
    max_kb: u32,
) -> PresetVariant {
    PresetVariant {
        name,
        format,
        width,
        height,
        min_size: None,
        max_size: Some(max_kb),
    }
}

static CATALOG: &[Preset] = &[
    Preset {
        id: "app-icons",
        name: "App Icons",
        description: "Standard app icon sizes for desktop and mobile",
        variants: &[
            v("icon_16", Png, 16, 16),
            v("icon_32", Png, 32, 32),
            v("icon_48", Png, 48, 48),
            v("icon_64", Png, 64, 64),
            v("icon_128", Png, 128, 128),
            v("icon_256", Png, 256, 256),
            v("icon_512", Png, 512, 512),
            v("icon_1024", Png, 1024, 1024),
        ],
    },
    Preset {
        id: "web-responsive",
        name: "Responsive Web Images",
        description: "Optimized images for responsive web design",
        variants: &[
            capped("desktop_2x", Webp, 1920, 1080, 500),
            capped("desktop_1x", Webp, 1280, 720, 300),
            capped("tablet_2x", Webp, 1024, 768, 250),
            capped("tablet_1x", Webp, 768, 576, 150),
            capped("mobile_2x", Webp, 750, 1334, 200),
            capped("mobile_1x", Webp, 375, 667, 100),
        ],
    },
    Preset {
        id: "social-media",
        name: "Social Media",
        description: "Standard sizes for major social platforms",
        variants: &[
            capped("facebook_cover", Jpg, 820, 312, 100),
            capped("facebook_post", Jpg, 1200, 630, 100),
            capped("twitter_header", Jpg, 1500, 500, 100),
            capped("twitter_post", Jpg, 1200, 675, 100),
            capped("instagram_post", Jpg, 1080, 1080, 100),
            capped("instagram_story", Jpg, 1080, 1920, 100),
            capped("linkedin_post", Jpg, 1200, 627, 100),
            capped("youtube_thumbnail", Jpg, 1280, 720, 2048),
        ],
    },
    Preset {
        id: "favicon",
        name: "Favicon Set",
        description: "Complete favicon package for websites",
        variants: &[
            v("favicon", Ico, 32, 32),
            v("favicon-16x16", Png, 16, 16),
            v("favicon-32x32", Png, 32, 32),
            v("apple-touch-icon", Png, 180, 180),
            v("android-chrome-192x192", Png, 192, 192),
            v("android-chrome-512x512", Png, 512, 512),
        ],
    },
    Preset {
        id: "thumbnails",
        name: "Thumbnail Sizes",
        description: "Various thumbnail sizes for galleries and previews",
        variants: &[
            capped("thumb_small", Jpg, 150, 150, 20),
            capped("thumb_medium", Jpg, 300, 300, 50),
            capped("thumb_large", Jpg, 600, 600, 100),
        ],
    },
    Preset {
        id: "product-images",
        name: "E-commerce Product Images",
        description: "Standard product image sizes for online stores",
        variants: &[
            capped("product_full", Jpg, 2000, 2000, 500),
            capped("product_large", Jpg, 1200, 1200, 300),
            capped("product_medium", Jpg, 600, 600, 150),
            capped("product_small", Jpg, 300, 300, 50),
            capped("product_thumb", Jpg, 150, 150, 20),
        ],
    },
    Preset {
        id: "print-ready",
        name: "Print Quality",
        description: "High-resolution images for print materials",
        variants: &[
            v("print_a4_300dpi", Tiff, 2480, 3508),
            v("print_letter_300dpi", Tiff, 2550, 3300),
            v("print_a5_300dpi", Tiff, 1748, 2480),
        ],
    },
];

/// All presets, in display order.
pub fn catalog() -> &'static [Preset] {
    CATALOG
}

pub fn find(id: &str) -> Option<&'static Preset> {
    CATALOG.iter().find(|p| p.id == id)
}
