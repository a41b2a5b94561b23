//! Source image discovery.
//!
//! Turns the paths given on the command line into an ordered list of
//! absolute source image paths.
//!
//! - **Files** are taken as given, in argument order, and must carry a
//!   supported extension.
//! - **Directories** are walked recursively; supported images inside are
//!   added sorted by path. Hidden entries (`.name`) are skipped.
//!
//! A path reached twice (listed explicitly and found by a walk, say) is kept
//! once, at its first position.
//!
//! ## Supported Inputs
//!
//! `png`, `jpg`, `jpeg`, `webp`, `bmp`, `tiff`, `tif` (case-insensitive).

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Source not found: {0}")]
    NotFound(PathBuf),
    #[error("Unsupported source file (expected png, jpg, jpeg, webp, bmp or tiff): {0}")]
    UnsupportedFile(PathBuf),
}

pub const SOURCE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "tiff", "tif"];

/// Whether `path` has a supported source extension.
pub fn is_source_image(path: &Path) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    SOURCE_EXTENSIONS.contains(&ext.as_str())
}

/// Resolve `inputs` into absolute source image paths.
pub fn collect_sources(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, ScanError> {
    let mut seen = HashSet::new();
    let mut sources = Vec::new();

    for input in inputs {
        if !input.exists() {
            return Err(ScanError::NotFound(input.clone()));
        }
        let found = if input.is_dir() {
            walk_directory(input)?
        } else if is_source_image(input) {
            vec![input.clone()]
        } else {
            return Err(ScanError::UnsupportedFile(input.clone()));
        };

        for path in found {
            let path = std::path::absolute(&path)?;
            if seen.insert(path.clone()) {
                sources.push(path);
            }
        }
    }

    Ok(sources)
}

fn walk_directory(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut images = Vec::new();
    let walker = WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        // Depth 0 is the directory itself, which may legitimately be `.`
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && is_source_image(entry.path()) {
            images.push(entry.into_path());
        }
    }
    images.sort();
    Ok(images)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}
