//! Batch orchestration over the image × variant cross-product.
//!
//! Every unit (one variant of one image) goes through
//! [`ConversionEngine::convert`] exactly once, and the per-unit callback
//! fires as soon as that unit finishes. Failures are recorded and the batch
//! moves on: the result matrix always has one entry per unit, in input
//! order.
//!
//! ## Scheduling
//!
//! [`Parallelism::Sequential`] (the default) runs one transcoder process at
//! a time and delivers callbacks in strict submission order.
//!
//! [`Parallelism::PerImage`] hands whole images to a bounded
//! [rayon](https://docs.rs/rayon) pool. An image's variants still run one
//! after another on a single worker, so callbacks for that image keep their
//! order, but callbacks of different images interleave. Results travel back
//! over an mpsc channel and the callback always runs on the calling thread.

use crate::config::effective_workers;
use crate::convert::{ConversionEngine, ConversionResult, FileProbe, SizeCheck, Transcoder};
use crate::types::Variant;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, mpsc};
use thiserror::Error;
use tracing::{debug, info, warn};

/// One source image and the variants to produce from it.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub image_id: String,
    pub source_path: PathBuf,
    /// Subdirectory under the batch destination, if the image has one.
    pub output_subdirectory: Option<String>,
    /// Snapshot of the image's variant list at submission time.
    pub variants: Arc<Vec<Variant>>,
}

/// A subdirectory must stay under the destination root: relative, with no
/// `..` or root components.
pub fn is_contained_subdirectory(sub: &str) -> bool {
    Path::new(sub)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

impl BatchItem {
    /// Where this image's outputs land under `root`.
    pub fn destination(&self, root: &Path) -> PathBuf {
        match self
            .output_subdirectory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(sub) => root.join(sub),
            None => root.to_path_buf(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parallelism {
    #[default]
    Sequential,
    /// Up to `workers` images converted at once.
    PerImage { workers: usize },
}

impl Parallelism {
    /// Map a requested worker count (clamped to available cores) to a mode.
    pub fn from_workers(requested: usize) -> Self {
        match effective_workers(requested) {
            0 | 1 => Parallelism::Sequential,
            workers => Parallelism::PerImage { workers },
        }
    }
}

/// Errors that abort a batch before any conversion starts.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("no destination directory chosen")]
    NoDestination,
    #[error("no images added")]
    NoImages,
    #[error("subdirectory {subdirectory:?} of image {image_id} leaves the destination")]
    InvalidSubdirectory {
        image_id: String,
        subdirectory: String,
    },
    #[error("{} would be written twice (images {first} and {second})", path.display())]
    OutputCollision {
        path: PathBuf,
        first: String,
        second: String,
    },
    #[error("could not create destination directory {}: {source}", path.display())]
    DirectoryCreation {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Check a batch can start and make sure the destination exists.
///
/// Every unit must resolve to its own output path inside the destination.
pub fn preflight(destination: Option<&Path>, items: &[BatchItem]) -> Result<PathBuf, BatchError> {
    let destination = destination.ok_or(BatchError::NoDestination)?;
    if items.is_empty() {
        return Err(BatchError::NoImages);
    }
    check_outputs(destination, items)?;
    std::fs::create_dir_all(destination).map_err(|source| BatchError::DirectoryCreation {
        path: destination.to_path_buf(),
        source,
    })?;
    Ok(destination.to_path_buf())
}

fn check_outputs(destination: &Path, items: &[BatchItem]) -> Result<(), BatchError> {
    let mut owners: HashMap<PathBuf, &str> = HashMap::new();
    for item in items {
        if let Some(sub) = &item.output_subdirectory
            && !is_contained_subdirectory(sub.trim())
        {
            return Err(BatchError::InvalidSubdirectory {
                image_id: item.image_id.clone(),
                subdirectory: sub.clone(),
            });
        }
        let dest = item.destination(destination);
        for variant in item.variants.iter() {
            let path = dest.join(variant.file_name());
            if let Some(first) = owners.insert(path.clone(), &item.image_id) {
                return Err(BatchError::OutputCollision {
                    path,
                    first: first.to_string(),
                    second: item.image_id.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Convert every variant of every item. Never fails as a whole.
///
/// `on_unit(image_id, variant_id, result)` is called once per unit.
pub fn convert_many<T, P, F>(
    engine: &ConversionEngine<T, P>,
    items: &[BatchItem],
    destination: &Path,
    parallelism: Parallelism,
    mut on_unit: F,
) -> Vec<Vec<ConversionResult>>
where
    T: Transcoder,
    P: FileProbe,
    F: FnMut(&str, &str, &ConversionResult),
{
    let units: usize = items.iter().map(|item| item.variants.len()).sum();
    info!(images = items.len(), units, ?parallelism, "starting batch");

    match parallelism {
        Parallelism::PerImage { workers } if workers > 1 && items.len() > 1 => {
            match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
                Ok(pool) => convert_parallel(engine, items, destination, &pool, &mut on_unit),
                Err(e) => {
                    warn!(error = %e, "could not build worker pool, running sequentially");
                    convert_sequential(engine, items, destination, &mut on_unit)
                }
            }
        }
        _ => convert_sequential(engine, items, destination, &mut on_unit),
    }
}

/// [`preflight`] followed by [`convert_many`].
pub fn run_batch<T, P, F>(
    engine: &ConversionEngine<T, P>,
    items: &[BatchItem],
    destination: Option<&Path>,
    parallelism: Parallelism,
    on_unit: F,
) -> Result<Vec<Vec<ConversionResult>>, BatchError>
where
    T: Transcoder,
    P: FileProbe,
    F: FnMut(&str, &str, &ConversionResult),
{
    let destination = preflight(destination, items)?;
    Ok(convert_many(engine, items, &destination, parallelism, on_unit))
}

fn convert_sequential<T, P, F>(
    engine: &ConversionEngine<T, P>,
    items: &[BatchItem],
    destination: &Path,
    on_unit: &mut F,
) -> Vec<Vec<ConversionResult>>
where
    T: Transcoder,
    P: FileProbe,
    F: FnMut(&str, &str, &ConversionResult),
{
    items
        .iter()
        .map(|item| {
            let dest = item.destination(destination);
            item.variants
                .iter()
                .map(|variant| {
                    let result = engine.convert(&item.source_path, variant, &dest);
                    log_unit(item, variant, &result);
                    on_unit(&item.image_id, &variant.id, &result);
                    result
                })
                .collect()
        })
        .collect()
}

fn convert_parallel<T, P, F>(
    engine: &ConversionEngine<T, P>,
    items: &[BatchItem],
    destination: &Path,
    pool: &rayon::ThreadPool,
    on_unit: &mut F,
) -> Vec<Vec<ConversionResult>>
where
    T: Transcoder,
    P: FileProbe,
    F: FnMut(&str, &str, &ConversionResult),
{
    let mut slots: Vec<Vec<Option<ConversionResult>>> = items
        .iter()
        .map(|item| vec![None; item.variants.len()])
        .collect();

    let (tx, rx) = mpsc::channel::<(usize, usize, ConversionResult)>();
    std::thread::scope(|scope| {
        scope.spawn(move || {
            pool.install(|| {
                items
                    .par_iter()
                    .enumerate()
                    .for_each_with(tx, |tx, (i, item)| {
                        let dest = item.destination(destination);
                        for (j, variant) in item.variants.iter().enumerate() {
                            let result = engine.convert(&item.source_path, variant, &dest);
                            log_unit(item, variant, &result);
                            // Receiver outlives every sender
                            let _ = tx.send((i, j, result));
                        }
                    });
            });
        });

        for (i, j, result) in rx {
            let item = &items[i];
            on_unit(&item.image_id, &item.variants[j].id, &result);
            slots[i][j] = Some(result);
        }
    });

    slots
        .into_iter()
        .map(|row| row.into_iter().flatten().collect())
        .collect()
}

fn log_unit(item: &BatchItem, variant: &Variant, result: &ConversionResult) {
    match result {
        Ok(converted) => debug!(
            image = %item.image_id,
            variant = %variant.name,
            output = %converted.output_path.display(),
            "unit converted"
        ),
        Err(e) => warn!(image = %item.image_id, variant = %variant.name, error = %e, "unit failed"),
    }
}

/// Counts over a finished result matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Successes whose size bounds could not be checked.
    pub unverified: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[Vec<ConversionResult>]) -> Self {
        let mut summary = BatchSummary::default();
        for result in results.iter().flatten() {
            summary.total += 1;
            match result {
                Ok(converted) => {
                    summary.succeeded += 1;
                    if converted.size_check == SizeCheck::Unverifiable {
                        summary.unverified += 1;
                    }
                }
                Err(_) => summary.failed += 1,
            }
        }
        summary
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} converted, {} failed ({} total)",
            self.succeeded, self.failed, self.total
        )?;
        if self.unverified > 0 {
            write!(f, ", {} size-unverified", self.unverified)?;
        }
        Ok(())
    }
}
