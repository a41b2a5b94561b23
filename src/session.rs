//! In-memory editing state: source images and their variant lists.
//!
//! A [`Session`] owns every [`SourceImage`]; each image exclusively owns an
//! ordered variant list. Lists are shared copy-on-write
//! (`Arc<Vec<Variant>>`): a running batch holds a snapshot while the session
//! keeps editing, and [`Arc::make_mut`] clones the list only when both sides
//! still hold it.
//!
//! ## Editing rules
//!
//! - Applying a preset or a custom expansion replaces the whole list.
//! - Field edits go through [`VariantPatch`] and produce a new record.
//! - A run marks its variants `converting` before any transcoder call and a
//!   variant already `converting` cannot be run again until its result is
//!   recorded ([`SessionError::AlreadyConverting`]).
//!
//! Nothing here is persisted.

use crate::batch::{self, BatchError, BatchItem, Parallelism};
use crate::convert::{ConversionEngine, ConversionResult, FileProbe, Transcoder};
use crate::presets;
use crate::types::{
    ImageFormat, PatchError, Size, Variant, VariantPatch, VariantStatus, VariantTemplate,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Name, format and size of the variant every new image starts with.
pub const DEFAULT_VARIANT_NAME: &str = "output";
pub const DEFAULT_VARIANT_FORMAT: ImageFormat = ImageFormat::Png;
pub const DEFAULT_VARIANT_EDGE: u32 = 512;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("unknown image: {0}")]
    UnknownImage(String),
    #[error("unknown variant {variant_id} on image {image_id}")]
    UnknownVariant { image_id: String, variant_id: String },
    #[error("unknown preset: {0}")]
    UnknownPreset(String),
    #[error("nothing to generate")]
    NothingToGenerate,
    #[error("subdirectory {0:?} must be relative and stay inside the destination")]
    InvalidSubdirectory(String),
    #[error("variant {0} is already converting")]
    AlreadyConverting(String),
    #[error("invalid variant edit: {0}")]
    InvalidPatch(#[from] PatchError),
    #[error("variant {variant_id} cannot move from {from} to {to}")]
    InvalidTransition {
        variant_id: String,
        from: VariantStatus,
        to: VariantStatus,
    },
    #[error(transparent)]
    Batch(#[from] BatchError),
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceImage {
    pub id: String,
    pub path: PathBuf,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_subdirectory: Option<String>,
    pub variants: Arc<Vec<Variant>>,
}

impl SourceImage {
    pub fn variant(&self, variant_id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    fn batch_item(&self, variants: Arc<Vec<Variant>>) -> BatchItem {
        BatchItem {
            image_id: self.id.clone(),
            source_path: self.path.clone(),
            output_subdirectory: self.output_subdirectory.clone(),
            variants,
        }
    }
}

#[derive(Debug, Default)]
pub struct Session {
    images: Vec<SourceImage>,
    next_id: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn images(&self) -> &[SourceImage] {
        &self.images
    }

    pub fn image(&self, image_id: &str) -> Option<&SourceImage> {
        self.images.iter().find(|img| img.id == image_id)
    }

    fn next(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn image_mut(&mut self, image_id: &str) -> Result<&mut SourceImage, SessionError> {
        self.images
            .iter_mut()
            .find(|img| img.id == image_id)
            .ok_or_else(|| SessionError::UnknownImage(image_id.to_string()))
    }

    /// Add a source image with one default variant. Returns the image id.
    pub fn add_image(&mut self, path: impl Into<PathBuf>) -> String {
        let path = path.into();
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let id = self.next("img");
        let variant = self.default_variant();
        debug!(image = %id, path = %path.display(), "image added");
        self.images.push(SourceImage {
            id: id.clone(),
            path,
            display_name,
            output_subdirectory: None,
            variants: Arc::new(vec![variant]),
        });
        id
    }

    pub fn remove_image(&mut self, image_id: &str) -> Result<SourceImage, SessionError> {
        let index = self
            .images
            .iter()
            .position(|img| img.id == image_id)
            .ok_or_else(|| SessionError::UnknownImage(image_id.to_string()))?;
        Ok(self.images.remove(index))
    }

    fn default_variant(&mut self) -> Variant {
        let template = VariantTemplate::new(
            DEFAULT_VARIANT_NAME,
            DEFAULT_VARIANT_FORMAT,
            Size {
                width: DEFAULT_VARIANT_EDGE,
                height: DEFAULT_VARIANT_EDGE,
            },
        );
        Variant::from_template(self.next("variant"), &template)
    }

    /// Append a default variant. Returns its id.
    pub fn add_default_variant(&mut self, image_id: &str) -> Result<String, SessionError> {
        self.image_mut(image_id)?;
        let variant = self.default_variant();
        let id = variant.id.clone();
        let image = self.image_mut(image_id)?;
        Arc::make_mut(&mut image.variants).push(variant);
        Ok(id)
    }

    /// Replace the image's variants with a preset's templates.
    pub fn apply_preset(&mut self, image_id: &str, preset_id: &str) -> Result<usize, SessionError> {
        let preset =
            presets::find(preset_id).ok_or_else(|| SessionError::UnknownPreset(preset_id.into()))?;
        self.replace_variants(image_id, &format!("preset-{}", preset.id), preset.templates())
    }

    /// Replace the image's variants with generated templates.
    ///
    /// An empty expansion leaves the list untouched.
    pub fn apply_custom(
        &mut self,
        image_id: &str,
        templates: Vec<VariantTemplate>,
    ) -> Result<usize, SessionError> {
        if templates.is_empty() {
            self.image_mut(image_id)?;
            return Err(SessionError::NothingToGenerate);
        }
        self.replace_variants(image_id, "custom", templates)
    }

    fn replace_variants(
        &mut self,
        image_id: &str,
        prefix: &str,
        templates: Vec<VariantTemplate>,
    ) -> Result<usize, SessionError> {
        self.image_mut(image_id)?;
        let variants: Vec<Variant> = templates
            .iter()
            .map(|t| Variant::from_template(self.next(prefix), t))
            .collect();
        let count = variants.len();
        let image = self.image_mut(image_id)?;
        image.variants = Arc::new(variants);
        debug!(image = %image_id, count, "variants replaced");
        Ok(count)
    }

    /// Apply a partial edit. The stored record is replaced, never mutated.
    pub fn update_variant(
        &mut self,
        image_id: &str,
        variant_id: &str,
        patch: &VariantPatch,
    ) -> Result<Variant, SessionError> {
        let image = self.image_mut(image_id)?;
        let index = variant_index(image, variant_id)?;
        let next = image.variants[index].patched(patch)?;
        Arc::make_mut(&mut image.variants)[index] = next.clone();
        Ok(next)
    }

    pub fn delete_variant(
        &mut self,
        image_id: &str,
        variant_id: &str,
    ) -> Result<Variant, SessionError> {
        let image = self.image_mut(image_id)?;
        let index = variant_index(image, variant_id)?;
        Ok(Arc::make_mut(&mut image.variants).remove(index))
    }

    /// Set or clear the per-image output subdirectory. Blank clears it.
    ///
    /// Absolute paths and `..` components are rejected.
    pub fn set_output_subdirectory(
        &mut self,
        image_id: &str,
        subdirectory: Option<String>,
    ) -> Result<(), SessionError> {
        let subdirectory = subdirectory.filter(|s| !s.trim().is_empty());
        if let Some(sub) = &subdirectory
            && !batch::is_contained_subdirectory(sub.trim())
        {
            return Err(SessionError::InvalidSubdirectory(sub.clone()));
        }
        let image = self.image_mut(image_id)?;
        image.output_subdirectory = subdirectory;
        Ok(())
    }

    /// Give every image its own subdirectory named after its file stem,
    /// nested under `parent` when given.
    pub fn use_stem_subdirectories(&mut self, parent: Option<&str>) -> Result<(), SessionError> {
        let assignments: Vec<(String, String)> = self
            .images
            .iter()
            .map(|img| {
                let stem = img
                    .path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| img.id.clone());
                let sub = match parent.map(str::trim).filter(|p| !p.is_empty()) {
                    Some(parent) => format!("{}/{}", parent.trim_end_matches('/'), stem),
                    None => stem,
                };
                (img.id.clone(), sub)
            })
            .collect();
        for (id, sub) in assignments {
            self.set_output_subdirectory(&id, Some(sub))?;
        }
        Ok(())
    }

    // =========================================================================
    // Run state
    // =========================================================================

    /// Mark variants `converting`, clearing their previous outcome.
    ///
    /// All-or-nothing: if any id is unknown or already converting, no
    /// variant changes.
    pub fn begin_run(&mut self, image_id: &str, variant_ids: &[&str]) -> Result<(), SessionError> {
        let image = self.image_mut(image_id)?;
        let mut indices = Vec::with_capacity(variant_ids.len());
        for id in variant_ids {
            let index = variant_index(image, id)?;
            if image.variants[index].status == VariantStatus::Converting {
                return Err(SessionError::AlreadyConverting((*id).to_string()));
            }
            indices.push(index);
        }
        let variants = Arc::make_mut(&mut image.variants);
        for index in indices {
            let variant = &mut variants[index];
            variant.status = VariantStatus::Converting;
            variant.output_path = None;
            variant.error_message = None;
        }
        Ok(())
    }

    /// Record the outcome of one unit. The variant must be `converting`.
    pub fn record_result(
        &mut self,
        image_id: &str,
        variant_id: &str,
        result: &ConversionResult,
    ) -> Result<(), SessionError> {
        let image = self.image_mut(image_id)?;
        let index = variant_index(image, variant_id)?;
        let to = match result {
            Ok(_) => VariantStatus::Success,
            Err(_) => VariantStatus::Error,
        };
        let from = image.variants[index].status;
        if !from.can_transition_to(to) {
            return Err(SessionError::InvalidTransition {
                variant_id: variant_id.to_string(),
                from,
                to,
            });
        }
        let variant = &mut Arc::make_mut(&mut image.variants)[index];
        variant.status = to;
        match result {
            Ok(converted) => variant.output_path = Some(converted.output_path.clone()),
            Err(e) => variant.error_message = Some(e.to_string()),
        }
        Ok(())
    }

    // =========================================================================
    // Runs
    // =========================================================================

    /// Convert one variant of one image.
    pub fn run_variant<T, P, F>(
        &mut self,
        engine: &ConversionEngine<T, P>,
        destination: Option<&Path>,
        image_id: &str,
        variant_id: &str,
        on_unit: F,
    ) -> Result<ConversionResult, SessionError>
    where
        T: Transcoder,
        P: FileProbe,
        F: FnMut(&str, &str, &ConversionResult),
    {
        let image = self
            .image(image_id)
            .ok_or_else(|| SessionError::UnknownImage(image_id.to_string()))?;
        let variant = image
            .variant(variant_id)
            .ok_or_else(|| unknown_variant(image_id, variant_id))?;
        let items = vec![image.batch_item(Arc::new(vec![variant.clone()]))];

        let mut results =
            self.execute(engine, destination, items, Parallelism::Sequential, on_unit)?;
        results
            .pop()
            .and_then(|mut row| row.pop())
            .ok_or_else(|| unknown_variant(image_id, variant_id))
    }

    /// Convert every variant of one image, in order.
    pub fn run_image<T, P, F>(
        &mut self,
        engine: &ConversionEngine<T, P>,
        destination: Option<&Path>,
        image_id: &str,
        on_unit: F,
    ) -> Result<Vec<ConversionResult>, SessionError>
    where
        T: Transcoder,
        P: FileProbe,
        F: FnMut(&str, &str, &ConversionResult),
    {
        let image = self
            .image(image_id)
            .ok_or_else(|| SessionError::UnknownImage(image_id.to_string()))?;
        let items = vec![image.batch_item(Arc::clone(&image.variants))];

        let mut results =
            self.execute(engine, destination, items, Parallelism::Sequential, on_unit)?;
        Ok(results.pop().unwrap_or_default())
    }

    /// Convert every variant of every image.
    pub fn run_all<T, P, F>(
        &mut self,
        engine: &ConversionEngine<T, P>,
        destination: Option<&Path>,
        parallelism: Parallelism,
        on_unit: F,
    ) -> Result<Vec<Vec<ConversionResult>>, SessionError>
    where
        T: Transcoder,
        P: FileProbe,
        F: FnMut(&str, &str, &ConversionResult),
    {
        let items: Vec<BatchItem> = self
            .images
            .iter()
            .map(|img| img.batch_item(Arc::clone(&img.variants)))
            .collect();
        self.execute(engine, destination, items, parallelism, on_unit)
    }

    /// Pre-flight, mark every unit converting, run, record each result.
    fn execute<T, P, F>(
        &mut self,
        engine: &ConversionEngine<T, P>,
        destination: Option<&Path>,
        items: Vec<BatchItem>,
        parallelism: Parallelism,
        mut on_unit: F,
    ) -> Result<Vec<Vec<ConversionResult>>, SessionError>
    where
        T: Transcoder,
        P: FileProbe,
        F: FnMut(&str, &str, &ConversionResult),
    {
        let destination = batch::preflight(destination, &items)?;

        // Reject before marking anything
        for item in &items {
            for variant in item.variants.iter() {
                if variant.status == VariantStatus::Converting {
                    return Err(SessionError::AlreadyConverting(variant.id.clone()));
                }
            }
        }
        for item in &items {
            let ids: Vec<&str> = item.variants.iter().map(|v| v.id.as_str()).collect();
            self.begin_run(&item.image_id, &ids)?;
        }

        let results = batch::convert_many(
            engine,
            &items,
            &destination,
            parallelism,
            |image_id, variant_id, result| {
                if let Err(e) = self.record_result(image_id, variant_id, result) {
                    warn!(
                        image = %image_id,
                        variant = %variant_id,
                        error = %e,
                        "result not recorded"
                    );
                }
                on_unit(image_id, variant_id, result);
            },
        );
        Ok(results)
    }
}

fn variant_index(image: &SourceImage, variant_id: &str) -> Result<usize, SessionError> {
    image
        .variants
        .iter()
        .position(|v| v.id == variant_id)
        .ok_or_else(|| unknown_variant(&image.id, variant_id))
}

fn unknown_variant(image_id: &str, variant_id: &str) -> SessionError {
    SessionError::UnknownVariant {
        image_id: image_id.to_string(),
        variant_id: variant_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncodingConfig;
    use crate::convert::transcoder::tests::MockTranscoder;
    use crate::convert::{Converted, ConversionError, FsProbe, SizeCheck};
    use crate::naming::{NamingScheme, custom_variants};
    use crate::size_spec::RawSizeSpec;
    use tempfile::TempDir;

    fn engine(mock: MockTranscoder) -> ConversionEngine<MockTranscoder, FsProbe> {
        ConversionEngine::new(mock, FsProbe, EncodingConfig::default())
    }

    fn ok(path: &str) -> ConversionResult {
        Ok(Converted {
            output_path: PathBuf::from(path),
            size_check: SizeCheck::NotRequired,
        })
    }

    fn first_variant_id(session: &Session, image_id: &str) -> String {
        session.image(image_id).unwrap().variants[0].id.clone()
    }

    // =========================================================================
    // Editing
    // =========================================================================

    #[test]
    fn new_image_gets_default_variant() {
        let mut session = Session::new();
        let id = session.add_image("/photos/logo.png");
        let image = session.image(&id).unwrap();

        assert_eq!(image.display_name, "logo.png");
        assert_eq!(image.variants.len(), 1);
        let v = &image.variants[0];
        assert_eq!(v.name, "output");
        assert_eq!(v.format, ImageFormat::Png);
        assert_eq!((v.width, v.height), (512, 512));
        assert_eq!(v.status, VariantStatus::Idle);
    }

    #[test]
    fn ids_are_unique() {
        let mut session = Session::new();
        let a = session.add_image("/a.png");
        let b = session.add_image("/b.png");
        assert_ne!(a, b);
        let v2 = session.add_default_variant(&a).unwrap();
        assert_ne!(first_variant_id(&session, &a), v2);
    }

    #[test]
    fn preset_replaces_whole_list() {
        let mut session = Session::new();
        let id = session.add_image("/logo.png");
        session.add_default_variant(&id).unwrap();

        let count = session.apply_preset(&id, "favicon").unwrap();
        let variants = &session.image(&id).unwrap().variants;
        let names: Vec<&str> = variants.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(count, 6);
        assert_eq!(names[0], "favicon");
        assert!(!names.contains(&"output"));
    }

    #[test]
    fn unknown_preset_is_rejected() {
        let mut session = Session::new();
        let id = session.add_image("/logo.png");
        assert!(matches!(
            session.apply_preset(&id, "nope"),
            Err(SessionError::UnknownPreset(_))
        ));
    }

    #[test]
    fn empty_custom_expansion_leaves_list_untouched() {
        let mut session = Session::new();
        let id = session.add_image("/logo.png");
        let before = session.image(&id).unwrap().variants.clone();

        let specs: Vec<RawSizeSpec> = vec!["square:foo,bar".parse().unwrap()];
        let templates = custom_variants(&NamingScheme::default(), ImageFormat::Png, &specs);
        let err = session.apply_custom(&id, templates).unwrap_err();

        assert!(matches!(err, SessionError::NothingToGenerate));
        assert_eq!(session.image(&id).unwrap().variants, before);
    }

    #[test]
    fn custom_expansion_replaces_list() {
        let mut session = Session::new();
        let id = session.add_image("/logo.png");
        let specs: Vec<RawSizeSpec> = vec!["square:16,32".parse().unwrap()];
        let templates = custom_variants(&NamingScheme::default(), ImageFormat::Webp, &specs);

        assert_eq!(session.apply_custom(&id, templates).unwrap(), 2);
        let variants = &session.image(&id).unwrap().variants;
        assert_eq!(variants[0].name, "custom_16x16");
        assert!(variants[0].id.starts_with("custom-"));
    }

    #[test]
    fn update_returns_new_record_and_keeps_snapshots() {
        let mut session = Session::new();
        let id = session.add_image("/logo.png");
        let vid = first_variant_id(&session, &id);
        let snapshot = Arc::clone(&session.image(&id).unwrap().variants);

        let updated = session
            .update_variant(
                &id,
                &vid,
                &VariantPatch {
                    width: Some(64),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.width, 64);
        assert_eq!(session.image(&id).unwrap().variants[0].width, 64);
        // Snapshot taken before the edit is unchanged
        assert_eq!(snapshot[0].width, 512);
    }

    #[test]
    fn invalid_patch_is_rejected() {
        let mut session = Session::new();
        let id = session.add_image("/logo.png");
        let vid = first_variant_id(&session, &id);
        let err = session
            .update_variant(
                &id,
                &vid,
                &VariantPatch {
                    width: Some(0),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidPatch(_)));
        assert_eq!(session.image(&id).unwrap().variants[0].width, 512);
    }

    #[test]
    fn delete_and_remove() {
        let mut session = Session::new();
        let id = session.add_image("/logo.png");
        let vid = first_variant_id(&session, &id);

        session.delete_variant(&id, &vid).unwrap();
        assert!(session.image(&id).unwrap().variants.is_empty());
        assert!(matches!(
            session.delete_variant(&id, &vid),
            Err(SessionError::UnknownVariant { .. })
        ));

        session.remove_image(&id).unwrap();
        assert!(session.images().is_empty());
        assert!(matches!(
            session.remove_image(&id),
            Err(SessionError::UnknownImage(_))
        ));
    }

    #[test]
    fn blank_subdirectory_clears_override() {
        let mut session = Session::new();
        let id = session.add_image("/logo.png");
        session.set_output_subdirectory(&id, Some("icons".into())).unwrap();
        assert_eq!(session.image(&id).unwrap().output_subdirectory.as_deref(), Some("icons"));
        session.set_output_subdirectory(&id, Some(" ".into())).unwrap();
        assert_eq!(session.image(&id).unwrap().output_subdirectory, None);
    }

    #[test]
    fn subdirectory_must_stay_inside_destination() {
        let mut session = Session::new();
        let id = session.add_image("/logo.png");
        for sub in ["/tmp/elsewhere", "../up", "icons/../../up"] {
            assert!(matches!(
                session.set_output_subdirectory(&id, Some(sub.into())),
                Err(SessionError::InvalidSubdirectory(_))
            ));
        }
        assert_eq!(session.image(&id).unwrap().output_subdirectory, None);
        session.set_output_subdirectory(&id, Some("icons/small".into())).unwrap();
    }

    #[test]
    fn stem_subdirectories_nest_under_parent() {
        let mut session = Session::new();
        let a = session.add_image("/photos/logo.png");
        let b = session.add_image("/photos/banner.jpg");

        session.use_stem_subdirectories(None).unwrap();
        assert_eq!(session.image(&a).unwrap().output_subdirectory.as_deref(), Some("logo"));

        session.use_stem_subdirectories(Some("icons/")).unwrap();
        let subs: Vec<Option<&str>> = [&a, &b]
            .iter()
            .map(|id| session.image(id).unwrap().output_subdirectory.as_deref())
            .collect();
        assert_eq!(subs, vec![Some("icons/logo"), Some("icons/banner")]);
    }

    // =========================================================================
    // Run state
    // =========================================================================

    #[test]
    fn begin_run_rejects_reentry() {
        let mut session = Session::new();
        let id = session.add_image("/logo.png");
        let vid = first_variant_id(&session, &id);

        session.begin_run(&id, &[vid.as_str()]).unwrap();
        let err = session.begin_run(&id, &[vid.as_str()]).unwrap_err();
        assert!(matches!(err, SessionError::AlreadyConverting(ref v) if *v == vid));
    }

    #[test]
    fn begin_run_is_all_or_nothing() {
        let mut session = Session::new();
        let id = session.add_image("/logo.png");
        let a = first_variant_id(&session, &id);
        let b = session.add_default_variant(&id).unwrap();
        session.begin_run(&id, &[b.as_str()]).unwrap();

        assert!(session.begin_run(&id, &[a.as_str(), b.as_str()]).is_err());
        assert_eq!(session.image(&id).unwrap().variants[0].status, VariantStatus::Idle);
    }

    #[test]
    fn record_result_drives_lifecycle() {
        let mut session = Session::new();
        let id = session.add_image("/logo.png");
        let vid = first_variant_id(&session, &id);

        // Idle cannot jump to success
        assert!(matches!(
            session.record_result(&id, &vid, &ok("/out/output.png")),
            Err(SessionError::InvalidTransition { .. })
        ));

        session.begin_run(&id, &[vid.as_str()]).unwrap();
        session.record_result(&id, &vid, &ok("/out/output.png")).unwrap();
        let v = &session.image(&id).unwrap().variants[0];
        assert_eq!(v.status, VariantStatus::Success);
        assert_eq!(v.output_path, Some(PathBuf::from("/out/output.png")));

        // Re-run clears the previous outcome
        session.begin_run(&id, &[vid.as_str()]).unwrap();
        let v = &session.image(&id).unwrap().variants[0];
        assert_eq!(v.status, VariantStatus::Converting);
        assert_eq!(v.output_path, None);

        let failure: ConversionResult = Err(ConversionError::Transcode {
            stderr: "bad input".into(),
        });
        session.record_result(&id, &vid, &failure).unwrap();
        let v = &session.image(&id).unwrap().variants[0];
        assert_eq!(v.status, VariantStatus::Error);
        assert_eq!(v.error_message.as_deref(), Some("bad input"));
    }

    // =========================================================================
    // Runs
    // =========================================================================

    #[test]
    fn run_all_requires_destination_and_images() {
        let mut session = Session::new();
        let engine = engine(MockTranscoder::new());
        let tmp = TempDir::new().unwrap();

        assert!(matches!(
            session.run_all(&engine, Some(tmp.path()), Parallelism::Sequential, |_, _, _| {}),
            Err(SessionError::Batch(BatchError::NoImages))
        ));

        let id = session.add_image("/logo.png");
        assert!(matches!(
            session.run_all(&engine, None, Parallelism::Sequential, |_, _, _| {}),
            Err(SessionError::Batch(BatchError::NoDestination))
        ));
        // Pre-flight failure marks nothing
        assert_eq!(session.image(&id).unwrap().variants[0].status, VariantStatus::Idle);
    }

    #[test]
    fn run_all_records_every_outcome() {
        let tmp = TempDir::new().unwrap();
        let engine = engine(MockTranscoder::new().failing_on("thumb_medium", "encoder error"));
        let mut session = Session::new();
        let a = session.add_image("/photos/a.png");
        let b = session.add_image("/photos/b.png");
        session.apply_preset(&a, "thumbnails").unwrap();
        session.set_output_subdirectory(&b, Some("b".into())).unwrap();

        let mut seen = 0;
        let results = session
            .run_all(&engine, Some(tmp.path()), Parallelism::Sequential, |_, _, _| seen += 1)
            .unwrap();

        assert_eq!(seen, 4);
        assert_eq!(results[0].len(), 3);
        assert_eq!(results[1].len(), 1);

        let statuses: Vec<VariantStatus> =
            session.image(&a).unwrap().variants.iter().map(|v| v.status).collect();
        assert_eq!(
            statuses,
            vec![VariantStatus::Success, VariantStatus::Error, VariantStatus::Success]
        );
        let b_variant = &session.image(&b).unwrap().variants[0];
        assert_eq!(b_variant.output_path, Some(tmp.path().join("b").join("output.png")));
    }

    #[test]
    fn run_all_rejects_images_writing_the_same_files() {
        let tmp = TempDir::new().unwrap();
        let engine = engine(MockTranscoder::new());
        let mut session = Session::new();
        let a = session.add_image("/photos/a.png");
        let b = session.add_image("/photos/b.png");
        for id in [&a, &b] {
            session.apply_preset(id, "favicon").unwrap();
            session.set_output_subdirectory(id, Some("icons".into())).unwrap();
        }

        let err = session
            .run_all(&engine, Some(tmp.path()), Parallelism::Sequential, |_, _, _| {})
            .unwrap_err();

        assert!(matches!(
            err,
            SessionError::Batch(BatchError::OutputCollision { ref first, ref second, .. })
                if *first == a && *second == b
        ));
        assert!(engine.transcoder().get_calls().is_empty());
        assert!(
            session
                .images()
                .iter()
                .flat_map(|img| img.variants.iter())
                .all(|v| v.status == VariantStatus::Idle)
        );

        // Separate subdirectories resolve it
        session.use_stem_subdirectories(Some("icons")).unwrap();
        let results = session
            .run_all(
                &engine,
                Some(tmp.path()),
                Parallelism::PerImage { workers: 2 },
                |_, _, _| {},
            )
            .unwrap();
        assert_eq!(results.iter().flatten().filter(|r| r.is_ok()).count(), 12);
        let a_icon = &session.image(&a).unwrap().variants[0];
        assert_eq!(
            a_icon.output_path,
            Some(tmp.path().join("icons/a/favicon.ico"))
        );
        assert!(tmp.path().join("icons/b/favicon.ico").exists());
    }

    #[test]
    fn run_all_rejects_variant_already_converting() {
        let tmp = TempDir::new().unwrap();
        let engine = engine(MockTranscoder::new());
        let mut session = Session::new();
        let id = session.add_image("/logo.png");
        let vid = first_variant_id(&session, &id);
        session.begin_run(&id, &[vid.as_str()]).unwrap();

        let err = session
            .run_all(&engine, Some(tmp.path()), Parallelism::Sequential, |_, _, _| {})
            .unwrap_err();
        assert!(matches!(err, SessionError::AlreadyConverting(_)));
        assert!(engine.transcoder().get_calls().is_empty());
    }

    #[test]
    fn run_variant_converts_only_that_variant() {
        let tmp = TempDir::new().unwrap();
        let engine = engine(MockTranscoder::new());
        let mut session = Session::new();
        let id = session.add_image("/logo.png");
        session.apply_preset(&id, "favicon").unwrap();
        let target = session.image(&id).unwrap().variants[2].id.clone();

        let result = session
            .run_variant(&engine, Some(tmp.path()), &id, &target, |_, _, _| {})
            .unwrap();

        assert_eq!(result.unwrap().output_path, tmp.path().join("favicon-32x32.png"));
        assert_eq!(engine.transcoder().get_calls().len(), 1);
        let statuses: Vec<VariantStatus> =
            session.image(&id).unwrap().variants.iter().map(|v| v.status).collect();
        assert_eq!(statuses[2], VariantStatus::Success);
        assert!(statuses.iter().enumerate().all(|(i, s)| i == 2 || *s == VariantStatus::Idle));
    }

    #[test]
    fn run_image_preserves_variant_order() {
        let tmp = TempDir::new().unwrap();
        let engine = engine(MockTranscoder::new());
        let mut session = Session::new();
        let id = session.add_image("/logo.png");
        session.apply_preset(&id, "app-icons").unwrap();
        let expected: Vec<String> =
            session.image(&id).unwrap().variants.iter().map(|v| v.id.clone()).collect();

        let mut order = Vec::new();
        let results = session
            .run_image(&engine, Some(tmp.path()), &id, |_, v, _| order.push(v.to_string()))
            .unwrap();

        assert_eq!(order, expected);
        assert!(results.iter().all(|r| r.is_ok()));
    }
}
