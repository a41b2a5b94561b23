//! # variant-forge
//!
//! Turns one source image into many named output variants (sizes, formats,
//! byte-size bounds) by driving an external transcoder, ffmpeg by default.
//!
//! # Architecture
//!
//! Two halves, leaves first:
//!
//! ```text
//! 1. Specify   size specs / presets  →  variant lists   (pure data, no I/O)
//! 2. Convert   variant lists         →  files on disk   (one ffmpeg run per variant)
//! ```
//!
//! The specification half never fails loudly: malformed size text produces
//! no sizes, and an empty expansion is reported as "nothing to generate".
//! The conversion half never lets one failure escape its unit: every
//! (image, variant) pair gets exactly one result and one progress callback.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Formats, sizes, variants, variant status and partial edits |
//! | [`size_spec`] | `square` / `dimension` / `aspect` size-spec parsing |
//! | [`naming`] | Deterministic variant names (`base_WxH`, spliced name parts) |
//! | [`presets`] | Built-in preset catalog |
//! | [`convert`] | Argument vectors, transcoder seam, `ConversionEngine` |
//! | [`batch`] | Pre-flight checks and the exhaustive batch loop |
//! | [`session`] | In-memory images and variant lists, run state |
//! | [`scan`] | Source discovery from files and directories |
//! | [`config`] | `variant-forge.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## External Transcoder Behind a Trait
//!
//! All pixel work is delegated to ffmpeg. The engine only talks to the
//! [`convert::Transcoder`] and [`convert::FileProbe`] traits, so every
//! failure path (spawn errors, non-zero exits, size violations, unreadable
//! outputs) is tested with mocks and no ffmpeg install.
//!
//! ## Fail Open, Visibly
//!
//! When an output's size cannot be read, its bounds cannot be checked and
//! the conversion still counts as a success. The result says so:
//! [`convert::SizeCheck::Unverifiable`] is distinct from `Satisfied`.
//!
//! ## Copy-on-Write Variant Lists
//!
//! Each image's variants live in an `Arc<Vec<Variant>>`. A batch runs over a
//! snapshot while the session records results; edits are whole-record
//! replacements, so no reader ever sees a half-applied change.
//!
//! ## Sequential by Default
//!
//! One transcoder process at a time keeps progress in strict submission
//! order. `processing.workers > 1` converts several images at once; each
//! image's variants still report in order, but images interleave.
//!
//! ## No Re-entrant Runs
//!
//! Starting a run on a variant that is already converting is an error
//! ([`session::SessionError::AlreadyConverting`]); nothing is queued.

pub mod batch;
pub mod config;
pub mod convert;
pub mod naming;
pub mod output;
pub mod presets;
pub mod scan;
pub mod session;
pub mod size_spec;
pub mod types;
