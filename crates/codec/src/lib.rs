//! Decode path for embedded visualization sessions.
//!
//! A distributable session file is a raster image with a ZIP archive appended
//! after the image data. The archive holds molecular structure data, a
//! replay-from-scratch view script, and assorted manifest entries. This crate
//! turns such a byte buffer into a [`SessionPlan`]: a resolved structure
//! source plus the ordered styling/view commands to apply on top of it.
//!
//! # Pipeline
//!
//! 1. [`scanner`] locates the embedded archive inside the image-shaped buffer
//! 2. [`archive`] unpacks it into named entries
//! 3. [`classify`] sorts entries into structure data, view script, and other
//! 4. [`script`] splits the view script into inline data and view commands
//! 5. [`plan`] resolves the structure source with deterministic precedence
//!
//! Every stage is a pure function over immutable input; independent sessions
//! can be decoded concurrently without shared state.

pub mod accession;
pub mod archive;
pub mod classify;
pub mod error;
pub mod plan;
pub mod scanner;
pub mod script;

pub use archive::ArchiveEntry;
pub use classify::ClassifiedEntries;
pub use error::{DecodeError, Result};
pub use plan::{ReferenceKind, SessionPlan, StructureSource};
pub use script::{ParsedScript, ScriptReference};

/// Decodes a raw session buffer into a replay plan.
///
/// Runs the full pipeline: scan for the embedded archive, unpack it,
/// classify the entries, parse the view script if one is present, and
/// resolve a structure source. `fallback_reference` is consulted only when
/// nothing inside the buffer yields a structure (e.g. the group's canonical
/// accession); see [`plan::plan`] for the exact precedence.
///
/// # Errors
///
/// * [`DecodeError::NotFound`]: no archive signature in the buffer; the
///   caller should treat the bytes as a plain raster image.
/// * [`DecodeError::CorruptArchive`]: signature present but the archive is
///   unreadable.
/// * [`DecodeError::NoStructureFound`]: archive opened but no structure
///   source could be established by any tier.
pub fn decode_session(buffer: &[u8], fallback_reference: Option<&str>) -> Result<SessionPlan> {
    let offset = scanner::find_archive_offset(buffer).ok_or(DecodeError::NotFound)?;
    let entries = archive::read_archive(&buffer[offset..])?;
    let classified = classify::classify(entries);

    let parsed = classified
        .script_candidate
        .as_ref()
        .map(|entry| script::parse_script(&entry.text()));

    plan::plan(&classified, parsed.as_ref(), fallback_reference)
}
