//! Session classifier: sorts archive entries into structure data, view
//! script, and everything else.
//!
//! Classification is a deterministic, side-effect-free cascade. Within each
//! category the first qualifying entry in archive order wins; that tie-break
//! is part of the contract, not an error condition.

use crate::accession::accession_from_name;
use crate::archive::ArchiveEntry;

/// Markers that identify molecular coordinate data inside entry content.
const ATOM_RECORD: &str = "ATOM  ";
const HETATM_RECORD: &str = "HETATM";

/// The classifier's view of an unpacked archive.
#[derive(Debug, Default)]
pub struct ClassifiedEntries {
    /// Entry holding molecular structure data, if any qualified.
    pub structure_candidate: Option<ArchiveEntry>,
    /// Entry holding the view script, if any qualified.
    pub script_candidate: Option<ArchiveEntry>,
    /// Accession hint derived from the structure candidate's file name.
    ///
    /// Retained for diagnostics and fallback; never overrides inline data.
    pub reference_hint: Option<String>,
    /// Entries that matched neither category (manifests, previews, ...).
    pub others: Vec<ArchiveEntry>,
}

/// Classifies archive entries by name and content sniffing.
///
/// Rules, applied as an ordered cascade:
/// 1. Script candidate: path contains `state.spt` or ends in `.spt`.
/// 2. Structure candidate, tiers tried across all remaining entries in
///    priority order: coordinate-file extension, then coordinate records in
///    content, then a purely numeric base name with coordinate records
///    (the archive-internal convention for unnamed payloads).
/// 3. Accession hint extracted from the structure candidate's base name.
pub fn classify(entries: Vec<ArchiveEntry>) -> ClassifiedEntries {
    let mut script_candidate: Option<ArchiveEntry> = None;
    let mut remaining: Vec<ArchiveEntry> = Vec::with_capacity(entries.len());

    for entry in entries {
        if script_candidate.is_none() && is_script_path(&entry.path) {
            tracing::debug!(path = %entry.path, "classified view script");
            script_candidate = Some(entry);
        } else {
            remaining.push(entry);
        }
    }

    let structure_index = find_structure_candidate(&remaining);
    let structure_candidate = structure_index.map(|index| remaining.remove(index));

    let reference_hint = structure_candidate
        .as_ref()
        .and_then(|entry| accession_from_name(entry.base_name()));

    if let Some(entry) = &structure_candidate {
        tracing::debug!(path = %entry.path, hint = ?reference_hint, "classified structure data");
    }

    ClassifiedEntries {
        structure_candidate,
        script_candidate,
        reference_hint,
        others: remaining,
    }
}

fn is_script_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.contains("state.spt") || lower.ends_with(".spt")
}

/// Finds the structure candidate, trying each tier across all entries
/// before falling to the next. First match within a tier wins.
fn find_structure_candidate(entries: &[ArchiveEntry]) -> Option<usize> {
    let tiers: [&dyn Fn(&ArchiveEntry) -> bool; 3] = [
        &|entry| has_structure_extension(&entry.path),
        &|entry| content_has_coordinates(entry),
        &|entry| has_numeric_base_name(entry.base_name()) && content_has_atom_records(entry),
    ];

    for tier in tiers {
        if let Some(index) = entries.iter().position(|entry| tier(entry)) {
            return Some(index);
        }
    }
    None
}

fn has_structure_extension(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.ends_with(".pdb") || lower.ends_with(".cif") || lower.ends_with(".mmcif")
}

fn content_has_coordinates(entry: &ArchiveEntry) -> bool {
    let text = entry.text();
    text.contains(ATOM_RECORD) || text.contains(HETATM_RECORD)
}

// Looser sniff for the numeric-name tier: unnamed payloads are sometimes
// minimized exports whose ATOM records carry no trailing spaces.
fn content_has_atom_records(entry: &ArchiveEntry) -> bool {
    let text = entry.text();
    text.contains("ATOM") || text.contains(HETATM_RECORD)
}

fn has_numeric_base_name(name: &str) -> bool {
    let stem = name.split('.').next().unwrap_or(name);
    !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_digit())
}
