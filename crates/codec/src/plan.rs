//! Reconstruction planner: resolves a structure source and command list
//! into the codec's durable output type.

use serde::{Deserialize, Serialize};

use crate::classify::ClassifiedEntries;
use crate::error::{DecodeError, Result};
use crate::script::ParsedScript;

/// Standard presentation applied when a session is rebuilt from a reference
/// and no view-script commands were recoverable.
pub const DEFAULT_VIEW_COMMANDS: [&str; 2] = ["cartoon only", "color structure"];

/// How a [`StructureSource::Reference`] should be resolved by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceKind {
    /// Fetch the structure from the database by accession id.
    FetchById,
    /// Resolve a file known to the caller (the id came from a file name).
    FileReference,
}

/// The resolved origin of molecular coordinate data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StructureSource {
    /// Coordinate data carried inside the session itself.
    Inline(String),
    /// A named reference the engine resolves externally.
    Reference { id: String, kind: ReferenceKind },
}

impl StructureSource {
    /// Returns `true` when the source carries coordinate data inline.
    pub fn is_inline(&self) -> bool {
        matches!(self, StructureSource::Inline(_))
    }
}

/// Normalized decode output: one structure source plus the ordered view
/// commands to replay on top of it.
///
/// `view_commands` preserves source order and is never reordered: ordering
/// carries semantic meaning, later commands override earlier ones in the
/// replaying engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPlan {
    pub structure_source: StructureSource,
    pub view_commands: Vec<String>,
}

impl SessionPlan {
    /// Renders the command list as executable script text.
    pub fn command_text(&self) -> String {
        self.view_commands.join(";\n")
    }
}

/// Resolves a session plan from classified entries, an optionally parsed
/// view script, and an optional caller-supplied fallback reference.
///
/// Precedence, first available wins (this ordering is a core contract):
/// 1. inline structure data found directly in the archive;
/// 2. inline data block recovered from the view script;
/// 3. named reference recovered from the view script;
/// 4. the structure candidate's filename-derived hint, when no structure
///    data exists at all;
/// 5. the caller-supplied fallback reference.
///
/// Fails with [`DecodeError::NoStructureFound`] when no tier resolves.
pub fn plan(
    classified: &ClassifiedEntries,
    parsed: Option<&ParsedScript>,
    fallback_reference: Option<&str>,
) -> Result<SessionPlan> {
    // Explicit ordered resolver list; each tier is independently testable.
    let resolvers: [&dyn Fn() -> Option<StructureSource>; 5] = [
        &|| archive_inline(classified),
        &|| script_inline(parsed),
        &|| script_reference(parsed),
        &|| filename_hint(classified),
        &|| fallback(fallback_reference),
    ];

    let source = resolvers
        .iter()
        .find_map(|resolve| resolve())
        .ok_or(DecodeError::NoStructureFound)?;

    let recovered_commands = parsed.map(|p| p.commands.as_slice()).unwrap_or_default();
    let view_commands = if source.is_inline() {
        // Inline sessions use the recovered list verbatim, possibly empty.
        recovered_commands.to_vec()
    } else if recovered_commands.is_empty() {
        DEFAULT_VIEW_COMMANDS.iter().map(|c| c.to_string()).collect()
    } else {
        recovered_commands.to_vec()
    };

    Ok(SessionPlan {
        structure_source: source,
        view_commands,
    })
}

fn archive_inline(classified: &ClassifiedEntries) -> Option<StructureSource> {
    let entry = classified.structure_candidate.as_ref()?;
    let text = entry.text();
    if text.trim().is_empty() {
        // A named-but-empty entry contributes only its filename hint.
        return None;
    }
    Some(StructureSource::Inline(text.into_owned()))
}

fn script_inline(parsed: Option<&ParsedScript>) -> Option<StructureSource> {
    parsed?
        .inline_data
        .clone()
        .map(StructureSource::Inline)
}

fn script_reference(parsed: Option<&ParsedScript>) -> Option<StructureSource> {
    parsed?.named_reference.clone().map(|reference| StructureSource::Reference {
        id: reference.id,
        kind: reference.kind,
    })
}

fn filename_hint(classified: &ClassifiedEntries) -> Option<StructureSource> {
    classified.reference_hint.clone().map(|id| StructureSource::Reference {
        id,
        kind: ReferenceKind::FileReference,
    })
}

fn fallback(reference: Option<&str>) -> Option<StructureSource> {
    reference.map(|id| StructureSource::Reference {
        id: id.to_ascii_uppercase(),
        kind: ReferenceKind::FetchById,
    })
}
