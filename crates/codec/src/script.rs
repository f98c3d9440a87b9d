//! View-script parser: splits a replay-from-scratch script into inline
//! structure data and the styling/view command subset.
//!
//! The raw script reinitializes the whole session (loads data, resets the
//! camera, clears state). The codec only wants the styling/view subset to
//! apply on top of a structure the caller already loaded; replaying the
//! unfiltered script would double-load and reset session state
//! unpredictably. Session-lifecycle commands are therefore stripped, and
//! inline data blocks are lifted out of the command stream entirely.

use std::sync::OnceLock;

use regex::Regex;

use crate::accession::accession_from_name;
use crate::plan::ReferenceKind;

/// Marker the engine substitutes for its own script directory in saved
/// state; a filename follows it on the same line.
const SCRIPT_PATH_MARKER: &str = r"\$SCRIPT_PATH\$";

/// Result of parsing one view script.
#[derive(Debug, Default)]
pub struct ParsedScript {
    /// Structure data recovered from an inline `data "…" … end "…"` block.
    pub inline_data: Option<String>,
    /// Structure reference recovered from a `load` command.
    pub named_reference: Option<ScriptReference>,
    /// Styling/view commands in source order, lifecycle commands removed.
    pub commands: Vec<String>,
}

impl ParsedScript {
    /// Renders the filtered command stream as executable script text.
    pub fn script_text(&self) -> String {
        self.commands.join(";\n")
    }
}

/// A structure reference recovered from script text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptReference {
    /// Upper-cased 4-character accession token.
    pub id: String,
    /// How the replaying engine should resolve the reference.
    pub kind: ReferenceKind,
}

/// Parses a semicolon/newline-delimited view script.
pub fn parse_script(script: &str) -> ParsedScript {
    ParsedScript {
        inline_data: extract_inline_data(script),
        named_reference: extract_named_reference(script),
        commands: filter_commands(script),
    }
}

// ---------------------------------------------------------------------------
// Named-reference extraction
// ---------------------------------------------------------------------------

/// Extracts a structure reference, trying each form in priority order;
/// the first extractor that matches stops the search.
fn extract_named_reference(script: &str) -> Option<ScriptReference> {
    let extractors: [fn(&str) -> Option<ScriptReference>; 3] = [
        accession_load_reference,
        script_path_reference,
        quoted_file_reference,
    ];

    extractors.iter().find_map(|extract| extract(script))
}

// `load =4HHB` / `load :4hhb`, a direct database fetch.
fn accession_load_reference(script: &str) -> Option<ScriptReference> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?i)load[ \t]*[=:][ \t]*([0-9a-z]{4})\b").expect("valid accession pattern")
    });

    re.captures(script).map(|caps| ScriptReference {
        id: caps[1].to_ascii_uppercase(),
        kind: ReferenceKind::FetchById,
    })
}

// `$SCRIPT_PATH$4hhb_model.pdb`: internal-path placeholder with a file
// name carrying an accession token.
fn script_path_reference(script: &str) -> Option<ScriptReference> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(&format!(r#"{SCRIPT_PATH_MARKER}([^"';\r\n]+)"#))
            .expect("valid script-path pattern")
    });

    re.captures(script)
        .and_then(|caps| accession_from_name(caps[1].trim()))
        .map(|id| ScriptReference {
            id,
            kind: ReferenceKind::FileReference,
        })
}

// `load "4hhb.pdb"`: quoted file reference; the accession heuristic is
// applied to the file name.
fn quoted_file_reference(script: &str) -> Option<ScriptReference> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r#"(?i)load[^\r\n;"]*"([^"]+\.(?:pdb|cif|mmcif|txt))""#)
            .expect("valid quoted-file pattern")
    });

    re.captures(script)
        .and_then(|caps| accession_from_name(&caps[1]))
        .map(|id| ScriptReference {
            id,
            kind: ReferenceKind::FileReference,
        })
}

// ---------------------------------------------------------------------------
// Inline-data-block extraction
// ---------------------------------------------------------------------------

fn block_opener(line: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r#"(?i)^(?:load[ \t]+)?data[ \t]+"([^"]*)""#).expect("valid opener pattern")
    });
    re.captures(line).map(|caps| caps[1].to_string())
}

fn block_closer(line: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE
        .get_or_init(|| Regex::new(r#"(?i)^end[ \t]+"([^"]*)""#).expect("valid closer pattern"));
    re.captures(line).map(|caps| caps[1].to_string())
}

fn looks_like_structure(text: &str) -> bool {
    text.contains("ATOM") || text.contains("HETATM") || text.contains("HEADER")
}

/// Extracts the first inline data block whose interior looks like structure
/// data. Labels must match on both ends; a closer with a different label
/// does not close the block. Only one block is ever extracted.
fn extract_inline_data(script: &str) -> Option<String> {
    let lines: Vec<&str> = script.lines().collect();
    let mut index = 0;

    while index < lines.len() {
        let Some(label) = block_opener(lines[index].trim()) else {
            index += 1;
            continue;
        };

        // Find the matching closer; mismatched labels are interior content.
        let mut closer = None;
        for (offset, line) in lines[index + 1..].iter().enumerate() {
            if block_closer(line.trim()).is_some_and(|end_label| end_label == label) {
                closer = Some(index + 1 + offset);
                break;
            }
        }

        let Some(closer) = closer else {
            // Unclosed block swallows the rest of the script.
            tracing::debug!(%label, "inline data block never closed");
            return None;
        };

        let interior = lines[index + 1..closer].join("\n");
        if looks_like_structure(&interior) {
            return Some(interior);
        }

        index = closer + 1;
    }

    None
}

// ---------------------------------------------------------------------------
// Command filtering
// ---------------------------------------------------------------------------

/// Session-lifecycle prefixes dropped from the command stream
/// (case-insensitive, matched against the trimmed line).
const LIFECYCLE_PREFIXES: [&str; 7] = [
    "load ",
    "zap",
    "initialize",
    "set defaultdirectory",
    "cd ",
    "set currentlocalpath",
    "set logfile",
];

fn is_lifecycle_line(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    LIFECYCLE_PREFIXES.iter().any(|prefix| lower.starts_with(prefix))
}

/// Walks the script line by line, dropping empty lines, lifecycle commands,
/// and everything inside an open data block. Kept lines are trimmed and
/// split on `;` into individual commands; order is preserved. Data-block
/// tracking is a single open/close flag; the format never nests blocks.
fn filter_commands(script: &str) -> Vec<String> {
    let mut commands = Vec::new();
    let mut open_label: Option<String> = None;

    for raw in script.lines() {
        let line = raw.trim();

        if let Some(label) = &open_label {
            if block_closer(line).is_some_and(|end_label| end_label == *label) {
                open_label = None;
            }
            continue;
        }

        if let Some(label) = block_opener(line) {
            open_label = Some(label);
            continue;
        }

        if line.is_empty() || is_lifecycle_line(line) {
            continue;
        }

        for command in line.split(';') {
            let command = command.trim();
            if !command.is_empty() {
                commands.push(command.to_string());
            }
        }
    }

    commands
}
