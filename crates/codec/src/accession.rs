//! Accession-token heuristic shared by the classifier and script parser.

use std::sync::OnceLock;

use regex::Regex;

// A 4-character alphanumeric token at the start of a base name, terminated
// by a separator (space, dot, underscore, hyphen). Matches both
// "4hhb_final.pdb" and the pure "4hhb.pdb" pattern; a bare token with no
// separator at all does not qualify.
fn token_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([0-9A-Za-z]{4})[ ._-]").expect("valid token pattern"))
}

/// Extracts an upper-cased structure-database accession from a file name.
///
/// The heuristic is deliberately imprecise: any separator-delimited 4-char
/// prefix is accepted as an accession, even when it is really the first word
/// of a longer local name. That matches the sessions in the wild; do not
/// tighten it.
pub fn accession_from_name(name: &str) -> Option<String> {
    let base = name.rsplit('/').next().unwrap_or(name);
    token_pattern()
        .captures(base)
        .map(|caps| caps[1].to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_accession_with_extension() {
        assert_eq!(accession_from_name("4hhb.pdb"), Some("4HHB".to_string()));
    }

    #[test]
    fn token_before_separator() {
        assert_eq!(accession_from_name("1abc_model2.cif"), Some("1ABC".to_string()));
        assert_eq!(accession_from_name("2xyz final.pdb"), Some("2XYZ".to_string()));
        assert_eq!(accession_from_name("3def-v2"), Some("3DEF".to_string()));
    }

    #[test]
    fn bare_token_without_separator_does_not_match() {
        assert_eq!(accession_from_name("4hhb"), None);
    }

    #[test]
    fn uses_base_name_of_nested_path() {
        assert_eq!(accession_from_name("models/a/4hhb.pdb"), Some("4HHB".to_string()));
    }

    #[test]
    fn longer_identifiers_still_match_first_four() {
        // Accepted imprecision: "12345.pdb" has no separator after 4 chars,
        // but "1234_rest" does. Only the separator form matches.
        assert_eq!(accession_from_name("12345.pdb"), None);
        assert_eq!(accession_from_name("1234_rest.pdb"), Some("1234".to_string()));
    }

    #[test]
    fn short_or_empty_names_do_not_match() {
        assert_eq!(accession_from_name("abc.pdb"), None);
        assert_eq!(accession_from_name(""), None);
    }
}
