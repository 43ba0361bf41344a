//! Author name handling: the external name-parser collaborator and the
//! name-variation helpers the emitter uses to build author queries.

use once_cell::sync::Lazy;
use regex::Regex;

/// A decomposed human name, mirroring the contract of the external
/// name-parser collaborator declared in the specification (§6): the
/// caller hands it a raw author string and gets back last name, first
/// names (as separate tokens), any suffix tokens (Jr., III, ...), and
/// whether each first-name token is a bare initial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub last: String,
    pub first_list: Vec<String>,
    pub suffix_list: Vec<String>,
}

static SUFFIXES: &[&str] = &["jr", "jr.", "sr", "sr.", "ii", "iii", "iv", "v"];

/// Parses a free-form author name of the form `Last, First Middle` or
/// `Last, F. M.` into its components. Names without a comma are treated
/// as a single last-name token (the collaborator's fallback for
/// unparseable input, matching how `HumanName`-style parsers degrade).
pub fn parse_name(raw: &str) -> ParsedName {
    let raw = raw.trim();
    let Some((last_part, rest)) = raw.split_once(',') else {
        return ParsedName {
            last: raw.to_string(),
            first_list: Vec::new(),
            suffix_list: Vec::new(),
        };
    };

    let mut first_list = Vec::new();
    let mut suffix_list = Vec::new();
    for token in rest.split_whitespace() {
        let normalized = token.trim_end_matches('.').to_lowercase();
        if SUFFIXES.contains(&token.to_lowercase().as_str()) || SUFFIXES.contains(&normalized.as_str()) {
            suffix_list.push(token.to_string());
        } else {
            first_list.push(token.to_string());
        }
    }

    ParsedName {
        last: last_part.trim().to_string(),
        first_list,
        suffix_list,
    }
}

/// Returns true if `token` (a single first-name token, dot stripped or
/// not) looks like a bare initial: exactly one letter, possibly followed
/// by a period.
pub fn is_initial_of_a_name(token: &str) -> bool {
    let stripped = token.trim_end_matches('.');
    stripped.chars().count() == 1 && stripped.chars().next().is_some_and(|c| c.is_alphabetic())
}

/// Returns true if every first-name token in `name` is a full name (none
/// are bare initials).
pub fn author_name_contains_fullnames(name: &ParsedName) -> bool {
    !name.first_list.is_empty() && name.first_list.iter().all(|t| !is_initial_of_a_name(t))
}

/// Generates the minimal set of name-variations worth querying: the full
/// name as given, plus an all-initials variation when the name contains
/// full first names (so `"Smith, John Michael"` also matches records
/// indexed as `"Smith, J. M."`). Mirrors
/// `generate_minimal_name_variations` from the original implementation,
/// simplified to the two variations that matter for query generation
/// rather than the full cross-product of truncations.
pub fn generate_minimal_name_variations(name: &ParsedName) -> Vec<String> {
    let mut variations = vec![format_name(name, false)];
    if author_name_contains_fullnames(name) {
        variations.push(format_name(name, true));
    }
    variations.dedup();
    variations
}

fn format_name(name: &ParsedName, initials_only: bool) -> String {
    if name.first_list.is_empty() {
        return name.last.clone();
    }
    let first = name
        .first_list
        .iter()
        .map(|t| {
            if initials_only {
                format!("{}.", t.chars().next().unwrap_or_default())
            } else {
                t.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!("{}, {}", name.last, first)
}

/// Regex recognising a fully-qualified BAI (Bibliographic Author
/// Identifier), e.g. `J.Smith.1`: one or more `(\w|-|')+ .` groups
/// followed by a trailing digit sequence.
pub static BAI_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^((\w|-|')+\.)+\d+$").unwrap());

/// Returns true if `value` fully matches the BAI pattern.
pub fn is_bai(value: &str) -> bool {
    BAI_REGEX.is_match(value)
}

/// Returns true if `value` looks like a partial/malformed BAI: no
/// whitespace and contains a `.`, but doesn't fully match [`BAI_REGEX`].
/// This triggers the emitter's dual BAI/name-field fallback query.
pub fn looks_like_partial_bai(value: &str) -> bool {
    !value.contains(char::is_whitespace) && value.contains('.') && !is_bai(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_last_first_with_suffix() {
        let n = parse_name("Smith, John Jr.");
        assert_eq!(n.last, "Smith");
        assert_eq!(n.first_list, vec!["John".to_string()]);
        assert_eq!(n.suffix_list, vec!["Jr.".to_string()]);
    }

    #[test]
    fn name_without_comma_is_last_only() {
        let n = parse_name("Witten");
        assert_eq!(n.last, "Witten");
        assert!(n.first_list.is_empty());
    }

    #[test]
    fn detects_initials() {
        assert!(is_initial_of_a_name("J."));
        assert!(is_initial_of_a_name("J"));
        assert!(!is_initial_of_a_name("John"));
    }

    #[test]
    fn minimal_variations_add_initials_form_for_fullnames() {
        let n = parse_name("Smith, John Michael");
        let variations = generate_minimal_name_variations(&n);
        assert_eq!(variations, vec!["Smith, John Michael".to_string(), "Smith, J. M.".to_string()]);
    }

    #[test]
    fn minimal_variations_skip_initials_form_when_already_initials() {
        let n = parse_name("Smith, J. M.");
        let variations = generate_minimal_name_variations(&n);
        assert_eq!(variations, vec!["Smith, J. M.".to_string()]);
    }

    #[test]
    fn bai_detection() {
        assert!(is_bai("J.Smith.1"));
        assert!(!is_bai("Smith, John"));
        assert!(looks_like_partial_bai("J.Smith"));
        assert!(!looks_like_partial_bai("J. Smith"));
        assert!(!looks_like_partial_bai("J.Smith.1"));
    }
}
