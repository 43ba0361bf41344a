//! Keyword alias table and related static configuration.
//!
//! This mirrors `inspire_query_parser/config.py` from the original parser:
//! a single source of truth for keyword aliases (shortened SPIRES forms,
//! Invenio forms, and their canonical long form), the set of canonical
//! keywords (used by the parser to support implicit-AND), the boolean
//! operator words (used to reject them as bare values outside parentheses),
//! and the type-code value table used by the emitter.
//!
//! All tables are built once, lazily, and are read-only for the lifetime of
//! the process (see the concurrency model in the specification).

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

/// Non-date keyword aliases, canonical form in the value.
static NONDATE_KEYWORD_ALIASES: &[(&str, &str)] = &[
    ("abstract", "abstract"),
    ("address", "address"),
    ("affiliation", "affiliation"),
    ("affil", "affiliation"),
    ("aff", "affiliation"),
    ("af", "affiliation"),
    ("institution", "affiliation"),
    ("inst", "affiliation"),
    ("affid", "affiliation-id"),
    ("affiliation-id", "affiliation-id"),
    ("author", "author"),
    ("au", "author"),
    ("a", "author"),
    ("name", "author"),
    ("author-count", "author-count"),
    ("authorcount", "author-count"),
    ("ac", "author-count"),
    ("cat", "cataloguer"),
    ("caption", "caption"),
    ("cite", "cite"),
    ("c", "cite"),
    ("reference", "cite"),
    ("citedby", "citedby"),
    ("citedbyexcludingselfcites", "citedbyexcludingselfcites"),
    ("citedbyx", "citedbyexcludingselfcites"),
    ("citedexcludingselfcites", "citedexcludingselfcites"),
    ("cx", "citedexcludingselfcites"),
    ("collaboration", "collaboration"),
    ("cn", "collaboration"),
    ("cnum", "confnumber"),
    ("control_number", "control_number"),
    ("recid", "control_number"),
    ("country", "country"),
    ("cc", "country"),
    ("doi", "doi"),
    ("bb", "eprint"),
    ("bull", "eprint"),
    ("eprint", "eprint"),
    ("arxiv", "eprint"),
    ("exact-author", "exact-author"),
    ("exactauthor", "exact-author"),
    ("ea", "exact-author"),
    ("experiment", "experiment"),
    ("exp", "experiment"),
    ("fc", "field-code"),
    ("field-code", "field-code"),
    ("first-author", "first_author"),
    ("firstauthor", "first_author"),
    ("fa", "first_author"),
    ("fulltext", "fulltext"),
    ("ft", "fulltext"),
    ("irn", "irn"),
    ("coden", "journal"),
    ("journal", "journal"),
    ("j", "journal"),
    ("published_in", "journal"),
    ("volume", "volume"),
    ("vol", "volume"),
    ("keyword", "keyword"),
    ("keywords", "keyword"),
    ("kw", "keyword"),
    ("k", "keyword"),
    ("primarch", "primary_arxiv_category"),
    ("rawref", "rawref"),
    ("citation", "reference"),
    ("jour-vol-page", "reference"),
    ("jvp", "reference"),
    ("refersto", "refersto"),
    ("referstoexcludingselfcites", "referstoexcludingselfcites"),
    ("referstox", "referstoexcludingselfcites"),
    ("reportnumber", "reportnumber"),
    ("report-num", "reportnumber"),
    ("report", "reportnumber"),
    ("rept", "reportnumber"),
    ("rn", "reportnumber"),
    ("r", "reportnumber"),
    ("subject", "subject"),
    ("title", "title"),
    ("ti", "title"),
    ("t", "title"),
    ("texkey", "texkeys.raw"),
    ("cited", "topcite"),
    ("topcit", "topcite"),
    ("topcite", "topcite"),
    ("type-code", "type-code"),
    ("type", "type-code"),
    ("tc", "type-code"),
    ("ty", "type-code"),
    ("scl", "type-code"),
    ("ps", "type-code"),
    ("collection", "type-code"),
];

/// Date keyword aliases, canonical form in the value.
static DATE_KEYWORD_ALIASES: &[(&str, &str)] = &[
    ("date", "date"),
    ("d", "date"),
    ("year", "date"),
    ("date-added", "date-added"),
    ("dadd", "date-added"),
    ("da", "date-added"),
    ("date-earliest", "date-earliest"),
    ("de", "date-earliest"),
    ("date-updated", "date-updated"),
    ("dupd", "date-updated"),
    ("du", "date-updated"),
    ("journal-year", "publication_info.year"),
    ("jy", "publication_info.year"),
];

/// Alias → canonical keyword lookup (both date and non-date keywords).
pub static KEYWORD_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    NONDATE_KEYWORD_ALIASES
        .iter()
        .chain(DATE_KEYWORD_ALIASES.iter())
        .copied()
        .collect()
});

/// Set of canonical date keywords, used by the parser and emitter to treat
/// date-valued keywords specially (range expansion, granularity rounding).
pub static DATE_KEYWORD_CANONICALS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| DATE_KEYWORD_ALIASES.iter().map(|(_, c)| *c).collect());

/// Set of all canonical keyword long forms.
///
/// Used by the parser to support implicit-AND: a bare token that exactly
/// equals one of these (and is not itself a shortened alias) splits a
/// simple-value run even without an explicit boolean operator.
pub static CANONICAL_KEYWORDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| KEYWORD_ALIASES.values().copied().collect());

/// Nestable keywords: their value is itself a sub-query, not a plain value.
pub static NESTABLE_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "citedby",
        "citedbyexcludingselfcites",
        "refersto",
        "referstoexcludingselfcites",
    ]
    .into_iter()
    .collect()
});

/// Boolean operator words/symbols, case-insensitive. These are rejected as
/// bare simple-value tokens outside parentheses (the "global keyword table"
/// of the specification).
pub static BOOLEAN_WORDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["and", "+", "&", "or", "|", "not", "-"].into_iter().collect());

/// Resolve a keyword alias (already lowercased) to its canonical long form.
pub fn canonicalize(alias: &str) -> Option<&'static str> {
    KEYWORD_ALIASES.get(alias.to_lowercase().as_str()).copied()
}

/// Returns true if `token`, lowercased, is a registered boolean word.
pub fn is_boolean_word(token: &str) -> bool {
    BOOLEAN_WORDS.contains(token.to_lowercase().as_str())
}

/// Returns true if `token` is exactly a canonical (non-shortened) keyword.
pub fn is_canonical_keyword(token: &str) -> bool {
    CANONICAL_KEYWORDS.contains(token)
}

/// Type-code value → (field, value) mapping used by the emitter.
pub static TYPECODE_TABLE: Lazy<HashMap<&'static str, (&'static str, TypecodeValue)>> =
    Lazy::new(|| {
        use TypecodeValue::*;
        [
            ("b", ("document_type", Str("book"))),
            ("book", ("document_type", Str("book"))),
            ("c", ("document_type", Str("conference paper"))),
            ("conferencepaper", ("document_type", Str("conference paper"))),
            ("citeable", ("citeable", Bool(true))),
            ("core", ("core", Bool(true))),
            ("i", ("publication_type", Str("introductory"))),
            ("introductory", ("publication_type", Str("introductory"))),
            ("l", ("publication_type", Str("lectures"))),
            ("lectures", ("publication_type", Str("lectures"))),
            ("p", ("refereed", Bool(true))),
            ("published", ("refereed", Bool(true))),
            ("r", ("publication_type", Str("review"))),
            ("review", ("publication_type", Str("review"))),
            ("t", ("document_type", Str("thesis"))),
            ("thesis", ("document_type", Str("thesis"))),
            ("proceedings", ("document_type", Str("proceedings"))),
        ]
        .into_iter()
        .collect()
    });

/// Value side of the type-code table: either a literal string or a boolean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypecodeValue {
    Str(&'static str),
    Bool(bool),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortened_aliases_resolve_to_canonical() {
        assert_eq!(canonicalize("a"), Some("author"));
        assert_eq!(canonicalize("AU"), Some("author"));
        assert_eq!(canonicalize("t"), Some("title"));
        assert_eq!(canonicalize("j"), Some("journal"));
        assert_eq!(canonicalize("recid"), Some("control_number"));
        assert_eq!(canonicalize("not-a-keyword"), None);
    }

    #[test]
    fn boolean_words_are_case_insensitive() {
        assert!(is_boolean_word("AND"));
        assert!(is_boolean_word("Or"));
        assert!(is_boolean_word("+"));
        assert!(!is_boolean_word("author"));
    }

    #[test]
    fn canonical_keyword_detection_excludes_shortened_forms() {
        assert!(is_canonical_keyword("author"));
        assert!(is_canonical_keyword("title"));
        assert!(!is_canonical_keyword("a"));
        assert!(!is_canonical_keyword("t"));
    }

    #[test]
    fn nestable_keywords_cover_all_four_forms() {
        assert!(NESTABLE_KEYWORDS.contains("citedby"));
        assert!(NESTABLE_KEYWORDS.contains("citedbyexcludingselfcites"));
        assert!(NESTABLE_KEYWORDS.contains("refersto"));
        assert!(NESTABLE_KEYWORDS.contains("referstoexcludingselfcites"));
    }
}
