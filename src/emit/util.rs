//! Shared helpers for building the target query DSL: escaping, the
//! `nested` wrapper, and small `bool` clause combinators.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value as Json};

use crate::keywords;

/// Prefixes under which a field must be wrapped in an ES `nested` query,
/// because the underlying documents index these as nested objects.
pub const NESTED_FIELDS: &[&str] = &["authors.", "publication_info.", "first_author.", "supervisors."];

pub fn nested_path_for(field: &str) -> Option<&'static str> {
    NESTED_FIELDS
        .iter()
        .find(|prefix| field.starts_with(**prefix))
        .map(|prefix| prefix.trim_end_matches('.'))
}

/// Wraps `query` in a `nested` query over `field`'s nested path, if any.
pub fn wrap_nested_if_needed(field: &str, query: Json) -> Json {
    match nested_path_for(field) {
        Some(path) => generate_nested_query(path, query),
        None => query,
    }
}

pub fn generate_nested_query(path: &str, inner: Json) -> Json {
    json!({ "nested": { "path": path, "query": inner } })
}

/// A `match` query with an explicit `and` operator, per §4.3's "Plain
/// value + single target field" rule.
pub fn generate_match_query(field: &str, value: &str) -> Json {
    json!({ "match": { field: { "query": value, "operator": "and" } } })
}

pub fn generate_multi_match_query(fields: &[&str], value: &str) -> Json {
    json!({ "multi_match": { "query": value, "fields": fields } })
}

pub fn generate_term_query(field: &str, value: &str) -> Json {
    json!({ "term": { field: value } })
}

pub fn generate_regexp_query(field: &str, value: &str) -> Json {
    json!({ "regexp": { field: value } })
}

/// Builds a `query_string` query for partial/wildcard matches against a
/// single field, escaping ES special characters first and wrapping the
/// term in `*...*` (unless it already carries a wildcard).
pub fn generate_partial_match_query(field: &str, value: &str) -> Json {
    json!({
        "query_string": {
            "query": wildcard_wrap(value),
            "default_field": field,
            "analyze_wildcard": true,
        }
    })
}

pub fn generate_partial_match_query_multi(fields: &[&str], value: &str) -> Json {
    json!({
        "query_string": {
            "query": wildcard_wrap(value),
            "fields": fields,
            "analyze_wildcard": true,
        }
    })
}

fn wildcard_wrap(value: &str) -> String {
    let escaped = escape_query_string_special_characters(value);
    if escaped.starts_with('*') && escaped.ends_with('*') {
        escaped
    } else {
        format!("*{}*", escaped)
    }
}

/// Escapes the characters ElasticSearch's `query_string` parser treats
/// specially. `*` is deliberately excluded: wildcards are meaningful
/// here, not literal text to escape.
pub fn escape_query_string_special_characters(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(
            c,
            '/' | '+' | '-' | '=' | '&' | '|' | '>' | '<' | '!' | '(' | ')' | '{' | '}' | '[' | ']' | '^' | '"' | '~' | '?' | ':' | '\\'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Combines two or more clauses into a single `bool` query when there is
/// more than one; a single clause is returned as-is.
pub fn wrap_in_bool(clauses: Vec<Json>, occur: &str) -> Json {
    let mut clauses = clauses;
    if clauses.len() == 1 {
        return clauses.remove(0);
    }
    json!({ "bool": { occur: clauses } })
}

/// The fall-back query for a parsed-but-unparseable (or wholly
/// unparseable) fragment: a `simple_query_string` over `_all`, with `:`
/// stripped from the text (so a stray `keyword:` doesn't get
/// reinterpreted as a field selector).
pub fn simple_query_string_fallback(text: &str) -> Json {
    json!({
        "simple_query_string": {
            "fields": ["_all"],
            "query": text.replace(':', ""),
        }
    })
}

/// The top-level driver fallback per the public interface contract: a
/// `multi_match` over `_all` with `zero_terms_query: all`.
pub fn multi_match_fallback(text: &str) -> Json {
    json!({
        "multi_match": {
            "query": text.replace(':', ""),
            "fields": ["_all"],
            "zero_terms_query": "all",
        }
    })
}

static TEXKEY_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z.\-]+:\d{4}[a-z]{2,3}$").unwrap());

/// Builds the query for a keyword with no known field mapping: a
/// two-branch `should` of a match on the literal keyword-as-field and a
/// match on `_all` for `keyword:value`, unless that text looks like a
/// texkey, in which case it's a direct match on `texkeys.raw`.
pub fn emit_unknown_keyword(keyword: &str, value_text: &str) -> Json {
    let combined = format!("{}:{}", keyword, value_text);
    if TEXKEY_REGEX.is_match(&combined) {
        return generate_match_query("texkeys.raw", &combined);
    }
    wrap_in_bool(
        vec![generate_match_query(keyword, value_text), generate_match_query("_all", &combined)],
        "should",
    )
}

/// Resolves a canonical keyword to its ElasticSearch field name(s), or
/// `None` if the keyword has no explicit mapping (triggering
/// [`emit_unknown_keyword`]).
pub fn es_fieldnames(keyword: &str) -> Option<Vec<&'static str>> {
    let fields = match keyword {
        "title" => vec!["titles.title"],
        "abstract" => vec!["abstracts.value"],
        "author" => vec!["authors.full_name"],
        "exact-author" => vec!["authors.full_name"],
        "first_author" => vec!["first_author.full_name"],
        "affiliation" => vec!["authors.affiliations.value"],
        "affiliation-id" => vec![
            "authors.affiliations.record.$ref",
            "authors.affiliations.recid",
            "authors.affiliations.value",
            "authors.affiliations.curated_relation",
        ],
        "collaboration" => vec!["collaborations.value"],
        "doi" => vec!["dois.value"],
        "eprint" => vec!["arxiv_eprints.value"],
        "experiment" => vec!["accelerator_experiments.experiment"],
        "irn" => vec!["external_system_identifiers.value"],
        "journal" => vec!["publication_info.journal_title"],
        "volume" => vec!["publication_info.journal_volume"],
        "keyword" => vec!["keywords.value"],
        "reportnumber" => vec!["report_numbers.value"],
        "subject" => vec!["inspire_categories.term"],
        "fulltext" => vec!["fulltext.body"],
        "control_number" => vec!["control_number"],
        "cataloguer" => vec!["cataloguer_name"],
        "field-code" => vec!["field_code"],
        "cite" => vec!["reference"],
        "confnumber" => vec!["publication_info.cnum"],
        "country" => vec!["authors.affiliations.country"],
        "author-count" => vec!["author_count"],
        "caption" => vec!["figures.caption"],
        "rawref" => vec!["raw_refs.value"],
        "supervisors" => vec!["supervisors.full_name"],
        "topcite" => vec!["citation_count"],
        // The original visitor expands a bare `date`/`d` query across all
        // of the date-aliased fields a record might carry the date under,
        // not just `earliest_date` (`elastic_search_visitor.py`'s
        // `date`/`d` branch).
        "date" => vec!["earliest_date", "imprints.date", "preprint_date", "publication_info.year", "thesis_info.date"],
        "date-added" => vec!["_created"],
        "date-updated" => vec!["_updated"],
        "date-earliest" => vec!["earliest_date"],
        "publication_info.year" => vec!["publication_info.year"],
        "texkeys.raw" => vec!["texkeys.raw"],
        "primary_arxiv_category" => vec!["arxiv_eprints.categories"],
        _ => return None,
    };
    Some(fields)
}

/// True if `keyword` resolves to a date-valued field.
pub fn is_date_keyword(keyword: &str) -> bool {
    keywords::DATE_KEYWORD_CANONICALS.contains(keyword)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_path_strips_trailing_dot() {
        assert_eq!(nested_path_for("authors.full_name"), Some("authors"));
        assert_eq!(nested_path_for("titles.title"), None);
    }

    #[test]
    fn texkey_shaped_unknown_query_matches_texkeys_raw() {
        let q = emit_unknown_keyword("Witten", "1998qj");
        assert_eq!(q, generate_match_query("texkeys.raw", "Witten:1998qj"));
    }

    #[test]
    fn escaping_leaves_wildcards_alone() {
        assert_eq!(escape_query_string_special_characters("SU(2)*"), "SU\\(2\\)*");
    }
}
