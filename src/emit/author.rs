//! Author-query emission: BAI detection, the partial-BAI fallback, and
//! name-variation minimization.

use serde_json::{json, Value as Json};

use crate::emit::util::{generate_match_query, wrap_in_bool};
use crate::names;

const BAI_FIELD_RAW: &str = "authors.ids.value.raw";
const BAI_FIELD_SEARCH: &str = "authors.ids.value.search";
const EXACT_AUTHOR_FIELD: &str = "authors.full_name_unicode_normalized";

/// Builds the query for a plain (non-exact) author-valued keyword
/// (`author`, `first_author`). `name_field` is the plain-text name field
/// for the keyword in play (e.g. `authors.full_name`); the BAI
/// identifier field is always under `authors.ids.value` regardless of
/// which author keyword is used, matching `handle_author_query`.
pub fn build_author_query(name_field: &str, value: &str) -> Json {
    if names::is_bai(value) {
        return json!({ "term": { BAI_FIELD_RAW: value } });
    }

    if names::looks_like_partial_bai(value) {
        // Ambiguous: could be a mistyped BAI or an unusual plain name.
        // Query both, matching the original's dual BAI/name fallback.
        return wrap_in_bool(
            vec![
                json!({ "match": { BAI_FIELD_SEARCH: value } }),
                generate_match_query(name_field, value),
            ],
            "should",
        );
    }

    let parsed = names::parse_name(value);
    let variations = names::generate_minimal_name_variations(&parsed);
    let clauses: Vec<Json> = variations.into_iter().map(|v| generate_match_query(name_field, &v)).collect();
    wrap_in_bool(clauses, "should")
}

/// Builds the query for an `exact-author` keyword: a `term` on the
/// normalized full-name field (case-folded as a stand-in for the
/// original's NFKC + custom name normalizer), or on the BAI `.raw`
/// variation for a BAI-shaped value.
pub fn build_exact_author_query(value: &str) -> Json {
    if names::is_bai(value) {
        return json!({ "term": { BAI_FIELD_RAW: value } });
    }
    json!({ "term": { EXACT_AUTHOR_FIELD: value.to_lowercase() } })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_bai_queries_the_identifier_raw_field() {
        let q = build_author_query("authors.full_name", "J.Smith.1");
        assert_eq!(q, json!({"term": {BAI_FIELD_RAW: "J.Smith.1"}}));
    }

    #[test]
    fn partial_bai_queries_both_fields() {
        let q = build_author_query("authors.full_name", "J.Smith");
        assert_eq!(
            q,
            json!({"bool": {"should": [
                {"match": {BAI_FIELD_SEARCH: "J.Smith"}},
                {"match": {"authors.full_name": {"query": "J.Smith", "operator": "and"}}},
            ]}})
        );
    }

    #[test]
    fn plain_name_generates_initials_variation() {
        let q = build_author_query("authors.full_name", "Smith, John Michael");
        assert_eq!(
            q,
            json!({"bool": {"should": [
                {"match": {"authors.full_name": {"query": "Smith, John Michael", "operator": "and"}}},
                {"match": {"authors.full_name": {"query": "Smith, J. M.", "operator": "and"}}},
            ]}})
        );
    }

    #[test]
    fn exact_author_term_is_lowercased() {
        let q = build_exact_author_query("Ellis");
        assert_eq!(q, json!({"term": {"authors.full_name_unicode_normalized": "ellis"}}));
    }
}
