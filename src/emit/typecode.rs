//! `type-code` keyword emission: maps a SPIRES document/publication-type
//! code to its (field, value) pair via [`crate::keywords::TYPECODE_TABLE`].

use serde_json::{json, Value as Json};

use crate::emit::util::{generate_match_query, wrap_in_bool};
use crate::keywords::{self, TypecodeValue};

/// Builds the query for a `type-code` value. Unknown codes fall back to
/// a `should` of matches on `document_type` and `publication_type` with
/// the raw value, rather than rejecting the query outright.
pub fn build_typecode_query(value: &str) -> Json {
    let key = value.to_lowercase();
    match keywords::TYPECODE_TABLE.get(key.as_str()) {
        Some((field, TypecodeValue::Str(v))) => generate_match_query(field, v),
        Some((field, TypecodeValue::Bool(v))) => json!({ "term": { *field: *v } }),
        None => wrap_in_bool(
            vec![
                generate_match_query("document_type", &key),
                generate_match_query("publication_type", &key),
            ],
            "should",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_code_maps_to_its_field_and_value() {
        assert_eq!(
            build_typecode_query("b"),
            json!({"match": {"document_type": {"query": "book", "operator": "and"}}})
        );
        assert_eq!(build_typecode_query("CORE"), json!({"term": {"core": true}}));
    }

    #[test]
    fn unknown_code_falls_back_to_document_and_publication_type() {
        assert_eq!(
            build_typecode_query("mystery"),
            json!({"bool": {"should": [
                {"match": {"document_type": {"query": "mystery", "operator": "and"}}},
                {"match": {"publication_type": {"query": "mystery", "operator": "and"}}},
            ]}})
        );
    }
}
