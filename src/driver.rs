//! The public entry point: wires parsing, restructuring and emission
//! together.
//!
//! Per the error-handling design (§7), nothing below this module is
//! allowed to propagate an error to the caller of [`parse_query`]: the
//! parser is total (it always produces *some* `cst::Query`, falling
//! back to [`cst::Query::Malformed`]/[`cst::Query::WithMalformedPart`]
//! rather than erroring), so a syntax error degrades through the normal
//! restructure/emit pipeline into a `simple_query_string` over `_all`
//! at the AST level, mirroring `parsing_driver.py`'s try/except ladder.
//! [`emit::fallback_query`] (a `multi_match` over `_all`) remains
//! available as the documented top-level contract for a caller that
//! wants to bypass the pipeline entirely, but is not on the normal path.

use chrono::{NaiveDate, Utc};
use serde_json::Value as Json;

use crate::{emit, restructure};

/// Compiles a literature search query string into a target search
/// engine query DSL document.
///
/// This never returns an error and never panics: any input, however
/// malformed, produces *some* JSON query.
#[tracing::instrument(skip_all, fields(query = %query))]
pub fn parse_query(query: &str) -> Json {
    parse_query_at(query, Utc::now().date_naive())
}

/// Same as [`parse_query`], but resolves relative date specifiers
/// (`today`, `last month`, ...) against `reference_date` instead of the
/// real current date. Exposed so tests (and callers who need
/// reproducible output) don't depend on wall-clock time.
pub fn parse_query_at(query: &str, reference_date: NaiveDate) -> Json {
    if query.trim().is_empty() {
        tracing::debug!("empty query, returning match_all");
        return emit::emit(&crate::ast::Node::Empty);
    }

    let parsed = crate::parser::parse(query);
    if let crate::cst::Query::WithMalformedPart(_, ref tail) = parsed {
        tracing::warn!(%query, tail = %tail.join(" "), "query parsed with a trailing malformed part");
    }
    if matches!(parsed, crate::cst::Query::Malformed(_)) {
        tracing::warn!(%query, "query did not parse at all, degrading to a fallback query");
    }

    let restructured = restructure::restructure(parsed, reference_date);
    tracing::debug!(?restructured, "restructured query tree");

    emit::emit(&restructured)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 6, 15).unwrap()
    }

    #[test]
    fn empty_query_is_match_all() {
        assert_eq!(parse_query_at("", today()), serde_json::json!({"match_all": {}}));
    }

    #[test]
    fn unparseable_query_falls_back_to_simple_query_string() {
        let result = parse_query_at(")))(((", today());
        let simple_query_string = result.get("simple_query_string").expect("expected simple_query_string fallback");
        assert_eq!(simple_query_string.get("fields").unwrap(), &serde_json::json!(["_all"]));
    }

    #[test]
    fn top_level_multi_match_fallback_is_still_exposed() {
        let fallback = emit::fallback_query("author:ellis and");
        assert!(fallback.get("multi_match").is_some());
    }

    #[test]
    fn well_formed_query_compiles_without_falling_back() {
        let result = parse_query_at("author smith and title gravity", today());
        assert!(result.get("multi_match").is_none());
        assert!(result.get("bool").is_some());
    }

    #[test]
    fn leading_find_prefix_is_accepted() {
        let a = parse_query_at("find author smith", today());
        let b = parse_query_at("author smith", today());
        assert_eq!(a, b);
    }
}
