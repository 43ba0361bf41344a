//! Date-valued keyword emission: expanding a single resolved date into a
//! granularity-aware ElasticSearch `range` query.

use serde_json::{json, Value as Json};

use crate::dates;

/// Builds a `range` query matching exactly the period `date_value`
/// names, at whatever granularity it was given (year, month, or day).
/// `"2015"` becomes `[2015-01-01, 2016-01-01)`; `"2015-03"` becomes
/// `[2015-03-01, 2015-04-01)`; `"2015-03-07"` matches only that day.
/// Mirrors `update_date_value_in_operator_value_pairs_for_fieldname`'s
/// "plain date" path.
pub fn build_date_equality_range(field: &str, date_value: &str) -> Json {
    let cleaned = dates::truncate_wildcard_from_date(date_value).unwrap_or_else(|_| date_value.to_string());
    match dates::parse_partial_date(&cleaned) {
        Ok(partial) => {
            let next = partial.next();
            json!({
                "range": {
                    field: {
                        "gte": partial.dumps(),
                        "lt": next.dumps(),
                    }
                }
            })
        }
        Err(_) => json!({ "match": { field: date_value } }),
    }
}

/// Builds an open-ended `range` query for a date comparison operator
/// (`>`, `>=`, `<`, `<=`), rounding the bound to the given granularity
/// using ElasticSearch date-math (`||/y`, `||/M`, `||/d`), matching
/// `_get_proper_elastic_search_date_rounding_format`.
pub fn build_date_comparison_range(field: &str, date_value: &str, op: &str) -> Json {
    match dates::parse_partial_date(date_value) {
        Ok(partial) => {
            let bound = format!("{}{}", partial.dumps(), partial.es_rounding_anchor());
            json!({ "range": { field: { op: bound } } })
        }
        Err(_) => json!({ "range": { field: { op: date_value } } }),
    }
}

/// Builds an inclusive `range` query for `start->end`: both endpoints
/// are used verbatim as `gte`/`lte`, matching the literal end-to-end
/// examples (`date 2015->2017` → `{"gte":"2015","lte":"2017"}`) rather
/// than rolling the upper bound forward the way a plain-value equality
/// match does.
pub fn build_date_span_range(field: &str, start: &str, end: &str) -> Json {
    json!({ "range": { field: { "gte": start, "lte": end } } })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_only_expands_to_full_year_range() {
        let q = build_date_equality_range("earliest_date", "2015");
        assert_eq!(q, json!({"range": {"earliest_date": {"gte": "2015", "lt": "2016"}}}));
    }

    #[test]
    fn month_expands_to_next_month() {
        let q = build_date_equality_range("earliest_date", "2015-12");
        assert_eq!(q, json!({"range": {"earliest_date": {"gte": "2015-12", "lt": "2016-01"}}}));
    }

    #[test]
    fn comparison_rounds_with_date_math_anchor() {
        let q = build_date_comparison_range("earliest_date", "2015-03", "gte");
        assert_eq!(q, json!({"range": {"earliest_date": {"gte": "2015-03||/M"}}}));
    }

    #[test]
    fn span_range_uses_endpoints_verbatim() {
        let q = build_date_span_range("earliest_date", "2015", "2017");
        assert_eq!(q, json!({"range": {"earliest_date": {"gte": "2015", "lte": "2017"}}}));
    }
}
