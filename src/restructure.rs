//! The restructuring visitor: turns the parser's concrete syntax tree
//! into the canonical [`crate::ast::Node`] tree.
//!
//! Three things happen here that don't belong in either the parser or
//! the emitter:
//!
//! - Complex-value delimiter classification is finalized into
//!   [`crate::ast::Value`] variants.
//! - A keyword's value, which may be a whole boolean-combined run of
//!   simple values (`author smith and jones`), is distributed back over
//!   the keyword so each leaf becomes its own `KeywordOp`, matching the
//!   original grammar's `_convert_simple_value_boolean_query_to_and_boolean_queries`.
//! - Relative date specifiers (`today`, `last month - 2`, ...) are
//!   resolved to absolute ISO dates, and `journal` immediately followed
//!   by `volume` is folded into a single comma-joined journal value.

use chrono::NaiveDate;

use crate::ast::{Node, Value};
use crate::cst::{self, BoolOp, ComplexValueKind, Expression, Query, RawValue};
use crate::dates;
use crate::keywords;

/// Restructures a parsed [`Query`] into a [`Node`], resolving relative
/// date specifiers against `today`.
pub fn restructure(query: Query, today: NaiveDate) -> Node {
    let node = match query {
        Query::Empty => Node::Empty,
        Query::Malformed(words) => Node::MalformedQuery(words),
        Query::Find(expr) => restructure_expression(*expr, today),
        Query::WithMalformedPart(expr, tail) => {
            Node::QueryWithMalformedPart(Box::new(restructure_expression(*expr, today)), tail)
        }
    };
    fold_journal_volume(node)
}

fn restructure_expression(expr: Expression, today: NaiveDate) -> Node {
    match expr {
        Expression::Not(inner) => Node::NotOp(Box::new(restructure_expression(*inner, today))),
        Expression::Parenthesized(inner) => restructure_expression(*inner, today),
        Expression::Nested(keyword, inner) => Node::NestedKeywordOp {
            keyword,
            query: Box::new(restructure_expression(*inner, today)),
        },
        Expression::Boolean(left, op, right) => combine(
            restructure_expression(*left, today),
            op,
            restructure_expression(*right, today),
        ),
        Expression::Keyword(keyword, value) => restructure_keyword_value(&keyword, *value, today),
        Expression::Simple(value) => restructure_bare_value(*value, today),
    }
}

fn combine(left: Node, op: Option<BoolOp>, right: Node) -> Node {
    match op {
        Some(BoolOp::Or) => Node::OrOp(Box::new(left), Box::new(right)),
        Some(BoolOp::And) | None => Node::AndOp(Box::new(left), Box::new(right)),
    }
}

fn complex_to_value(kind: ComplexValueKind, s: String) -> Value {
    match kind {
        ComplexValueKind::PartialMatch => Value::PartialMatch(s),
        ComplexValueKind::ExactMatch => Value::ExactMatch(s),
        ComplexValueKind::Regex => Value::Regex(s),
    }
}

/// Reconstructs the original whitespace-joined text of a value subtree,
/// if (and only if) it is made up purely of implicit-AND-joined simple
/// leaves and negations — the shape relative date specifiers like
/// `"this month"` or `"last month - 2"` take once tokenized. Returns
/// `None` for anything else (explicit boolean operators, ranges,
/// comparisons, complex values), which can't be a date specifier anyway.
fn raw_value_text(v: &RawValue) -> Option<String> {
    match v {
        RawValue::Simple(s) => Some(s.clone()),
        RawValue::Boolean(l, None, r) => {
            let l = raw_value_text(l)?;
            let r = raw_value_text(r)?;
            Some(format!("{} {}", l, r))
        }
        RawValue::Negation(inner) => raw_value_text(inner).map(|s| format!("- {}", s)),
        _ => None,
    }
}

fn leaf_value(v: RawValue) -> Value {
    match v {
        RawValue::Simple(s) => Value::Simple(s),
        RawValue::Complex(kind, s) => complex_to_value(kind, s),
        // Endpoints of ranges/comparisons are always simple or complex by
        // construction; anything else degrades to its textual form.
        other => Value::Simple(format!("{:?}", other)),
    }
}

/// Restructures the value of a `keyword:value` query, distributing the
/// keyword over every leaf of a boolean-combined value run.
fn restructure_keyword_value(keyword: &str, value: RawValue, today: NaiveDate) -> Node {
    if keywords::DATE_KEYWORD_CANONICALS.contains(keyword) {
        if let Some(text) = raw_value_text(&value) {
            if let Some(resolved) = dates::resolve_relative_date_specifier(&text, today) {
                return Node::KeywordOp {
                    keyword: keyword.to_string(),
                    value: Box::new(Node::ValueOp(Value::Simple(resolved))),
                };
            }
        }
    }

    match value {
        RawValue::Boolean(l, op, r) => combine(
            restructure_keyword_value(keyword, *l, today),
            op,
            restructure_keyword_value(keyword, *r, today),
        ),
        RawValue::Negation(inner) => Node::NotOp(Box::new(restructure_keyword_value(keyword, *inner, today))),
        RawValue::Range(start, end) => Node::KeywordOp {
            keyword: keyword.to_string(),
            value: Box::new(Node::RangeOp { start: leaf_value(*start), end: leaf_value(*end) }),
        },
        RawValue::GreaterThan(v) => Node::KeywordOp {
            keyword: keyword.to_string(),
            value: Box::new(Node::GreaterThanOp(leaf_value(*v))),
        },
        RawValue::GreaterEqual(v) => Node::KeywordOp {
            keyword: keyword.to_string(),
            value: Box::new(Node::GreaterEqualThanOp(leaf_value(*v))),
        },
        RawValue::LessThan(v) => Node::KeywordOp {
            keyword: keyword.to_string(),
            value: Box::new(Node::LessThanOp(leaf_value(*v))),
        },
        RawValue::LessEqual(v) => Node::KeywordOp {
            keyword: keyword.to_string(),
            value: Box::new(Node::LessEqualThanOp(leaf_value(*v))),
        },
        RawValue::Simple(s) => Node::KeywordOp {
            keyword: keyword.to_string(),
            value: Box::new(Node::ValueOp(Value::Simple(s))),
        },
        RawValue::Complex(kind, s) => Node::KeywordOp {
            keyword: keyword.to_string(),
            value: Box::new(Node::ValueOp(complex_to_value(kind, s))),
        },
    }
}

/// Same as [`restructure_keyword_value`] but for a value with no
/// enclosing keyword, wrapping leaves in `ValueOp` instead of `KeywordOp`.
fn restructure_bare_value(value: RawValue, today: NaiveDate) -> Node {
    match value {
        RawValue::Boolean(l, op, r) => combine(
            restructure_bare_value(*l, today),
            op,
            restructure_bare_value(*r, today),
        ),
        RawValue::Negation(inner) => Node::NotOp(Box::new(restructure_bare_value(*inner, today))),
        RawValue::Range(start, end) => Node::RangeOp { start: leaf_value(*start), end: leaf_value(*end) },
        RawValue::GreaterThan(v) => Node::GreaterThanOp(leaf_value(*v)),
        RawValue::GreaterEqual(v) => Node::GreaterEqualThanOp(leaf_value(*v)),
        RawValue::LessThan(v) => Node::LessThanOp(leaf_value(*v)),
        RawValue::LessEqual(v) => Node::LessEqualThanOp(leaf_value(*v)),
        RawValue::Simple(s) => Node::ValueOp(Value::Simple(s)),
        RawValue::Complex(kind, s) => Node::ValueOp(complex_to_value(kind, s)),
    }
}

/// Folds `journal:J AND volume:V` (and `journal:J AND (volume:V AND
/// rest)`) into a single `journal` keyword query whose value is
/// `"J,V"`, dropping the separate volume node. This mirrors
/// `_restructure_if_volume_follows_journal`: INSPIRE indexes journal and
/// volume as one joined field, so a bare `AndOp` between the two is
/// indexed wrong unless folded here.
fn fold_journal_volume(node: Node) -> Node {
    match node {
        Node::AndOp(left, right) => {
            let left = fold_journal_volume(*left);
            let right = fold_journal_volume(*right);
            if let Node::KeywordOp { keyword, value } = &left {
                if keyword == "journal" {
                    if let Node::ValueOp(Value::Simple(journal_value)) = value.as_ref() {
                        if let Some((volume_value, remainder)) = extract_volume(right) {
                            let combined = Node::KeywordOp {
                                keyword: "journal".to_string(),
                                value: Box::new(Node::ValueOp(Value::Simple(format!(
                                    "{},{}",
                                    journal_value, volume_value
                                )))),
                            };
                            return match remainder {
                                Some(rest) => Node::AndOp(Box::new(combined), Box::new(rest)),
                                None => combined,
                            };
                        }
                    }
                }
            }
            Node::AndOp(Box::new(left), Box::new(right))
        }
        Node::OrOp(left, right) => Node::OrOp(
            Box::new(fold_journal_volume(*left)),
            Box::new(fold_journal_volume(*right)),
        ),
        Node::NotOp(inner) => Node::NotOp(Box::new(fold_journal_volume(*inner))),
        Node::NestedKeywordOp { keyword, query } => Node::NestedKeywordOp {
            keyword,
            query: Box::new(fold_journal_volume(*query)),
        },
        Node::QueryWithMalformedPart(inner, tail) => {
            Node::QueryWithMalformedPart(Box::new(fold_journal_volume(*inner)), tail)
        }
        other => other,
    }
}

/// Looks for a `volume` keyword query within `node`, which is either the
/// volume node itself or an `AndOp` chain with it on the left. Returns
/// the volume's value and whatever remains of `node` once it is removed
/// (`None` if nothing remains).
fn extract_volume(node: Node) -> Option<(String, Option<Node>)> {
    match node {
        Node::KeywordOp { keyword, value } if keyword == "volume" => {
            if let Node::ValueOp(Value::Simple(s)) = *value {
                Some((s, None))
            } else {
                None
            }
        }
        Node::AndOp(left, right) => {
            if let Node::KeywordOp { keyword, value } = left.as_ref() {
                if keyword == "volume" {
                    if let Node::ValueOp(Value::Simple(s)) = value.as_ref() {
                        return Some((s.clone(), Some(*right)));
                    }
                }
            }
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 6, 15).unwrap()
    }

    #[test]
    fn empty_query_restructures_to_empty_node() {
        assert_eq!(restructure(cst::Query::Empty, today()), Node::Empty);
    }

    #[test]
    fn keyword_value_distributes_over_implicit_and() {
        let parsed = parser::parse("title quantum gravity");
        let node = restructure(parsed, today());
        match node {
            Node::AndOp(l, r) => {
                assert!(matches!(*l, Node::KeywordOp { ref keyword, .. } if keyword == "title"));
                assert!(matches!(*r, Node::KeywordOp { ref keyword, .. } if keyword == "title"));
            }
            other => panic!("expected AndOp, got {:?}", other),
        }
    }

    #[test]
    fn relative_date_specifier_resolves_against_reference_date() {
        let parsed = parser::parse("date this month");
        let node = restructure(parsed, today());
        match node {
            Node::KeywordOp { keyword, value } => {
                assert_eq!(keyword, "date");
                assert_eq!(*value, Node::ValueOp(Value::Simple("2020-06-15".to_string())));
            }
            other => panic!("expected KeywordOp, got {:?}", other),
        }
    }

    #[test]
    fn journal_followed_by_volume_folds_into_single_keyword() {
        let parsed = parser::parse("journal Phys.Rev.D and volume 94");
        let node = restructure(parsed, today());
        match node {
            Node::KeywordOp { keyword, value } => {
                assert_eq!(keyword, "journal");
                assert_eq!(*value, Node::ValueOp(Value::Simple("Phys.Rev.D,94".to_string())));
            }
            other => panic!("expected folded journal KeywordOp, got {:?}", other),
        }
    }
}
