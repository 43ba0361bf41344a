//! The concrete syntax tree produced directly by [`crate::parser`].
//!
//! This mirrors the shape of the grammar rather than the semantics of
//! the query: several of these node kinds collapse to the same
//! [`crate::ast::Node`] variant once restructured (an `InvenioKeywordQuery`
//! and a `SpiresKeywordQuery` both become a `KeywordOp`, for instance,
//! since they differ only in which separator token the user typed).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComplexValueKind {
    PartialMatch,
    ExactMatch,
    Regex,
}

/// A leaf value as produced by the grammar, before classification is
/// pushed into [`crate::ast::Value`].
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Simple(String),
    Complex(ComplexValueKind, String),
    /// `start->end`.
    Range(Box<RawValue>, Box<RawValue>),
    GreaterThan(Box<RawValue>),
    GreaterEqual(Box<RawValue>),
    LessThan(Box<RawValue>),
    LessEqual(Box<RawValue>),
    /// Bare `-value` appearing inside a value position (not a query-level
    /// boolean operator), e.g. the second operand of `author A -author B`.
    Negation(Box<RawValue>),
    /// Two values joined by an explicit or implicit boolean operator
    /// without an intervening keyword, e.g. `title foo and bar`.
    Boolean(Box<RawValue>, Option<BoolOp>, Box<RawValue>),
}

/// A parsed query, the root node produced by [`crate::parser::parse`].
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Empty,
    /// Input that could not be parsed at all; carried as the original
    /// whitespace-split words.
    Malformed(Vec<String>),
    Find(Box<Expression>),
    /// A successfully parsed expression followed by text that could not
    /// be parsed as part of it.
    WithMalformedPart(Box<Expression>, Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Not(Box<Expression>),
    Parenthesized(Box<Expression>),
    /// `keyword:(sub-expression)` for the nestable keywords.
    Nested(String, Box<Expression>),
    Boolean(Box<Expression>, Option<BoolOp>, Box<Expression>),
    /// `keyword:value` / `keyword value` / `keyword=value`; the
    /// distinction between SPIRES and Invenio separator syntax is
    /// immaterial past this point.
    Keyword(String, Box<RawValue>),
    Simple(Box<RawValue>),
}
