//! The stateful recursive-descent parser.
//!
//! Tokenization is context-free; interpretation is not. The parser
//! carries two boolean flags, set only while descending into a
//! parenthesized value position, that relax which tokens are accepted
//! as bare terminals. This mirrors `InspireParserState` from the
//! original grammar: a keyword or boolean word that would normally be
//! rejected as a terminal (because it would otherwise be ambiguous with
//! the start of a new keyword query or boolean expression) is accepted
//! once we know we're inside an explicitly parenthesized value list,
//! since the parentheses already disambiguate the boundary.

use crate::cst::{BoolOp, ComplexValueKind, Expression, Query, RawValue};
use crate::keywords;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub remainder: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (at {:?})", self.message, self.remainder)
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Colon,
    LParen,
    RParen,
    Quoted(ComplexValueKind, String),
    Op(&'static str), // ">", "<", ">=", "<=", "->"
}

fn tokenize(input: &str) -> Vec<Token> {
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    let mut tokens = Vec::new();

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        match c {
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ':' => {
                tokens.push(Token::Colon);
                i += 1;
            }
            '\'' | '"' | '/' => {
                let delim = c;
                let kind = match delim {
                    '\'' => ComplexValueKind::PartialMatch,
                    '"' => ComplexValueKind::ExactMatch,
                    _ => ComplexValueKind::Regex,
                };
                let start = i + 1;
                let mut j = start;
                while j < chars.len() && chars[j] != delim {
                    j += 1;
                }
                let content: String = chars[start..j.min(chars.len())].iter().collect();
                tokens.push(Token::Quoted(kind, content));
                i = j + 1;
            }
            '-' if matches!(chars.get(i + 1), Some('>')) => {
                tokens.push(Token::Op("->"));
                i += 2;
            }
            '>' if matches!(chars.get(i + 1), Some('=')) => {
                tokens.push(Token::Op(">="));
                i += 2;
            }
            '<' if matches!(chars.get(i + 1), Some('=')) => {
                tokens.push(Token::Op("<="));
                i += 2;
            }
            '>' => {
                tokens.push(Token::Op(">"));
                i += 1;
            }
            '<' => {
                tokens.push(Token::Op("<"));
                i += 1;
            }
            '-' => {
                // A lone '-' (not part of "->") is its own token: either the
                // NOT boolean word or a value negation marker.
                tokens.push(Token::Word("-".to_string()));
                i += 1;
            }
            _ => {
                let start = i;
                let mut j = i;
                while j < chars.len() {
                    let cj = chars[j];
                    if cj.is_whitespace() || matches!(cj, '(' | ')' | ':' | '\'' | '"' | '/') {
                        break;
                    }
                    if cj == '-' && matches!(chars.get(j + 1), Some('>')) {
                        break;
                    }
                    j += 1;
                }
                let word: String = chars[start..j].iter().collect();
                tokens.push(Token::Word(word));
                i = j;
            }
        }
    }

    tokens
}

#[derive(Default, Clone, Copy)]
struct ParserState {
    in_paren_terminal: bool,
    in_paren_simple_value: bool,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    state: ParserState,
}

type PResult<T> = Result<T, ()>;

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0, state: ParserState::default() }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// Top-level entry: a sequence of boolean-combined expressions.
    fn parse_expression(&mut self) -> PResult<Expression> {
        let mut left = self.parse_unary()?;
        loop {
            match self.peek() {
                Some(Token::Word(w)) if keywords::is_boolean_word(w) && matches!(w.to_lowercase().as_str(), "and" | "+" | "&" | "or" | "|") => {
                    let op = if matches!(w.to_lowercase().as_str(), "and" | "+" | "&") {
                        BoolOp::And
                    } else {
                        BoolOp::Or
                    };
                    // A dangling or doubled-up operator (nothing sensible
                    // follows it) isn't consumed: it's left for the
                    // caller to report as a malformed tail instead of
                    // failing the whole parse.
                    let checkpoint = self.pos;
                    self.advance();
                    match self.parse_unary() {
                        Ok(right) => left = Expression::Boolean(Box::new(left), Some(op), Box::new(right)),
                        Err(()) => {
                            self.pos = checkpoint;
                            break;
                        }
                    }
                }
                Some(Token::RParen) | None => break,
                _ => {
                    // Implicit AND: another expression follows directly.
                    let checkpoint = self.pos;
                    match self.parse_unary() {
                        Ok(right) => left = Expression::Boolean(Box::new(left), None, Box::new(right)),
                        Err(()) => {
                            self.pos = checkpoint;
                            break;
                        }
                    }
                }
            }
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> PResult<Expression> {
        if let Some(Token::Word(w)) = self.peek() {
            if w.eq_ignore_ascii_case("not") || w == "-" {
                self.advance();
                let inner = self.parse_unary()?;
                return Ok(Expression::Not(Box::new(inner)));
            }
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> PResult<Expression> {
        if matches!(self.peek(), Some(Token::LParen)) {
            self.advance();
            let prev = self.state;
            self.state.in_paren_terminal = true;
            let inner = self.parse_expression();
            self.state = prev;
            let inner = inner?;
            if matches!(self.peek(), Some(Token::RParen)) {
                self.advance();
            }
            return Ok(Expression::Parenthesized(Box::new(inner)));
        }

        // keyword:(...) or keyword:value / keyword value
        if let Some(Token::Word(w)) = self.peek() {
            if let Some(canonical) = keywords::canonicalize(w) {
                let has_colon = matches!(self.peek_at(1), Some(Token::Colon));
                let followed_by_value = has_colon || self.starts_value_at(1);
                if followed_by_value {
                    let consumed_colon = has_colon;
                    self.advance(); // keyword
                    if consumed_colon {
                        self.advance(); // ':'
                    }

                    if keywords::NESTABLE_KEYWORDS.contains(canonical) && matches!(self.peek(), Some(Token::LParen)) {
                        self.advance();
                        let inner = self.parse_expression()?;
                        if matches!(self.peek(), Some(Token::RParen)) {
                            self.advance();
                        }
                        return Ok(Expression::Nested(canonical.to_string(), Box::new(inner)));
                    }

                    let value = self.parse_value()?;
                    return Ok(Expression::Keyword(canonical.to_string(), Box::new(value)));
                }
                // A canonical keyword with no value following it at all
                // (end of input, a closing paren, or another operator
                // word) is a dangling keyword, not a valid bare search
                // term: fail the parse rather than silently treat the
                // keyword name itself as literal text.
                return Err(());
            }
        }

        let value = self.parse_value()?;
        Ok(Expression::Simple(Box::new(value)))
    }

    /// Looks ahead (without consuming) to see whether a value expression
    /// starts at `self.pos + offset`, used to decide whether a canonical
    /// keyword token is being used as a keyword or as a bare value.
    fn starts_value_at(&self, offset: usize) -> bool {
        match self.tokens.get(self.pos + offset) {
            Some(Token::Word(w)) => !keywords::is_boolean_word(w) && self.tokens.get(self.pos + offset + 1) != Some(&Token::Colon),
            Some(Token::Quoted(_, _)) | Some(Token::Op(_)) => true,
            _ => false,
        }
    }

    /// True if the token at `idx` starts a new keyword query (a
    /// canonical keyword immediately followed by `:` or by a value),
    /// used to stop a value-level boolean chain before it swallows what
    /// should be a sibling keyword query instead.
    fn is_keyword_start(&self, idx: usize) -> bool {
        let Some(Token::Word(w)) = self.tokens.get(idx) else { return false };
        if keywords::canonicalize(w).is_none() {
            return false;
        }
        if matches!(self.tokens.get(idx + 1), Some(Token::Colon)) {
            return true;
        }
        match self.tokens.get(idx + 1) {
            Some(Token::Word(w2)) => !keywords::is_boolean_word(w2) && self.tokens.get(idx + 2) != Some(&Token::Colon),
            Some(Token::Quoted(_, _)) | Some(Token::Op(_)) => true,
            _ => false,
        }
    }

    fn parse_value(&mut self) -> PResult<RawValue> {
        let first = self.parse_comparison_or_simple()?;
        if matches!(self.peek(), Some(Token::Op("->"))) {
            self.advance();
            let second = self.parse_comparison_or_simple()?;
            return Ok(RawValue::Range(Box::new(first), Box::new(second)));
        }

        let mut left = first;
        loop {
            match self.peek() {
                Some(Token::Word(w)) if w == "-" => {
                    // Negation only binds a single following value unit.
                    self.advance();
                    let right = self.parse_comparison_or_simple()?;
                    left = RawValue::Boolean(Box::new(left), None, Box::new(RawValue::Negation(Box::new(right))));
                }
                Some(Token::Word(w)) if keywords::is_boolean_word(w) && matches!(w.to_lowercase().as_str(), "and" | "+" | "&" | "or" | "|") => {
                    // If the operator introduces a new keyword query
                    // ("journal X and volume Y"), or isn't actually
                    // followed by another value unit at all (a trailing
                    // or doubled-up operator), leave it where it is for
                    // the top-level expression parser / malformed-tail
                    // handling instead of folding it into this keyword's
                    // value.
                    let next_is_value_unit = matches!(
                        self.tokens.get(self.pos + 1),
                        Some(Token::Word(w2)) if !keywords::is_boolean_word(w2)
                    ) || matches!(self.tokens.get(self.pos + 1), Some(Token::Quoted(_, _)) | Some(Token::Op(_)));
                    if self.is_keyword_start(self.pos + 1) || !next_is_value_unit {
                        break;
                    }
                    let lower = w.to_lowercase();
                    let op = if matches!(lower.as_str(), "and" | "+" | "&") {
                        Some(BoolOp::And)
                    } else {
                        Some(BoolOp::Or)
                    };
                    self.advance();
                    let right = self.parse_comparison_or_simple()?;
                    left = RawValue::Boolean(Box::new(left), op, Box::new(right));
                }
                _ => {
                    if self.value_continues() {
                        let right = self.parse_comparison_or_simple()?;
                        left = RawValue::Boolean(Box::new(left), None, Box::new(right));
                    } else {
                        break;
                    }
                }
            }
        }
        Ok(left)
    }

    /// True if the upcoming tokens still look like part of the same value
    /// run (a terminal word, not a new keyword or a closing paren).
    fn value_continues(&self) -> bool {
        match self.peek() {
            None | Some(Token::RParen) | Some(Token::LParen) => false,
            Some(Token::Word(w)) => {
                if keywords::is_boolean_word(w) {
                    return false;
                }
                if matches!(self.peek_at(1), Some(Token::Colon)) {
                    return false;
                }
                if keywords::is_canonical_keyword(w) && !self.state.in_paren_terminal && !self.state.in_paren_simple_value {
                    return false;
                }
                // A keyword alias (shortened or canonical) directly
                // followed by a ComplexValue with no colon ("t 'bar'") is
                // the start of a new keyword:value query, not a bare word
                // to fold into the current value run: back up before it
                // rather than swallowing the quoted value as this
                // keyword's own. Mirrors the grammar's ComplexValue
                // recovery rule.
                if keywords::canonicalize(w).is_some()
                    && matches!(self.peek_at(1), Some(Token::Quoted(_, _)))
                    && !self.state.in_paren_terminal
                    && !self.state.in_paren_simple_value
                {
                    return false;
                }
                true
            }
            Some(Token::Quoted(_, _)) | Some(Token::Op(_)) => true,
        }
    }

    fn parse_comparison_or_simple(&mut self) -> PResult<RawValue> {
        match self.peek() {
            Some(Token::Op(">=")) => {
                self.advance();
                let v = self.parse_simple_term()?;
                Ok(RawValue::GreaterEqual(Box::new(v)))
            }
            Some(Token::Op(">")) => {
                self.advance();
                let v = self.parse_simple_term()?;
                Ok(RawValue::GreaterThan(Box::new(v)))
            }
            Some(Token::Op("<=")) => {
                self.advance();
                let v = self.parse_simple_term()?;
                Ok(RawValue::LessEqual(Box::new(v)))
            }
            Some(Token::Op("<")) => {
                self.advance();
                let v = self.parse_simple_term()?;
                Ok(RawValue::LessThan(Box::new(v)))
            }
            Some(Token::Word(w)) if w.eq_ignore_ascii_case("after") => {
                self.advance();
                let v = self.parse_simple_term()?;
                Ok(RawValue::GreaterEqual(Box::new(v)))
            }
            Some(Token::Word(w)) if w.eq_ignore_ascii_case("before") => {
                self.advance();
                let v = self.parse_simple_term()?;
                Ok(RawValue::LessEqual(Box::new(v)))
            }
            _ => {
                let v = self.parse_simple_term()?;
                if let RawValue::Simple(s) = &v {
                    if let Some(stripped) = s.strip_suffix('+') {
                        if !stripped.is_empty() {
                            return Ok(RawValue::GreaterEqual(Box::new(RawValue::Simple(stripped.to_string()))));
                        }
                    }
                    // Trailing '-' is the symmetric <= form (e.g. "cited 1-").
                    // The tokenizer already splits words at whitespace/parens,
                    // so a suffix here is always followed by whitespace, ')'
                    // or end of input.
                    if let Some(stripped) = s.strip_suffix('-') {
                        if !stripped.is_empty() {
                            return Ok(RawValue::LessEqual(Box::new(RawValue::Simple(stripped.to_string()))));
                        }
                    }
                }
                Ok(v)
            }
        }
    }

    fn parse_simple_term(&mut self) -> PResult<RawValue> {
        match self.peek() {
            // A bare boolean-operator word is never itself a value: it
            // always signals either a combinator (already handled by the
            // callers above) or a dangling operator that should surface
            // as a malformed tail, not be swallowed as literal text.
            Some(Token::Word(w)) if keywords::is_boolean_word(w) => Err(()),
            _ => {}
        }
        match self.advance() {
            Some(Token::Word(w)) => Ok(RawValue::Simple(w)),
            Some(Token::Quoted(kind, content)) => Ok(RawValue::Complex(kind, content)),
            _ => Err(()),
        }
    }
}

/// Strips a leading `find`/`fin`/`fi`/`f` token (the SPIRES query prefix),
/// case-insensitively, if present and followed by more input.
fn strip_query_prefix(input: &str) -> &str {
    let trimmed = input.trim_start();
    for prefix in ["find", "fin", "fi", "f"] {
        if trimmed.len() > prefix.len() {
            let (head, rest) = trimmed.split_at(prefix.len());
            if head.eq_ignore_ascii_case(prefix) && rest.starts_with(char::is_whitespace) {
                return rest.trim_start();
            }
        }
    }
    trimmed
}

/// Parses `input` into a [`Query`]. Never panics: unparseable trailing
/// text becomes a [`Query::WithMalformedPart`], and input that doesn't
/// parse at all becomes [`Query::Malformed`].
pub fn parse(input: &str) -> Query {
    let input = strip_query_prefix(input);
    if input.trim().is_empty() {
        return Query::Empty;
    }

    let tokens = tokenize(input);
    let mut parser = Parser::new(tokens);

    match parser.parse_expression() {
        Ok(expr) => {
            if parser.pos >= parser.tokens.len() {
                Query::Find(Box::new(expr))
            } else {
                let remainder = remainder_words(&parser.tokens[parser.pos..]);
                Query::WithMalformedPart(Box::new(expr), remainder)
            }
        }
        Err(()) => Query::Malformed(input.split_whitespace().map(str::to_string).collect()),
    }
}

fn remainder_words(tokens: &[Token]) -> Vec<String> {
    tokens
        .iter()
        .map(|t| match t {
            Token::Word(w) => w.clone(),
            Token::Colon => ":".to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
            Token::Op(op) => op.to_string(),
            Token::Quoted(ComplexValueKind::PartialMatch, s) => format!("'{}'", s),
            Token::Quoted(ComplexValueKind::ExactMatch, s) => format!("\"{}\"", s),
            Token::Quoted(ComplexValueKind::Regex, s) => format!("/{}/", s),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_parses_to_empty_query() {
        assert_eq!(parse(""), Query::Empty);
        assert_eq!(parse("   "), Query::Empty);
    }

    #[test]
    fn strips_find_prefix() {
        match parse("find author smith") {
            Query::Find(_) => {}
            other => panic!("expected Find, got {:?}", other),
        }
    }

    #[test]
    fn simple_keyword_query_parses() {
        match parse("author smith") {
            Query::Find(expr) => match *expr {
                Expression::Keyword(k, _) => assert_eq!(k, "author"),
                other => panic!("expected Keyword, got {:?}", other),
            },
            other => panic!("expected Find, got {:?}", other),
        }
    }

    #[test]
    fn spires_colon_syntax_parses() {
        match parse("t:\"exact title\"") {
            Query::Find(expr) => match *expr {
                Expression::Keyword(k, v) => {
                    assert_eq!(k, "title");
                    assert_eq!(*v, RawValue::Complex(ComplexValueKind::ExactMatch, "exact title".to_string()));
                }
                other => panic!("expected Keyword, got {:?}", other),
            },
            other => panic!("expected Find, got {:?}", other),
        }
    }

    #[test]
    fn boolean_and_or_combine_expressions() {
        match parse("author smith and title gravity") {
            Query::Find(expr) => match *expr {
                Expression::Boolean(_, Some(BoolOp::And), _) => {}
                other => panic!("expected explicit And, got {:?}", other),
            },
            other => panic!("expected Find, got {:?}", other),
        }
    }

    #[test]
    fn garbage_after_valid_query_is_malformed_tail() {
        match parse("author smith ) ) (") {
            Query::WithMalformedPart(_, tail) => assert!(!tail.is_empty()),
            other => panic!("expected WithMalformedPart, got {:?}", other),
        }
    }

    #[test]
    fn keyword_with_nothing_following_is_entirely_malformed() {
        match parse("title and foo") {
            Query::Malformed(words) => assert_eq!(words, vec!["title", "and", "foo"]),
            other => panic!("expected Malformed, got {:?}", other),
        }
    }

    #[test]
    fn doubled_operator_leaves_a_malformed_tail() {
        match parse("title gravity and and") {
            Query::WithMalformedPart(expr, tail) => {
                assert_eq!(tail, vec!["and", "and"]);
                match *expr {
                    Expression::Keyword(k, _) => assert_eq!(k, "title"),
                    other => panic!("expected Keyword, got {:?}", other),
                }
            }
            other => panic!("expected WithMalformedPart, got {:?}", other),
        }
    }

    #[test]
    fn range_operator_parses() {
        match parse("date 2015->2017") {
            Query::Find(expr) => match *expr {
                Expression::Keyword(k, v) => {
                    assert_eq!(k, "date");
                    assert_eq!(*v, RawValue::Range(Box::new(RawValue::Simple("2015".into())), Box::new(RawValue::Simple("2017".into()))));
                }
                other => panic!("expected Keyword, got {:?}", other),
            },
            other => panic!("expected Find, got {:?}", other),
        }
    }

    #[test]
    fn trailing_plus_sign_parses_as_greater_equal() {
        match parse("cited 1+") {
            Query::Find(expr) => match *expr {
                Expression::Keyword(k, v) => {
                    assert_eq!(k, "topcite");
                    assert_eq!(*v, RawValue::GreaterEqual(Box::new(RawValue::Simple("1".into()))));
                }
                other => panic!("expected Keyword, got {:?}", other),
            },
            other => panic!("expected Find, got {:?}", other),
        }
    }

    #[test]
    fn shortened_keyword_before_complex_value_starts_a_new_query() {
        match parse("author foo t 'bar'") {
            Query::Find(expr) => match *expr {
                Expression::Boolean(l, None, r) => {
                    match *l {
                        Expression::Keyword(k, v) => {
                            assert_eq!(k, "author");
                            assert_eq!(*v, RawValue::Simple("foo".to_string()));
                        }
                        other => panic!("expected Keyword, got {:?}", other),
                    }
                    match *r {
                        Expression::Keyword(k, v) => {
                            assert_eq!(k, "title");
                            assert_eq!(*v, RawValue::Complex(ComplexValueKind::PartialMatch, "bar".to_string()));
                        }
                        other => panic!("expected Keyword, got {:?}", other),
                    }
                }
                other => panic!("expected implicit-AND Boolean, got {:?}", other),
            },
            other => panic!("expected Find, got {:?}", other),
        }
    }

    #[test]
    fn trailing_minus_sign_parses_as_less_equal() {
        match parse("cited 1-") {
            Query::Find(expr) => match *expr {
                Expression::Keyword(k, v) => {
                    assert_eq!(k, "topcite");
                    assert_eq!(*v, RawValue::LessEqual(Box::new(RawValue::Simple("1".into()))));
                }
                other => panic!("expected Keyword, got {:?}", other),
            },
            other => panic!("expected Find, got {:?}", other),
        }
    }
}
