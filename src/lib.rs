//! A compiler from SPIRES/Invenio-style literature search queries to a
//! search-engine query DSL.
//!
//! The pipeline is three stages, each its own module: [`parser`] turns
//! the input string into a [`cst::Query`], [`restructure`] turns that
//! into the canonical [`ast::Node`], and [`emit`] turns the AST into a
//! `serde_json::Value` document ready to hand to the search engine.
//! [`driver::parse_query`] is the one function most callers need; it
//! wires the three stages together and guarantees it never panics or
//! returns an error, degrading to a broad full-text query when the
//! input can't be meaningfully compiled.

pub mod ast;
pub mod cst;
pub mod dates;
pub mod driver;
pub mod emit;
pub mod keywords;
pub mod names;
pub mod parser;
pub mod restructure;

pub use driver::{parse_query, parse_query_at};
