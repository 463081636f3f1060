//! Syntax frontend for attrscript: lexer, parser, AST, diagnostics.
//!
//! attrscript is the Starlark dialect used to compute attribute values from build-graph metadata. This crate turns
//! source text into an AST; evaluation lives in the `attrscript` crate.
//!
//! ## Notes
//! - This crate is "syntax-only": it does not resolve names or evaluate anything.
//! - Vocabulary identity (keywords/operators/punctuation) comes from `attrscript_core::lang` registries.
//!
//! ## Examples
//! ```rust
//! use attrscript_syntax::{lexer, parser};
//!
//! let tokens = lexer::lex("x = 1\n").unwrap();
//! let module = parser::parse(&tokens).unwrap();
//! assert_eq!(module.stmts.len(), 1);
//! ```

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod token_helpers;

pub use diagnostics::CompileError;

/// Lex and parse a source string in one step.
///
/// ## Errors
/// - Every lexer error, or the first parser error(s) if lexing succeeded.
pub fn parse_source(source: &str) -> Result<ast::Module, Vec<CompileError>> {
    let tokens = lexer::lex(source)?;
    parser::parse(&tokens)
}
