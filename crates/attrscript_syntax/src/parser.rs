//! Parser for attrscript
//!
//! Converts a token stream into a [`Module`] AST.
//!
//! ## Examples
//!
//! ```rust
//! use attrscript_syntax::{lexer, parser};
//!
//! let source = "def double(x):\n    return x * 2\n";
//! let tokens = lexer::lex(source).unwrap();
//! let module = parser::parse(&tokens).unwrap();
//! assert_eq!(module.function_names(), vec!["double"]);
//! ```

use crate::ast::*;
use crate::diagnostics::CompileError;
use crate::lexer::{Token, TokenKind};
use attrscript_core::lang::keywords::KeywordId;
use attrscript_core::lang::operators::{self, OperatorId};
use attrscript_core::lang::punctuation::PunctuationId;

// NOTE: This module is split across multiple files using `include!` to keep all parser
// methods in the same Rust module (preserving privacy + call patterns) while avoiding
// a single large source file.

include!("parser/core.rs");
include!("parser/helpers.rs");
include!("parser/stmts.rs");
include!("parser/expr.rs");
include!("parser/util.rs");
include!("parser/api.rs");
include!("parser/tests.rs");
