//! Attrscript language vocabulary registries.
//!
//! This module is the "front door" for language-level vocabulary: reserved keywords, operators,
//! punctuation and builtin function names.
//!
//! Callers work with **stable IDs** (e.g. `KeywordId`, `OperatorId`) and look up spellings/metadata via registry
//! tables instead of comparing strings across the lexer, parser and interpreter.
//!
//! ## Notes
//! - Registries are **pure**: no AST types, no IO, no side effects.
//! - Every table is stored in enum declaration order so `info_for` is a plain index. The guardrail tests in
//!   `tests/lang_registry_guardrails.rs` keep that ordering honest.
//!
//! ## Examples
//! ```rust
//! use attrscript_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("def"), Some(KeywordId::Def));
//! assert_eq!(keywords::as_str(KeywordId::Def), "def");
//! ```

pub mod builtins;
pub mod keywords;
pub mod operators;
pub mod punctuation;
