#![forbid(unsafe_code)]
//! attrscript: computed attribute values for build target graphs.
//!
//! Attributes in a target graph can carry a computed value: a function in a script written in a Starlark
//! dialect, or an inline snippet. This crate provides the target model and JSON manifests, the interpreter, the
//! read-only views scripts get of attributes and targets, the command runner behind `run(...)`, layered
//! configuration, and the CLI.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Script errors**: A failing script is an `Err`, never a panic. Runaway scripts are stopped by the step and
//!   call-depth limits in [`config::LimitsConfig`].

pub mod cli;
pub mod computed;
pub mod config;
pub mod interp;
pub mod model;
pub mod proxy;
pub mod runner;

pub use attrscript_syntax::{ast, diagnostics, lexer, parser};

pub use computed::{ComputeError, eval_computed_attribute, script_from_inline};
pub use config::EvalConfig;
