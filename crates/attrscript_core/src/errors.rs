//! Shared user-facing error messages used by the syntax frontend and the interpreter.
//!
//! Keeping the spellings in one place means diagnostics and runtime failures stay aligned.

pub use crate::strings::{INDEX_OUT_OF_RANGE_MSG, SLICE_STEP_ZERO_MSG};

/// Message used when an integer operation overflows the 64-bit range.
pub const INT_OVERFLOW_MSG: &str = "integer overflow";

/// Message used for `x / 0`, `x // 0` and `x % 0`.
pub const DIVISION_BY_ZERO_MSG: &str = "division by zero";

/// Message used when a frozen list or dict is mutated.
pub const FROZEN_MUTATION_MSG: &str = "cannot mutate a frozen value";
