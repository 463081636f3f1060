//! Provide shared, pure semantic helpers and canonical language vocabulary for the attrscript evaluator.
//!
//! This crate is intentionally small and dependency-free. It contains deterministic helpers that both:
//! - the syntax frontend can use to classify tokens (keywords/operators/punctuation), and
//! - the interpreter can use to apply numeric and string semantics consistently.
//!
//! ## Notes
//!
//! - This is a “semantic core” crate: **no IO**, no global state, and no interpreter-specific types.
//! - Current scope: numeric policy (Starlark/Python-like semantics), string semantics (Unicode-scalar indexing/slicing,
//!   shared error messages), and canonical language vocabulary.

pub mod errors;
pub mod lang;
pub mod strings;

/// Represent the numeric category used by semantic policy.
///
/// This is not a concrete runtime type. It exists to describe “int-like” and “float-like” behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericTy {
    Int,
    Float,
}

/// Represent a numeric operator subject to promotion rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericOp {
    Add,
    Sub,
    Mul,
    Div,
    /// `//` (floor division): returns `Int` for `Int // Int`, otherwise `Float`.
    FloorDiv,
    Mod,
}

/// Determine the numeric result category for a binary operation.
///
/// ## Parameters
/// - `op`: the numeric operator.
/// - `lhs`: numeric category of the left operand.
/// - `rhs`: numeric category of the right operand.
///
/// ## Returns
/// - (`NumericTy`): `Int` or `Float`.
///
/// ## Notes
/// - `/` always yields `Float` (even `Int / Int`).
/// - `//`, `%`, `+`, `-`, `*` yield `Float` if either operand is `Float`, otherwise `Int`.
///
/// ## Examples
/// ```rust
/// use attrscript_core::{result_numeric_type, NumericOp, NumericTy};
/// assert_eq!(result_numeric_type(NumericOp::Div, NumericTy::Int, NumericTy::Int), NumericTy::Float);
/// assert_eq!(result_numeric_type(NumericOp::Mod, NumericTy::Int, NumericTy::Int), NumericTy::Int);
/// ```
pub fn result_numeric_type(op: NumericOp, lhs: NumericTy, rhs: NumericTy) -> NumericTy {
    match op {
        NumericOp::Div => NumericTy::Float,
        NumericOp::FloorDiv | NumericOp::Mod | NumericOp::Add | NumericOp::Sub | NumericOp::Mul => {
            if lhs == NumericTy::Float || rhs == NumericTy::Float {
                NumericTy::Float
            } else {
                NumericTy::Int
            }
        }
    }
}

// =====================================================================
// Runtime-facing numeric helpers
// =====================================================================

/// Python-like modulo for integers (sign of divisor).
///
/// ## Parameters
/// - `a`: dividend
/// - `b`: divisor (must be non-zero)
///
/// ## Returns
/// - (`i64`): remainder with the sign of the divisor.
#[inline]
pub fn py_mod_i64(a: i64, b: i64) -> i64 {
    debug_assert!(b != 0);
    // `wrapping_rem` keeps `i64::MIN % -1` from trapping.
    let r = a.wrapping_rem(b);
    if (r > 0 && b < 0) || (r < 0 && b > 0) { r + b } else { r }
}

/// Python-like floor division for integers (rounds toward negative infinity).
///
/// ## Returns
/// - `None` when the quotient overflows (`i64::MIN // -1`).
#[inline]
pub fn py_floor_div_i64(a: i64, b: i64) -> Option<i64> {
    debug_assert!(b != 0);
    let q = a.checked_div(b)?;
    let r = a % b;
    if (r > 0 && b < 0) || (r < 0 && b > 0) { q.checked_sub(1) } else { Some(q) }
}

/// Python-like modulo for floats (sign of divisor).
#[inline]
pub fn py_mod_f64(a: f64, b: f64) -> f64 {
    debug_assert!(b != 0.0);
    let r = a % b;
    if (r > 0.0 && b < 0.0) || (r < 0.0 && b > 0.0) {
        r + b
    } else {
        r
    }
}

/// Python-like floor division for floats.
#[inline]
pub fn py_floor_div_f64(a: f64, b: f64) -> f64 {
    (a / b).floor()
}

/// Format a float the way Starlark prints it: the shortest digits that round-trip, in exponent form when the decimal
/// exponent is below -4 or at least 21, otherwise as a decimal that always carries a `.`.
///
/// ## Examples
/// ```rust
/// use attrscript_core::format_float;
/// assert_eq!(format_float(4.0), "4.0");
/// assert_eq!(format_float(0.25), "0.25");
/// assert_eq!(format_float(1e21), "1e+21");
/// ```
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "+inf".to_string() } else { "-inf".to_string() };
    }

    let sci = format!("{:e}", f);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };
    if f != 0.0 && !(-4..21).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exp.unsigned_abs());
    }

    let mut out = format!("{}", f);
    if !out.contains('.') {
        out.push_str(".0");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_div_always_float() {
        assert_eq!(
            result_numeric_type(NumericOp::Div, NumericTy::Int, NumericTy::Int),
            NumericTy::Float
        );
        assert_eq!(
            result_numeric_type(NumericOp::Div, NumericTy::Float, NumericTy::Int),
            NumericTy::Float
        );
    }

    #[test]
    fn test_mixed_operands_promote() {
        assert_eq!(
            result_numeric_type(NumericOp::Add, NumericTy::Int, NumericTy::Float),
            NumericTy::Float
        );
        assert_eq!(
            result_numeric_type(NumericOp::FloorDiv, NumericTy::Int, NumericTy::Int),
            NumericTy::Int
        );
    }

    #[test]
    fn test_floor_semantics() {
        assert_eq!(py_floor_div_i64(7, 2), Some(3));
        assert_eq!(py_floor_div_i64(-7, 2), Some(-4));
        assert_eq!(py_floor_div_i64(i64::MIN, -1), None);
        assert_eq!(py_mod_i64(-7, 2), 1);
        assert_eq!(py_mod_i64(7, -2), -1);
        assert_eq!(py_mod_f64(-1.5, 1.0), 0.5);
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(-2.5), "-2.5");
        assert_eq!(format_float(f64::INFINITY), "+inf");
        assert_eq!(format_float(1e20), "100000000000000000000.0");
        assert_eq!(format_float(1e16), "10000000000000000.0");
        assert_eq!(format_float(1e21), "1e+21");
        assert_eq!(format_float(-1.5e300), "-1.5e+300");
        assert_eq!(format_float(1.23e-7), "1.23e-07");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(-0.0), "-0.0");
    }
}
