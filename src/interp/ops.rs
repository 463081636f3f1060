//! Operators: arithmetic, comparison, membership, indexing and slicing.
//!
//! Numeric policy (promotion, floor division, modulo sign) comes from `attrscript_core` so it stays in one place.

use std::cmp::Ordering;
use std::rc::Rc;

use attrscript_core::errors::{DIVISION_BY_ZERO_MSG, INT_OVERFLOW_MSG};
use attrscript_core::strings::{self, AccessError};
use attrscript_core::{NumericOp, NumericTy, py_floor_div_f64, py_floor_div_i64, py_mod_f64, py_mod_i64, result_numeric_type};
use attrscript_syntax::ast::{BinaryOp, UnaryOp};

use super::builtins::MAX_RANGE_LEN;
use super::error::EvalError;
use super::value::{List, Value};

/// Containers nested deeper than this compare unequal, or fail to order, instead of recursing further.
const MAX_COMPARE_DEPTH: usize = 64;

fn overflow() -> EvalError {
    EvalError::new(INT_OVERFLOW_MSG)
}

fn access(err: AccessError) -> EvalError {
    EvalError::new(err.message())
}

fn unsupported(op: BinaryOp, l: &Value, r: &Value) -> EvalError {
    EvalError::new(format!("unknown binary op: {} {} {}", l.type_name(), op, r.type_name()))
}

pub fn equals(a: &Value, b: &Value) -> bool {
    equals_at(a, b, 0)
}

fn equals_at(a: &Value, b: &Value, depth: usize) -> bool {
    if depth > MAX_COMPARE_DEPTH {
        return false;
    }
    let seq_eq = |x: &[Value], y: &[Value]| x.len() == y.len() && x.iter().zip(y).all(|(p, q)| equals_at(p, q, depth + 1));
    match (a, b) {
        (Value::None, Value::None) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => (*x as f64) == *y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::List(x), Value::List(y)) => Rc::ptr_eq(x, y) || seq_eq(&x.items(), &y.items()),
        (Value::Tuple(x), Value::Tuple(y)) => seq_eq(x, y),
        (Value::Dict(x), Value::Dict(y)) => {
            Rc::ptr_eq(x, y)
                || (x.len() == y.len()
                    && x.entries().iter().all(|(k, v)| {
                        y.get(k)
                            .ok()
                            .flatten()
                            .is_some_and(|other| equals_at(v, &other, depth + 1))
                    }))
        }
        (Value::Function(x), Value::Function(y)) => Rc::ptr_eq(x, y),
        (Value::Builtin(x), Value::Builtin(y)) => Rc::ptr_eq(x, y),
        (Value::Struct(x), Value::Struct(y)) => {
            x.fields.len() == y.fields.len()
                && x.fields
                    .iter()
                    .zip(&y.fields)
                    .all(|((kx, vx), (ky, vy))| kx == ky && equals_at(vx, vy, depth + 1))
        }
        (Value::Attr(x), Value::Attr(y)) => x.same_as(y),
        (Value::Target(x), Value::Target(y)) => x.same_as(y),
        _ => false,
    }
}

/// Order two values. Only numbers, strings, bools and same-kind sequences are ordered.
pub fn compare(a: &Value, b: &Value) -> Result<Ordering, EvalError> {
    compare_at(a, b, 0)
}

fn compare_at(a: &Value, b: &Value, depth: usize) -> Result<Ordering, EvalError> {
    if depth > MAX_COMPARE_DEPTH {
        return Err(EvalError::new("comparison nested too deeply"));
    }
    let incomparable = || EvalError::new(format!("cannot compare {} with {}", a.type_name(), b.type_name()));
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Ok(x.cmp(y)),
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let (x, y) = (as_f64(a), as_f64(b));
            x.partial_cmp(&y).ok_or_else(incomparable)
        }
        (Value::List(x), Value::List(y)) => compare_seq(&x.snapshot(), &y.snapshot(), depth),
        (Value::Tuple(x), Value::Tuple(y)) => compare_seq(x, y, depth),
        _ => Err(incomparable()),
    }
}

fn compare_seq(x: &[Value], y: &[Value], depth: usize) -> Result<Ordering, EvalError> {
    for (p, q) in x.iter().zip(y) {
        match compare_at(p, q, depth + 1)? {
            Ordering::Equal => continue,
            other => return Ok(other),
        }
    }
    Ok(x.len().cmp(&y.len()))
}

fn as_f64(v: &Value) -> f64 {
    match v {
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        _ => f64::NAN,
    }
}

pub fn unary(op: UnaryOp, v: Value) -> Result<Value, EvalError> {
    match (op, &v) {
        (UnaryOp::Not, _) => Ok(Value::Bool(!v.truth())),
        (UnaryOp::Neg, Value::Int(i)) => i.checked_neg().map(Value::Int).ok_or_else(overflow),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Pos, Value::Int(_) | Value::Float(_)) => Ok(v),
        _ => Err(EvalError::new(format!("unknown unary op: {}{}", op, v.type_name()))),
    }
}

/// Apply a non-short-circuiting binary operator.
pub fn binary(op: BinaryOp, l: Value, r: Value) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(equals(&l, &r))),
        BinaryOp::NotEq => Ok(Value::Bool(!equals(&l, &r))),
        BinaryOp::Lt => Ok(Value::Bool(compare(&l, &r)? == Ordering::Less)),
        BinaryOp::LtEq => Ok(Value::Bool(compare(&l, &r)? != Ordering::Greater)),
        BinaryOp::Gt => Ok(Value::Bool(compare(&l, &r)? == Ordering::Greater)),
        BinaryOp::GtEq => Ok(Value::Bool(compare(&l, &r)? != Ordering::Less)),
        BinaryOp::In => Ok(Value::Bool(contains(&r, &l)?)),
        BinaryOp::NotIn => Ok(Value::Bool(!contains(&r, &l)?)),
        BinaryOp::And => Ok(if l.truth() { r } else { l }),
        BinaryOp::Or => Ok(if l.truth() { l } else { r }),
        BinaryOp::Add => add(l, r),
        BinaryOp::Mul => mul(l, r),
        BinaryOp::Sub => numeric(op, NumericOp::Sub, &l, &r),
        BinaryOp::Div => numeric(op, NumericOp::Div, &l, &r),
        BinaryOp::FloorDiv => numeric(op, NumericOp::FloorDiv, &l, &r),
        BinaryOp::Mod => numeric(op, NumericOp::Mod, &l, &r),
    }
}

fn add(l: Value, r: Value) -> Result<Value, EvalError> {
    match (&l, &r) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
        (Value::List(a), Value::List(b)) => {
            let mut items = a.snapshot();
            items.extend(b.items().iter().cloned());
            Ok(Value::list(items))
        }
        (Value::Tuple(a), Value::Tuple(b)) => Ok(Value::tuple(a.iter().chain(b.iter()).cloned().collect())),
        _ => numeric(BinaryOp::Add, NumericOp::Add, &l, &r),
    }
}

fn mul(l: Value, r: Value) -> Result<Value, EvalError> {
    fn repeat<T: Clone>(items: &[T], n: i64) -> Result<Vec<T>, EvalError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let n = usize::try_from(n.max(0)).map_err(|_| overflow())?;
        let total = items.len().checked_mul(n).ok_or_else(overflow)?;
        if total > MAX_RANGE_LEN as usize {
            return Err(EvalError::new(format!(
                "repetition result too large ({} elements, max {})",
                total, MAX_RANGE_LEN
            )));
        }
        let mut out = Vec::with_capacity(total);
        for _ in 0..n {
            out.extend_from_slice(items);
        }
        Ok(out)
    }
    match (&l, &r) {
        (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
            let chars: Vec<char> = s.chars().collect();
            Ok(Value::Str(repeat(&chars, *n)?.into_iter().collect()))
        }
        (Value::List(items), Value::Int(n)) | (Value::Int(n), Value::List(items)) => {
            Ok(Value::list(repeat(&items.snapshot(), *n)?))
        }
        (Value::Tuple(items), Value::Int(n)) | (Value::Int(n), Value::Tuple(items)) => {
            Ok(Value::tuple(repeat(items, *n)?))
        }
        _ => numeric(BinaryOp::Mul, NumericOp::Mul, &l, &r),
    }
}

fn numeric(op: BinaryOp, nop: NumericOp, l: &Value, r: &Value) -> Result<Value, EvalError> {
    let ty = |v: &Value| match v {
        Value::Int(_) => Some(NumericTy::Int),
        Value::Float(_) => Some(NumericTy::Float),
        _ => None,
    };
    let (Some(lt), Some(rt)) = (ty(l), ty(r)) else {
        return Err(unsupported(op, l, r));
    };

    if let (Value::Int(a), Value::Int(b), NumericTy::Int) = (l, r, result_numeric_type(nop, lt, rt)) {
        let (a, b) = (*a, *b);
        let result = match nop {
            NumericOp::Add => a.checked_add(b),
            NumericOp::Sub => a.checked_sub(b),
            NumericOp::Mul => a.checked_mul(b),
            NumericOp::FloorDiv | NumericOp::Mod if b == 0 => return Err(EvalError::new(DIVISION_BY_ZERO_MSG)),
            NumericOp::FloorDiv => py_floor_div_i64(a, b),
            NumericOp::Mod => Some(py_mod_i64(a, b)),
            NumericOp::Div => None,
        };
        return result.map(Value::Int).ok_or_else(overflow);
    }

    let (a, b) = (as_f64(l), as_f64(r));
    let result = match nop {
        NumericOp::Add => a + b,
        NumericOp::Sub => a - b,
        NumericOp::Mul => a * b,
        NumericOp::Div | NumericOp::FloorDiv | NumericOp::Mod if b == 0.0 => {
            return Err(EvalError::new(DIVISION_BY_ZERO_MSG));
        }
        NumericOp::Div => a / b,
        NumericOp::FloorDiv => py_floor_div_f64(a, b),
        NumericOp::Mod => py_mod_f64(a, b),
    };
    Ok(Value::Float(result))
}

/// `item in container`.
pub fn contains(container: &Value, item: &Value) -> Result<bool, EvalError> {
    match container {
        Value::Str(s) => Ok(s.contains(item.as_str("in")?)),
        Value::List(l) => Ok(l.items().iter().any(|v| equals(v, item))),
        Value::Tuple(items) => Ok(items.iter().any(|v| equals(v, item))),
        Value::Dict(d) => d.contains(item),
        other => Err(EvalError::new(format!(
            "unknown binary op: {} in {}",
            item.type_name(),
            other.type_name()
        ))),
    }
}

/// `object[index]`.
pub fn index(object: &Value, idx: &Value) -> Result<Value, EvalError> {
    match object {
        Value::Str(s) => strings::str_char_at(s, idx.as_int("string index")?)
            .map(Value::Str)
            .map_err(access),
        Value::List(l) => {
            let items = l.items();
            let i = strings::normalize_index(items.len(), idx.as_int("list index")?)
                .ok_or_else(|| access(AccessError::IndexOutOfRange))?;
            Ok(items[i].clone())
        }
        Value::Tuple(items) => {
            let i = strings::normalize_index(items.len(), idx.as_int("tuple index")?)
                .ok_or_else(|| access(AccessError::IndexOutOfRange))?;
            Ok(items[i].clone())
        }
        Value::Dict(d) => d
            .get(idx)?
            .ok_or_else(|| EvalError::new(format!("key {} not in dict", idx.repr()))),
        other => Err(EvalError::new(format!("{} value is not indexable", other.type_name()))),
    }
}

/// `object[index] = value`.
pub fn set_index(object: &Value, idx: Value, value: Value) -> Result<(), EvalError> {
    match object {
        Value::List(l) => set_list_item(l, &idx, value),
        Value::Dict(d) => d.insert(idx, value),
        other => Err(EvalError::new(format!(
            "{} value does not support item assignment",
            other.type_name()
        ))),
    }
}

fn set_list_item(list: &List, idx: &Value, value: Value) -> Result<(), EvalError> {
    let i = idx.as_int("list index")?;
    let mut items = list.items_mut()?;
    let pos = strings::normalize_index(items.len(), i).ok_or_else(|| access(AccessError::IndexOutOfRange))?;
    items[pos] = value;
    Ok(())
}

/// `object[start:end:step]`.
pub fn slice(object: &Value, start: Option<i64>, end: Option<i64>, step: Option<i64>) -> Result<Value, EvalError> {
    match object {
        Value::Str(s) => strings::str_slice(s, start, end, step).map(Value::Str).map_err(access),
        Value::List(l) => {
            let items = l.items();
            let picked = strings::slice_indices(items.len(), start, end, step).map_err(access)?;
            Ok(Value::list(picked.into_iter().map(|i| items[i].clone()).collect()))
        }
        Value::Tuple(items) => {
            let picked = strings::slice_indices(items.len(), start, end, step).map_err(access)?;
            Ok(Value::tuple(picked.into_iter().map(|i| items[i].clone()).collect()))
        }
        other => Err(EvalError::new(format!("{} value is not sliceable", other.type_name()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(i: i64) -> Value {
        Value::Int(i)
    }

    #[test]
    fn test_python_division_semantics() {
        assert_eq!(binary(BinaryOp::FloorDiv, int(-7), int(2)).unwrap(), int(-4));
        assert_eq!(binary(BinaryOp::Mod, int(-7), int(2)).unwrap(), int(1));
        assert_eq!(binary(BinaryOp::Div, int(7), int(2)).unwrap(), Value::Float(3.5));
        assert_eq!(
            binary(BinaryOp::Div, int(1), int(0)).unwrap_err().message,
            DIVISION_BY_ZERO_MSG
        );
        assert_eq!(
            binary(BinaryOp::Mod, Value::Float(1.0), Value::Float(0.0)).unwrap_err().message,
            DIVISION_BY_ZERO_MSG
        );
    }

    #[test]
    fn test_overflow_is_an_error() {
        assert_eq!(
            binary(BinaryOp::Add, int(i64::MAX), int(1)).unwrap_err().message,
            INT_OVERFLOW_MSG
        );
        assert!(unary(UnaryOp::Neg, int(i64::MIN)).is_err());
        assert!(binary(BinaryOp::FloorDiv, int(i64::MIN), int(-1)).is_err());
    }

    #[test]
    fn test_concat_and_repeat() {
        assert_eq!(binary(BinaryOp::Add, Value::str("1"), Value::str("2")).unwrap(), Value::str("12"));
        assert_eq!(binary(BinaryOp::Mul, Value::str("ab"), int(2)).unwrap(), Value::str("abab"));
        assert_eq!(binary(BinaryOp::Mul, int(-1), Value::str("ab")).unwrap(), Value::str(""));
        let joined = binary(BinaryOp::Add, Value::list(vec![int(1)]), Value::list(vec![int(2)])).unwrap();
        assert_eq!(joined, Value::list(vec![int(1), int(2)]));
        let err = binary(BinaryOp::Add, Value::str("a"), int(1)).unwrap_err();
        assert_eq!(err.message, "unknown binary op: string + int");
    }

    #[test]
    fn test_repeat_is_bounded() {
        let err = binary(BinaryOp::Mul, Value::str("a"), int(1_000_000_000_000)).unwrap_err();
        assert_eq!(
            err.message,
            "repetition result too large (1000000000000 elements, max 10000000)"
        );
        assert!(binary(BinaryOp::Mul, Value::list(vec![int(1)]), int(1_000_000_000_000)).is_err());
        assert!(binary(BinaryOp::Mul, int(1_000_000_000_000), Value::tuple(vec![int(1)])).is_err());
        // Empty sequences stay empty however large the count.
        assert_eq!(binary(BinaryOp::Mul, Value::str(""), int(i64::MAX)).unwrap(), Value::str(""));
    }

    #[test]
    fn test_ordering_self_containing_list_fails() {
        let l = Value::list(vec![int(1)]);
        let Value::List(inner) = &l else { unreachable!() };
        inner.items_mut().unwrap().push(l.clone());
        let err = compare(&l, &l).unwrap_err();
        assert_eq!(err.message, "comparison nested too deeply");
        // Equality short-circuits on identity.
        assert!(equals(&l, &l));
    }

    #[test]
    fn test_mixed_numeric_equality_and_ordering() {
        assert!(equals(&int(1), &Value::Float(1.0)));
        assert_eq!(compare(&int(1), &Value::Float(1.5)).unwrap(), Ordering::Less);
        assert_eq!(
            compare(&Value::str("b"), &Value::str("a")).unwrap(),
            Ordering::Greater
        );
        assert!(compare(&int(1), &Value::str("a")).is_err());
    }

    #[test]
    fn test_membership() {
        assert!(contains(&Value::str("hello"), &Value::str("ell")).unwrap());
        assert!(contains(&Value::list(vec![int(1), int(2)]), &int(2)).unwrap());
        assert!(contains(&Value::str("x"), &int(1)).is_err());
    }

    #[test]
    fn test_index_and_slice() {
        let l = Value::list(vec![int(1), int(2), int(3)]);
        assert_eq!(index(&l, &int(-1)).unwrap(), int(3));
        assert_eq!(index(&l, &int(3)).unwrap_err().message, "index out of range");
        assert_eq!(slice(&l, Some(1), None, None).unwrap(), Value::list(vec![int(2), int(3)]));
        assert_eq!(slice(&Value::str("hello"), None, None, Some(-1)).unwrap(), Value::str("olleh"));
        set_index(&l, int(0), int(9)).unwrap();
        assert_eq!(index(&l, &int(0)).unwrap(), int(9));
    }
}
