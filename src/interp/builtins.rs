//! The universal builtin functions.
//!
//! Every module sees these unless it or the embedder shadows the name. Names and identities come from
//! `attrscript_core::lang::builtins`; this module only supplies behavior.

use std::cmp::Ordering;
use std::rc::Rc;

use attrscript_core::lang::builtins::{self as names, BuiltinFnId};
use attrscript_core::strings::str_len;

use super::call::{no_kwargs, required, unpack_args};
use super::value::{Dict, Value, iterate};
use super::{EvalError, Interpreter, methods, ops};

/// `range` refuses to build lists longer than this.
pub const MAX_RANGE_LEN: i64 = 10_000_000;

pub(crate) fn call(
    interp: &mut Interpreter<'_>,
    id: BuiltinFnId,
    args: Vec<Value>,
    named: Vec<(String, Value)>,
) -> Result<Value, EvalError> {
    let fname = names::as_str(id);
    match id {
        BuiltinFnId::Len => {
            let [v] = one(fname, args, named)?;
            let n = match &v {
                Value::Str(s) => str_len(s),
                Value::List(l) => l.items().len(),
                Value::Tuple(t) => t.len(),
                Value::Dict(d) => d.len(),
                other => return Err(EvalError::new(format!("len: value of type {} has no len", other.type_name()))),
            };
            Ok(Value::Int(n as i64))
        }
        BuiltinFnId::Str => {
            let [v] = one(fname, args, named)?;
            Ok(Value::Str(v.to_str()))
        }
        BuiltinFnId::Repr => {
            let [v] = one(fname, args, named)?;
            Ok(Value::Str(v.repr()))
        }
        BuiltinFnId::Bool => {
            let slots = unpack_args(fname, args, named, &["x"], 0)?;
            Ok(Value::Bool(slots[0].as_ref().is_some_and(Value::truth)))
        }
        BuiltinFnId::Int => int(fname, args, named),
        BuiltinFnId::Float => float(fname, args, named),
        BuiltinFnId::List => {
            let slots = unpack_args(fname, args, named, &["x"], 0)?;
            match &slots[0] {
                Some(v) => Ok(Value::list(iterate(v)?)),
                None => Ok(Value::list(Vec::new())),
            }
        }
        BuiltinFnId::Tuple => {
            let slots = unpack_args(fname, args, named, &["x"], 0)?;
            match &slots[0] {
                Some(v) => Ok(Value::tuple(iterate(v)?)),
                None => Ok(Value::tuple(Vec::new())),
            }
        }
        BuiltinFnId::Dict => dict(fname, args, named),
        BuiltinFnId::Range => range(fname, args, named),
        BuiltinFnId::Enumerate => {
            let slots = unpack_args(fname, args, named, &["x", "start"], 1)?;
            let items = iterate(required(&slots, 0, fname)?)?;
            let start = match &slots[1] {
                Some(v) => v.as_int("enumerate: start")?,
                None => 0,
            };
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                let n = start
                    .checked_add(i as i64)
                    .ok_or_else(|| EvalError::new(attrscript_core::errors::INT_OVERFLOW_MSG))?;
                out.push(Value::tuple(vec![Value::Int(n), item]));
            }
            Ok(Value::list(out))
        }
        BuiltinFnId::Zip => {
            no_kwargs(fname, &named)?;
            let columns = args.iter().map(iterate).collect::<Result<Vec<_>, _>>()?;
            let len = columns.iter().map(Vec::len).min().unwrap_or(0);
            let rows = (0..len)
                .map(|i| Value::tuple(columns.iter().map(|c| c[i].clone()).collect()))
                .collect();
            Ok(Value::list(rows))
        }
        BuiltinFnId::Sorted => {
            let slots = unpack_args(fname, args, named, &["x", "key", "reverse"], 1)?;
            let items = iterate(required(&slots, 0, fname)?)?;
            let reverse = slots[2].as_ref().is_some_and(Value::truth);
            let sorted = sort_values(interp, items, slots[1].as_ref())?;
            Ok(Value::list(if reverse { sorted.into_iter().rev().collect() } else { sorted }))
        }
        BuiltinFnId::Reversed => {
            let [v] = one(fname, args, named)?;
            let mut items = iterate(&v)?;
            items.reverse();
            Ok(Value::list(items))
        }
        BuiltinFnId::Min => extremum(interp, fname, args, named, Ordering::Less),
        BuiltinFnId::Max => extremum(interp, fname, args, named, Ordering::Greater),
        BuiltinFnId::Any => {
            let [v] = one(fname, args, named)?;
            Ok(Value::Bool(iterate(&v)?.iter().any(Value::truth)))
        }
        BuiltinFnId::All => {
            let [v] = one(fname, args, named)?;
            Ok(Value::Bool(iterate(&v)?.iter().all(Value::truth)))
        }
        BuiltinFnId::Abs => {
            let [v] = one(fname, args, named)?;
            match v {
                Value::Int(i) => i
                    .checked_abs()
                    .map(Value::Int)
                    .ok_or_else(|| EvalError::new(attrscript_core::errors::INT_OVERFLOW_MSG)),
                Value::Float(f) => Ok(Value::Float(f.abs())),
                other => Err(EvalError::new(format!("abs: got {}, want int or float", other.type_name()))),
            }
        }
        BuiltinFnId::Hasattr => {
            no_kwargs(fname, &named)?;
            let [object, name] = exactly::<2>(fname, args)?;
            let name = name.as_str("hasattr: name")?;
            Ok(Value::Bool(methods::dir(&object).iter().any(|n| n == name)))
        }
        BuiltinFnId::Getattr => {
            no_kwargs(fname, &named)?;
            if !(2..=3).contains(&args.len()) {
                return Err(EvalError::new(format!("getattr: got {} arguments, want 2 or 3", args.len())));
            }
            let mut args = args.into_iter();
            let object = args.next().unwrap_or(Value::None);
            let name = args.next().unwrap_or(Value::None);
            let default = args.next();
            let name = name.as_str("getattr: name")?;
            match (methods::get_attr(&object, name), default) {
                (Ok(v), _) => Ok(v),
                (Err(_), Some(default)) => Ok(default),
                (Err(e), None) => Err(e),
            }
        }
        BuiltinFnId::Dir => {
            let [v] = one(fname, args, named)?;
            Ok(Value::list(methods::dir(&v).into_iter().map(Value::Str).collect()))
        }
        BuiltinFnId::Type => {
            let [v] = one(fname, args, named)?;
            Ok(Value::str(v.type_name()))
        }
        BuiltinFnId::Print => {
            let sep = named
                .iter()
                .find(|(k, _)| k == "sep")
                .map(|(_, v)| v.as_str("print: sep").map(str::to_string))
                .transpose()?;
            if let Some((k, _)) = named.iter().find(|(k, _)| k != "sep") {
                return Err(EvalError::new(format!("print: unexpected keyword argument {}", k)));
            }
            let sep = sep.unwrap_or_else(|| " ".to_string());
            let line = args.iter().map(Value::to_str).collect::<Vec<_>>().join(&sep);
            tracing::info!(target: "attrscript::print", "{}", line);
            Ok(Value::None)
        }
        BuiltinFnId::Fail => {
            no_kwargs(fname, &named)?;
            let msg = args.iter().map(Value::to_str).collect::<Vec<_>>().join(" ");
            Err(EvalError::new(msg))
        }
    }
}

fn one(fname: &str, args: Vec<Value>, named: Vec<(String, Value)>) -> Result<[Value; 1], EvalError> {
    no_kwargs(fname, &named)?;
    exactly::<1>(fname, args)
}

fn exactly<const N: usize>(fname: &str, args: Vec<Value>) -> Result<[Value; N], EvalError> {
    let got = args.len();
    <[Value; N]>::try_from(args).map_err(|_| {
        EvalError::new(format!(
            "{}: got {} arguments, want {}",
            fname, got, N
        ))
    })
}

fn int(fname: &str, args: Vec<Value>, named: Vec<(String, Value)>) -> Result<Value, EvalError> {
    let slots = unpack_args(fname, args, named, &["x", "base"], 0)?;
    let base = match &slots[1] {
        Some(b) => Some(b.as_int("int: base")?),
        None => None,
    };
    match (&slots[0], base) {
        (None, _) => Ok(Value::Int(0)),
        (Some(Value::Str(s)), base) => parse_int(s, base.unwrap_or(10)).map(Value::Int),
        (Some(_), Some(_)) => Err(EvalError::new("int: can't convert non-string with explicit base")),
        (Some(Value::Int(i)), None) => Ok(Value::Int(*i)),
        (Some(Value::Bool(b)), None) => Ok(Value::Int(i64::from(*b))),
        (Some(Value::Float(f)), None) => {
            if !f.is_finite() || f.trunc() < i64::MIN as f64 || f.trunc() >= i64::MAX as f64 {
                return Err(EvalError::new(format!("int: cannot convert {} to int", Value::Float(*f))));
            }
            Ok(Value::Int(f.trunc() as i64))
        }
        (Some(other), None) => Err(EvalError::new(format!("int: cannot convert {} to int", other.type_name()))),
    }
}

fn parse_int(text: &str, base: i64) -> Result<i64, EvalError> {
    let invalid = || EvalError::new(format!("int: invalid literal with base {}: {}", base, Value::str(text).repr()));
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let lower = digits.to_ascii_lowercase();
    let (radix, digits) = match (base, lower.get(..2)) {
        (0 | 16, Some("0x")) => (16, &digits[2..]),
        (0 | 8, Some("0o")) => (8, &digits[2..]),
        (0 | 2, Some("0b")) => (2, &digits[2..]),
        (0, _) => (10, digits),
        (2..=36, _) => (base as u32, digits),
        _ => return Err(EvalError::new(format!("int: base must be 0 or between 2 and 36, got {}", base))),
    };
    let digits = digits.replace('_', "");
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid());
    }
    let magnitude = i128::from_str_radix(&digits, radix).map_err(|_| invalid())?;
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).map_err(|_| EvalError::new(attrscript_core::errors::INT_OVERFLOW_MSG))
}

fn float(fname: &str, args: Vec<Value>, named: Vec<(String, Value)>) -> Result<Value, EvalError> {
    let slots = unpack_args(fname, args, named, &["x"], 0)?;
    match &slots[0] {
        None => Ok(Value::Float(0.0)),
        Some(Value::Float(f)) => Ok(Value::Float(*f)),
        Some(Value::Int(i)) => Ok(Value::Float(*i as f64)),
        Some(Value::Bool(b)) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Some(Value::Str(s)) => {
            let t = s.trim();
            let parsed = match t.to_ascii_lowercase().as_str() {
                "inf" | "+inf" | "infinity" => Some(f64::INFINITY),
                "-inf" | "-infinity" => Some(f64::NEG_INFINITY),
                "nan" => Some(f64::NAN),
                _ => t.parse::<f64>().ok(),
            };
            parsed
                .map(Value::Float)
                .ok_or_else(|| EvalError::new(format!("float: invalid literal {}", Value::str(t).repr())))
        }
        Some(other) => Err(EvalError::new(format!("float: cannot convert {} to float", other.type_name()))),
    }
}

fn dict(fname: &str, args: Vec<Value>, named: Vec<(String, Value)>) -> Result<Value, EvalError> {
    if args.len() > 1 {
        return Err(EvalError::new(format!("{}: got {} positional arguments, want at most 1", fname, args.len())));
    }
    let out = Dict::new();
    if let Some(source) = args.first() {
        match source {
            Value::Dict(d) => {
                for (k, v) in d.entries().iter() {
                    out.insert(k.clone(), v.clone())?;
                }
            }
            other => {
                for (i, pair) in iterate(other)?.into_iter().enumerate() {
                    let kv = iterate(&pair)
                        .map_err(|_| EvalError::new(format!("dict: element #{} is not iterable", i)))?;
                    let [k, v] = <[Value; 2]>::try_from(kv).map_err(|kv| {
                        EvalError::new(format!("dict: element #{} has length {}, want 2", i, kv.len()))
                    })?;
                    out.insert(k, v)?;
                }
            }
        }
    }
    for (k, v) in named {
        out.insert(Value::Str(k), v)?;
    }
    Ok(Value::Dict(Rc::new(out)))
}

fn range(fname: &str, args: Vec<Value>, named: Vec<(String, Value)>) -> Result<Value, EvalError> {
    no_kwargs(fname, &named)?;
    let ints = args
        .iter()
        .map(|v| v.as_int("range"))
        .collect::<Result<Vec<_>, _>>()?;
    let (start, stop, step) = match ints.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => return Err(EvalError::new(format!("range: got {} arguments, want 1 to 3", ints.len()))),
    };
    if step == 0 {
        return Err(EvalError::new("range: step argument must not be zero"));
    }
    let span = i128::from(stop) - i128::from(start);
    let step_wide = i128::from(step);
    let count = if (span > 0 && step > 0) || (span < 0 && step < 0) {
        (span.abs() + step_wide.abs() - 1) / step_wide.abs()
    } else {
        0
    };
    if count > i128::from(MAX_RANGE_LEN) {
        return Err(EvalError::new(format!("range: {} elements exceeds the limit of {}", count, MAX_RANGE_LEN)));
    }
    let items = (0..count)
        .map(|i| Value::Int((i128::from(start) + i * step_wide) as i64))
        .collect();
    Ok(Value::list(items))
}

/// Stable sort, optionally by `key(x)`.
fn sort_values(interp: &mut Interpreter<'_>, items: Vec<Value>, key: Option<&Value>) -> Result<Vec<Value>, EvalError> {
    let keys = match key {
        Some(f) if !matches!(f, Value::None) => items
            .iter()
            .map(|v| interp.call_value(f, vec![v.clone()], Vec::new()))
            .collect::<Result<Vec<_>, _>>()?,
        _ => items.clone(),
    };
    let mut order: Vec<usize> = (0..items.len()).collect();
    let mut failure = None;
    order.sort_by(|&a, &b| match ops::compare(&keys[a], &keys[b]) {
        Ok(o) => o,
        Err(e) => {
            failure.get_or_insert(e);
            Ordering::Equal
        }
    });
    if let Some(e) = failure {
        return Err(e);
    }
    Ok(order.into_iter().map(|i| items[i].clone()).collect())
}

/// `min` and `max`: `want` is the ordering a new best element has relative to the current one.
fn extremum(
    interp: &mut Interpreter<'_>,
    fname: &str,
    args: Vec<Value>,
    named: Vec<(String, Value)>,
    want: Ordering,
) -> Result<Value, EvalError> {
    let mut key = None;
    for (k, v) in named {
        if k != "key" {
            return Err(EvalError::new(format!("{}: unexpected keyword argument {}", fname, k)));
        }
        key = Some(v);
    }
    let items = match args.len() {
        0 => return Err(EvalError::new(format!("{}: got 0 arguments, want at least 1", fname))),
        1 => iterate(&args[0])?,
        _ => args,
    };
    let mut best: Option<(Value, Value)> = None;
    for item in items {
        let k = match &key {
            Some(f) if !matches!(f, Value::None) => interp.call_value(f, vec![item.clone()], Vec::new())?,
            _ => item.clone(),
        };
        let replace = match &best {
            None => true,
            Some((best_key, _)) => ops::compare(&k, best_key)? == want,
        };
        if replace {
            best = Some((k, item));
        }
    }
    best.map(|(_, v)| v)
        .ok_or_else(|| EvalError::new(format!("{}: argument is an empty sequence", fname)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::{Limits, NoHost};

    fn call_builtin(id: BuiltinFnId, args: Vec<Value>, named: Vec<(&str, Value)>) -> Result<Value, EvalError> {
        let mut host = NoHost;
        let mut interp = Interpreter::new(&mut host, Limits::default());
        let named = named.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        call(&mut interp, id, args, named)
    }

    fn ints(xs: &[i64]) -> Value {
        Value::list(xs.iter().copied().map(Value::Int).collect())
    }

    #[test]
    fn test_range_forms() {
        assert_eq!(call_builtin(BuiltinFnId::Range, vec![Value::Int(3)], vec![]).unwrap(), ints(&[0, 1, 2]));
        assert_eq!(
            call_builtin(BuiltinFnId::Range, vec![Value::Int(5), Value::Int(0), Value::Int(-2)], vec![]).unwrap(),
            ints(&[5, 3, 1])
        );
        assert!(call_builtin(BuiltinFnId::Range, vec![Value::Int(0), Value::Int(1), Value::Int(0)], vec![]).is_err());
        assert!(call_builtin(BuiltinFnId::Range, vec![Value::Int(i64::MAX)], vec![]).is_err());
    }

    #[test]
    fn test_int_parsing() {
        let parse = |s: &str| call_builtin(BuiltinFnId::Int, vec![Value::str(s)], vec![]);
        assert_eq!(parse("42").unwrap(), Value::Int(42));
        assert_eq!(parse(" -7 ").unwrap(), Value::Int(-7));
        assert!(parse("1.2").is_err());
        assert_eq!(
            call_builtin(BuiltinFnId::Int, vec![Value::str("ff")], vec![("base", Value::Int(16))]).unwrap(),
            Value::Int(255)
        );
        assert_eq!(
            call_builtin(BuiltinFnId::Int, vec![Value::str("0x10"), Value::Int(0)], vec![]).unwrap(),
            Value::Int(16)
        );
        assert_eq!(call_builtin(BuiltinFnId::Int, vec![Value::Float(-2.7)], vec![]).unwrap(), Value::Int(-2));
    }

    #[test]
    fn test_sorted_reverse_and_mixed_types() {
        let v = call_builtin(BuiltinFnId::Sorted, vec![ints(&[3, 1, 2])], vec![("reverse", Value::Bool(true))]);
        assert_eq!(v.unwrap(), ints(&[3, 2, 1]));
        let mixed = Value::list(vec![Value::Int(1), Value::str("a")]);
        assert!(call_builtin(BuiltinFnId::Sorted, vec![mixed], vec![]).is_err());
    }

    #[test]
    fn test_min_max() {
        assert_eq!(call_builtin(BuiltinFnId::Min, vec![ints(&[3, 1, 2])], vec![]).unwrap(), Value::Int(1));
        assert_eq!(
            call_builtin(BuiltinFnId::Max, vec![Value::Int(1), Value::Float(2.5)], vec![]).unwrap(),
            Value::Float(2.5)
        );
        assert!(call_builtin(BuiltinFnId::Max, vec![ints(&[])], vec![]).is_err());
    }

    #[test]
    fn test_dict_from_pairs_and_kwargs() {
        let pairs = Value::list(vec![Value::tuple(vec![Value::str("a"), Value::Int(1)])]);
        let d = call_builtin(BuiltinFnId::Dict, vec![pairs], vec![("b", Value::Int(2))]).unwrap();
        assert_eq!(d.repr(), r#"{"a": 1, "b": 2}"#);
    }

    #[test]
    fn test_fail_joins_arguments() {
        let err = call_builtin(BuiltinFnId::Fail, vec![Value::str("bad"), Value::Int(3)], vec![]).unwrap_err();
        assert_eq!(err.message, "bad 3");
    }

    #[test]
    fn test_zip_and_enumerate() {
        let z = call_builtin(BuiltinFnId::Zip, vec![ints(&[1, 2, 3]), ints(&[4, 5])], vec![]).unwrap();
        assert_eq!(z.repr(), "[(1, 4), (2, 5)]");
        let e = call_builtin(BuiltinFnId::Enumerate, vec![ints(&[7])], vec![("start", Value::Int(1))]).unwrap();
        assert_eq!(e.repr(), "[(1, 7)]");
    }
}
