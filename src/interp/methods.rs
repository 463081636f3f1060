//! Attribute access and the methods of strings, lists and dicts.
//!
//! Reading `x.name` yields either a field (structs and proxies) or a method bound to `x`; calling the bound method
//! lands in [`call`].

use std::rc::Rc;

use attrscript_core::strings::{
    self, str_find, str_lstrip, str_rfind, str_rsplit, str_rstrip, str_split, str_strip, str_title,
};

use super::call::{no_kwargs, required, unpack_args};
use super::format::format_str;
use super::value::{Builtin, Dict, List, Value, iterate};
use super::{EvalError, ops};

const STR_METHODS: &[&str] = &[
    "capitalize",
    "count",
    "elems",
    "endswith",
    "find",
    "format",
    "index",
    "isalpha",
    "isdigit",
    "isspace",
    "join",
    "lower",
    "lstrip",
    "partition",
    "removeprefix",
    "removesuffix",
    "replace",
    "rfind",
    "rsplit",
    "rstrip",
    "split",
    "splitlines",
    "startswith",
    "strip",
    "title",
    "upper",
];

const LIST_METHODS: &[&str] = &["append", "clear", "extend", "index", "insert", "pop", "remove"];

const DICT_METHODS: &[&str] = &["clear", "get", "items", "keys", "pop", "setdefault", "update", "values"];

fn method_names(value: &Value) -> &'static [&'static str] {
    match value {
        Value::Str(_) => STR_METHODS,
        Value::List(_) => LIST_METHODS,
        Value::Dict(_) => DICT_METHODS,
        _ => &[],
    }
}

/// `value.name`.
pub(crate) fn get_attr(value: &Value, name: &str) -> Result<Value, EvalError> {
    match value {
        Value::Attr(attr) => return attr.field(name),
        Value::Target(target) => return target.field(name),
        Value::Struct(s) => {
            if let Some(v) = s.field(name) {
                return Ok(v.clone());
            }
        }
        _ => {
            if method_names(value).contains(&name) {
                return Ok(Builtin::method(value.clone(), name));
            }
        }
    }
    Err(EvalError::new(format!(
        "{} has no .{} field or method",
        value.type_name(),
        name
    )))
}

/// Field and method names of a value, as `dir` reports them.
pub(crate) fn dir(value: &Value) -> Vec<String> {
    match value {
        Value::Attr(attr) => attr.field_names().iter().map(|s| s.to_string()).collect(),
        Value::Target(target) => target.field_names().iter().map(|s| s.to_string()).collect(),
        Value::Struct(s) => s.fields.iter().map(|(k, _)| k.clone()).collect(),
        other => method_names(other).iter().map(|s| s.to_string()).collect(),
    }
}

/// Call the method `name` bound to `receiver`.
pub(crate) fn call(
    receiver: &Value,
    name: &str,
    args: Vec<Value>,
    named: Vec<(String, Value)>,
) -> Result<Value, EvalError> {
    let qualified = format!("{}.{}", receiver.type_name(), name);
    match receiver {
        Value::Str(s) => str_method(s, &qualified, name, args, named),
        Value::List(l) => list_method(l, &qualified, name, args, named),
        Value::Dict(d) => dict_method(d, &qualified, name, args, named),
        other => Err(EvalError::new(format!(
            "{} has no .{} field or method",
            other.type_name(),
            name
        ))),
    }
}

fn opt_str<'a>(slot: &'a Option<Value>, what: &str) -> Result<Option<&'a str>, EvalError> {
    match slot {
        None | Some(Value::None) => Ok(None),
        Some(v) => v.as_str(what).map(Some),
    }
}

fn req_str<'a>(slot: &'a Option<Value>, what: &str) -> Result<&'a str, EvalError> {
    match slot {
        Some(v) => v.as_str(what),
        None => Err(EvalError::new(format!("{}: missing argument", what))),
    }
}

fn opt_int(slot: &Option<Value>, what: &str, default: i64) -> Result<i64, EvalError> {
    match slot {
        None | Some(Value::None) => Ok(default),
        Some(v) => v.as_int(what),
    }
}

fn str_list(items: Vec<String>) -> Value {
    Value::list(items.into_iter().map(Value::Str).collect())
}

/// `startswith`/`endswith` take one string or a tuple of alternatives.
fn affix_matches(fname: &str, arg: &Value, test: impl Fn(&str) -> bool) -> Result<bool, EvalError> {
    match arg {
        Value::Tuple(items) => {
            for item in items.iter() {
                if test(item.as_str(fname)?) {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        other => Ok(test(other.as_str(fname)?)),
    }
}

fn str_method(
    s: &str,
    fname: &str,
    name: &str,
    args: Vec<Value>,
    named: Vec<(String, Value)>,
) -> Result<Value, EvalError> {
    match name {
        "strip" | "lstrip" | "rstrip" => {
            let slots = unpack_args(fname, args, named, &["chars"], 0)?;
            let chars = opt_str(&slots[0], fname)?;
            let out = match name {
                "strip" => str_strip(s, chars),
                "lstrip" => str_lstrip(s, chars),
                _ => str_rstrip(s, chars),
            };
            Ok(Value::Str(out))
        }
        "split" | "rsplit" => {
            let slots = unpack_args(fname, args, named, &["sep", "maxsplit"], 0)?;
            let sep = opt_str(&slots[0], fname)?;
            if sep == Some("") {
                return Err(EvalError::new(format!("{}: empty separator", fname)));
            }
            let maxsplit = opt_int(&slots[1], fname, -1)?;
            Ok(str_list(if name == "split" {
                str_split(s, sep, maxsplit)
            } else {
                str_rsplit(s, sep, maxsplit)
            }))
        }
        "splitlines" => {
            let slots = unpack_args(fname, args, named, &["keepends"], 0)?;
            let keep = slots[0].as_ref().is_some_and(Value::truth);
            let mut lines = Vec::new();
            let mut rest = s;
            while !rest.is_empty() {
                let (line, ending, tail) = match rest.find(['\n', '\r']) {
                    Some(i) if rest[i..].starts_with("\r\n") => (&rest[..i], &rest[i..i + 2], &rest[i + 2..]),
                    Some(i) => (&rest[..i], &rest[i..i + 1], &rest[i + 1..]),
                    None => (rest, "", ""),
                };
                lines.push(if keep { format!("{}{}", line, ending) } else { line.to_string() });
                rest = tail;
            }
            Ok(str_list(lines))
        }
        "join" => {
            let slots = unpack_args(fname, args, named, &["iterable"], 1)?;
            let items = iterate(required(&slots, 0, fname)?)?;
            let parts = items
                .iter()
                .map(|v| v.as_str(fname).map(str::to_string))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Str(parts.join(s)))
        }
        "format" => format_str(s, &args, &named).map(Value::Str),
        "startswith" | "endswith" => {
            let slots = unpack_args(fname, args, named, &["prefix"], 1)?;
            let arg = required(&slots, 0, fname)?;
            let found = if name == "startswith" {
                affix_matches(fname, arg, |p| s.starts_with(p))?
            } else {
                affix_matches(fname, arg, |p| s.ends_with(p))?
            };
            Ok(Value::Bool(found))
        }
        "replace" => {
            let slots = unpack_args(fname, args, named, &["old", "new", "count"], 2)?;
            let old = req_str(&slots[0], fname)?;
            let new = req_str(&slots[1], fname)?;
            let count = opt_int(&slots[2], fname, -1)?;
            let out = if count < 0 {
                s.replace(old, new)
            } else {
                s.replacen(old, new, count as usize)
            };
            Ok(Value::Str(out))
        }
        "upper" => {
            unpack_args(fname, args, named, &[], 0)?;
            Ok(Value::Str(s.to_uppercase()))
        }
        "lower" => {
            unpack_args(fname, args, named, &[], 0)?;
            Ok(Value::Str(s.to_lowercase()))
        }
        "find" | "rfind" | "index" => {
            let slots = unpack_args(fname, args, named, &["sub"], 1)?;
            let sub = req_str(&slots[0], fname)?;
            let pos = if name == "rfind" { str_rfind(s, sub) } else { str_find(s, sub) };
            if name == "index" && pos < 0 {
                return Err(EvalError::new(format!("{}: substring not found", fname)));
            }
            Ok(Value::Int(pos))
        }
        "count" => {
            let slots = unpack_args(fname, args, named, &["sub"], 1)?;
            let sub = req_str(&slots[0], fname)?;
            let n = if sub.is_empty() { strings::str_len(s) + 1 } else { s.matches(sub).count() };
            Ok(Value::Int(n as i64))
        }
        "isdigit" | "isalpha" | "isspace" => {
            unpack_args(fname, args, named, &[], 0)?;
            let test: fn(char) -> bool = match name {
                "isdigit" => |c| c.is_ascii_digit(),
                "isalpha" => char::is_alphabetic,
                _ => char::is_whitespace,
            };
            Ok(Value::Bool(!s.is_empty() && s.chars().all(test)))
        }
        "title" => {
            unpack_args(fname, args, named, &[], 0)?;
            Ok(Value::Str(str_title(s)))
        }
        "capitalize" => {
            unpack_args(fname, args, named, &[], 0)?;
            let mut chars = s.chars();
            let out = match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            };
            Ok(Value::Str(out))
        }
        "partition" => {
            let slots = unpack_args(fname, args, named, &["sep"], 1)?;
            let sep = req_str(&slots[0], fname)?;
            if sep.is_empty() {
                return Err(EvalError::new(format!("{}: empty separator", fname)));
            }
            let parts = match s.split_once(sep) {
                Some((head, tail)) => [head, sep, tail],
                None => [s, "", ""],
            };
            Ok(Value::tuple(parts.into_iter().map(Value::str).collect()))
        }
        "removeprefix" | "removesuffix" => {
            let slots = unpack_args(fname, args, named, &["affix"], 1)?;
            let affix = req_str(&slots[0], fname)?;
            let out = if name == "removeprefix" {
                s.strip_prefix(affix)
            } else {
                s.strip_suffix(affix)
            };
            Ok(Value::str(out.unwrap_or(s)))
        }
        "elems" => {
            unpack_args(fname, args, named, &[], 0)?;
            Ok(Value::list(s.chars().map(|c| Value::Str(c.to_string())).collect()))
        }
        _ => Err(EvalError::new(format!("string has no .{} field or method", name))),
    }
}

fn list_method(
    list: &Rc<List>,
    fname: &str,
    name: &str,
    args: Vec<Value>,
    named: Vec<(String, Value)>,
) -> Result<Value, EvalError> {
    match name {
        "append" => {
            let slots = unpack_args(fname, args, named, &["x"], 1)?;
            let x = slots.into_iter().next().flatten().unwrap_or(Value::None);
            list.items_mut()?.push(x);
            Ok(Value::None)
        }
        "extend" => {
            let slots = unpack_args(fname, args, named, &["iterable"], 1)?;
            let extra = iterate(required(&slots, 0, fname)?)?;
            list.items_mut()?.extend(extra);
            Ok(Value::None)
        }
        "insert" => {
            let slots = unpack_args(fname, args, named, &["index", "x"], 2)?;
            let index = opt_int(&slots[0], fname, 0)?;
            let x = slots[1].clone().unwrap_or(Value::None);
            let mut items = list.items_mut()?;
            let len = items.len() as i64;
            let pos = if index < 0 { (index + len).max(0) } else { index.min(len) };
            items.insert(pos as usize, x);
            Ok(Value::None)
        }
        "pop" => {
            let slots = unpack_args(fname, args, named, &["index"], 0)?;
            let mut items = list.items_mut()?;
            let index = opt_int(&slots[0], fname, -1)?;
            let pos = strings::normalize_index(items.len(), index)
                .ok_or_else(|| EvalError::new(format!("{}: index {} out of range", fname, index)))?;
            Ok(items.remove(pos))
        }
        "remove" => {
            let slots = unpack_args(fname, args, named, &["x"], 1)?;
            let x = required(&slots, 0, fname)?;
            let mut items = list.items_mut()?;
            let pos = items
                .iter()
                .position(|v| ops::equals(v, x))
                .ok_or_else(|| EvalError::new(format!("{}: element not found", fname)))?;
            items.remove(pos);
            Ok(Value::None)
        }
        "index" => {
            let slots = unpack_args(fname, args, named, &["x"], 1)?;
            let x = required(&slots, 0, fname)?;
            list.items()
                .iter()
                .position(|v| ops::equals(v, x))
                .map(|i| Value::Int(i as i64))
                .ok_or_else(|| EvalError::new(format!("{}: value not in list", fname)))
        }
        "clear" => {
            no_kwargs(fname, &named)?;
            unpack_args(fname, args, Vec::new(), &[], 0)?;
            list.items_mut()?.clear();
            Ok(Value::None)
        }
        _ => Err(EvalError::new(format!("list has no .{} field or method", name))),
    }
}

fn dict_method(
    dict: &Rc<Dict>,
    fname: &str,
    name: &str,
    args: Vec<Value>,
    named: Vec<(String, Value)>,
) -> Result<Value, EvalError> {
    match name {
        "get" => {
            let slots = unpack_args(fname, args, named, &["key", "default"], 1)?;
            let key = required(&slots, 0, fname)?;
            Ok(dict
                .get(key)?
                .unwrap_or_else(|| slots[1].clone().unwrap_or(Value::None)))
        }
        "keys" => {
            unpack_args(fname, args, named, &[], 0)?;
            Ok(Value::list(dict.keys()))
        }
        "values" => {
            unpack_args(fname, args, named, &[], 0)?;
            Ok(Value::list(dict.entries().iter().map(|(_, v)| v.clone()).collect()))
        }
        "items" => {
            unpack_args(fname, args, named, &[], 0)?;
            Ok(Value::list(
                dict.entries()
                    .iter()
                    .map(|(k, v)| Value::tuple(vec![k.clone(), v.clone()]))
                    .collect(),
            ))
        }
        "pop" => {
            let slots = unpack_args(fname, args, named, &["key", "default"], 1)?;
            let key = required(&slots, 0, fname)?;
            match (dict.remove(key)?, &slots[1]) {
                (Some(v), _) => Ok(v),
                (None, Some(default)) => Ok(default.clone()),
                (None, None) => Err(EvalError::new(format!("{}: missing key {}", fname, key.repr()))),
            }
        }
        "setdefault" => {
            let slots = unpack_args(fname, args, named, &["key", "default"], 1)?;
            let key = slots[0].clone().unwrap_or(Value::None);
            if let Some(v) = dict.get(&key)? {
                return Ok(v);
            }
            let default = slots[1].clone().unwrap_or(Value::None);
            dict.insert(key, default.clone())?;
            Ok(default)
        }
        "update" => {
            if args.len() > 1 {
                return Err(EvalError::new(format!("{}: got {} arguments, want at most 1", fname, args.len())));
            }
            if let Some(source) = args.first() {
                let pairs: Vec<(Value, Value)> = match source {
                    Value::Dict(other) => other.entries().clone(),
                    other => iterate(other)?
                        .into_iter()
                        .map(|pair| {
                            let kv = iterate(&pair)?;
                            <[Value; 2]>::try_from(kv)
                                .map(|[k, v]| (k, v))
                                .map_err(|_| EvalError::new(format!("{}: sequence element must be a pair", fname)))
                        })
                        .collect::<Result<_, _>>()?,
                };
                for (k, v) in pairs {
                    dict.insert(k, v)?;
                }
            }
            for (k, v) in named {
                dict.insert(Value::Str(k), v)?;
            }
            Ok(Value::None)
        }
        "clear" => {
            unpack_args(fname, args, named, &[], 0)?;
            dict.clear()?;
            Ok(Value::None)
        }
        _ => Err(EvalError::new(format!("dict has no .{} field or method", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(recv: Value, name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
        call(&recv, name, args, Vec::new())
    }

    #[test]
    fn test_string_methods() {
        let s = Value::str("  a,b,,c  ");
        assert_eq!(method(s.clone(), "strip", vec![]).unwrap(), Value::str("a,b,,c"));
        assert_eq!(
            method(Value::str("a,b,,c"), "split", vec![Value::str(",")]).unwrap().repr(),
            r#"["a", "b", "", "c"]"#
        );
        assert_eq!(method(Value::str(" x  y "), "split", vec![]).unwrap().repr(), r#"["x", "y"]"#);
        assert_eq!(
            method(Value::str("-"), "join", vec![Value::list(vec![Value::str("a"), Value::str("b")])]).unwrap(),
            Value::str("a-b")
        );
        assert_eq!(method(Value::str("hello"), "find", vec![Value::str("l")]).unwrap(), Value::Int(2));
        assert_eq!(method(Value::str("hello"), "rfind", vec![Value::str("l")]).unwrap(), Value::Int(3));
        assert!(method(Value::str("hello"), "index", vec![Value::str("z")]).is_err());
        assert_eq!(
            method(Value::str("a=b=c"), "partition", vec![Value::str("=")]).unwrap().repr(),
            r#"("a", "=", "b=c")"#
        );
        assert_eq!(method(Value::str("hELLO"), "capitalize", vec![]).unwrap(), Value::str("Hello"));
        assert_eq!(
            method(Value::str("ab\r\ncd\n"), "splitlines", vec![]).unwrap().repr(),
            r#"["ab", "cd"]"#
        );
        assert_eq!(method(Value::str("ab"), "elems", vec![]).unwrap().repr(), r#"["a", "b"]"#);
        assert!(method(Value::str("a"), "split", vec![Value::str("")]).is_err());
    }

    #[test]
    fn test_startswith_accepts_tuple() {
        let prefixes = Value::tuple(vec![Value::str("x"), Value::str("he")]);
        assert_eq!(method(Value::str("hello"), "startswith", vec![prefixes]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_list_methods_mutate_in_place() {
        let l = Value::list(vec![Value::Int(1)]);
        method(l.clone(), "append", vec![Value::Int(2)]).unwrap();
        method(l.clone(), "insert", vec![Value::Int(0), Value::Int(0)]).unwrap();
        assert_eq!(l.repr(), "[0, 1, 2]");
        assert_eq!(method(l.clone(), "pop", vec![]).unwrap(), Value::Int(2));
        method(l.clone(), "remove", vec![Value::Int(0)]).unwrap();
        assert_eq!(l.repr(), "[1]");
        l.freeze();
        assert!(method(l, "append", vec![Value::Int(3)]).is_err());
    }

    #[test]
    fn test_dict_methods() {
        let d = Value::Dict(Rc::new(Dict::new()));
        assert_eq!(
            method(d.clone(), "setdefault", vec![Value::str("a"), Value::Int(1)]).unwrap(),
            Value::Int(1)
        );
        assert_eq!(method(d.clone(), "get", vec![Value::str("zz"), Value::Int(5)]).unwrap(), Value::Int(5));
        assert_eq!(method(d.clone(), "items", vec![]).unwrap().repr(), r#"[("a", 1)]"#);
        assert_eq!(method(d.clone(), "pop", vec![Value::str("a")]).unwrap(), Value::Int(1));
        assert!(method(d, "pop", vec![Value::str("a")]).is_err());
    }

    #[test]
    fn test_missing_member() {
        let err = get_attr(&Value::Int(1), "foo").unwrap_err();
        assert_eq!(err.message, "int has no .foo field or method");
        assert!(dir(&Value::str("")).contains(&"upper".to_string()));
    }
}
