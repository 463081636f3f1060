//! Builtin function vocabulary.
//!
//! This module defines the canonical set of core builtin functions every evaluation environment exposes.
//! Callers should use the stable identifier [`BuiltinFnId`] for identity and query spellings through
//! [`BuiltinFnInfo`] / [`BUILTIN_FUNCTIONS`].
//!
//! ## Notes
//! - Host builtins (`run`, `broken_assumption`) are not listed here; the computed-attribute environment injects
//!   them separately.
//!
//! ## Examples
//! ```rust
//! use attrscript_core::lang::builtins::{self, BuiltinFnId};
//!
//! assert_eq!(builtins::from_str("len"), Some(BuiltinFnId::Len));
//! assert_eq!(builtins::as_str(BuiltinFnId::Sorted), "sorted");
//! ```

/// Stable identifier for a builtin function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFnId {
    Len,
    Str,
    Repr,
    Int,
    Bool,
    Float,
    List,
    Tuple,
    Dict,
    Range,
    Enumerate,
    Zip,
    Sorted,
    Reversed,
    Min,
    Max,
    Any,
    All,
    Abs,
    Hasattr,
    Getattr,
    Dir,
    Type,
    Print,
    Fail,
}

/// Metadata for a builtin function.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinFnInfo {
    pub id: BuiltinFnId,
    pub canonical: &'static str,
    pub summary: &'static str,
}

/// Registry of all builtin functions, in [`BuiltinFnId`] declaration order.
pub const BUILTIN_FUNCTIONS: &[BuiltinFnInfo] = &[
    info(BuiltinFnId::Len, "len", "Return the length of a string or collection."),
    info(BuiltinFnId::Str, "str", "Convert a value to its string form."),
    info(BuiltinFnId::Repr, "repr", "Return the quoted representation of a value."),
    info(BuiltinFnId::Int, "int", "Convert a value to an integer."),
    info(BuiltinFnId::Bool, "bool", "Return the truthiness of a value."),
    info(BuiltinFnId::Float, "float", "Convert a value to a float."),
    info(BuiltinFnId::List, "list", "Build a list from an iterable."),
    info(BuiltinFnId::Tuple, "tuple", "Build a tuple from an iterable."),
    info(BuiltinFnId::Dict, "dict", "Build a dict from pairs and keyword arguments."),
    info(BuiltinFnId::Range, "range", "Return a list of integers."),
    info(BuiltinFnId::Enumerate, "enumerate", "Pair each element with its index."),
    info(BuiltinFnId::Zip, "zip", "Combine iterables element-wise."),
    info(BuiltinFnId::Sorted, "sorted", "Return a sorted list."),
    info(BuiltinFnId::Reversed, "reversed", "Return a reversed list."),
    info(BuiltinFnId::Min, "min", "Return the smallest element."),
    info(BuiltinFnId::Max, "max", "Return the largest element."),
    info(BuiltinFnId::Any, "any", "Whether any element is truthy."),
    info(BuiltinFnId::All, "all", "Whether every element is truthy."),
    info(BuiltinFnId::Abs, "abs", "Return the absolute value of a number."),
    info(BuiltinFnId::Hasattr, "hasattr", "Whether a value has the named field or method."),
    info(BuiltinFnId::Getattr, "getattr", "Read a field or method by name."),
    info(BuiltinFnId::Dir, "dir", "List the field and method names of a value."),
    info(BuiltinFnId::Type, "type", "Return the type name of a value."),
    info(BuiltinFnId::Print, "print", "Write values to the debug log."),
    info(BuiltinFnId::Fail, "fail", "Abort evaluation with an error."),
];

/// Return the full metadata entry for a builtin.
pub fn info_for(id: BuiltinFnId) -> &'static BuiltinFnInfo {
    &BUILTIN_FUNCTIONS[id as usize]
}

/// Canonical spelling.
pub fn as_str(id: BuiltinFnId) -> &'static str {
    info_for(id).canonical
}

/// Lookup by spelling.
pub fn from_str(s: &str) -> Option<BuiltinFnId> {
    BUILTIN_FUNCTIONS.iter().find(|b| b.canonical == s).map(|b| b.id)
}

const fn info(id: BuiltinFnId, canonical: &'static str, summary: &'static str) -> BuiltinFnInfo {
    BuiltinFnInfo { id, canonical, summary }
}
