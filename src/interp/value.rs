//! Runtime values.
//!
//! Values are cheap to clone: scalars are copied, strings are owned, containers and callables are reference
//! counted. Lists and dicts are mutable until frozen; executing a module freezes everything it exported.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use attrscript_core::errors::FROZEN_MUTATION_MSG;
use attrscript_core::format_float;
use attrscript_core::lang::builtins::BuiltinFnId;
use attrscript_core::strings::str_quote;
use attrscript_syntax::ast::{Expr, Param, Spanned, Stmt};

use super::error::EvalError;
use super::ops;
use super::ModuleEnv;
use crate::proxy::{AttrProxy, TargetProxy};

/// Nesting beyond this prints as `...`, which also stops self-referencing containers.
const MAX_DISPLAY_DEPTH: usize = 32;

#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Rc<List>),
    Tuple(Rc<[Value]>),
    Dict(Rc<Dict>),
    Function(Rc<Function>),
    Builtin(Rc<Builtin>),
    Struct(Rc<Struct>),
    Attr(Rc<AttrProxy>),
    Target(Rc<TargetProxy>),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Value {
        Value::Str(s.into())
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(List::new(items)))
    }

    pub fn tuple(items: Vec<Value>) -> Value {
        Value::Tuple(items.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Function(_) => "function",
            Value::Builtin(_) => "builtin_function_or_method",
            Value::Struct(_) => "struct",
            Value::Attr(_) => AttrProxy::TYPE,
            Value::Target(t) => t.type_name(),
        }
    }

    pub fn truth(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(l) => !l.items().is_empty(),
            Value::Tuple(t) => !t.is_empty(),
            Value::Dict(d) => !d.is_empty(),
            _ => true,
        }
    }

    /// Freeze this value and everything reachable from it.
    pub fn freeze(&self) {
        match self {
            Value::List(l) => {
                if !l.frozen.replace(true) {
                    for item in l.items().iter() {
                        item.freeze();
                    }
                }
            }
            Value::Dict(d) => {
                if !d.frozen.replace(true) {
                    for (k, v) in d.entries().iter() {
                        k.freeze();
                        v.freeze();
                    }
                }
            }
            Value::Tuple(items) => items.iter().for_each(Value::freeze),
            Value::Function(f) => {
                if !f.frozen.replace(true) {
                    f.defaults.iter().flatten().for_each(Value::freeze);
                    f.captured.values().for_each(Value::freeze);
                }
            }
            _ => {}
        }
    }

    /// Dict keys must not be mutable containers.
    pub fn check_hashable(&self) -> Result<(), EvalError> {
        match self {
            Value::List(_) | Value::Dict(_) => Err(EvalError::new(format!("unhashable type: {}", self.type_name()))),
            Value::Tuple(items) => items.iter().try_for_each(Value::check_hashable),
            _ => Ok(()),
        }
    }

    pub fn as_int(&self, what: &str) -> Result<i64, EvalError> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(EvalError::new(format!("{}: got {}, want int", what, other.type_name()))),
        }
    }

    pub fn as_str(&self, what: &str) -> Result<&str, EvalError> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(EvalError::new(format!("{}: got {}, want string", what, other.type_name()))),
        }
    }

    /// The `str()` form: strings are bare, everything else is its `repr`.
    pub fn to_str(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            other => other.repr(),
        }
    }

    pub fn repr(&self) -> String {
        let mut out = String::new();
        self.write_repr(&mut out, 0);
        out
    }

    fn write_repr(&self, out: &mut String, depth: usize) {
        if depth > MAX_DISPLAY_DEPTH {
            out.push_str("...");
            return;
        }
        match self {
            Value::None => out.push_str("None"),
            Value::Bool(true) => out.push_str("True"),
            Value::Bool(false) => out.push_str("False"),
            Value::Int(i) => out.push_str(&i.to_string()),
            Value::Float(f) => out.push_str(&format_float(*f)),
            Value::Str(s) => out.push_str(&str_quote(s)),
            Value::List(l) => {
                out.push('[');
                write_items(out, &l.items(), depth);
                out.push(']');
            }
            Value::Tuple(items) => {
                out.push('(');
                write_items(out, items, depth);
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            Value::Dict(d) => {
                out.push('{');
                for (i, (k, v)) in d.entries().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    k.write_repr(out, depth + 1);
                    out.push_str(": ");
                    v.write_repr(out, depth + 1);
                }
                out.push('}');
            }
            Value::Function(f) => out.push_str(&format!("<function {}>", f.name)),
            Value::Builtin(b) => match &b.kind {
                BuiltinKind::Method(recv) => {
                    out.push_str(&format!("<built-in method {} of {} value>", b.name, recv.type_name()))
                }
                _ => out.push_str(&format!("<built-in function {}>", b.name)),
            },
            Value::Struct(s) => {
                out.push_str("struct(");
                for (i, (name, v)) in s.fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(name);
                    out.push_str(" = ");
                    v.write_repr(out, depth + 1);
                }
                out.push(')');
            }
            Value::Attr(_) | Value::Target(_) => out.push_str(self.type_name()),
        }
    }
}

fn write_items(out: &mut String, items: &[Value], depth: usize) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item.write_repr(out, depth + 1);
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_str())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        ops::equals(self, other)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

// ============================================================================
// Containers
// ============================================================================

#[derive(Default)]
pub struct List {
    items: RefCell<Vec<Value>>,
    frozen: Cell<bool>,
}

impl List {
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            items: RefCell::new(items),
            frozen: Cell::new(false),
        }
    }

    pub fn items(&self) -> Ref<'_, Vec<Value>> {
        self.items.borrow()
    }

    /// Mutable access; fails once the list is frozen.
    pub fn items_mut(&self) -> Result<RefMut<'_, Vec<Value>>, EvalError> {
        if self.frozen.get() {
            return Err(EvalError::new(FROZEN_MUTATION_MSG));
        }
        self.items
            .try_borrow_mut()
            .map_err(|_| EvalError::new("cannot mutate a list while it is being iterated"))
    }

    pub fn snapshot(&self) -> Vec<Value> {
        self.items.borrow().clone()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.get()
    }
}

/// An insertion-ordered dictionary.
///
/// Lookups compare keys with script equality, so `1` and `1.0` name the same entry.
#[derive(Default)]
pub struct Dict {
    entries: RefCell<Vec<(Value, Value)>>,
    frozen: Cell<bool>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Ref<'_, Vec<(Value, Value)>> {
        self.entries.borrow()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.get()
    }

    pub fn keys(&self) -> Vec<Value> {
        self.entries.borrow().iter().map(|(k, _)| k.clone()).collect()
    }

    fn position(&self, key: &Value) -> Option<usize> {
        self.entries.borrow().iter().position(|(k, _)| ops::equals(k, key))
    }

    pub fn get(&self, key: &Value) -> Result<Option<Value>, EvalError> {
        key.check_hashable()?;
        Ok(self.position(key).map(|i| self.entries.borrow()[i].1.clone()))
    }

    pub fn contains(&self, key: &Value) -> Result<bool, EvalError> {
        key.check_hashable()?;
        Ok(self.position(key).is_some())
    }

    fn entries_mut(&self) -> Result<RefMut<'_, Vec<(Value, Value)>>, EvalError> {
        if self.frozen.get() {
            return Err(EvalError::new(FROZEN_MUTATION_MSG));
        }
        self.entries
            .try_borrow_mut()
            .map_err(|_| EvalError::new("cannot mutate a dict while it is being iterated"))
    }

    pub fn insert(&self, key: Value, value: Value) -> Result<(), EvalError> {
        key.check_hashable()?;
        let pos = self.position(&key);
        let mut entries = self.entries_mut()?;
        match pos {
            Some(i) => entries[i].1 = value,
            None => entries.push((key, value)),
        }
        Ok(())
    }

    pub fn remove(&self, key: &Value) -> Result<Option<Value>, EvalError> {
        key.check_hashable()?;
        let pos = self.position(key);
        let mut entries = self.entries_mut()?;
        Ok(pos.map(|i| entries.remove(i).1))
    }

    pub fn clear(&self) -> Result<(), EvalError> {
        self.entries_mut()?.clear();
        Ok(())
    }
}

// ============================================================================
// Callables
// ============================================================================

pub enum FunctionBody {
    Block(Vec<Spanned<Stmt>>),
    /// A lambda.
    Expr(Spanned<Expr>),
}

/// A user-defined function or lambda.
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    /// Default values, evaluated when the function was defined; one slot per parameter.
    pub defaults: Vec<Option<Value>>,
    pub body: FunctionBody,
    pub module: Rc<ModuleEnv>,
    /// Names assigned anywhere in the body; these are local for the whole call.
    pub bound: Rc<HashSet<String>>,
    /// Enclosing function locals visible to a nested `def` or lambda, copied at definition time.
    pub captured: HashMap<String, Value>,
    frozen: Cell<bool>,
}

impl Function {
    pub fn new(
        name: String,
        params: Vec<Param>,
        defaults: Vec<Option<Value>>,
        body: FunctionBody,
        module: Rc<ModuleEnv>,
        captured: HashMap<String, Value>,
    ) -> Self {
        let mut bound: HashSet<String> = params.iter().map(|p| p.name.clone()).collect();
        if let FunctionBody::Block(stmts) = &body {
            collect_bindings(stmts, &mut bound);
        }
        Self {
            name,
            params,
            defaults,
            body,
            module,
            bound: Rc::new(bound),
            captured,
            frozen: Cell::new(false),
        }
    }
}

/// Collect the names a block binds, without descending into nested functions.
fn collect_bindings(stmts: &[Spanned<Stmt>], out: &mut HashSet<String>) {
    use attrscript_syntax::ast::AssignTarget;

    fn target_names(target: &AssignTarget, out: &mut HashSet<String>) {
        match target {
            AssignTarget::Name(n) => {
                out.insert(n.clone());
            }
            AssignTarget::Tuple(items) => items.iter().for_each(|t| target_names(&t.node, out)),
            AssignTarget::Index { .. } | AssignTarget::Attr { .. } => {}
        }
    }

    for stmt in stmts {
        match &stmt.node {
            Stmt::Assign { target, .. } | Stmt::AugAssign { target, .. } => target_names(&target.node, out),
            Stmt::Def(def) => {
                out.insert(def.name.clone());
            }
            Stmt::For(f) => {
                target_names(&f.target.node, out);
                collect_bindings(&f.body, out);
            }
            Stmt::If(s) => {
                for (_, body) in &s.branches {
                    collect_bindings(body, out);
                }
                if let Some(body) = &s.else_body {
                    collect_bindings(body, out);
                }
            }
            Stmt::Load(load) => {
                out.extend(load.bindings.iter().map(|b| b.local.clone()));
            }
            _ => {}
        }
    }
}

pub enum BuiltinKind {
    Global(BuiltinFnId),
    /// A method bound to its receiver (`"a,b".split`).
    Method(Value),
    /// Supplied by the embedding host (`run`, `broken_assumption`).
    Host,
}

pub struct Builtin {
    pub name: String,
    pub kind: BuiltinKind,
}

impl Builtin {
    pub fn global(id: BuiltinFnId) -> Value {
        Value::Builtin(Rc::new(Builtin {
            name: attrscript_core::lang::builtins::as_str(id).to_string(),
            kind: BuiltinKind::Global(id),
        }))
    }

    pub fn method(receiver: Value, name: &str) -> Value {
        Value::Builtin(Rc::new(Builtin {
            name: name.to_string(),
            kind: BuiltinKind::Method(receiver),
        }))
    }

    pub fn host(name: &str) -> Value {
        Value::Builtin(Rc::new(Builtin {
            name: name.to_string(),
            kind: BuiltinKind::Host,
        }))
    }
}

/// An immutable record with named fields, such as the result of `run`.
pub struct Struct {
    pub fields: Vec<(String, Value)>,
}

impl Struct {
    pub fn new(fields: Vec<(&str, Value)>) -> Value {
        Value::Struct(Rc::new(Struct {
            fields: fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }))
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}

/// Iterate a value the way `for` does. Strings are not iterable; use `.elems()`.
pub fn iterate(value: &Value) -> Result<Vec<Value>, EvalError> {
    match value {
        Value::List(l) => Ok(l.snapshot()),
        Value::Tuple(items) => Ok(items.to_vec()),
        Value::Dict(d) => Ok(d.keys()),
        Value::Str(_) => Err(EvalError::new("string is not iterable; use .elems()")),
        other => Err(EvalError::new(format!("{} is not iterable", other.type_name()))),
    }
}
