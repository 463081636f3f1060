//! Tree-walking evaluator for attrscript modules.
//!
//! An [`Interpreter`] executes parsed modules against three layers of names: module globals, values predeclared
//! by the embedder (`run`, `none`, ...), and the universal builtins from
//! `attrscript_core::lang::builtins`. Everything that touches the outside world goes through the [`Host`] trait,
//! so the evaluator itself never spawns processes or reads files.
//!
//! ## Semantics worth knowing
//! - Executing a module freezes its globals; values a module exports cannot be mutated afterwards.
//! - Recursion is rejected, and calls nest at most [`Limits::max_call_depth`] frames.
//! - Every executed statement and comprehension iteration counts against [`Limits::max_steps`].

pub mod builtins;
mod call;
mod error;
mod eval;
mod exec;
mod format;
mod methods;
pub mod ops;
mod value;

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use attrscript_core::lang::builtins as builtin_names;
use attrscript_syntax::ast::Module;
use attrscript_syntax::{lexer, parser};

pub use error::{EvalError, ExecError, Location};
pub use value::{Builtin, BuiltinKind, Dict, Function, FunctionBody, List, Struct, Value, iterate};

/// Execution bounds for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_call_depth: usize,
    pub max_steps: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_call_depth: 64,
            max_steps: 1_000_000,
        }
    }
}

/// Source text returned by [`Host::resolve_load`].
#[derive(Debug, Clone)]
pub struct LoadedSource {
    /// Cache key; two loads with the same key share one module.
    pub key: String,
    /// Display name used in error locations.
    pub name: String,
    /// Directory that the module's own `load` statements resolve against.
    pub origin: PathBuf,
    pub source: String,
}

/// The embedder's side of evaluation.
pub trait Host {
    /// Call a host function installed with [`Interpreter::predeclare_host_fn`].
    fn call(&mut self, name: &str, args: &[Value]) -> Result<Value, EvalError>;

    /// Find the source of `load(module, ...)` issued by a module whose origin is `origin`.
    fn resolve_load(&mut self, module: &str, origin: &Path) -> Result<LoadedSource, EvalError>;
}

/// A host with no functions and no loadable modules.
#[derive(Debug, Default)]
pub struct NoHost;

impl Host for NoHost {
    fn call(&mut self, name: &str, _args: &[Value]) -> Result<Value, EvalError> {
        Err(EvalError::new(format!("{} is not available here", name)))
    }

    fn resolve_load(&mut self, module: &str, _origin: &Path) -> Result<LoadedSource, EvalError> {
        Err(EvalError::new(format!("cannot load {}: loading is not available here", module)))
    }
}

/// The globals of one executed module.
#[derive(Debug)]
pub struct ModuleEnv {
    pub name: String,
    pub origin: PathBuf,
    pub source: Arc<str>,
    globals: RefCell<HashMap<String, Value>>,
}

impl ModuleEnv {
    pub fn new(name: impl Into<String>, origin: PathBuf, source: &str) -> Self {
        Self {
            name: name.into(),
            origin,
            source: Arc::from(source),
            globals: RefCell::new(HashMap::new()),
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.globals.borrow().get(name).cloned()
    }

    pub(crate) fn set(&self, name: &str, value: Value) {
        self.globals.borrow_mut().insert(name.to_string(), value);
    }

    /// Global names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.globals.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    fn freeze(&self) {
        for value in self.globals.borrow().values() {
            value.freeze();
        }
    }
}

/// Name resolution state for the code currently executing.
pub(crate) struct Frame {
    pub(crate) module: Rc<ModuleEnv>,
    locals: HashMap<String, Value>,
    /// `None` at module top level, where assignments write globals.
    bound: Option<Rc<HashSet<String>>>,
    captured: HashMap<String, Value>,
    /// Comprehension scopes, innermost last.
    comp: Vec<HashMap<String, Value>>,
}

impl Frame {
    fn module_level(module: Rc<ModuleEnv>) -> Self {
        Self {
            module,
            locals: HashMap::new(),
            bound: None,
            captured: HashMap::new(),
            comp: Vec::new(),
        }
    }

    fn function(func: &Function, locals: HashMap<String, Value>) -> Self {
        Self {
            module: func.module.clone(),
            locals,
            bound: Some(func.bound.clone()),
            captured: func.captured.clone(),
            comp: Vec::new(),
        }
    }

    pub(crate) fn set(&mut self, name: &str, value: Value) {
        if self.bound.is_some() {
            self.locals.insert(name.to_string(), value);
        } else {
            self.module.set(name, value);
        }
    }

    /// Values a nested `def` or lambda can see from this frame.
    fn closure_env(&self) -> HashMap<String, Value> {
        if self.bound.is_none() {
            return HashMap::new();
        }
        let mut env = self.captured.clone();
        env.extend(self.locals.iter().map(|(k, v)| (k.clone(), v.clone())));
        for scope in &self.comp {
            env.extend(scope.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        env
    }
}

/// Executes modules and calls script functions.
pub struct Interpreter<'h> {
    host: &'h mut dyn Host,
    limits: Limits,
    predeclared: HashMap<String, Value>,
    /// Loaded modules by key; `None` while a module is still executing.
    modules: HashMap<String, Option<Rc<ModuleEnv>>>,
    stack: Vec<Rc<Function>>,
    steps: u64,
}

impl<'h> Interpreter<'h> {
    pub fn new(host: &'h mut dyn Host, limits: Limits) -> Self {
        Self {
            host,
            limits,
            predeclared: HashMap::new(),
            modules: HashMap::new(),
            stack: Vec::new(),
            steps: 0,
        }
    }

    /// Make `value` visible to every module under `name`, shadowing any builtin of that name.
    pub fn predeclare(&mut self, name: &str, value: Value) {
        self.predeclared.insert(name.to_string(), value);
    }

    /// Install a function whose calls are forwarded to [`Host::call`].
    pub fn predeclare_host_fn(&mut self, name: &str) {
        self.predeclare(name, Builtin::host(name));
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Parse and execute a module, then freeze its globals.
    ///
    /// ## Parameters
    /// - `key`: identity for load-cycle detection; a module that loads its own key fails.
    /// - `name`: display name for error locations.
    /// - `origin`: directory its `load` statements resolve against.
    #[tracing::instrument(skip(self, source), fields(steps))]
    pub fn exec_module(
        &mut self,
        key: &str,
        name: &str,
        origin: &Path,
        source: &str,
    ) -> Result<Rc<ModuleEnv>, ExecError> {
        let module = parse_module(name, source)?;
        let env = Rc::new(ModuleEnv::new(name, origin.to_path_buf(), source));
        self.modules.insert(key.to_string(), None);

        let mut frame = Frame::module_level(env.clone());
        let flow = self.exec_block(&mut frame, &module.stmts);
        let result = match flow {
            Ok(exec::Flow::Normal) => Ok(()),
            Ok(exec::Flow::Return(_)) => Err(EvalError::new("return statement outside function")),
            Ok(exec::Flow::Break | exec::Flow::Continue) => Err(EvalError::new("break or continue outside loop")),
            Err(e) => Err(e),
        };
        tracing::Span::current().record("steps", self.steps);
        if let Err(e) = result {
            self.modules.remove(key);
            return Err(ExecError::Eval(e));
        }

        env.freeze();
        self.modules.insert(key.to_string(), Some(env.clone()));
        Ok(env)
    }

    /// Call a callable value with positional and keyword arguments.
    pub fn call(&mut self, callee: &Value, args: Vec<Value>, named: Vec<(String, Value)>) -> Result<Value, EvalError> {
        self.call_value(callee, args, named)
    }

    fn load_module(&mut self, module: &str, origin: &Path) -> Result<Rc<ModuleEnv>, EvalError> {
        let loaded = self.host.resolve_load(module, origin)?;
        match self.modules.get(&loaded.key) {
            Some(Some(env)) => return Ok(env.clone()),
            Some(None) => {
                return Err(EvalError::new(format!("cycle in dependency graph when loading {}", module)));
            }
            None => {}
        }
        tracing::debug!(module, key = %loaded.key, "loading module");
        self.exec_module(&loaded.key, &loaded.name, &loaded.origin, &loaded.source)
            .map_err(|e| match e {
                ExecError::Syntax { .. } => EvalError::new(format!("cannot load {}: {}", module, e)),
                ExecError::Eval(inner) => inner.with_note(format!("while loading {}", module)),
            })
    }

    fn lookup(&self, frame: &Frame, name: &str) -> Result<Value, EvalError> {
        for scope in frame.comp.iter().rev() {
            if let Some(v) = scope.get(name) {
                return Ok(v.clone());
            }
        }
        if let Some(bound) = &frame.bound {
            if let Some(v) = frame.locals.get(name) {
                return Ok(v.clone());
            }
            if bound.contains(name) {
                return Err(EvalError::new(format!(
                    "local variable {} referenced before assignment",
                    name
                )));
            }
            if let Some(v) = frame.captured.get(name) {
                return Ok(v.clone());
            }
        }
        if let Some(v) = frame.module.get(name) {
            return Ok(v);
        }
        if let Some(v) = self.predeclared.get(name) {
            return Ok(v.clone());
        }
        if let Some(id) = builtin_names::from_str(name) {
            return Ok(Builtin::global(id));
        }
        Err(EvalError::new(format!("undefined: {}", name)))
    }

    fn tick(&mut self) -> Result<(), EvalError> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            return Err(EvalError::new(format!(
                "evaluation exceeded {} steps",
                self.limits.max_steps
            )));
        }
        Ok(())
    }
}

impl Drop for Interpreter<'_> {
    /// Functions hold their module and modules hold their functions; clearing globals breaks those cycles.
    fn drop(&mut self) {
        for env in self.modules.values().flatten() {
            if let Ok(mut globals) = env.globals.try_borrow_mut() {
                globals.clear();
            }
        }
    }
}

fn parse_module(name: &str, source: &str) -> Result<Module, ExecError> {
    let syntax = |errors| ExecError::Syntax {
        name: name.to_string(),
        text: source.to_string(),
        errors,
    };
    let tokens = lexer::lex(source).map_err(syntax)?;
    parser::parse(&tokens).map_err(syntax)
}

#[cfg(test)]
mod tests;
