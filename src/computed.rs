//! Evaluating computed attribute values.
//!
//! A computed value names a script function (or carries an inline snippet). Evaluation executes the script with the
//! host builtins installed, then calls the function with read-only views of the attribute and its target:
//!
//! ```text
//! def some_function(attr, t):
//!     return run("uname").output.strip()
//! ```
//!
//! Host builtins:
//! - `run(*args)`: execute a command in the contract directory; returns `struct(output, stderr, exit_code)`.
//! - `broken_assumption(*args)`: fail with `broken assumption: ...`.
//! - `none`: the `None` value.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use attrscript_syntax::CompileError;
use miette::Report;

use crate::config::EvalConfig;
use crate::interp::{EvalError, ExecError, Host, Interpreter, LoadedSource, Struct, Value};
use crate::model::{Attr, ComputedValue, Target, ValidationError};
use crate::proxy::{AttrProxy, TargetProxy};
use crate::runner::{CommandRequest, CommandRunner, Isolation, RunError};

/// Name of the function an inline snippet is wrapped in.
pub const INLINE_FN: &str = "inline_fn";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InlineError {
    #[error("inline script was empty")]
    Empty,
    #[error("inline script had inconsistent indentation")]
    InconsistentIndentation,
}

#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Inline(#[from] InlineError),

    #[error("{}", syntax_summary(.name, .text, .errors))]
    Syntax {
        name: String,
        text: String,
        errors: Vec<CompileError>,
    },

    #[error("{}", .0.located())]
    Eval(EvalError),

    #[error("cannot compute value: function {0:?} was not present")]
    MissingFunction(String),

    #[error("closing runner: {0}")]
    Run(#[from] RunError),
}

fn syntax_summary(name: &str, text: &str, errors: &[CompileError]) -> String {
    ExecError::Syntax {
        name: name.to_string(),
        text: text.to_string(),
        errors: errors.to_vec(),
    }
    .to_string()
}

impl From<ExecError> for ComputeError {
    fn from(err: ExecError) -> Self {
        match err {
            ExecError::Syntax { name, text, errors } => ComputeError::Syntax { name, text, errors },
            ExecError::Eval(e) => ComputeError::Eval(e),
        }
    }
}

impl From<EvalError> for ComputeError {
    fn from(err: EvalError) -> Self {
        ComputeError::Eval(err)
    }
}

impl ComputeError {
    /// Diagnostics with source context where there is any.
    pub fn to_reports(&self) -> Vec<Report> {
        match self {
            ComputeError::Syntax { name, text, errors } => errors.iter().map(|e| e.to_report(name, text)).collect(),
            ComputeError::Eval(e) => vec![e.to_report()],
            other => vec![miette::miette!("{}", other)],
        }
    }
}

/// Wrap an inline snippet into `def inline_fn(attr, t):`.
///
/// The first non-empty line sets the indentation that every line must share, and the last line is returned unless it
/// already is a `return` statement.
pub fn script_from_inline(code: &str) -> Result<String, InlineError> {
    let trimmed = code.trim_end_matches(['\n', ' ']);
    let lines: Vec<&str> = trimmed.split('\n').collect();
    let mut out = String::with_capacity(128);
    out.push_str("def ");
    out.push_str(INLINE_FN);
    out.push_str("(attr, t):\n");

    let mut indent: Option<usize> = None;
    let mut wrote_any = false;
    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let width = *indent.get_or_insert_with(|| line.len() - line.trim_start_matches(' ').len());
        let Some(body) = line.get(width..).filter(|_| line.as_bytes()[..width].iter().all(|b| *b == b' ')) else {
            return Err(InlineError::InconsistentIndentation);
        };
        out.push_str("  ");
        if i + 1 == lines.len() && !body.starts_with("return ") {
            out.push_str("return ");
        }
        out.push_str(body);
        out.push('\n');
        wrote_any = true;
    }
    if !wrote_any {
        return Err(InlineError::Empty);
    }
    Ok(out)
}

/// Compute the value of `attr` on `target`.
///
/// The runner is closed before returning. A failure to close is reported only if evaluation itself succeeded.
#[tracing::instrument(skip_all, fields(attr = %attr.path, target = %target, value = %computed))]
pub fn eval_computed_attribute(
    attr: &Attr,
    target: &Arc<Target>,
    computed: &ComputedValue,
    runner: &mut dyn CommandRunner,
    config: &EvalConfig,
) -> Result<Value, ComputeError> {
    let result = eval_inner(attr, target, computed, runner, config);
    let closed = runner.close();
    match (result, closed) {
        (Ok(v), Ok(())) => Ok(v),
        (Ok(_), Err(e)) => Err(ComputeError::Run(e)),
        (Err(e), Err(close_err)) => {
            tracing::warn!(error = %close_err, "closing runner after a failed evaluation");
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
    }
}

fn eval_inner(
    attr: &Attr,
    target: &Arc<Target>,
    computed: &ComputedValue,
    runner: &mut dyn CommandRunner,
    config: &EvalConfig,
) -> Result<Value, ComputeError> {
    computed.validate()?;

    let (source, func_name, name, origin) = if computed.is_inline() {
        let source = script_from_inline(&computed.inline_script)?;
        (source, INLINE_FN.to_string(), computed.to_string(), computed.contract_dir.clone())
    } else {
        let source = std::fs::read_to_string(&computed.filename).map_err(|source| ComputeError::Io {
            path: computed.filename.clone(),
            source,
        })?;
        let origin = match computed.filename.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => computed.contract_dir.clone(),
        };
        (source, computed.func.clone(), computed.filename.display().to_string(), origin)
    };

    let mut host = ComputeHost {
        runner,
        dir: computed.contract_dir.clone(),
        isolation: if computed.read_write {
            Isolation::ReadWrite
        } else {
            Isolation::ReadOnly
        },
    };
    let mut interp = Interpreter::new(&mut host, config.limits());
    interp.predeclare("none", Value::None);
    interp.predeclare_host_fn("run");
    interp.predeclare_host_fn("broken_assumption");

    let module = interp.exec_module(&name, &name, &origin, &source)?;
    // The inline wrapper always defines INLINE_FN, so only file scripts can miss their function.
    let func = module
        .get(&func_name)
        .ok_or_else(|| ComputeError::MissingFunction(func_name.clone()))?;
    let args = vec![AttrProxy::value(attr.clone()), TargetProxy::value(target.clone())];
    let value = interp.call(&func, args, Vec::new())?;
    tracing::debug!(steps = interp.steps(), "computed value");
    Ok(value)
}

/// Host side of a computed-attribute evaluation.
struct ComputeHost<'r> {
    runner: &'r mut dyn CommandRunner,
    dir: PathBuf,
    isolation: Isolation,
}

impl Host for ComputeHost<'_> {
    fn call(&mut self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        let words: Vec<String> = args.iter().map(Value::to_str).collect();
        match name {
            "run" => {
                let request = CommandRequest {
                    args: words,
                    dir: self.dir.clone(),
                    isolation: self.isolation,
                };
                let output = self
                    .runner
                    .run(&request)
                    .map_err(|e| EvalError::new(e.to_string()))?;
                Ok(Struct::new(vec![
                    ("output", Value::Str(output.stdout)),
                    ("stderr", Value::Str(output.stderr)),
                    ("exit_code", Value::Int(i64::from(output.exit_code))),
                ]))
            }
            "broken_assumption" => Err(EvalError::new(format!("broken assumption: {}", words.join(" ")))),
            other => Err(EvalError::new(format!("undefined host function {}", other))),
        }
    }

    fn resolve_load(&mut self, module: &str, origin: &Path) -> Result<LoadedSource, EvalError> {
        let path = origin.join(module);
        let source = std::fs::read_to_string(&path)
            .map_err(|e| EvalError::new(format!("cannot load {}: {}", module, e)))?;
        let key = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        let origin = key.parent().map(Path::to_path_buf).unwrap_or_else(|| origin.to_path_buf());
        Ok(LoadedSource {
            key: key.display().to_string(),
            name: module.to_string(),
            origin,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_wraps_and_returns_last_line() {
        insta::assert_snapshot!(script_from_inline("'1' + '2'").unwrap(), @r"
        def inline_fn(attr, t):
          return '1' + '2'
        ");
        insta::assert_snapshot!(script_from_inline("\n  v = 2*2\n  v\n  ").unwrap(), @r"
        def inline_fn(attr, t):
          v = 2*2
          return v
        ");
        let explicit = script_from_inline("v = 'yeet'\nreturn v").unwrap();
        assert_eq!(explicit, "def inline_fn(attr, t):\n  v = 'yeet'\n  return v\n");
    }

    #[test]
    fn test_inline_nested_blocks_keep_relative_indent() {
        let script = script_from_inline("  if attr:\n    x = 1\n  else:\n    x = 2\n  x").unwrap();
        assert_eq!(
            script,
            "def inline_fn(attr, t):\n  if attr:\n    x = 1\n  else:\n    x = 2\n  return x\n"
        );
    }

    #[test]
    fn test_inline_always_defines_wrapper() {
        for code in ["1", "if attr:\n  x = 1\nelse:\n  x = 2\nx", "x = 1\nreturn x"] {
            let script = script_from_inline(code).unwrap();
            let module = attrscript_syntax::parse_source(&script).unwrap();
            assert_eq!(module.function_names(), vec![INLINE_FN], "{script}");
        }
    }

    #[test]
    fn test_inline_errors() {
        assert_eq!(script_from_inline("  a\n b"), Err(InlineError::InconsistentIndentation));
        assert_eq!(script_from_inline("\n \n"), Err(InlineError::Empty));
        assert_eq!(script_from_inline(""), Err(InlineError::Empty));
    }
}
