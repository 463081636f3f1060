//! Call dispatch and argument binding.

use std::collections::HashMap;
use std::rc::Rc;

use attrscript_syntax::ast::ParamKind;

use super::value::{BuiltinKind, Dict, Function, Value};
use super::{EvalError, Interpreter, builtins, methods};

impl Interpreter<'_> {
    pub(crate) fn call_value(
        &mut self,
        callee: &Value,
        args: Vec<Value>,
        named: Vec<(String, Value)>,
    ) -> Result<Value, EvalError> {
        match callee {
            Value::Function(func) => self.call_function(func, args, named),
            Value::Builtin(builtin) => match &builtin.kind {
                BuiltinKind::Global(id) => builtins::call(self, *id, args, named),
                BuiltinKind::Method(receiver) => methods::call(receiver, &builtin.name, args, named),
                BuiltinKind::Host => {
                    if let Some((name, _)) = named.first() {
                        return Err(EvalError::new(format!(
                            "{}: unexpected keyword argument {}",
                            builtin.name, name
                        )));
                    }
                    self.host.call(&builtin.name, &args)
                }
            },
            other => Err(EvalError::new(format!(
                "invalid call of non-function ({})",
                other.type_name()
            ))),
        }
    }
}

/// Bind call arguments to a function's parameters.
///
/// Parameters after `*args` are keyword-only. Keywords that match no parameter land in `**kwargs` when the
/// function declares one.
pub(crate) fn bind_params(
    func: &Rc<Function>,
    args: Vec<Value>,
    named: Vec<(String, Value)>,
) -> Result<HashMap<String, Value>, EvalError> {
    let mut locals: HashMap<String, Value> = HashMap::new();
    let positional: Vec<usize> = func
        .params
        .iter()
        .enumerate()
        .take_while(|(_, p)| p.kind == ParamKind::Normal)
        .map(|(i, _)| i)
        .collect();
    let varargs = func.params.iter().find(|p| p.kind == ParamKind::Varargs);
    let kwargs = func.params.iter().find(|p| p.kind == ParamKind::Kwargs);

    let mut args = args.into_iter();
    for &i in &positional {
        match args.next() {
            Some(v) => {
                locals.insert(func.params[i].name.clone(), v);
            }
            None => break,
        }
    }
    let extra: Vec<Value> = args.collect();
    match varargs {
        Some(p) => {
            locals.insert(p.name.clone(), Value::tuple(extra));
        }
        None if !extra.is_empty() => {
            return Err(EvalError::new(format!(
                "function {} accepts at most {} positional arguments ({} given)",
                func.name,
                positional.len(),
                positional.len() + extra.len()
            )));
        }
        None => {}
    }

    let extra_named = Dict::new();
    for (name, value) in named {
        let param = func
            .params
            .iter()
            .find(|p| p.kind == ParamKind::Normal && p.name == name);
        match param {
            Some(p) => {
                if locals.contains_key(&p.name) {
                    return Err(EvalError::new(format!(
                        "function {} got multiple values for parameter {}",
                        func.name, name
                    )));
                }
                locals.insert(name, value);
            }
            None if kwargs.is_some() => {
                if extra_named.contains(&Value::str(name.as_str()))? {
                    return Err(EvalError::new(format!(
                        "function {} got multiple values for keyword argument {}",
                        func.name, name
                    )));
                }
                extra_named.insert(Value::Str(name), value)?;
            }
            None => {
                return Err(EvalError::new(format!(
                    "function {} got an unexpected keyword argument {}",
                    func.name, name
                )));
            }
        }
    }
    if let Some(p) = kwargs {
        locals.insert(p.name.clone(), Value::Dict(Rc::new(extra_named)));
    }

    for (param, default) in func.params.iter().zip(&func.defaults) {
        if param.kind != ParamKind::Normal || locals.contains_key(&param.name) {
            continue;
        }
        match default {
            Some(v) => {
                locals.insert(param.name.clone(), v.clone());
            }
            None => {
                return Err(EvalError::new(format!(
                    "function {} missing argument for {}",
                    func.name, param.name
                )));
            }
        }
    }
    Ok(locals)
}

/// Match builtin arguments against a fixed parameter list.
///
/// The first `required` parameters must be supplied; the rest come back as `None` when absent.
pub(crate) fn unpack_args(
    fname: &str,
    args: Vec<Value>,
    named: Vec<(String, Value)>,
    params: &[&str],
    required: usize,
) -> Result<Vec<Option<Value>>, EvalError> {
    if args.len() > params.len() {
        return Err(EvalError::new(format!(
            "{}: got {} arguments, want at most {}",
            fname,
            args.len(),
            params.len()
        )));
    }
    let mut slots: Vec<Option<Value>> = vec![None; params.len()];
    for (slot, v) in slots.iter_mut().zip(args) {
        *slot = Some(v);
    }
    for (name, value) in named {
        let Some(i) = params.iter().position(|p| *p == name) else {
            return Err(EvalError::new(format!("{}: unexpected keyword argument {}", fname, name)));
        };
        if slots[i].is_some() {
            return Err(EvalError::new(format!("{}: got multiple values for {}", fname, name)));
        }
        slots[i] = Some(value);
    }
    if let Some(i) = slots.iter().take(required).position(Option::is_none) {
        return Err(EvalError::new(format!("{}: missing argument for {}", fname, params[i])));
    }
    Ok(slots)
}

/// A slot that [`unpack_args`] was told is required.
pub(crate) fn required<'a>(slots: &'a [Option<Value>], i: usize, fname: &str) -> Result<&'a Value, EvalError> {
    slots
        .get(i)
        .and_then(Option::as_ref)
        .ok_or_else(|| EvalError::new(format!("{}: missing argument #{}", fname, i + 1)))
}

/// Reject keyword arguments for builtins that take none.
pub(crate) fn no_kwargs(fname: &str, named: &[(String, Value)]) -> Result<(), EvalError> {
    match named.first() {
        Some((name, _)) => Err(EvalError::new(format!("{}: unexpected keyword argument {}", fname, name))),
        None => Ok(()),
    }
}
