//! Expression evaluation and assignment.

use std::collections::HashMap;
use std::rc::Rc;

use attrscript_syntax::ast::{AssignTarget, BinaryOp, CallArg, CompClause, Expr, Param, Spanned};

use super::value::{Dict, Function, FunctionBody, Value, iterate};
use super::{EvalError, Frame, Interpreter, Location, methods, ops};

/// Where comprehension results accumulate.
enum CompSink<'a> {
    List(&'a Spanned<Expr>, Vec<Value>),
    Dict(&'a Spanned<Expr>, &'a Spanned<Expr>, Dict),
}

/// Which scope a name target binds in.
#[derive(Clone, Copy)]
enum BindScope {
    Frame,
    Comprehension,
}

impl Interpreter<'_> {
    pub(crate) fn eval(&mut self, frame: &mut Frame, expr: &Spanned<Expr>) -> Result<Value, EvalError> {
        self.eval_inner(frame, expr)
            .map_err(|e| e.at(&frame.module, expr.span))
    }

    fn eval_inner(&mut self, frame: &mut Frame, expr: &Spanned<Expr>) -> Result<Value, EvalError> {
        match &expr.node {
            Expr::Name(name) => self.lookup(frame, name),
            Expr::Int(i) => Ok(Value::Int(*i)),
            Expr::Float(f) => Ok(Value::Float(*f)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::None => Ok(Value::None),
            Expr::List(items) => Ok(Value::list(self.eval_all(frame, items)?)),
            Expr::Tuple(items) => Ok(Value::tuple(self.eval_all(frame, items)?)),
            Expr::Dict(pairs) => {
                let dict = Dict::new();
                for (k, v) in pairs {
                    let key = self.eval(frame, k)?;
                    let value = self.eval(frame, v)?;
                    if dict.contains(&key)? {
                        return Err(EvalError::new(format!("duplicate key {} in dict literal", key.repr())));
                    }
                    dict.insert(key, value)?;
                }
                Ok(Value::Dict(Rc::new(dict)))
            }
            Expr::Unary { op, operand } => {
                let v = self.eval(frame, operand)?;
                ops::unary(*op, v)
            }
            Expr::Binary { op: BinaryOp::And, lhs, rhs } => {
                let l = self.eval(frame, lhs)?;
                if !l.truth() { Ok(l) } else { self.eval(frame, rhs) }
            }
            Expr::Binary { op: BinaryOp::Or, lhs, rhs } => {
                let l = self.eval(frame, lhs)?;
                if l.truth() { Ok(l) } else { self.eval(frame, rhs) }
            }
            Expr::Binary { op, lhs, rhs } => {
                let l = self.eval(frame, lhs)?;
                let r = self.eval(frame, rhs)?;
                ops::binary(*op, l, r)
            }
            Expr::Call { callee, args } => {
                let func = self.eval(frame, callee)?;
                let (positional, named) = self.eval_args(frame, args)?;
                self.call_value(&func, positional, named).map_err(|e| match &func {
                    Value::Function(f) => {
                        let site = Location {
                            module: frame.module.name.clone(),
                            source: frame.module.source.clone(),
                            span: expr.span,
                        };
                        e.with_note(format!("in {}, called at {}", f.name, site))
                    }
                    _ => e,
                })
            }
            Expr::Attr { object, name } => {
                let object = self.eval(frame, object)?;
                methods::get_attr(&object, name)
            }
            Expr::Index { object, index } => {
                let object = self.eval(frame, object)?;
                let index = self.eval(frame, index)?;
                ops::index(&object, &index)
            }
            Expr::Slice { object, start, end, step } => {
                let object = self.eval(frame, object)?;
                let start = self.eval_slice_bound(frame, start.as_deref())?;
                let end = self.eval_slice_bound(frame, end.as_deref())?;
                let step = self.eval_slice_bound(frame, step.as_deref())?;
                ops::slice(&object, start, end, step)
            }
            Expr::Conditional { cond, then_expr, else_expr } => {
                if self.eval(frame, cond)?.truth() {
                    self.eval(frame, then_expr)
                } else {
                    self.eval(frame, else_expr)
                }
            }
            Expr::Lambda { params, body } => {
                self.make_function(frame, "lambda", params, FunctionBody::Expr((**body).clone()))
            }
            Expr::ListComp { element, clauses } => {
                let mut sink = CompSink::List(element, Vec::new());
                self.comprehension(frame, clauses, &mut sink)?;
                match sink {
                    CompSink::List(_, items) => Ok(Value::list(items)),
                    CompSink::Dict(_, _, dict) => Ok(Value::Dict(Rc::new(dict))),
                }
            }
            Expr::DictComp { key, value, clauses } => {
                let mut sink = CompSink::Dict(key, value, Dict::new());
                self.comprehension(frame, clauses, &mut sink)?;
                match sink {
                    CompSink::List(_, items) => Ok(Value::list(items)),
                    CompSink::Dict(_, _, dict) => Ok(Value::Dict(Rc::new(dict))),
                }
            }
        }
    }

    fn eval_all(&mut self, frame: &mut Frame, exprs: &[Spanned<Expr>]) -> Result<Vec<Value>, EvalError> {
        exprs.iter().map(|e| self.eval(frame, e)).collect()
    }

    fn eval_slice_bound(&mut self, frame: &mut Frame, expr: Option<&Spanned<Expr>>) -> Result<Option<i64>, EvalError> {
        match expr {
            None => Ok(None),
            Some(expr) => match self.eval(frame, expr)? {
                Value::None => Ok(None),
                v => v.as_int("slice index").map(Some),
            },
        }
    }

    fn eval_args(
        &mut self,
        frame: &mut Frame,
        args: &[CallArg],
    ) -> Result<(Vec<Value>, Vec<(String, Value)>), EvalError> {
        let mut positional = Vec::new();
        let mut named = Vec::new();
        for arg in args {
            match arg {
                CallArg::Positional(e) => positional.push(self.eval(frame, e)?),
                CallArg::Named(name, e) => named.push((name.clone(), self.eval(frame, e)?)),
                CallArg::Star(e) => {
                    let v = self.eval(frame, e)?;
                    positional.extend(iterate(&v)?);
                }
                CallArg::StarStar(e) => match self.eval(frame, e)? {
                    Value::Dict(d) => {
                        for (k, v) in d.entries().iter() {
                            let key = k.as_str("**kwargs key")?;
                            named.push((key.to_string(), v.clone()));
                        }
                    }
                    other => {
                        return Err(EvalError::new(format!(
                            "argument after ** must be a dict, not {}",
                            other.type_name()
                        )));
                    }
                },
            }
        }
        Ok((positional, named))
    }

    pub(crate) fn make_function(
        &mut self,
        frame: &mut Frame,
        name: &str,
        params: &[Param],
        body: FunctionBody,
    ) -> Result<Value, EvalError> {
        let mut defaults = Vec::with_capacity(params.len());
        for param in params {
            defaults.push(match &param.default {
                Some(e) => Some(self.eval(frame, e)?),
                None => None,
            });
        }
        let captured: HashMap<String, Value> = frame.closure_env();
        Ok(Value::Function(Rc::new(Function::new(
            name.to_string(),
            params.to_vec(),
            defaults,
            body,
            frame.module.clone(),
            captured,
        ))))
    }

    fn comprehension(&mut self, frame: &mut Frame, clauses: &[CompClause], sink: &mut CompSink<'_>) -> Result<(), EvalError> {
        frame.comp.push(HashMap::new());
        let result = self.comp_clauses(frame, clauses, sink);
        frame.comp.pop();
        result
    }

    fn comp_clauses(&mut self, frame: &mut Frame, clauses: &[CompClause], sink: &mut CompSink<'_>) -> Result<(), EvalError> {
        let Some((clause, rest)) = clauses.split_first() else {
            match sink {
                CompSink::List(element, items) => {
                    let v = self.eval(frame, element)?;
                    items.push(v);
                }
                CompSink::Dict(key, value, dict) => {
                    let k = self.eval(frame, key)?;
                    let v = self.eval(frame, value)?;
                    dict.insert(k, v)?;
                }
            }
            return Ok(());
        };
        match clause {
            CompClause::For { target, iter } => {
                let iterable = self.eval(frame, iter)?;
                for item in iterate(&iterable)? {
                    self.tick()?;
                    self.bind(frame, target, item, BindScope::Comprehension)?;
                    self.comp_clauses(frame, rest, sink)?;
                }
                Ok(())
            }
            CompClause::If(cond) => {
                if self.eval(frame, cond)?.truth() {
                    self.comp_clauses(frame, rest, sink)?;
                }
                Ok(())
            }
        }
    }

    pub(crate) fn assign(&mut self, frame: &mut Frame, target: &Spanned<AssignTarget>, value: Value) -> Result<(), EvalError> {
        self.bind(frame, target, value, BindScope::Frame)
    }

    fn bind(
        &mut self,
        frame: &mut Frame,
        target: &Spanned<AssignTarget>,
        value: Value,
        scope: BindScope,
    ) -> Result<(), EvalError> {
        let result = match &target.node {
            AssignTarget::Name(name) => {
                match (scope, frame.comp.last_mut()) {
                    (BindScope::Comprehension, Some(comp)) => {
                        comp.insert(name.clone(), value);
                    }
                    _ => frame.set(name, value),
                }
                Ok(())
            }
            AssignTarget::Index { object, index } => {
                let object = self.eval(frame, object)?;
                let index = self.eval(frame, index)?;
                ops::set_index(&object, index, value)
            }
            AssignTarget::Attr { object, name } => {
                let object = self.eval(frame, object)?;
                Err(EvalError::new(format!(
                    "cannot set .{} field of {} value",
                    name,
                    object.type_name()
                )))
            }
            AssignTarget::Tuple(targets) => {
                let items = unpack(&value, targets.len())?;
                for (t, item) in targets.iter().zip(items) {
                    self.bind(frame, t, item, scope)?;
                }
                Ok(())
            }
        };
        result.map_err(|e| e.at(&frame.module, target.span))
    }

    /// `target op= value`. Lists extend in place under `+=`.
    pub(crate) fn aug_assign(
        &mut self,
        frame: &mut Frame,
        target: &Spanned<AssignTarget>,
        op: BinaryOp,
        value: &Spanned<Expr>,
    ) -> Result<(), EvalError> {
        match &target.node {
            AssignTarget::Name(name) => {
                let old = self.lookup(frame, name)?;
                let rhs = self.eval(frame, value)?;
                let new = apply_aug(op, old, rhs)?;
                frame.set(name, new);
                Ok(())
            }
            AssignTarget::Index { object, index } => {
                let object = self.eval(frame, object)?;
                let index = self.eval(frame, index)?;
                let old = ops::index(&object, &index)?;
                let rhs = self.eval(frame, value)?;
                let new = apply_aug(op, old, rhs)?;
                ops::set_index(&object, index, new)
            }
            AssignTarget::Attr { name, .. } => Err(EvalError::new(format!("cannot update .{} field", name))),
            AssignTarget::Tuple(_) => Err(EvalError::new("cannot use augmented assignment on a tuple target")),
        }
    }
}

fn apply_aug(op: BinaryOp, old: Value, rhs: Value) -> Result<Value, EvalError> {
    if let (BinaryOp::Add, Value::List(list)) = (op, &old) {
        let extra = iterate(&rhs)?;
        list.items_mut()?.extend(extra);
        return Ok(old);
    }
    ops::binary(op, old, rhs)
}

fn unpack(value: &Value, want: usize) -> Result<Vec<Value>, EvalError> {
    let items = iterate(value)?;
    match items.len().cmp(&want) {
        std::cmp::Ordering::Equal => Ok(items),
        std::cmp::Ordering::Greater => Err(EvalError::new(format!(
            "too many values to unpack (got {}, want {})",
            items.len(),
            want
        ))),
        std::cmp::Ordering::Less => Err(EvalError::new(format!(
            "too few values to unpack (got {}, want {})",
            items.len(),
            want
        ))),
    }
}
