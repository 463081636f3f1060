//! Statement execution.

use std::rc::Rc;

use attrscript_syntax::ast::{FunctionDef, LoadStmt, Spanned, Stmt};

use super::value::{FunctionBody, Value, iterate};
use super::{EvalError, Frame, Interpreter};

/// How control leaves a statement.
pub(crate) enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

impl Interpreter<'_> {
    pub(crate) fn exec_block(&mut self, frame: &mut Frame, stmts: &[Spanned<Stmt>]) -> Result<Flow, EvalError> {
        for stmt in stmts {
            match self.exec(frame, stmt)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&mut self, frame: &mut Frame, stmt: &Spanned<Stmt>) -> Result<Flow, EvalError> {
        self.exec_inner(frame, stmt)
            .map_err(|e| e.at(&frame.module, stmt.span))
    }

    fn exec_inner(&mut self, frame: &mut Frame, stmt: &Spanned<Stmt>) -> Result<Flow, EvalError> {
        self.tick()?;
        match &stmt.node {
            Stmt::Expr(expr) => {
                self.eval(frame, expr)?;
            }
            Stmt::Assign { target, value } => {
                let value = self.eval(frame, value)?;
                self.assign(frame, target, value)?;
            }
            Stmt::AugAssign { target, op, value } => self.aug_assign(frame, target, *op, value)?,
            Stmt::Def(def) => self.exec_def(frame, def)?,
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(frame, expr)?,
                    None => Value::None,
                };
                return Ok(Flow::Return(value));
            }
            Stmt::If(stmt) => {
                for (cond, body) in &stmt.branches {
                    if self.eval(frame, cond)?.truth() {
                        return self.exec_block(frame, body);
                    }
                }
                if let Some(body) = &stmt.else_body {
                    return self.exec_block(frame, body);
                }
            }
            Stmt::For(stmt) => {
                let iterable = self.eval(frame, &stmt.iter)?;
                for item in iterate(&iterable)? {
                    self.assign(frame, &stmt.target, item)?;
                    match self.exec_block(frame, &stmt.body)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
            }
            Stmt::Load(load) => self.exec_load(frame, load)?,
            Stmt::Pass => {}
            Stmt::Break => return Ok(Flow::Break),
            Stmt::Continue => return Ok(Flow::Continue),
        }
        Ok(Flow::Normal)
    }

    fn exec_def(&mut self, frame: &mut Frame, def: &FunctionDef) -> Result<(), EvalError> {
        let func = self.make_function(frame, &def.name, &def.params, FunctionBody::Block(def.body.clone()))?;
        frame.set(&def.name, func);
        Ok(())
    }

    fn exec_load(&mut self, frame: &mut Frame, load: &LoadStmt) -> Result<(), EvalError> {
        let origin = frame.module.origin.clone();
        let module = self.load_module(&load.module, &origin)?;
        for binding in &load.bindings {
            let value = module.get(&binding.exported).ok_or_else(|| {
                EvalError::new(format!(
                    "load: name {} not found in module {}",
                    binding.exported, load.module
                ))
            })?;
            frame.set(&binding.local, value);
        }
        Ok(())
    }

    /// Call a user function: bind arguments, run the body, pop the frame.
    pub(crate) fn call_function(
        &mut self,
        func: &Rc<super::Function>,
        args: Vec<Value>,
        named: Vec<(String, Value)>,
    ) -> Result<Value, EvalError> {
        if self.stack.iter().any(|f| Rc::ptr_eq(f, func)) {
            return Err(EvalError::new(format!("function {} called recursively", func.name)));
        }
        if self.stack.len() >= self.limits.max_call_depth {
            return Err(EvalError::new(format!(
                "call stack exceeds {} frames",
                self.limits.max_call_depth
            )));
        }

        let locals = super::call::bind_params(func, args, named)?;
        let mut frame = Frame::function(func, locals);
        self.stack.push(func.clone());
        let result = match &func.body {
            FunctionBody::Block(stmts) => match self.exec_block(&mut frame, stmts) {
                Ok(Flow::Return(v)) => Ok(v),
                Ok(Flow::Normal) => Ok(Value::None),
                Ok(Flow::Break | Flow::Continue) => Err(EvalError::new("break or continue outside loop")),
                Err(e) => Err(e),
            },
            FunctionBody::Expr(expr) => self.eval(&mut frame, expr),
        };
        self.stack.pop();
        result
    }
}
