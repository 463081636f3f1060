//! Abstract Syntax Tree definitions for attrscript.
//!
//! The tree mirrors the Starlark statement and expression grammar. Every statement and expression carries a
//! [`Span`] so evaluation errors can point back at source.

use std::fmt;

/// Source location span (byte offsets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

pub type Ident = String;

/// A parsed source file: a flat list of top-level statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub stmts: Vec<Spanned<Stmt>>,
}

impl Module {
    /// Names bound by top-level `def` statements, in source order.
    pub fn function_names(&self) -> Vec<&str> {
        self.stmts
            .iter()
            .filter_map(|s| match &s.node {
                Stmt::Def(def) => Some(def.name.as_str()),
                _ => None,
            })
            .collect()
    }
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Spanned<Expr>),
    Assign {
        target: Spanned<AssignTarget>,
        value: Spanned<Expr>,
    },
    /// `x += 1` and friends.
    AugAssign {
        target: Spanned<AssignTarget>,
        op: BinaryOp,
        value: Spanned<Expr>,
    },
    Def(FunctionDef),
    Return(Option<Spanned<Expr>>),
    If(IfStmt),
    For(ForStmt),
    Load(LoadStmt),
    Pass,
    Break,
    Continue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: Ident,
    pub params: Vec<Param>,
    pub body: Vec<Spanned<Stmt>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Normal,
    /// `*args`
    Varargs,
    /// `**kwargs`
    Kwargs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub kind: ParamKind,
    pub default: Option<Spanned<Expr>>,
    pub span: Span,
}

/// `if cond: ... elif cond: ... else: ...`
///
/// `elif` chains are flattened into `branches`.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub branches: Vec<(Spanned<Expr>, Vec<Spanned<Stmt>>)>,
    pub else_body: Option<Vec<Spanned<Stmt>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub target: Spanned<AssignTarget>,
    pub iter: Spanned<Expr>,
    pub body: Vec<Spanned<Stmt>>,
}

/// `load("module.star", "sym", alias = "other")`
#[derive(Debug, Clone, PartialEq)]
pub struct LoadStmt {
    pub module: String,
    pub bindings: Vec<LoadBinding>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadBinding {
    /// Name bound in the loading module.
    pub local: Ident,
    /// Name exported by the loaded module.
    pub exported: Ident,
}

/// Left-hand side of an assignment or `for` loop.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Name(Ident),
    Index {
        object: Box<Spanned<Expr>>,
        index: Box<Spanned<Expr>>,
    },
    Attr {
        object: Box<Spanned<Expr>>,
        name: Ident,
    },
    Tuple(Vec<Spanned<AssignTarget>>),
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Name(Ident),
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    None,
    List(Vec<Spanned<Expr>>),
    Tuple(Vec<Spanned<Expr>>),
    Dict(Vec<(Spanned<Expr>, Spanned<Expr>)>),
    Unary {
        op: UnaryOp,
        operand: Box<Spanned<Expr>>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Spanned<Expr>>,
        rhs: Box<Spanned<Expr>>,
    },
    Call {
        callee: Box<Spanned<Expr>>,
        args: Vec<CallArg>,
    },
    Attr {
        object: Box<Spanned<Expr>>,
        name: Ident,
    },
    Index {
        object: Box<Spanned<Expr>>,
        index: Box<Spanned<Expr>>,
    },
    Slice {
        object: Box<Spanned<Expr>>,
        start: Option<Box<Spanned<Expr>>>,
        end: Option<Box<Spanned<Expr>>>,
        step: Option<Box<Spanned<Expr>>>,
    },
    /// `a if cond else b`
    Conditional {
        cond: Box<Spanned<Expr>>,
        then_expr: Box<Spanned<Expr>>,
        else_expr: Box<Spanned<Expr>>,
    },
    Lambda {
        params: Vec<Param>,
        body: Box<Spanned<Expr>>,
    },
    ListComp {
        element: Box<Spanned<Expr>>,
        clauses: Vec<CompClause>,
    },
    DictComp {
        key: Box<Spanned<Expr>>,
        value: Box<Spanned<Expr>>,
        clauses: Vec<CompClause>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompClause {
    For {
        target: Spanned<AssignTarget>,
        iter: Spanned<Expr>,
    },
    If(Spanned<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallArg {
    Positional(Spanned<Expr>),
    Named(Ident, Spanned<Expr>),
    /// `*args`
    Star(Spanned<Expr>),
    /// `**kwargs`
    StarStar(Spanned<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    In,
    NotIn,
    And,
    Or,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::In => "in",
            BinaryOp::NotIn => "not in",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Pos => write!(f, "+"),
            UnaryOp::Not => write!(f, "not"),
        }
    }
}
