//! Define the operator vocabulary for attrscript: spellings, precedence and fixity.
//!
//! The parser climbs precedence levels using [`precedence`]; the lexer maps symbol spellings through [`from_str`].
//!
//! ## Notes
//! - `precedence` is relative: higher binds tighter.
//! - `not in` is not a single registry entry; the parser composes it from [`OperatorId::Not`] and
//!   [`OperatorId::In`].
//!
//! ## Examples
//! ```rust
//! use attrscript_core::lang::operators::{self, OperatorId};
//!
//! assert_eq!(operators::from_str("//"), Some(OperatorId::SlashSlash));
//! assert!(operators::precedence(OperatorId::Star) > operators::precedence(OperatorId::Plus));
//! ```

/// Define how operators associate when chained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
    None,
}

/// Define whether an operator is infix (binary) or prefix (unary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fixity {
    Infix,
    Prefix,
}

/// Stable identifier for every operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorId {
    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    SlashSlash,
    Percent,

    // Comparison
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Assignment
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    SlashSlashEq,
    PercentEq,

    // Word operators
    And,
    Or,
    Not,
    In,
}

/// Metadata for an operator.
#[derive(Debug, Clone, Copy)]
pub struct OperatorInfo {
    pub id: OperatorId,
    pub spelling: &'static str,
    pub precedence: u8,
    pub associativity: Associativity,
    pub fixity: Fixity,
    pub is_keyword_spelling: bool,
}

/// Registry of all operators, in [`OperatorId`] declaration order.
pub const OPERATORS: &[OperatorInfo] = &[
    // Arithmetic
    op(OperatorId::Plus, "+", 50, Associativity::Left, Fixity::Infix, false),
    op(OperatorId::Minus, "-", 50, Associativity::Left, Fixity::Infix, false),
    op(OperatorId::Star, "*", 60, Associativity::Left, Fixity::Infix, false),
    op(OperatorId::Slash, "/", 60, Associativity::Left, Fixity::Infix, false),
    op(OperatorId::SlashSlash, "//", 60, Associativity::Left, Fixity::Infix, false),
    op(OperatorId::Percent, "%", 60, Associativity::Left, Fixity::Infix, false),
    // Comparison
    op(OperatorId::EqEq, "==", 40, Associativity::None, Fixity::Infix, false),
    op(OperatorId::NotEq, "!=", 40, Associativity::None, Fixity::Infix, false),
    op(OperatorId::Lt, "<", 40, Associativity::None, Fixity::Infix, false),
    op(OperatorId::LtEq, "<=", 40, Associativity::None, Fixity::Infix, false),
    op(OperatorId::Gt, ">", 40, Associativity::None, Fixity::Infix, false),
    op(OperatorId::GtEq, ">=", 40, Associativity::None, Fixity::Infix, false),
    // Assignment
    op(OperatorId::Eq, "=", 1, Associativity::Right, Fixity::Infix, false),
    op(OperatorId::PlusEq, "+=", 1, Associativity::Right, Fixity::Infix, false),
    op(OperatorId::MinusEq, "-=", 1, Associativity::Right, Fixity::Infix, false),
    op(OperatorId::StarEq, "*=", 1, Associativity::Right, Fixity::Infix, false),
    op(OperatorId::SlashEq, "/=", 1, Associativity::Right, Fixity::Infix, false),
    op(OperatorId::SlashSlashEq, "//=", 1, Associativity::Right, Fixity::Infix, false),
    op(OperatorId::PercentEq, "%=", 1, Associativity::Right, Fixity::Infix, false),
    // Word operators
    op(OperatorId::And, "and", 20, Associativity::Left, Fixity::Infix, true),
    op(OperatorId::Or, "or", 10, Associativity::Left, Fixity::Infix, true),
    op(OperatorId::Not, "not", 30, Associativity::Right, Fixity::Prefix, true),
    op(OperatorId::In, "in", 40, Associativity::None, Fixity::Infix, true),
];

/// Return the full metadata entry for an operator.
pub fn info_for(id: OperatorId) -> &'static OperatorInfo {
    &OPERATORS[id as usize]
}

/// Canonical spelling.
pub fn as_str(id: OperatorId) -> &'static str {
    info_for(id).spelling
}

/// Relative binding strength.
pub fn precedence(id: OperatorId) -> u8 {
    info_for(id).precedence
}

/// Resolve an operator spelling to its identifier.
///
/// ## Notes
/// - Matching is **case-sensitive**.
pub fn from_str(spelling: &str) -> Option<OperatorId> {
    OPERATORS.iter().find(|o| o.spelling == spelling).map(|o| o.id)
}

/// Map an augmented assignment operator (`+=`) to its underlying binary operator (`+`).
pub fn augmented_base(id: OperatorId) -> Option<OperatorId> {
    match id {
        OperatorId::PlusEq => Some(OperatorId::Plus),
        OperatorId::MinusEq => Some(OperatorId::Minus),
        OperatorId::StarEq => Some(OperatorId::Star),
        OperatorId::SlashEq => Some(OperatorId::Slash),
        OperatorId::SlashSlashEq => Some(OperatorId::SlashSlash),
        OperatorId::PercentEq => Some(OperatorId::Percent),
        _ => None,
    }
}

const fn op(
    id: OperatorId,
    spelling: &'static str,
    precedence: u8,
    associativity: Associativity,
    fixity: Fixity,
    is_keyword_spelling: bool,
) -> OperatorInfo {
    OperatorInfo {
        id,
        spelling,
        precedence,
        associativity,
        fixity,
        is_keyword_spelling,
    }
}
