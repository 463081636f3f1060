/// Parser core types and entrypoint.
///
/// This chunk defines the [`Parser`] type and its top-level `parse()` entrypoint.
///
/// ## Notes
/// - This file is `include!`'d into `crate::parser` to keep all parser methods in a
///   single module.

/// Deepest nesting of brackets, unary operators and blocks the parser descends into.
const MAX_NESTING: usize = 200;

/// Result of parsing `[...]` postfix syntax: either a single index or a slice.
enum IndexOrSlice {
    Index(Spanned<Expr>),
    Slice {
        start: Option<Box<Spanned<Expr>>>,
        end: Option<Box<Spanned<Expr>>>,
        step: Option<Box<Spanned<Expr>>>,
    },
}

/// Parser state.
///
/// ## Notes
/// - The parser is single-pass and recovers from errors by synchronizing at top-level statement boundaries.
/// - `depth` counts the INDENT tokens consumed by blocks that have not seen their DEDENT yet, so recovery can skip
///   the rest of a broken block.
/// - `nesting` bounds recursion; input nested past [`MAX_NESTING`] is a syntax error.
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    nesting: usize,
    errors: Vec<CompileError>,
}

impl<'a> Parser<'a> {
    /// Create a new parser for a token stream produced by `attrscript_syntax::lexer`.
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            nesting: 0,
            errors: Vec::new(),
        }
    }

    /// Parse the entire token stream into a [`Module`].
    ///
    /// ## Errors
    /// Returns every [`CompileError`] found; the parser recovers after each error to report multiple issues in one
    /// pass.
    pub fn parse(mut self) -> Result<Module, Vec<CompileError>> {
        let mut stmts = Vec::new();

        self.skip_newlines();

        while !self.is_at_end() {
            if self.check(&TokenKind::Indent) {
                self.errors.push(CompileError::syntax(
                    "Unexpected indentation at top level".to_string(),
                    self.current_span(),
                ));
                self.skip_indented_region();
                self.skip_newlines();
                continue;
            }
            match self.statement_line() {
                Ok(mut line) => stmts.append(&mut line),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
            self.skip_newlines();
        }

        if self.errors.is_empty() {
            Ok(Module { stmts })
        } else {
            Err(self.errors)
        }
    }
}
