/// Miscellaneous parser utilities.
///
/// This chunk contains small shared parsing helpers that don't cleanly fit into "stmt" or "expr" (identifier and
/// string literal handling, assignment-target conversion).
impl<'a> Parser<'a> {
    fn identifier(&mut self) -> Result<Ident, CompileError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("Expected identifier")),
        }
    }

    fn string_literal(&mut self, msg: &str) -> Result<String, CompileError> {
        match &self.peek().kind {
            TokenKind::String(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            _ => Err(self.unexpected(msg)),
        }
    }

    /// Convert a parsed expression into an assignment target.
    fn to_target(&self, expr: Spanned<Expr>) -> Result<Spanned<AssignTarget>, CompileError> {
        let span = expr.span;
        let target = match expr.node {
            Expr::Name(name) => AssignTarget::Name(name),
            Expr::Attr { object, name } => AssignTarget::Attr { object, name },
            Expr::Index { object, index } => AssignTarget::Index { object, index },
            Expr::Tuple(items) | Expr::List(items) => AssignTarget::Tuple(
                items
                    .into_iter()
                    .map(|item| self.to_target(item))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            _ => {
                return Err(CompileError::syntax("Cannot assign to this expression".to_string(), span)
                    .with_hint("Assignment targets are names, attributes, subscripts, or tuples of those"));
            }
        };
        Ok(Spanned::new(target, span))
    }
}

/// Map an arithmetic operator id to its AST binary operator.
fn binary_op_for(id: OperatorId) -> Option<BinaryOp> {
    match id {
        OperatorId::Plus => Some(BinaryOp::Add),
        OperatorId::Minus => Some(BinaryOp::Sub),
        OperatorId::Star => Some(BinaryOp::Mul),
        OperatorId::Slash => Some(BinaryOp::Div),
        OperatorId::SlashSlash => Some(BinaryOp::FloorDiv),
        OperatorId::Percent => Some(BinaryOp::Mod),
        _ => None,
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && crate::lexer::keyword_id(s).is_none()
}
