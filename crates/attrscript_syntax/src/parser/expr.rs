/// Expression parsing methods.
///
/// This chunk implements the expression grammar using a precedence ladder:
/// `lambda` / conditional → `or` → `and` → `not` → comparison → additive → multiplicative → unary → postfix →
/// primary.
///
/// ## Notes
/// - Comparisons do not chain: `a < b < c` is a syntax error, as in Starlark.
/// - Comprehension `for` clauses iterate over an `or`-level expression so a trailing `if` starts a filter clause.
impl<'a> Parser<'a> {
    // ========================================================================
    // Expressions
    // ========================================================================

    /// Parse `test (',' test)* [',']`, producing a tuple when a comma is present.
    fn expr_list(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let first = self.test()?;
        if !self.check_punct(PunctuationId::Comma) {
            return Ok(first);
        }
        let start = first.span.start;
        let mut items = vec![first];
        while self.match_punct(PunctuationId::Comma) {
            if !self.is_at_expr_start() {
                break;
            }
            items.push(self.test()?);
        }
        Ok(Spanned::new(Expr::Tuple(items), Span::new(start, self.previous_end())))
    }

    /// Parse a full expression: lambda, or an `or`-expression with an optional `if ... else ...` suffix.
    fn test(&mut self) -> Result<Spanned<Expr>, CompileError> {
        self.nested("Expression", Self::test_inner)
    }

    fn test_inner(&mut self) -> Result<Spanned<Expr>, CompileError> {
        if self.check_keyword(KeywordId::Lambda) {
            return self.lambda_expr();
        }

        let then_expr = self.or_expr()?;
        if !self.match_keyword(KeywordId::If) {
            return Ok(then_expr);
        }
        let cond = self.or_expr()?;
        self.expect_keyword(KeywordId::Else, "Expected 'else' in conditional expression")?;
        let else_expr = self.test()?;
        let span = then_expr.span.merge(else_expr.span);
        Ok(Spanned::new(
            Expr::Conditional {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            span,
        ))
    }

    fn lambda_expr(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let start = self.current_span().start;
        self.expect_keyword(KeywordId::Lambda, "Expected 'lambda'")?;
        let params = self.params(PunctuationId::Colon)?;
        self.expect_punct(PunctuationId::Colon, "Expected ':' after lambda parameters")?;
        let body = self.test()?;
        let span = Span::new(start, body.span.end);
        Ok(Spanned::new(
            Expr::Lambda {
                params,
                body: Box::new(body),
            },
            span,
        ))
    }

    fn or_expr(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut left = self.and_expr()?;
        while self.match_keyword(KeywordId::Or) {
            let right = self.and_expr()?;
            left = binary(left, BinaryOp::Or, right);
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut left = self.not_expr()?;
        while self.match_keyword(KeywordId::And) {
            let right = self.not_expr()?;
            left = binary(left, BinaryOp::And, right);
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> Result<Spanned<Expr>, CompileError> {
        if self.match_keyword(KeywordId::Not) {
            let start = self.tokens[self.pos - 1].span.start;
            let operand = self.nested("Expression", Self::not_expr)?;
            let span = Span::new(start, operand.span.end);
            Ok(Spanned::new(
                Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                span,
            ))
        } else {
            self.comparison()
        }
    }

    fn comparison_op(&mut self) -> Option<BinaryOp> {
        let op = match &self.peek().kind {
            TokenKind::Operator(OperatorId::EqEq) => BinaryOp::Eq,
            TokenKind::Operator(OperatorId::NotEq) => BinaryOp::NotEq,
            TokenKind::Operator(OperatorId::Lt) => BinaryOp::Lt,
            TokenKind::Operator(OperatorId::LtEq) => BinaryOp::LtEq,
            TokenKind::Operator(OperatorId::Gt) => BinaryOp::Gt,
            TokenKind::Operator(OperatorId::GtEq) => BinaryOp::GtEq,
            TokenKind::Keyword(KeywordId::In) => BinaryOp::In,
            TokenKind::Keyword(KeywordId::Not) if self.peek_next().kind.is_keyword(KeywordId::In) => {
                self.advance();
                BinaryOp::NotIn
            }
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn comparison(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let left = self.additive()?;
        let Some(op) = self.comparison_op() else {
            return Ok(left);
        };
        let right = self.additive()?;
        let expr = binary(left, op, right);

        if self.comparison_op().is_some() {
            return Err(CompileError::syntax(
                "Comparison operators do not chain".to_string(),
                self.tokens[self.pos - 1].span,
            )
            .with_hint("Combine comparisons with 'and', e.g. `a < b and b < c`"));
        }
        Ok(expr)
    }

    fn additive(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut left = self.multiplicative()?;
        loop {
            let op = if self.match_op(OperatorId::Plus) {
                BinaryOp::Add
            } else if self.match_op(OperatorId::Minus) {
                BinaryOp::Sub
            } else {
                break;
            };
            let right = self.multiplicative()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut left = self.unary()?;
        loop {
            let op = if self.match_op(OperatorId::Star) {
                BinaryOp::Mul
            } else if self.match_op(OperatorId::Slash) {
                BinaryOp::Div
            } else if self.match_op(OperatorId::SlashSlash) {
                BinaryOp::FloorDiv
            } else if self.match_op(OperatorId::Percent) {
                BinaryOp::Mod
            } else {
                break;
            };
            let right = self.unary()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let op = if self.check_op(OperatorId::Minus) {
            UnaryOp::Neg
        } else if self.check_op(OperatorId::Plus) {
            UnaryOp::Pos
        } else {
            return self.postfix();
        };
        let start = self.current_span().start;
        self.advance();
        let operand = self.nested("Expression", Self::unary)?;

        // Fold `-<literal>` so `-9223372036854775808`-style constants and `x[-1]` stay literals.
        if op == UnaryOp::Neg {
            match operand.node {
                Expr::Int(v) => {
                    return Ok(Spanned::new(
                        Expr::Int(v.wrapping_neg()),
                        Span::new(start, operand.span.end),
                    ));
                }
                Expr::Float(v) => {
                    return Ok(Spanned::new(Expr::Float(-v), Span::new(start, operand.span.end)));
                }
                _ => {}
            }
        }

        let span = Span::new(start, operand.span.end);
        Ok(Spanned::new(
            Expr::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn postfix(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut expr = self.primary()?;
        loop {
            let start = expr.span.start;
            if self.match_punct(PunctuationId::LParen) {
                let args = self.call_args()?;
                expr = Spanned::new(
                    Expr::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    Span::new(start, self.previous_end()),
                );
            } else if self.match_punct(PunctuationId::Dot) {
                let name = self.identifier()?;
                expr = Spanned::new(
                    Expr::Attr {
                        object: Box::new(expr),
                        name,
                    },
                    Span::new(start, self.previous_end()),
                );
            } else if self.match_punct(PunctuationId::LBracket) {
                let node = match self.index_or_slice()? {
                    IndexOrSlice::Index(index) => Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    },
                    IndexOrSlice::Slice { start, end, step } => Expr::Slice {
                        object: Box::new(expr),
                        start,
                        end,
                        step,
                    },
                };
                expr = Spanned::new(node, Span::new(start, self.previous_end()));
            } else {
                break;
            }
        }
        Ok(expr)
    }

    /// Parse call arguments after `(`, consuming the closing `)`.
    fn call_args(&mut self) -> Result<Vec<CallArg>, CompileError> {
        let mut args = Vec::new();
        let mut seen_named = false;
        while !self.check_punct(PunctuationId::RParen) {
            let arg_span = self.current_span();
            let arg = if self.match_op(OperatorId::Star) {
                CallArg::Star(self.test()?)
            } else if self.match_token(&TokenKind::StarStar) {
                CallArg::StarStar(self.test()?)
            } else if matches!(self.peek().kind, TokenKind::Ident(_))
                && self.peek_next().kind.is_operator(OperatorId::Eq)
            {
                let name = self.identifier()?;
                self.advance();
                seen_named = true;
                CallArg::Named(name, self.test()?)
            } else {
                if seen_named {
                    return Err(CompileError::syntax(
                        "Positional argument follows keyword argument".to_string(),
                        arg_span,
                    ));
                }
                CallArg::Positional(self.test()?)
            };
            args.push(arg);
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        self.expect_punct(PunctuationId::RParen, "Expected ')' after arguments")?;
        Ok(args)
    }

    /// Parse the inside of `[...]` after `[`, consuming the closing `]`.
    fn index_or_slice(&mut self) -> Result<IndexOrSlice, CompileError> {
        let start = if self.check_punct(PunctuationId::Colon) {
            None
        } else {
            let first = self.expr_list()?;
            if self.match_punct(PunctuationId::RBracket) {
                return Ok(IndexOrSlice::Index(first));
            }
            Some(Box::new(first))
        };
        self.expect_punct(PunctuationId::Colon, "Expected ':' or ']' in subscript")?;

        let end = if self.check_punct(PunctuationId::Colon) || self.check_punct(PunctuationId::RBracket) {
            None
        } else {
            Some(Box::new(self.test()?))
        };
        let step = if self.match_punct(PunctuationId::Colon) && !self.check_punct(PunctuationId::RBracket) {
            Some(Box::new(self.test()?))
        } else {
            None
        };
        self.expect_punct(PunctuationId::RBracket, "Expected ']' after slice")?;
        Ok(IndexOrSlice::Slice { start, end, step })
    }

    fn primary(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let token = self.peek().clone();
        let span = token.span;

        let literal = match token.kind {
            TokenKind::Ident(name) => Some(Expr::Name(name)),
            TokenKind::Int(v) => Some(Expr::Int(v)),
            TokenKind::Float(v) => Some(Expr::Float(v)),
            TokenKind::String(s) => Some(Expr::Str(s)),
            TokenKind::Keyword(KeywordId::True) => Some(Expr::Bool(true)),
            TokenKind::Keyword(KeywordId::False) => Some(Expr::Bool(false)),
            TokenKind::Keyword(KeywordId::None) => Some(Expr::None),
            _ => None,
        };
        if let Some(node) = literal {
            self.advance();
            return Ok(Spanned::new(node, span));
        }

        if self.match_punct(PunctuationId::LParen) {
            return self.paren_expr(span.start);
        }
        if self.match_punct(PunctuationId::LBracket) {
            return self.list_expr(span.start);
        }
        if self.match_punct(PunctuationId::LBrace) {
            return self.dict_expr(span.start);
        }

        Err(self.unexpected("Expected expression"))
    }

    /// `()`, `(x)`, `(x,)`, `(x, y)`
    fn paren_expr(&mut self, start: usize) -> Result<Spanned<Expr>, CompileError> {
        if self.match_punct(PunctuationId::RParen) {
            return Ok(Spanned::new(Expr::Tuple(Vec::new()), Span::new(start, self.previous_end())));
        }
        let first = self.test()?;
        if self.match_punct(PunctuationId::RParen) {
            return Ok(Spanned::new(first.node, Span::new(start, self.previous_end())));
        }

        let mut items = vec![first];
        while self.match_punct(PunctuationId::Comma) {
            if self.check_punct(PunctuationId::RParen) {
                break;
            }
            items.push(self.test()?);
        }
        self.expect_punct(PunctuationId::RParen, "Expected ')' to close tuple")?;
        Ok(Spanned::new(Expr::Tuple(items), Span::new(start, self.previous_end())))
    }

    /// `[a, b]` or `[elt for x in xs if cond]`
    fn list_expr(&mut self, start: usize) -> Result<Spanned<Expr>, CompileError> {
        if self.match_punct(PunctuationId::RBracket) {
            return Ok(Spanned::new(Expr::List(Vec::new()), Span::new(start, self.previous_end())));
        }
        let first = self.test()?;
        if self.check_keyword(KeywordId::For) {
            let clauses = self.comp_clauses()?;
            self.expect_punct(PunctuationId::RBracket, "Expected ']' after comprehension")?;
            return Ok(Spanned::new(
                Expr::ListComp {
                    element: Box::new(first),
                    clauses,
                },
                Span::new(start, self.previous_end()),
            ));
        }

        let mut items = vec![first];
        while self.match_punct(PunctuationId::Comma) {
            if self.check_punct(PunctuationId::RBracket) {
                break;
            }
            items.push(self.test()?);
        }
        self.expect_punct(PunctuationId::RBracket, "Expected ']' to close list")?;
        Ok(Spanned::new(Expr::List(items), Span::new(start, self.previous_end())))
    }

    /// `{k: v}` or `{k: v for x in xs}`
    fn dict_expr(&mut self, start: usize) -> Result<Spanned<Expr>, CompileError> {
        if self.match_punct(PunctuationId::RBrace) {
            return Ok(Spanned::new(Expr::Dict(Vec::new()), Span::new(start, self.previous_end())));
        }
        let key = self.test()?;
        self.expect_punct(PunctuationId::Colon, "Expected ':' after dict key")?;
        let value = self.test()?;
        if self.check_keyword(KeywordId::For) {
            let clauses = self.comp_clauses()?;
            self.expect_punct(PunctuationId::RBrace, "Expected '}' after comprehension")?;
            return Ok(Spanned::new(
                Expr::DictComp {
                    key: Box::new(key),
                    value: Box::new(value),
                    clauses,
                },
                Span::new(start, self.previous_end()),
            ));
        }

        let mut entries = vec![(key, value)];
        while self.match_punct(PunctuationId::Comma) {
            if self.check_punct(PunctuationId::RBrace) {
                break;
            }
            let key = self.test()?;
            self.expect_punct(PunctuationId::Colon, "Expected ':' after dict key")?;
            let value = self.test()?;
            entries.push((key, value));
        }
        self.expect_punct(PunctuationId::RBrace, "Expected '}' to close dict")?;
        Ok(Spanned::new(Expr::Dict(entries), Span::new(start, self.previous_end())))
    }

    fn comp_clauses(&mut self) -> Result<Vec<CompClause>, CompileError> {
        let mut clauses = Vec::new();
        loop {
            if self.match_keyword(KeywordId::For) {
                let target = self.loop_target()?;
                self.expect_keyword(KeywordId::In, "Expected 'in' in comprehension")?;
                let iter = self.or_expr()?;
                clauses.push(CompClause::For { target, iter });
            } else if self.match_keyword(KeywordId::If) {
                clauses.push(CompClause::If(self.or_expr()?));
            } else {
                break;
            }
        }
        Ok(clauses)
    }

    /// Parse loop variables for `for` statements and comprehensions (`x`, `k, v`, `(a, b)`).
    fn loop_target(&mut self) -> Result<Spanned<AssignTarget>, CompileError> {
        let first = self.postfix()?;
        if !self.check_punct(PunctuationId::Comma) {
            return self.to_target(first);
        }
        let start = first.span.start;
        let mut items = vec![first];
        while self.match_punct(PunctuationId::Comma) {
            if self.check_keyword(KeywordId::In) {
                break;
            }
            items.push(self.postfix()?);
        }
        let tuple = Spanned::new(Expr::Tuple(items), Span::new(start, self.previous_end()));
        self.to_target(tuple)
    }
}

fn binary(lhs: Spanned<Expr>, op: BinaryOp, rhs: Spanned<Expr>) -> Spanned<Expr> {
    let span = lhs.span.merge(rhs.span);
    Spanned::new(
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        span,
    )
}
