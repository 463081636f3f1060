/// Statement parsing methods.
///
/// This chunk parses statement forms (`def`, `if`, `for`, `return`, `load`, assignments) as well as
/// indentation-based and single-line suites.
///
/// ## Notes
/// - Block parsing relies on `Indent` / `Dedent` layout tokens produced by the lexer.
/// - A logical line may hold several small statements separated by `;`.
impl<'a> Parser<'a> {
    /// Parse one logical line: a compound statement, or a `;`-separated run of small statements.
    fn statement_line(&mut self) -> Result<Vec<Spanned<Stmt>>, CompileError> {
        if self.check_keyword(KeywordId::Def) {
            Ok(vec![self.def_stmt()?])
        } else if self.check_keyword(KeywordId::If) {
            Ok(vec![self.if_stmt()?])
        } else if self.check_keyword(KeywordId::For) {
            Ok(vec![self.for_stmt()?])
        } else {
            self.simple_stmts()
        }
    }

    fn simple_stmts(&mut self) -> Result<Vec<Spanned<Stmt>>, CompileError> {
        let mut stmts = vec![self.small_stmt()?];
        while self.match_punct(PunctuationId::Semicolon) {
            if self.check(&TokenKind::Newline) {
                break;
            }
            stmts.push(self.small_stmt()?);
        }
        self.expect(&TokenKind::Newline, "Expected newline after statement")?;
        Ok(stmts)
    }

    fn small_stmt(&mut self) -> Result<Spanned<Stmt>, CompileError> {
        let start = self.current_span().start;

        let stmt = if self.match_keyword(KeywordId::Return) {
            let value = if self.is_at_expr_start() {
                Some(self.expr_list()?)
            } else {
                None
            };
            Stmt::Return(value)
        } else if self.match_keyword(KeywordId::Pass) {
            Stmt::Pass
        } else if self.match_keyword(KeywordId::Break) {
            Stmt::Break
        } else if self.match_keyword(KeywordId::Continue) {
            Stmt::Continue
        } else if self.check_keyword(KeywordId::Load) {
            self.load_stmt()?
        } else {
            self.assignment_or_expr_stmt()?
        };

        Ok(Spanned::new(stmt, Span::new(start, self.previous_end())))
    }

    /// Parse `: NEWLINE INDENT stmts DEDENT` or `: simple_stmts`.
    fn suite(&mut self, after: &str) -> Result<Vec<Spanned<Stmt>>, CompileError> {
        self.expect_punct(PunctuationId::Colon, &format!("Expected ':' after {}", after))?;
        if !self.match_token(&TokenKind::Newline) {
            return self.simple_stmts();
        }

        self.expect(&TokenKind::Indent, "Expected an indented block")?;
        self.depth += 1;
        let stmts = self.nested("Block", |p| {
            let mut stmts = Vec::new();
            p.skip_newlines();
            while !p.check(&TokenKind::Dedent) && !p.is_at_end() {
                stmts.append(&mut p.statement_line()?);
                p.skip_newlines();
            }
            Ok(stmts)
        })?;
        self.expect(&TokenKind::Dedent, "Expected end of indented block")?;
        self.depth = self.depth.saturating_sub(1);
        Ok(stmts)
    }

    fn def_stmt(&mut self) -> Result<Spanned<Stmt>, CompileError> {
        let start = self.current_span().start;
        self.expect_keyword(KeywordId::Def, "Expected 'def'")?;
        let name = self.identifier()?;
        self.expect_punct(PunctuationId::LParen, "Expected '(' after function name")?;
        let params = self.params(PunctuationId::RParen)?;
        self.expect_punct(PunctuationId::RParen, "Expected ')' after parameters")?;
        let header_end = self.previous_end();
        let body = self.suite("function signature")?;
        let end = body.last().map(|s| s.span.end).unwrap_or(header_end);
        Ok(Spanned::new(
            Stmt::Def(FunctionDef { name, params, body }),
            Span::new(start, end),
        ))
    }

    /// Parse a parameter list up to (not including) `closing`.
    fn params(&mut self, closing: PunctuationId) -> Result<Vec<Param>, CompileError> {
        let mut params: Vec<Param> = Vec::new();
        while !self.check_punct(closing) {
            let start = self.current_span().start;
            let kind = if self.match_op(OperatorId::Star) {
                ParamKind::Varargs
            } else if self.match_token(&TokenKind::StarStar) {
                ParamKind::Kwargs
            } else {
                ParamKind::Normal
            };
            let name = self.identifier()?;
            let default = if kind == ParamKind::Normal && self.match_op(OperatorId::Eq) {
                Some(self.test()?)
            } else {
                None
            };
            let span = Span::new(start, self.previous_end());

            if params.iter().any(|p| p.name == name) {
                return Err(CompileError::syntax(format!("Duplicate parameter '{}'", name), span));
            }
            if let Some(last) = params.last() {
                if last.kind == ParamKind::Kwargs {
                    return Err(CompileError::syntax(
                        "Parameters may not follow **kwargs".to_string(),
                        span,
                    ));
                }
                if kind == ParamKind::Normal
                    && default.is_none()
                    && params.iter().any(|p| p.default.is_some())
                    && !params.iter().any(|p| p.kind == ParamKind::Varargs)
                {
                    return Err(CompileError::syntax(
                        format!("Required parameter '{}' follows an optional parameter", name),
                        span,
                    ));
                }
            }
            params.push(Param {
                name,
                kind,
                default,
                span,
            });

            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        Ok(params)
    }

    fn if_stmt(&mut self) -> Result<Spanned<Stmt>, CompileError> {
        let start = self.current_span().start;
        self.expect_keyword(KeywordId::If, "Expected 'if'")?;
        let condition = self.test()?;
        let body = self.suite("if condition")?;
        let mut branches = vec![(condition, body)];

        while self.match_keyword(KeywordId::Elif) {
            let condition = self.test()?;
            let body = self.suite("elif condition")?;
            branches.push((condition, body));
        }

        let else_body = if self.match_keyword(KeywordId::Else) {
            Some(self.suite("else")?)
        } else {
            None
        };

        Ok(Spanned::new(
            Stmt::If(IfStmt { branches, else_body }),
            Span::new(start, self.previous_end()),
        ))
    }

    fn for_stmt(&mut self) -> Result<Spanned<Stmt>, CompileError> {
        let start = self.current_span().start;
        self.expect_keyword(KeywordId::For, "Expected 'for'")?;
        let target = self.loop_target()?;
        self.expect_keyword(KeywordId::In, "Expected 'in' after loop variables")?;
        let iter = self.expr_list()?;
        let body = self.suite("for clause")?;
        Ok(Spanned::new(
            Stmt::For(ForStmt { target, iter, body }),
            Span::new(start, self.previous_end()),
        ))
    }

    /// `load("module.star", "name", alias = "exported")`
    fn load_stmt(&mut self) -> Result<Stmt, CompileError> {
        let load_span = self.current_span();
        self.expect_keyword(KeywordId::Load, "Expected 'load'")?;
        if self.depth > 0 {
            return Err(CompileError::syntax(
                "load statements may only appear at top level".to_string(),
                load_span,
            ));
        }
        self.expect_punct(PunctuationId::LParen, "Expected '(' after load")?;
        let module = self.string_literal("load statement must begin with a module string")?;

        let mut bindings = Vec::new();
        while self.match_punct(PunctuationId::Comma) {
            if self.check_punct(PunctuationId::RParen) {
                break;
            }
            let binding_span = self.current_span();
            let (local, exported) = if matches!(self.peek().kind, TokenKind::Ident(_))
                && self.peek_next().kind.is_operator(OperatorId::Eq)
            {
                let local = self.identifier()?;
                self.advance();
                let exported = self.string_literal("Expected a quoted symbol name in load")?;
                (local, exported)
            } else {
                let exported = self.string_literal("Expected a quoted symbol name in load")?;
                (exported.clone(), exported)
            };
            if exported.starts_with('_') {
                return Err(CompileError::syntax(
                    format!("load: symbol '{}' is private and cannot be loaded", exported),
                    binding_span,
                ));
            }
            if !is_identifier(&local) {
                return Err(CompileError::syntax(
                    format!("load: '{}' is not a valid identifier", local),
                    binding_span,
                ));
            }
            bindings.push(LoadBinding { local, exported });
        }
        self.expect_punct(PunctuationId::RParen, "Expected ')' to close load")?;

        if bindings.is_empty() {
            return Err(CompileError::syntax(
                "load statement must import at least one symbol".to_string(),
                load_span,
            ));
        }
        Ok(Stmt::Load(LoadStmt { module, bindings }))
    }

    fn assignment_or_expr_stmt(&mut self) -> Result<Stmt, CompileError> {
        let lhs = self.expr_list()?;

        if self.match_op(OperatorId::Eq) {
            let value = self.expr_list()?;
            let target = self.to_target(lhs)?;
            return Ok(Stmt::Assign { target, value });
        }

        if let Some(base) = self.peek().operator_id().and_then(operators::augmented_base) {
            let op_span = self.current_span();
            self.advance();
            let value = self.expr_list()?;
            let target = self.to_target(lhs)?;
            if matches!(target.node, AssignTarget::Tuple(_)) {
                return Err(CompileError::syntax(
                    "Augmented assignment to a tuple is not allowed".to_string(),
                    op_span,
                ));
            }
            let op = binary_op_for(base).ok_or_else(|| {
                CompileError::syntax("Unsupported augmented assignment".to_string(), op_span)
            })?;
            return Ok(Stmt::AugAssign { target, op, value });
        }

        Ok(Stmt::Expr(lhs))
    }
}
