#[cfg(test)]
/// Parser unit tests.
///
/// These tests focus on correctness of specific syntactic forms and on the parser's
/// error recovery behavior (avoiding cascaded errors).
mod tests {
    use super::*;
    use crate::lexer;

    fn parse_str(source: &str) -> Result<Module, Vec<CompileError>> {
        let tokens = lexer::lex(source)?;
        parse(&tokens)
    }

    fn single_expr(source: &str) -> Expr {
        let module = parse_str(source).unwrap();
        match module.stmts.into_iter().next().map(|s| s.node) {
            Some(Stmt::Expr(e)) => e.node,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_unexpected_indent_at_toplevel_is_single_clear_error() {
        let err = parse_str("  x = 1\ny = 2\n").expect_err("top-level indentation must be rejected");
        assert_eq!(err.len(), 1, "no cascade");
        assert!(err[0].message.contains("Unexpected indentation"));
    }

    #[test]
    fn test_parse_function() {
        let source = "def add(a, b = 2, *rest, **opts):\n  return a + b\n";
        let module = parse_str(source).unwrap();
        match &module.stmts[0].node {
            Stmt::Def(f) => {
                assert_eq!(f.name, "add");
                let kinds: Vec<ParamKind> = f.params.iter().map(|p| p.kind).collect();
                assert_eq!(
                    kinds,
                    vec![ParamKind::Normal, ParamKind::Normal, ParamKind::Varargs, ParamKind::Kwargs]
                );
                assert!(f.params[1].default.is_some());
                assert_eq!(f.body.len(), 1);
            }
            other => panic!("Expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_required_after_optional_rejected() {
        let err = parse_str("def f(a = 1, b):\n  pass\n").unwrap_err();
        assert!(err[0].message.contains("follows an optional parameter"));
    }

    #[test]
    fn test_if_elif_else_flattened() {
        let source = "if a:\n  x = 1\nelif b:\n  x = 2\nelse:\n  x = 3\n";
        let module = parse_str(source).unwrap();
        match &module.stmts[0].node {
            Stmt::If(stmt) => {
                assert_eq!(stmt.branches.len(), 2);
                assert!(stmt.else_body.is_some());
            }
            other => panic!("Expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_single_line_suite_and_semicolons() {
        let module = parse_str("def f(x): y = x; return y\n").unwrap();
        match &module.stmts[0].node {
            Stmt::Def(f) => assert_eq!(f.body.len(), 2),
            other => panic!("Expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_for_tuple_target() {
        let module = parse_str("for k, v in d.items():\n  pass\n").unwrap();
        match &module.stmts[0].node {
            Stmt::For(f) => assert!(matches!(&f.target.node, AssignTarget::Tuple(items) if items.len() == 2)),
            other => panic!("Expected for, got {:?}", other),
        }
    }

    #[test]
    fn test_load_statement() {
        let module = parse_str("load(\"lib.star\", \"helper\", alias = \"other\")\n").unwrap();
        match &module.stmts[0].node {
            Stmt::Load(load) => {
                assert_eq!(load.module, "lib.star");
                assert_eq!(load.bindings.len(), 2);
                assert_eq!(load.bindings[1].local, "alias");
                assert_eq!(load.bindings[1].exported, "other");
            }
            other => panic!("Expected load, got {:?}", other),
        }
    }

    #[test]
    fn test_load_inside_function_rejected() {
        let err = parse_str("def f():\n  load(\"x.star\", \"y\")\n").unwrap_err();
        assert!(err[0].message.contains("top level"));
    }

    #[test]
    fn test_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        match single_expr("1 + 2 * 3\n") {
            Expr::Binary { op: BinaryOp::Add, rhs, .. } => {
                assert!(matches!(rhs.node, Expr::Binary { op: BinaryOp::Mul, .. }))
            }
            other => panic!("unexpected {:?}", other),
        }
        // not a in b parses as not (a in b)
        match single_expr("not a in b\n") {
            Expr::Unary { op: UnaryOp::Not, operand } => {
                assert!(matches!(operand.node, Expr::Binary { op: BinaryOp::In, .. }))
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(single_expr("a not in b\n"), Expr::Binary { op: BinaryOp::NotIn, .. }));
    }

    #[test]
    fn test_negative_literal_folded() {
        assert_eq!(single_expr("-1\n"), Expr::Int(-1));
        assert!(matches!(single_expr("x[-1]\n"), Expr::Index { index, .. } if index.node == Expr::Int(-1)));
    }

    #[test]
    fn test_chained_comparison_rejected() {
        let err = parse_str("a < b < c\n").unwrap_err();
        assert!(err[0].message.contains("do not chain"));
    }

    #[test]
    fn test_slices() {
        match single_expr("s[1:]\n") {
            Expr::Slice { start, end, step, .. } => {
                assert!(start.is_some() && end.is_none() && step.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(single_expr("s[::-1]\n"), Expr::Slice { step: Some(_), .. }));
    }

    #[test]
    fn test_comprehensions_and_conditional() {
        assert!(matches!(
            single_expr("[x * 2 for x in xs if x > 1]\n"),
            Expr::ListComp { clauses, .. } if clauses.len() == 2
        ));
        assert!(matches!(single_expr("{k: v for k, v in pairs}\n"), Expr::DictComp { .. }));
        assert!(matches!(single_expr("a if c else b\n"), Expr::Conditional { .. }));
        assert!(matches!(single_expr("lambda x, y = 1: x + y\n"), Expr::Lambda { .. }));
    }

    #[test]
    fn test_tuples_and_parens() {
        assert_eq!(single_expr("()\n"), Expr::Tuple(vec![]));
        assert!(matches!(single_expr("(1,)\n"), Expr::Tuple(items) if items.len() == 1));
        assert_eq!(single_expr("(1)\n"), Expr::Int(1));
    }

    #[test]
    fn test_call_arguments() {
        match single_expr("f(1, *a, k = 2, **kw)\n") {
            Expr::Call { args, .. } => {
                assert!(matches!(args[0], CallArg::Positional(_)));
                assert!(matches!(args[1], CallArg::Star(_)));
                assert!(matches!(&args[2], CallArg::Named(name, _) if name == "k"));
                assert!(matches!(args[3], CallArg::StarStar(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
        let err = parse_str("f(k = 1, 2)\n").unwrap_err();
        assert!(err[0].message.contains("Positional argument follows keyword argument"));
    }

    #[test]
    fn test_augmented_assignment() {
        let module = parse_str("x += 1\nd[\"k\"] //= 2\n").unwrap();
        assert!(matches!(module.stmts[0].node, Stmt::AugAssign { op: BinaryOp::Add, .. }));
        assert!(matches!(module.stmts[1].node, Stmt::AugAssign { op: BinaryOp::FloorDiv, .. }));
    }

    #[test]
    fn test_invalid_assignment_target() {
        let err = parse_str("f() = 1\n").unwrap_err();
        assert!(err[0].message.contains("Cannot assign"));
    }

    #[test]
    fn test_recovery_reports_multiple_errors() {
        let source = "def f(a b):\n  pass\nx = 1 +\ny = 1\n";
        let err = parse_str(source).unwrap_err();
        assert_eq!(err.len(), 2, "one error per broken statement: {:?}", err);
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let parens = format!("x = {}1{}\n", "(".repeat(1000), ")".repeat(1000));
        let err = parse_str(&parens).unwrap_err();
        assert!(err[0].message.contains("nested too deeply"), "{:?}", err);

        let lists = format!("x = {}{}\n", "[".repeat(1000), "]".repeat(1000));
        assert!(parse_str(&lists).unwrap_err()[0].message.contains("nested too deeply"));

        let negations = format!("x = {}1\n", "-".repeat(1000));
        assert!(parse_str(&negations).unwrap_err()[0].message.contains("nested too deeply"));

        let nots = format!("x = {}True\n", "not ".repeat(1000));
        assert!(parse_str(&nots).unwrap_err()[0].message.contains("nested too deeply"));
    }

    #[test]
    fn test_moderate_nesting_parses() {
        let source = format!("x = {}1{}\ny = 2\n", "(".repeat(50), ")".repeat(50));
        let module = parse_str(&source).unwrap();
        assert_eq!(module.stmts.len(), 2);
        assert!(matches!(single_expr("---1"), Expr::Int(-1)));
    }
}
