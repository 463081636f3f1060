//! Property-based tests for the attrscript frontend
//!
//! These tests use proptest to verify that the lexer and parser never panic and that generated well-formed scripts
//! always parse.

use attrscript_syntax::ast::Stmt;
use attrscript_syntax::{lexer, parser};
use proptest::prelude::*;

fn ident_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}".prop_filter("Not a keyword", |s| lexer::keyword_id(s).is_none())
}

fn function_strategy() -> impl Strategy<Value = String> {
    (ident_strategy(), ident_strategy(), 0i64..1000).prop_map(|(name, param, n)| {
        format!(
            "def {name}({param}):\n    v = {param} + {n}\n    if v > 3:\n        return v\n    return [v for _ in range(2)]\n"
        )
    })
}

proptest! {
    #[test]
    fn lexer_never_panics(source in "\\PC{0,200}") {
        let _ = lexer::lex(&source);
    }

    #[test]
    fn parser_never_panics_on_lexable_input(source in "[a-z0-9 +*/%=(),:\\[\\]{}\\n.\"'-]{0,120}") {
        if let Ok(tokens) = lexer::lex(&source) {
            let _ = parser::parse(&tokens);
        }
    }

    #[test]
    fn deep_brackets_never_overflow(depth in 0usize..3000, open in prop::sample::select(vec!['(', '['])) {
        let close = if open == '(' { ')' } else { ']' };
        let source = format!("x = {}1{}\n", open.to_string().repeat(depth), close.to_string().repeat(depth));
        let tokens = lexer::lex(&source).expect("lex");
        let result = parser::parse(&tokens);
        if depth < 100 {
            prop_assert!(result.is_ok());
        } else if depth > 250 {
            prop_assert!(result.is_err());
        }
    }

    #[test]
    fn generated_functions_parse(source in function_strategy()) {
        let tokens = lexer::lex(&source).expect("lex");
        let module = parser::parse(&tokens).expect("parse");
        prop_assert_eq!(module.stmts.len(), 1);
        prop_assert!(matches!(module.stmts[0].node, Stmt::Def(_)));
    }

    #[test]
    fn identifiers_survive_lexing(ident in ident_strategy()) {
        let tokens = lexer::lex(&ident).expect("lex");
        prop_assert_eq!(&tokens[0].kind, &lexer::TokenKind::Ident(ident.clone()));
    }
}
