//! Number scanning for the attrscript lexer
//!
//! Handles decimal, hexadecimal (`0x`), octal (`0o`) integers and floating-point literals.

use super::Lexer;
use super::tokens::TokenKind;
use crate::ast::Span;
use crate::diagnostics::CompileError;

impl<'a> Lexer<'a> {
    pub(super) fn scan_number(&mut self, start: usize, first: char) {
        if first == '0' {
            let radix = match self.peek() {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                self.scan_radix_int(start, radix);
                return;
            }
        }

        let mut value = String::from(first);
        let mut is_float = first == '.';

        self.take_digits(&mut value);

        // Decimal part
        // `1.foo` is not a float; `1.` and `1.5` are
        if !is_float && self.peek() == Some('.') && !self.peek_next().is_some_and(is_ident_char) {
            is_float = true;
            value.push('.');
            self.advance();
            self.take_digits(&mut value);
        }

        // Exponent part
        if matches!(self.peek(), Some('e' | 'E')) {
            is_float = true;
            value.push('e');
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                value.push(sign);
                self.advance();
            }
            self.take_digits(&mut value);
        }

        if is_float {
            match value.parse::<f64>() {
                Ok(f) => self.add_token(TokenKind::Float(f), start),
                Err(_) => self.errors.push(CompileError::new(
                    format!("Invalid float literal: {}", value),
                    Span::new(start, self.current_pos),
                )),
            }
        } else {
            match value.parse::<i64>() {
                Ok(i) => self.add_token(TokenKind::Int(i), start),
                Err(_) => self.errors.push(CompileError::new(
                    format!("Invalid integer literal: {}", value),
                    Span::new(start, self.current_pos),
                )),
            }
        }
    }

    fn take_digits(&mut self, value: &mut String) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                value.push(c);
                self.advance();
            } else if c == '_' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn scan_radix_int(&mut self, start: usize, radix: u32) {
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_digit(radix) {
                digits.push(c);
                self.advance();
            } else if c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        match i64::from_str_radix(&digits, radix) {
            Ok(i) => self.add_token(TokenKind::Int(i), start),
            Err(_) => self.errors.push(CompileError::new(
                format!("Invalid integer literal: {}", &self.source[start..self.current_pos]),
                Span::new(start, self.current_pos),
            )),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

#[cfg(test)]
mod tests {
    use crate::lexer::{TokenKind, lex};

    #[test]
    #[allow(clippy::approx_constant)]
    fn test_numbers() {
        let tokens = lex("42 3.14 1_000_000 1e3 0xFF 0o17 .5").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Int(42));
        assert!(matches!(tokens[1].kind, TokenKind::Float(f) if (f - 3.14).abs() < 0.001));
        assert_eq!(tokens[2].kind, TokenKind::Int(1_000_000));
        assert_eq!(tokens[3].kind, TokenKind::Float(1000.0));
        assert_eq!(tokens[4].kind, TokenKind::Int(255));
        assert_eq!(tokens[5].kind, TokenKind::Int(15));
        assert_eq!(tokens[6].kind, TokenKind::Float(0.5));
    }

    #[test]
    fn test_integer_overflow_literal() {
        let errors = lex("99999999999999999999").unwrap_err();
        assert!(errors[0].message.contains("Invalid integer literal"));
    }

    #[test]
    fn test_empty_hex_literal() {
        assert!(lex("0x").is_err());
    }
}
