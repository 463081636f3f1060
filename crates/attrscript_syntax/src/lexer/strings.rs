//! String scanning for the attrscript lexer
//!
//! Handles single- and double-quoted strings, their triple-quoted forms, and raw (`r"..."`) strings.

use super::Lexer;
use super::tokens::{Token, TokenKind};
use crate::ast::Span;
use crate::diagnostics::CompileError;

/// Result of processing an escape sequence
enum EscapeResult {
    /// Successfully parsed escape character
    Char(char),
    /// Unknown escape - preserve as-is (backslash + char)
    Unknown(char),
    /// Malformed `\x` / `\u` escape
    Invalid(String),
    /// End of input during escape
    Eof,
}

impl<'a> Lexer<'a> {
    /// Process a text escape sequence. Called after consuming the backslash.
    fn scan_text_escape(&mut self) -> EscapeResult {
        match self.advance() {
            Some('n') => EscapeResult::Char('\n'),
            Some('t') => EscapeResult::Char('\t'),
            Some('r') => EscapeResult::Char('\r'),
            Some('0') => EscapeResult::Char('\0'),
            Some('a') => EscapeResult::Char('\x07'),
            Some('b') => EscapeResult::Char('\x08'),
            Some('f') => EscapeResult::Char('\x0c'),
            Some('v') => EscapeResult::Char('\x0b'),
            Some('\\') => EscapeResult::Char('\\'),
            Some('\'') => EscapeResult::Char('\''),
            Some('"') => EscapeResult::Char('"'),
            Some('x') => self.scan_hex_escape(2),
            Some('u') => self.scan_hex_escape(4),
            Some('U') => self.scan_hex_escape(8),
            Some(c) => EscapeResult::Unknown(c),
            None => EscapeResult::Eof,
        }
    }

    fn scan_hex_escape(&mut self, width: usize) -> EscapeResult {
        let mut hex = String::with_capacity(width);
        for _ in 0..width {
            match self.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    hex.push(c);
                    self.advance();
                }
                _ => break,
            }
        }
        match u32::from_str_radix(&hex, 16).ok().filter(|_| hex.len() == width).and_then(char::from_u32) {
            Some(c) => EscapeResult::Char(c),
            None => EscapeResult::Invalid(hex),
        }
    }

    pub(super) fn scan_string(&mut self, start: usize, quote: char, raw: bool) {
        let triple = self.peek() == Some(quote) && self.peek_next() == Some(quote);
        if triple {
            self.advance();
            self.advance();
        }

        let mut value = String::new();

        loop {
            match self.peek() {
                None => {
                    self.errors.push(CompileError::new(
                        "Unterminated string".to_string(),
                        Span::new(start, self.current_pos),
                    ));
                    break;
                }
                Some(c) if c == quote => {
                    self.advance();
                    if !triple {
                        break;
                    }
                    if self.peek() == Some(quote) && self.peek_next() == Some(quote) {
                        self.advance();
                        self.advance();
                        break;
                    }
                    value.push(quote);
                }
                Some('\n') if !triple => {
                    self.errors.push(CompileError::new(
                        "Unterminated string (newline in single-quoted string)".to_string(),
                        Span::new(start, self.current_pos),
                    ));
                    break;
                }
                Some('\\') if raw => {
                    self.advance();
                    value.push('\\');
                    // A raw string still cannot end on an escaped quote.
                    if let Some(c) = self.advance() {
                        value.push(c);
                    }
                }
                Some('\\') => {
                    self.advance();
                    if self.peek() == Some('\n') {
                        // Escaped newline joins lines.
                        self.advance();
                        continue;
                    }
                    match self.scan_text_escape() {
                        EscapeResult::Char(c) => value.push(c),
                        EscapeResult::Unknown(c) => {
                            value.push('\\');
                            value.push(c);
                        }
                        EscapeResult::Invalid(hex) => {
                            self.errors.push(CompileError::new(
                                format!("Invalid escape sequence: \\{}", hex),
                                Span::new(start, self.current_pos),
                            ));
                        }
                        EscapeResult::Eof => {
                            self.errors.push(CompileError::new(
                                "Unterminated escape sequence".to_string(),
                                Span::new(start, self.current_pos),
                            ));
                            break;
                        }
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        self.tokens.push(Token::new(
            TokenKind::String(value),
            Span::new(start, self.current_pos),
        ));
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::{TokenKind, lex};

    fn first_string(source: &str) -> String {
        match lex(source).unwrap().remove(0).kind {
            TokenKind::String(s) => s,
            other => panic!("expected string, got {:?}", other),
        }
    }

    #[test]
    fn test_strings() {
        assert_eq!(first_string(r#""hello""#), "hello");
        assert_eq!(first_string("'world'"), "world");
        assert_eq!(first_string("''"), "");
    }

    #[test]
    fn test_escapes() {
        assert_eq!(first_string(r#""a\nb\t\"q\"""#), "a\nb\t\"q\"");
        assert_eq!(first_string(r#""\x41é""#), "Aé");
        assert_eq!(first_string(r#""\d""#), "\\d");
    }

    #[test]
    fn test_raw_string_keeps_backslashes() {
        assert_eq!(first_string(r#"r"\d+\.\d+""#), r"\d+\.\d+");
    }

    #[test]
    fn test_triple_quoted() {
        assert_eq!(
            first_string("\"\"\"line one\nline \"two\" end\"\"\""),
            "line one\nline \"two\" end"
        );
    }

    #[test]
    fn test_unterminated() {
        let errors = lex("'abc\n").unwrap_err();
        assert!(errors[0].message.contains("Unterminated string"));
    }
}
