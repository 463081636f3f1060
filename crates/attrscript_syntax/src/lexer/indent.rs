//! Indentation handling for the attrscript lexer
//!
//! Implements Python-style INDENT/DEDENT tokens. Blank lines and comment-only lines never affect indentation.

use super::Lexer;
use super::tokens::{Token, TokenKind};
use crate::ast::Span;
use crate::diagnostics::CompileError;

/// Columns a tab advances the indentation counter by.
const TAB_WIDTH: usize = 4;

impl<'a> Lexer<'a> {
    pub(super) fn handle_indentation(&mut self) {
        let start = self.current_pos;
        let mut indent = 0;

        while let Some(c) = self.peek() {
            match c {
                ' ' => {
                    indent += 1;
                    self.advance();
                }
                '\t' => {
                    indent += TAB_WIDTH;
                    self.advance();
                }
                '#' => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                    if self.peek() == Some('\n') {
                        self.advance();
                    }
                    return;
                }
                '\n' => {
                    self.advance();
                    return;
                }
                '\r' => {
                    self.advance();
                }
                _ => break,
            }
        }

        if self.is_at_end() {
            self.at_line_start = false;
            return;
        }

        let current_indent = *self.indent_stack.last().unwrap_or(&0);

        if indent > current_indent {
            self.indent_stack.push(indent);
            self.tokens
                .push(Token::new(TokenKind::Indent, Span::new(start, self.current_pos)));
        } else if indent < current_indent {
            let mut count = 0;
            while let Some(&top) = self.indent_stack.last() {
                if indent >= top {
                    break;
                }
                self.indent_stack.pop();
                count += 1;
            }
            if self.indent_stack.is_empty() {
                self.indent_stack.push(0);
            }

            let final_indent = *self.indent_stack.last().unwrap_or(&0);
            if indent != final_indent {
                self.errors.push(
                    CompileError::new(
                        format!(
                            "Inconsistent indentation: expected {} spaces, got {}",
                            final_indent, indent
                        ),
                        Span::new(start, self.current_pos),
                    )
                    .with_hint("Dedent to the level of an enclosing block"),
                );
            }

            if count > 0 {
                self.tokens
                    .push(Token::new(TokenKind::Dedent, Span::new(start, self.current_pos)));
                self.pending_dedents = count - 1;
            }
        }

        self.at_line_start = false;
    }
}
