//! Diagnostics and error reporting for attrscript source.
//!
//! [`CompileError`] carries a byte span into the source; [`CompileError::to_report`] turns it into a `miette`
//! report with the offending line highlighted.

use crate::ast::Span;
use miette::{LabeledSpan, MietteDiagnostic, NamedSource, Report};

/// A lex or parse error with location information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct CompileError {
    pub message: String,
    pub span: Span,
    pub kind: ErrorKind,
    pub notes: Vec<String>,
    pub hints: Vec<String>,
}

impl CompileError {
    pub fn new(message: String, span: Span) -> Self {
        Self {
            message,
            span,
            kind: ErrorKind::Error,
            notes: Vec::new(),
            hints: Vec::new(),
        }
    }

    pub fn syntax(message: String, span: Span) -> Self {
        Self {
            kind: ErrorKind::Syntax,
            ..Self::new(message, span)
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    /// One-based `(line, column)` of the error start within `source`.
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        let (line, col, _) = get_line_info(source, self.span.start);
        (line, col)
    }

    /// Render as `name:line:col: message`, the form used in evaluation error chains.
    pub fn located(&self, name: &str, source: &str) -> String {
        let (line, col) = self.line_col(source);
        format!("{}:{}:{}: {}", name, line, col, self.message)
    }

    /// Build a `miette` report that points at the offending source.
    pub fn to_report(&self, name: &str, source: &str) -> Report {
        let start = self.span.start.min(source.len());
        let end = self.span.end.max(start).min(source.len());
        let mut diag = MietteDiagnostic::new(self.message.clone())
            .with_code(self.kind.code())
            .with_label(LabeledSpan::new(Some(self.kind.to_string()), start, end - start));
        let mut help: Vec<String> = self.notes.iter().map(|n| format!("note: {}", n)).collect();
        help.extend(self.hints.iter().cloned());
        if !help.is_empty() {
            diag = diag.with_help(help.join("\n"));
        }
        Report::new(diag).with_source_code(NamedSource::new(name, source.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Error,
    Syntax,
}

impl ErrorKind {
    fn code(self) -> &'static str {
        match self {
            ErrorKind::Error => "attrscript::lex",
            ErrorKind::Syntax => "attrscript::syntax",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Error => write!(f, "error"),
            ErrorKind::Syntax => write!(f, "syntax error"),
        }
    }
}

/// Get line number, column number, and line text for a byte offset.
pub fn get_line_info(source: &str, offset: usize) -> (usize, usize, &str) {
    let offset = offset.min(source.len());
    let mut line_num = 1;
    let mut line_start = 0;

    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line_num += 1;
            line_start = i + 1;
        }
    }

    let line_end = source[line_start..]
        .find('\n')
        .map(|i| line_start + i)
        .unwrap_or(source.len());

    let line_text = &source[line_start..line_end];
    let col_num = source[line_start..offset].chars().count() + 1;

    (line_num, col_num, line_text)
}
