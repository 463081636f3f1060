use std::sync::Arc;

use attrscript_syntax::ast::Span;
use attrscript_syntax::diagnostics::get_line_info;
use attrscript_syntax::CompileError;
use miette::{LabeledSpan, MietteDiagnostic, NamedSource, Report};

use super::ModuleEnv;

/// Where a runtime error happened.
#[derive(Debug, Clone)]
pub struct Location {
    pub module: String,
    pub source: Arc<str>,
    pub span: Span,
}

impl Location {
    /// One-based line and column.
    pub fn line_col(&self) -> (usize, usize) {
        let (line, col, _) = get_line_info(&self.source, self.span.start);
        (line, col)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (line, col) = self.line_col();
        write!(f, "{}:{}:{}", self.module, line, col)
    }
}

/// A runtime failure inside a script.
///
/// The location is that of the innermost expression that failed; `notes` carry the call stack, innermost first.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct EvalError {
    pub message: String,
    pub location: Option<Location>,
    pub notes: Vec<String>,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            notes: Vec::new(),
        }
    }

    /// Attach a location unless a more precise one is already set.
    pub(crate) fn at(mut self, module: &ModuleEnv, span: Span) -> Self {
        if self.location.is_none() {
            self.location = Some(Location {
                module: module.name.clone(),
                source: module.source.clone(),
                span,
            });
        }
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// `module:line:col: message`, or the bare message when no location is known.
    pub fn located(&self) -> String {
        match &self.location {
            Some(loc) => format!("{}: {}", loc, self.message),
            None => self.message.clone(),
        }
    }

    pub fn to_report(&self) -> Report {
        let mut diag = MietteDiagnostic::new(self.message.clone()).with_code("attrscript::eval");
        if !self.notes.is_empty() {
            diag = diag.with_help(self.notes.join("\n"));
        }
        let Some(loc) = &self.location else {
            return Report::new(diag);
        };
        let start = loc.span.start.min(loc.source.len());
        let end = loc.span.end.max(start).min(loc.source.len());
        diag = diag.with_label(LabeledSpan::new(Some("here".to_string()), start, end - start));
        Report::new(diag).with_source_code(NamedSource::new(loc.module.clone(), loc.source.to_string()))
    }
}

/// Failure to execute a module: either it did not parse, or it raised while running.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("{}", first_error(.name, .text, .errors))]
    Syntax {
        name: String,
        text: String,
        errors: Vec<CompileError>,
    },
    #[error(transparent)]
    Eval(#[from] EvalError),
}

fn first_error(name: &str, source: &str, errors: &[CompileError]) -> String {
    match errors {
        [] => format!("{}: syntax error", name),
        [only] => only.located(name, source),
        [first, rest @ ..] => format!("{} (and {} more)", first.located(name, source), rest.len()),
    }
}

impl ExecError {
    /// Render every diagnostic with source context.
    pub fn to_reports(&self) -> Vec<Report> {
        match self {
            ExecError::Syntax { name, text, errors } => {
                errors.iter().map(|e| e.to_report(name, text)).collect()
            }
            ExecError::Eval(e) => vec![e.to_report()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_located_message() {
        let module = ModuleEnv::new("a.star", "/".into(), "x = 1\ny = z\n");
        let err = EvalError::new("undefined: z").at(&module, Span::new(10, 11));
        assert_eq!(err.located(), "a.star:2:5: undefined: z");
        // The first location wins.
        let err = err.at(&module, Span::new(0, 1));
        assert_eq!(err.located(), "a.star:2:5: undefined: z");
        assert_eq!(EvalError::new("boom").located(), "boom");
    }
}
