//! Command-line interface for attrscript.
//!
//! ## Commands
//!
//! - `eval <MANIFEST>` - Evaluate the computed attributes of a JSON manifest
//! - `call <SCRIPT> <FUNC>` - Call one script function against a synthetic attribute
//! - `inline <CODE>` - Evaluate an inline snippet the same way
//! - `check <SCRIPT>...` - Lex and parse scripts, reporting diagnostics
//!
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use crate::config::EvalConfig;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// A user-facing message plus the code to exit with.
#[derive(Debug)]
pub struct CliError {
    /// Already formatted for display
    pub message: String,
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Evaluate computed build attributes written in a Starlark dialect
#[derive(Parser, Debug)]
#[command(name = "attrscript")]
#[command(version = VERSION)]
#[command(about = "Evaluate computed build attributes", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Configuration file (default: ./attrscript.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    // Debug/development flags
    /// Tokenize only (debug)
    #[arg(long = "lex", value_name = "FILE")]
    pub lex_file: Option<PathBuf>,

    /// Parse only (debug)
    #[arg(long = "parse", value_name = "FILE")]
    pub parse_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate the computed attributes of a manifest
    Eval {
        /// JSON manifest
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,
        /// Only evaluate these attribute paths
        #[arg(long = "attr", value_name = "PATH")]
        attrs: Vec<String>,
    },

    /// Call a script function against a synthetic attribute
    Call {
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,
        #[arg(value_name = "FUNC")]
        func: String,
        #[command(flatten)]
        subject: SubjectArgs,
    },

    /// Evaluate an inline snippet against a synthetic attribute
    Inline {
        #[arg(value_name = "CODE")]
        code: String,
        #[command(flatten)]
        subject: SubjectArgs,
    },

    /// Lex and parse scripts without running them
    Check {
        #[arg(value_name = "SCRIPT", required = true)]
        scripts: Vec<PathBuf>,
    },
}

/// The attribute and target handed to `call` and `inline`.
#[derive(Args, Debug, Clone)]
pub struct SubjectArgs {
    #[arg(long, default_value = "attr")]
    pub attr_name: String,
    #[arg(long, default_value = "//cli:attr")]
    pub attr_path: String,
    #[arg(long, default_value = "cli")]
    pub target_name: String,
    #[arg(long, default_value = "//cli:cli")]
    pub target_path: String,
    /// Let `run` write to the filesystem
    #[arg(long)]
    pub rw: bool,
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

fn execute(cli: Cli) -> CliResult<ExitCode> {
    if let Some(file) = cli.lex_file {
        return commands::lex_file(&file);
    }
    if let Some(file) = cli.parse_file {
        return commands::parse_file(&file);
    }

    let load_config = || {
        EvalConfig::load_from(cli.config.as_deref()).map_err(|e| CliError::failure(format!("Error: {}", e)))
    };

    match cli.command {
        Some(Command::Eval { manifest, attrs }) => commands::eval_manifest(&manifest, &attrs, &load_config()?),
        Some(Command::Call { script, func, subject }) => {
            commands::call_function(&script, &func, &subject, &load_config()?)
        }
        Some(Command::Inline { code, subject }) => commands::eval_inline(&code, &subject, &load_config()?),
        Some(Command::Check { scripts }) => commands::check_scripts(&scripts),
        None => Err(CliError::failure("Error: no command given; see --help")),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_eval() {
        let cli = Cli::try_parse_from(["attrscript", "eval", "BUILD.json", "--attr", "//a:b", "--attr", "//a:c"]).unwrap();
        if let Some(Command::Eval { manifest, attrs }) = cli.command {
            assert_eq!(manifest, PathBuf::from("BUILD.json"));
            assert_eq!(attrs, vec!["//a:b", "//a:c"]);
        } else {
            panic!("Expected Eval command");
        }
    }

    #[test]
    fn test_cli_parse_call_defaults() {
        let cli = Cli::try_parse_from(["attrscript", "call", "a.star", "some_number"]).unwrap();
        if let Some(Command::Call { func, subject, .. }) = cli.command {
            assert_eq!(func, "some_number");
            assert_eq!(subject.attr_name, "attr");
            assert_eq!(subject.target_path, "//cli:cli");
            assert!(!subject.rw);
        } else {
            panic!("Expected Call command");
        }
    }

    #[test]
    fn test_cli_parse_inline_with_subject() {
        let cli = Cli::try_parse_from([
            "attrscript",
            "inline",
            "'yeet_' + attr.name",
            "--attr-name",
            "BROSKIE",
            "--rw",
            "--config",
            "ci.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("ci.toml")));
        if let Some(Command::Inline { code, subject }) = cli.command {
            assert_eq!(code, "'yeet_' + attr.name");
            assert_eq!(subject.attr_name, "BROSKIE");
            assert!(subject.rw);
        } else {
            panic!("Expected Inline command");
        }
    }

    #[test]
    fn test_cli_parse_check_requires_scripts() {
        assert!(Cli::try_parse_from(["attrscript", "check"]).is_err());
        let cli = Cli::try_parse_from(["attrscript", "check", "a.star", "b.star"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Check { scripts }) if scripts.len() == 2));
    }

    #[test]
    fn test_cli_parse_debug_flags() {
        let cli = Cli::try_parse_from(["attrscript", "--lex", "a.star"]).unwrap();
        assert!(cli.lex_file.is_some());

        let cli = Cli::try_parse_from(["attrscript", "--parse", "a.star"]).unwrap();
        assert!(cli.parse_file.is_some());
    }
}
