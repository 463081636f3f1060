//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use attrscript_syntax::{CompileError, lexer, parser};
use miette::Report;

use crate::computed::{ComputeError, eval_computed_attribute};
use crate::config::EvalConfig;
use crate::model::{Attr, AttrClass, AttrValue, Component, ComputedValue, Manifest, Target, TargetRef};
use crate::runner::HostRunner;

use super::{CliError, CliResult, ExitCode, SubjectArgs};

/// Maximum script size (10 MB)
const MAX_SOURCE_SIZE: u64 = 10 * 1024 * 1024;

/// Read a script, rejecting files over `MAX_SOURCE_SIZE`.
pub fn read_source(path: &Path) -> CliResult<String> {
    let metadata = fs::metadata(path)
        .map_err(|e| CliError::failure(format!("Cannot access file '{}': {}", path.display(), e)))?;

    if metadata.len() > MAX_SOURCE_SIZE {
        return Err(CliError::failure(format!(
            "Source file '{}' is too large ({} bytes, max {} bytes)",
            path.display(),
            metadata.len(),
            MAX_SOURCE_SIZE
        )));
    }

    fs::read_to_string(path).map_err(|e| CliError::failure(format!("Error reading file '{}': {}", path.display(), e)))
}

/// Render reports the way miette prints them to a terminal.
fn render(reports: impl IntoIterator<Item = Report>) -> String {
    let mut msg = String::new();
    for report in reports {
        msg.push_str(&format!("{:?}\n", report));
    }
    msg.trim_end().to_string()
}

fn compile_failure(path: &Path, source: &str, errors: &[CompileError]) -> CliError {
    let name = path.display().to_string();
    CliError::failure(render(errors.iter().map(|e| e.to_report(&name, source))))
}

fn compute_failure(err: &ComputeError) -> CliError {
    CliError::failure(render(err.to_reports()))
}

/// Tokenize and display tokens.
pub fn lex_file(path: &Path) -> CliResult<ExitCode> {
    let source = read_source(path)?;
    let tokens = lexer::lex(&source).map_err(|errs| compile_failure(path, &source, &errs))?;
    for tok in &tokens {
        println!("{:?}", tok);
    }
    Ok(ExitCode::SUCCESS)
}

/// Parse and display the AST.
pub fn parse_file(path: &Path) -> CliResult<ExitCode> {
    let source = read_source(path)?;
    let tokens = lexer::lex(&source).map_err(|errs| compile_failure(path, &source, &errs))?;
    let module = parser::parse(&tokens).map_err(|errs| compile_failure(path, &source, &errs))?;
    println!("{:#?}", module);
    Ok(ExitCode::SUCCESS)
}

/// Lex and parse every script, reporting all diagnostics before failing.
pub fn check_scripts(paths: &[PathBuf]) -> CliResult<ExitCode> {
    let mut failed = 0usize;
    for path in paths {
        let source = match read_source(path) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("{}", e);
                failed += 1;
                continue;
            }
        };
        match attrscript_syntax::parse_source(&source) {
            Ok(_) => println!("ok: {}", path.display()),
            Err(errs) => {
                eprintln!("{}", compile_failure(path, &source, &errs));
                failed += 1;
            }
        }
    }
    if failed > 0 {
        return Err(CliError::failure(format!("{} of {} scripts failed", failed, paths.len())));
    }
    Ok(ExitCode::SUCCESS)
}

/// Evaluate the computed attributes of a manifest and print `PATH = value` lines.
pub fn eval_manifest(manifest: &Path, selected: &[String], config: &EvalConfig) -> CliResult<ExitCode> {
    let graph = Manifest::load(manifest).map_err(|e| CliError::failure(format!("Error: {}", e)))?;
    let computed = graph.computed_attrs();

    for path in selected {
        if !computed.iter().any(|c| c.attr.path() == path.as_str()) {
            return Err(CliError::failure(format!(
                "Error: {} is not a computed attribute in {}",
                path,
                manifest.display()
            )));
        }
    }

    let mut runner = HostRunner::new(config.runner.clone());
    let mut failed = 0usize;
    for entry in &computed {
        let Some(attr) = entry.attr() else { continue };
        if !selected.is_empty() && !selected.contains(&attr.path) {
            continue;
        }
        let Some(value) = attr.value.as_ref().and_then(AttrValue::as_computed) else {
            continue;
        };
        match eval_computed_attribute(attr, &entry.owner, value, &mut runner, config) {
            Ok(result) => println!("{} = {}", attr.path, result.repr()),
            Err(e) => {
                eprintln!("{}: {}", attr.path, compute_failure(&e));
                failed += 1;
            }
        }
    }
    if failed > 0 {
        return Err(CliError::failure(format!("{} attribute(s) failed to evaluate", failed)));
    }
    Ok(ExitCode::SUCCESS)
}

/// Call `func` from `script` with a synthetic attribute and target.
pub fn call_function(script: &Path, func: &str, subject: &SubjectArgs, config: &EvalConfig) -> CliResult<ExitCode> {
    let computed = ComputedValue {
        contract_dir: script.parent().map(Path::to_path_buf).unwrap_or_default(),
        contract_path: script.display().to_string(),
        filename: script.to_path_buf(),
        func: func.to_string(),
        inline_script: String::new(),
        read_write: subject.rw,
    };
    evaluate_subject(computed, subject, config)
}

/// Evaluate an inline snippet with a synthetic attribute and target.
pub fn eval_inline(code: &str, subject: &SubjectArgs, config: &EvalConfig) -> CliResult<ExitCode> {
    let contract_dir =
        std::env::current_dir().map_err(|e| CliError::failure(format!("Error: current directory: {}", e)))?;
    let computed = ComputedValue {
        contract_dir,
        contract_path: "<command line>".to_string(),
        filename: PathBuf::new(),
        func: String::new(),
        inline_script: code.to_string(),
        read_write: subject.rw,
    };
    evaluate_subject(computed, subject, config)
}

fn evaluate_subject(computed: ComputedValue, subject: &SubjectArgs, config: &EvalConfig) -> CliResult<ExitCode> {
    let (attr, target) = synthetic_subject(subject, &computed);
    let mut runner = HostRunner::new(config.runner.clone());
    let value = eval_computed_attribute(&attr, &target, &computed, &mut runner, config)
        .map_err(|e| compute_failure(&e))?;
    println!("{}", value.repr());
    Ok(ExitCode::SUCCESS)
}

/// An attribute of class `//cli:attr_class`, listed in the details of a component.
fn synthetic_subject(subject: &SubjectArgs, computed: &ComputedValue) -> (Attr, Arc<Target>) {
    let class = Arc::new(Target::AttrClass(AttrClass {
        name: "attr_class".to_string(),
        path: "//cli:attr_class".to_string(),
    }));
    let attr = Attr {
        name: subject.attr_name.clone(),
        path: subject.attr_path.clone(),
        parent: TargetRef::resolved(class),
        value: Some(AttrValue::Computed(computed.clone())),
    };
    let target = Arc::new(Target::Component(Component {
        name: subject.target_name.clone(),
        path: subject.target_path.clone(),
        deps: Vec::new(),
        details: vec![TargetRef::resolved(Arc::new(Target::Attr(attr.clone())))],
    }));
    (attr, target)
}
