//! The fixture scripts against real processes. Unix only: they shell out to `uname`, `echo` and `pwd`.
#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use attrscript::computed::eval_computed_attribute;
use attrscript::config::{EvalConfig, RunnerConfig};
use attrscript::interp::Value;
use attrscript::model::{Attr, AttrClass, Component, ComputedValue, Target, TargetRef};
use attrscript::runner::HostRunner;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn subject() -> (Attr, Arc<Target>) {
    let class = Arc::new(Target::AttrClass(AttrClass {
        name: "semantic".into(),
        path: "common://attrs/version:semantic".into(),
    }));
    let attr = Attr {
        name: "amd64".into(),
        path: "//test:amd64".into(),
        parent: TargetRef::resolved(class),
        value: None,
    };
    let target = Arc::new(Target::Component(Component {
        name: "test".into(),
        path: "//test:test".into(),
        deps: Vec::new(),
        details: Vec::new(),
    }));
    (attr, target)
}

fn eval(computed: &ComputedValue, runner: &mut HostRunner) -> Value {
    let (attr, target) = subject();
    eval_computed_attribute(&attr, &target, computed, runner, &EvalConfig::default()).unwrap()
}

#[test]
fn test_wd_defaults_to_root() {
    let mut runner = HostRunner::new(RunnerConfig::default());
    let computed = ComputedValue::from_file(fixture("run.star"), "wd");
    assert_eq!(eval(&computed, &mut runner), Value::str("/"));
}

#[test]
fn test_wd_follows_contract_dir() {
    let dir = tempfile::tempdir().unwrap();
    let canonical = std::fs::canonicalize(dir.path()).unwrap();
    let mut computed = ComputedValue::from_file(fixture("run.star"), "wd");
    computed.contract_dir = canonical.clone();
    let mut runner = HostRunner::new(RunnerConfig::default());
    assert_eq!(eval(&computed, &mut runner), Value::str(canonical.display().to_string()));
}

#[test]
fn test_run_basic() {
    let mut runner = HostRunner::new(RunnerConfig::default());
    let computed = ComputedValue::from_file(fixture("run.star"), "run_basic");
    let Value::Str(out) = eval(&computed, &mut runner) else {
        panic!("run_basic should return a string");
    };
    assert!(out.ends_with("\nye"), "{out:?}");
    assert!(out.len() > "\nye".len());
}

#[test]
fn test_runner_survives_close_between_evaluations() {
    let mut runner = HostRunner::new(RunnerConfig::default());
    let computed = ComputedValue::from_file(fixture("run.star"), "wd");
    assert_eq!(eval(&computed, &mut runner), Value::str("/"));
    assert_eq!(eval(&computed, &mut runner), Value::str("/"));
}

#[test]
fn test_read_only_wrapper_is_applied() {
    // `sh -c 'exit 1' --` stands in for a sandbox that refuses every write.
    let config = RunnerConfig {
        read_only_wrapper: vec!["sh".into(), "-c".into(), "exit 1".into(), "--".into()],
        ..RunnerConfig::default()
    };
    let dir = tempfile::tempdir().unwrap();
    let mut computed = ComputedValue::from_file(fixture("run.star"), "check_no_write");
    computed.contract_dir = dir.path().to_path_buf();

    let mut runner = HostRunner::new(config.clone());
    assert_eq!(eval(&computed, &mut runner), Value::Int(1));
    assert!(!dir.path().join("aa").exists());

    computed.read_write = true;
    let mut runner = HostRunner::new(config);
    assert_eq!(eval(&computed, &mut runner), Value::Int(0));
    assert!(dir.path().join("aa").exists());
}
