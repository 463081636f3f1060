//! `load()` resolution and caching against real files.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use attrscript::computed::{ComputeError, eval_computed_attribute};
use attrscript::config::EvalConfig;
use attrscript::interp::Value;
use attrscript::model::{Attr, AttrClass, Checker, ComputedValue, Target, TargetRef};
use attrscript::runner::{CommandOutput, CommandRequest, CommandRunner, RunError};

struct NoCommands;

impl CommandRunner for NoCommands {
    fn run(&mut self, request: &CommandRequest) -> Result<CommandOutput, RunError> {
        panic!("unexpected command {:?}", request.args);
    }
}

fn eval(computed: &ComputedValue) -> Result<Value, ComputeError> {
    let class = Arc::new(Target::AttrClass(AttrClass {
        name: "c".into(),
        path: "//c:c".into(),
    }));
    let attr = Attr {
        name: "a".into(),
        path: "//a:a".into(),
        parent: TargetRef::resolved(class),
        value: None,
    };
    let target = Arc::new(Target::Checker(Checker {
        name: "lint".into(),
        path: "//checks:lint".into(),
    }));
    eval_computed_attribute(&attr, &target, computed, &mut NoCommands, &EvalConfig::default())
}

fn write(dir: &Path, name: &str, text: &str) {
    if let Some(parent) = dir.join(name).parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(dir.join(name), text).unwrap();
}

#[test]
fn test_load_relative_to_script() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "lib/versions.star", "BASE = '1.2'\ndef suffixed(s):\n    return BASE + '-' + s\n");
    write(
        dir.path(),
        "lib/main.star",
        "load('versions.star', 'suffixed', base = 'BASE')\n\ndef version(attr, t):\n    return suffixed(t.name) + ' ' + base\n",
    );
    let computed = ComputedValue::from_file(dir.path().join("lib/main.star"), "version");
    assert_eq!(eval(&computed).unwrap(), Value::str("1.2-lint 1.2"));
}

#[test]
fn test_inline_loads_from_contract_dir() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "consts.star", "ARCH = 'amd64'\n");
    let mut computed = ComputedValue::inline("load('consts.star', 'ARCH')\nARCH");
    computed.contract_dir = dir.path().to_path_buf();
    assert_eq!(eval(&computed).unwrap(), Value::str("amd64"));
}

#[test]
fn test_shared_module_is_executed_once() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "common.star", "ITEMS = [1, 2]\n");
    write(dir.path(), "a.star", "load('common.star', 'ITEMS')\nA = ITEMS\n");
    write(dir.path(), "b.star", "load('common.star', 'ITEMS')\nB = ITEMS\n");
    write(
        dir.path(),
        "main.star",
        "load('a.star', 'A')\nload('b.star', 'B')\n\ndef same(attr, t):\n    return A == B and len(A) == 2\n",
    );
    let computed = ComputedValue::from_file(dir.path().join("main.star"), "same");
    assert_eq!(eval(&computed).unwrap(), Value::Bool(true));
}

#[test]
fn test_load_cycle() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "x.star", "load('y.star', 'Y')\nX = 1\n");
    write(dir.path(), "y.star", "load('x.star', 'X')\nY = 2\n");
    write(dir.path(), "main.star", "load('x.star', 'X')\ndef f(attr, t):\n    return X\n");
    let computed = ComputedValue::from_file(dir.path().join("main.star"), "f");
    let err = eval(&computed).unwrap_err();
    assert!(
        err.to_string().contains("cycle in dependency graph when loading x.star"),
        "{err}"
    );
}

#[test]
fn test_missing_module_and_symbol() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "lib.star", "A = 1\n");
    write(dir.path(), "missing.star", "load('nope.star', 'A')\ndef f(attr, t):\n    return A\n");
    write(dir.path(), "symbol.star", "load('lib.star', 'B')\ndef f(attr, t):\n    return B\n");

    let err = eval(&ComputedValue::from_file(dir.path().join("missing.star"), "f")).unwrap_err();
    assert!(err.to_string().contains("cannot load nope.star"), "{err}");

    let err = eval(&ComputedValue::from_file(dir.path().join("symbol.star"), "f")).unwrap_err();
    assert!(err.to_string().contains("B"), "{err}");
}

#[test]
fn test_loaded_values_are_frozen() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "lib.star", "ITEMS = [1]\n");
    let mut computed = ComputedValue::inline("load('lib.star', 'ITEMS')\nITEMS.append(2)");
    computed.contract_dir = dir.path().to_path_buf();
    let err = eval(&computed).unwrap_err();
    assert!(err.to_string().contains("cannot mutate a frozen value"), "{err}");
}
