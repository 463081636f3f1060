//! Manifests on disk: resolution, owner selection and the `eval` command.

use std::fs;

use attrscript::cli::ExitCode;
use attrscript::cli::commands::eval_manifest;
use attrscript::computed::eval_computed_attribute;
use attrscript::config::EvalConfig;
use attrscript::interp::Value;
use attrscript::model::{AttrValue, Manifest, ManifestError};
use attrscript::runner::HostRunner;

const MANIFEST: &str = r#"{
    "targets": [
        { "kind": "attr_class", "name": "semantic", "path": "common://attrs/version:semantic" },
        { "kind": "resource_class", "name": "file", "path": "common://resources:file" },
        { "kind": "attr", "name": "amd64", "path": "//test:amd64",
          "parent": "common://attrs/version:semantic",
          "value": { "computed": { "filename": "a.star", "func": "target_info" } } },
        { "kind": "attr", "name": "version", "path": "//test:version",
          "parent": "common://attrs/version:semantic",
          "value": { "computed": { "code": "t.type + ':' + attr.name" } } },
        { "kind": "resource", "name": "some_file", "path": "//test:some_file",
          "parent": "common://resources:file", "details": ["//test:amd64"] }
    ]
}"#;

fn setup() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let fixture = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/a.star");
    fs::copy(fixture, dir.path().join("a.star")).unwrap();
    fs::write(dir.path().join("BUILD.json"), MANIFEST).unwrap();
    dir
}

#[test]
fn test_evaluates_against_owner() {
    let dir = setup();
    let graph = Manifest::load(&dir.path().join("BUILD.json")).unwrap();
    let config = EvalConfig::default();
    let mut runner = HostRunner::new(config.runner.clone());

    let mut results = Vec::new();
    for entry in graph.computed_attrs() {
        let attr = entry.attr().unwrap();
        let computed = attr.value.as_ref().and_then(AttrValue::as_computed).unwrap();
        let value = eval_computed_attribute(attr, &entry.owner, computed, &mut runner, &config).unwrap();
        results.push((attr.path.clone(), value));
    }

    assert_eq!(
        results,
        vec![
            (
                "//test:amd64".to_string(),
                Value::str(
                    "resource: name=some_file, path=//test:some_file, deps=[], details=[attr]"
                )
            ),
            // Nobody lists //test:version, so it runs against its class.
            ("//test:version".to_string(), Value::str("attr_class:version")),
        ]
    );
}

#[test]
fn test_eval_command() {
    let dir = setup();
    let manifest = dir.path().join("BUILD.json");
    let config = EvalConfig::default();
    assert_eq!(eval_manifest(&manifest, &[], &config).unwrap(), ExitCode::SUCCESS);
    assert_eq!(
        eval_manifest(&manifest, &["//test:version".to_string()], &config).unwrap(),
        ExitCode::SUCCESS
    );
    let err = eval_manifest(&manifest, &["//test:missing".to_string()], &config).unwrap_err();
    assert!(err.message.contains("//test:missing is not a computed attribute"));
}

#[test]
fn test_eval_command_reports_failures() {
    let dir = setup();
    let broken = MANIFEST.replace("target_info", "not_there");
    let manifest = dir.path().join("BROKEN.json");
    fs::write(&manifest, broken).unwrap();
    let err = eval_manifest(&manifest, &[], &EvalConfig::default()).unwrap_err();
    assert_eq!(err.message, "1 attribute(s) failed to evaluate");
}

#[test]
fn test_manifest_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = Manifest::load(&dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(missing, ManifestError::Io { .. }));

    let path = dir.path().join("BUILD.json");
    fs::write(
        &path,
        r#"{"targets": [{"kind": "attr", "name": "a", "path": "//a", "parent": "//a",
             "value": {"computed": {"filename": "a.star"}}}]}"#,
    )
    .unwrap();
    assert!(Manifest::load(&path).is_err());
}
