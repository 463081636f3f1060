//! Layering guardrails.
//!
//! - The support crates (`attrscript_core`, `attrscript_syntax`) stay free of process, runtime and config
//!   dependencies; only the root crate talks to the outside world.
//! - The interpreter never spawns processes or touches the filesystem itself; that goes through `Host`.

use std::fs;
use std::path::Path;

const FORBIDDEN_IN_SUPPORT_CRATES: &[&str] = &["tokio", "figment", "serde_json", "attrscript"];

/// Names listed in the `[dependencies]` table of a manifest.
fn dependencies(manifest: &str) -> Vec<String> {
    let mut in_dependencies = false;
    let mut names = Vec::new();
    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        if line.starts_with('[') {
            in_dependencies = line == "[dependencies]";
            continue;
        }
        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line_no_comment = line.split('#').next().unwrap_or("").trim();
        if let Some((name, _)) = line_no_comment.split_once('=') {
            names.push(name.trim().to_string());
        }
    }
    names
}

#[test]
fn support_crates_have_no_outside_world_dependencies() {
    for manifest in [
        include_str!("../crates/attrscript_core/Cargo.toml"),
        include_str!("../crates/attrscript_syntax/Cargo.toml"),
    ] {
        for dep in dependencies(manifest) {
            assert!(
                !FORBIDDEN_IN_SUPPORT_CRATES.contains(&dep.as_str()),
                "support crate depends on {dep}"
            );
        }
    }
}

#[test]
fn interpreter_does_not_reach_outside() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/interp");
    let mut offenders = Vec::new();
    for entry in fs::read_dir(&dir).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().is_none_or(|e| e != "rs") {
            continue;
        }
        let text = fs::read_to_string(&path).unwrap();
        for (i, line) in text.lines().enumerate() {
            if ["std::process", "tokio::", "std::fs", "fs::read"].iter().any(|p| line.contains(p)) {
                offenders.push(format!("{}:{}: {}", path.display(), i + 1, line.trim()));
            }
        }
    }
    assert!(offenders.is_empty(), "interpreter must go through Host:\n{}", offenders.join("\n"));
}
