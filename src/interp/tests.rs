use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::*;

/// Host that serves `load` from an in-memory table and echoes host calls.
#[derive(Default)]
struct MapHost {
    files: HashMap<String, String>,
    calls: Vec<String>,
}

impl Host for MapHost {
    fn call(&mut self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        self.calls.push(name.to_string());
        Ok(Value::Str(format!(
            "{}({})",
            name,
            args.iter().map(Value::repr).collect::<Vec<_>>().join(", ")
        )))
    }

    fn resolve_load(&mut self, module: &str, _origin: &Path) -> Result<LoadedSource, EvalError> {
        let source = self
            .files
            .get(module)
            .cloned()
            .ok_or_else(|| EvalError::new(format!("no such module {}", module)))?;
        Ok(LoadedSource {
            key: module.to_string(),
            name: module.to_string(),
            origin: PathBuf::from("/"),
            source,
        })
    }
}

fn run_with(host: &mut MapHost, src: &str) -> Result<Rc<ModuleEnv>, ExecError> {
    let mut interp = Interpreter::new(host, Limits::default());
    interp.exec_module("main", "main.star", Path::new("/"), src)
}

fn global(src: &str, name: &str) -> Value {
    let mut host = MapHost::default();
    let env = run_with(&mut host, src).unwrap_or_else(|e| panic!("{}", e));
    env.get(name).unwrap_or_else(|| panic!("{} not defined", name))
}

fn error(src: &str) -> String {
    let mut host = MapHost::default();
    match run_with(&mut host, src) {
        Ok(_) => panic!("expected an error"),
        Err(ExecError::Eval(e)) => e.located(),
        Err(e) => e.to_string(),
    }
}

#[test]
fn test_arithmetic_and_strings() {
    assert_eq!(global("x = 1 + 2 * 3", "x"), Value::Int(7));
    assert_eq!(global("x = 7 // 2 + 7 % 3", "x"), Value::Int(4));
    assert_eq!(global("x = '1' + '2'", "x"), Value::str("12"));
    assert_eq!(global("x = 'ab' * 3", "x"), Value::str("ababab"));
    assert_eq!(global("x = 1 / 4", "x"), Value::Float(0.25));
}

#[test]
fn test_float_str() {
    assert_eq!(global("x = str(1e21)", "x"), Value::str("1e+21"));
    assert_eq!(global("x = str(1e20)", "x"), Value::str("100000000000000000000.0"));
    assert_eq!(global("x = str(1 / 8000000)", "x"), Value::str("1.25e-07"));
}

#[test]
fn test_functions_defaults_and_kwargs() {
    let src = r#"
def f(a, b = 10, *rest, **kw):
    return [a, b, rest, kw]

x = f(1)
y = f(1, 2, 3, 4, z = 5)
z = f(b = 3, a = 4)
"#;
    insta::assert_snapshot!(global(src, "x").repr(), @"[1, 10, (), {}]");
    insta::assert_snapshot!(global(src, "y").repr(), @r#"[1, 2, (3, 4), {"z": 5}]"#);
    insta::assert_snapshot!(global(src, "z").repr(), @"[4, 3, (), {}]");
}

#[test]
fn test_call_argument_errors() {
    let src = "def f(a):\n    return a\nf(1, 2)\n";
    assert!(error(src).contains("accepts at most 1 positional arguments"));
    assert!(error("def f(a):\n    return a\nf()\n").contains("missing argument for a"));
    assert!(error("def f(a):\n    return a\nf(b = 1)\n").contains("unexpected keyword argument b"));
    assert!(error("def f(a):\n    return a\nf(1, a = 1)\n").contains("multiple values"));
}

#[test]
fn test_control_flow() {
    let src = r#"
def classify(n):
    if n < 0:
        return "neg"
    elif n == 0:
        return "zero"
    else:
        return "pos"

out = []
for i in range(-1, 5):
    if i == 3:
        continue
    if i == 4:
        break
    out.append(classify(i))
"#;
    insta::assert_snapshot!(global(src, "out").repr(), @r#"["neg", "zero", "pos", "pos"]"#);
}

#[test]
fn test_comprehensions_and_lambda() {
    let src = r#"
squares = [x * x for x in range(5) if x % 2 == 0]
pairs = {k: v for k, v in [("a", 1), ("b", 2)]}
nested = [(i, j) for i in range(2) for j in range(i)]
by_len = sorted(["ccc", "a", "bb"], key = lambda s: len(s))
"#;
    insta::assert_snapshot!(global(src, "squares").repr(), @"[0, 4, 16]");
    insta::assert_snapshot!(global(src, "pairs").repr(), @r#"{"a": 1, "b": 2}"#);
    insta::assert_snapshot!(global(src, "nested").repr(), @"[(1, 0)]");
    insta::assert_snapshot!(global(src, "by_len").repr(), @r#"["a", "bb", "ccc"]"#);
}

#[test]
fn test_comprehension_variables_do_not_leak() {
    let err = error("xs = [i for i in range(3)]\ny = i\n");
    assert_eq!(err, "main.star:2:5: undefined: i");
}

#[test]
fn test_closures_capture_enclosing_locals() {
    let src = r#"
def outer(n):
    def inner(m):
        return n + m
    return inner(1)

x = outer(41)
"#;
    assert_eq!(global(src, "x"), Value::Int(42));
}

#[test]
fn test_local_before_assignment() {
    let src = "g = 1\ndef f():\n    y = g\n    g = 2\n    return y\nf()\n";
    assert!(error(src).contains("local variable g referenced before assignment"));
}

#[test]
fn test_recursion_is_rejected() {
    let src = "def f(n):\n    return f(n - 1) if n else 0\nf(3)\n";
    assert!(error(src).contains("function f called recursively"));
}

#[test]
fn test_step_limit() {
    let mut host = MapHost::default();
    let limits = Limits {
        max_call_depth: 64,
        max_steps: 50,
    };
    let mut interp = Interpreter::new(&mut host, limits);
    let err = interp
        .exec_module("main", "main.star", Path::new("/"), "for i in range(100):\n    pass\n")
        .unwrap_err();
    assert!(err.to_string().contains("evaluation exceeded 50 steps"));
}

#[test]
fn test_call_depth_limit() {
    let limits = Limits {
        max_call_depth: 3,
        max_steps: 1_000_000,
    };
    let defs = "def d():\n    return 4\ndef c():\n    return d()\ndef b():\n    return c()\ndef a():\n    return b()\n";

    let mut host = MapHost::default();
    let mut interp = Interpreter::new(&mut host, limits);
    let env = interp
        .exec_module("main", "main.star", Path::new("/"), &format!("{}x = b()\n", defs))
        .unwrap();
    assert_eq!(env.get("x"), Some(Value::Int(4)));

    let mut host = MapHost::default();
    let mut interp = Interpreter::new(&mut host, limits);
    let err = interp
        .exec_module("main", "main.star", Path::new("/"), &format!("{}x = a()\n", defs))
        .unwrap_err();
    assert!(err.to_string().contains("call stack exceeds 3 frames"), "{}", err);
}

#[test]
fn test_ordering_a_list_that_contains_itself_fails() {
    let err = error("l = [1]\nl.append(l)\nx = l < l\n");
    assert!(err.contains("comparison nested too deeply"), "{}", err);
    let err = error("l = [1]\nl.append(l)\nx = sorted([l, l])\n");
    assert!(err.contains("comparison nested too deeply"), "{}", err);
}

#[test]
fn test_huge_repetition_fails() {
    let err = error("x = len('a' * 1000000000000)\n");
    assert!(err.contains("repetition result too large"), "{}", err);
    let err = error("x = [1] * 1000000000000\n");
    assert!(err.contains("repetition result too large"), "{}", err);
}

#[test]
fn test_module_globals_are_frozen() {
    let mut host = MapHost::default();
    let mut interp = Interpreter::new(&mut host, Limits::default());
    let env = interp
        .exec_module("main", "main.star", Path::new("/"), "xs = [1]\ndef add(v):\n    xs.append(v)\n")
        .unwrap();
    let add = env.get("add").unwrap();
    let err = interp.call(&add, vec![Value::Int(2)], Vec::new()).unwrap_err();
    assert_eq!(err.message, attrscript_core::errors::FROZEN_MUTATION_MSG);
}

#[test]
fn test_augmented_assignment() {
    let src = "x = 1\nx += 2\nxs = [1]\nxs += [2]\nd = {'a': 1}\nd['a'] *= 5\n";
    assert_eq!(global(src, "x"), Value::Int(3));
    insta::assert_snapshot!(global(src, "xs").repr(), @"[1, 2]");
    insta::assert_snapshot!(global(src, "d").repr(), @r#"{"a": 5}"#);
}

#[test]
fn test_tuple_unpacking() {
    assert_eq!(global("a, b = 1, 2\nc = a - b", "c"), Value::Int(-1));
    assert!(error("a, b = [1, 2, 3]").contains("too many values to unpack"));
    assert!(error("a, b = [1]").contains("too few values to unpack"));
}

#[test]
fn test_load_binds_symbols_and_caches() {
    let mut host = MapHost::default();
    host.files.insert("lib.star".into(), "def double(x):\n    return x * 2\nconst = 21\n".into());
    let env = run_with(
        &mut host,
        "load('lib.star', 'const', twice = 'double')\nload('lib.star', 'const')\nx = twice(const)\n",
    )
    .unwrap();
    assert_eq!(env.get("x"), Some(Value::Int(42)));
}

#[test]
fn test_load_cycle_and_missing_symbol() {
    let mut host = MapHost::default();
    host.files.insert("a.star".into(), "load('b.star', 'y')\nx = 1\n".into());
    host.files.insert("b.star".into(), "load('a.star', 'x')\ny = 1\n".into());
    let err = run_with(&mut host, "load('a.star', 'x')\n").unwrap_err();
    assert!(err.to_string().contains("cycle in dependency graph when loading a.star"));

    let mut host = MapHost::default();
    host.files.insert("lib.star".into(), "x = 1\n".into());
    let err = run_with(&mut host, "load('lib.star', 'nope')\n").unwrap_err();
    assert!(err.to_string().contains("load: name nope not found in module lib.star"));
}

#[test]
fn test_host_functions() {
    let mut host = MapHost::default();
    {
        let mut interp = Interpreter::new(&mut host, Limits::default());
        interp.predeclare_host_fn("run");
        let env = interp
            .exec_module("main", "main.star", Path::new("/"), "x = run('echo', 1)\n")
            .unwrap();
        assert_eq!(env.get("x"), Some(Value::str(r#"run("echo", 1)"#)));
    }
    assert_eq!(host.calls, vec!["run".to_string()]);
}

#[test]
fn test_error_carries_call_stack() {
    let mut host = MapHost::default();
    let err = match run_with(&mut host, "def f():\n    return 1 // 0\n\nf()\n") {
        Err(ExecError::Eval(e)) => e,
        other => panic!("unexpected {:?}", other.map(|_| ())),
    };
    assert_eq!(err.located(), "main.star:2:12: division by zero");
    assert_eq!(err.notes, vec!["in f, called at main.star:4:1".to_string()]);
}

#[test]
fn test_syntax_errors_are_reported() {
    let mut host = MapHost::default();
    let err = run_with(&mut host, "def f(:\n").unwrap_err();
    assert!(matches!(err, ExecError::Syntax { .. }));
    assert!(!err.to_reports().is_empty());
}

#[test]
fn test_string_format_and_methods() {
    let src = r#"x = "{}: name={name}".format("attr", name = "amd64").upper()"#;
    assert_eq!(global(src, "x"), Value::str("ATTR: NAME=AMD64"));
}

#[test]
fn test_dict_literal_rejects_duplicates() {
    assert!(error("d = {'a': 1, 'a': 2}").contains("duplicate key"));
}

#[test]
fn test_return_outside_function() {
    assert!(error("return 1").contains("return statement outside function"));
}
