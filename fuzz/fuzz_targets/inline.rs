#![no_main]

use attrscript::computed::script_from_inline;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(code) = std::str::from_utf8(data) else {
        return;
    };
    // A wrapped snippet must always be a single `def` the parser can at least tokenize.
    if let Ok(script) = script_from_inline(code) {
        assert!(script.starts_with("def inline_fn(attr, t):\n"));
        let _ = attrscript_syntax::parse_source(&script);
    }
});
