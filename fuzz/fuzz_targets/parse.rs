#![no_main]

use attrscript_syntax::{lexer, parser};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    // Lexer errors are fine; panics are not.
    if let Ok(tokens) = lexer::lex(source) {
        let _ = parser::parse(&tokens);
    }
});
