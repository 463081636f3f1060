//! `str.format`.

use super::EvalError;
use super::value::Value;

/// Expand `{}`/`{0}`/`{name}` fields. `{{` and `}}` are literal braces, and a `!r` or `!s` suffix picks `repr` or
/// `str` for the field.
pub(crate) fn format_str(template: &str, args: &[Value], named: &[(String, Value)]) -> Result<String, EvalError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut auto_index = 0usize;
    let mut numbering: Option<bool> = None;

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(EvalError::new("format: single '}' in format string")),
            '{' => {
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') => return Err(EvalError::new("format: nested replacement fields are not supported")),
                        Some(ch) => field.push(ch),
                        None => return Err(EvalError::new("format: unmatched '{' in format string")),
                    }
                }
                let (name, conversion) = match field.split_once('!') {
                    Some((name, conv)) => (name, Some(conv)),
                    None => (field.as_str(), None),
                };
                if name.contains(':') {
                    return Err(EvalError::new("format: format specs are not supported"));
                }

                let value = if name.is_empty() {
                    if numbering == Some(true) {
                        return Err(EvalError::new(
                            "format: cannot switch from manual field numbering to automatic",
                        ));
                    }
                    numbering = Some(false);
                    let v = args
                        .get(auto_index)
                        .ok_or_else(|| EvalError::new(format!("format: tuple index out of range: {}", auto_index)))?;
                    auto_index += 1;
                    v
                } else if let Ok(index) = name.parse::<usize>() {
                    if numbering == Some(false) {
                        return Err(EvalError::new(
                            "format: cannot switch from automatic field numbering to manual",
                        ));
                    }
                    numbering = Some(true);
                    args.get(index)
                        .ok_or_else(|| EvalError::new(format!("format: tuple index out of range: {}", index)))?
                } else {
                    named
                        .iter()
                        .find(|(k, _)| k == name)
                        .map(|(_, v)| v)
                        .ok_or_else(|| EvalError::new(format!("format: keyword {} not found", name)))?
                };

                match conversion {
                    None | Some("s") => out.push_str(&value.to_str()),
                    Some("r") => out.push_str(&value.repr()),
                    Some(other) => {
                        return Err(EvalError::new(format!("format: unknown conversion {:?}", other)));
                    }
                }
            }
            c => out.push(c),
        }
    }
    Ok(out)
}
