//! Define shared string and sequence semantics (policy + pure helpers).
//!
//! This module holds **pure/deterministic** helpers the interpreter uses for string and list access so the two
//! sequence kinds behave identically.
//!
//! ## Notes
//! - **Indexing model**: Unicode scalar indexing (Rust `char`), not bytes or grapheme clusters.
//! - **Negative indices**: supported (Python-style): `s[-1]` is the last scalar.
//! - **Slicing**: Python-like `start`, `end`, `step` (default `step = 1`), with negative indices
//!   and bounds clamping.

/// Describe an index-out-of-range error message.
pub const INDEX_OUT_OF_RANGE_MSG: &str = "index out of range";
/// Describe a slice step-zero error message.
pub const SLICE_STEP_ZERO_MSG: &str = "slice step cannot be zero";

/// Represent sequence access errors produced by semantic-core helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    IndexOutOfRange,
    SliceStepZero,
}

impl AccessError {
    /// Return the canonical error message for this access error.
    pub fn message(self) -> &'static str {
        match self {
            AccessError::IndexOutOfRange => INDEX_OUT_OF_RANGE_MSG,
            AccessError::SliceStepZero => SLICE_STEP_ZERO_MSG,
        }
    }
}

/// Return the string length in Unicode scalars (Rust `char`).
pub fn str_len(s: &str) -> usize {
    s.chars().count()
}

/// Normalize an index (supports negatives). Returns `None` if out of range.
pub fn normalize_index(len: usize, idx: i64) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let len_i = len as i64;
    let mut i = idx;
    if i < 0 {
        i += len_i;
    }
    if i < 0 || i >= len_i { None } else { Some(i as usize) }
}

/// Index a string by Unicode scalar index.
///
/// ## Returns
/// - `Ok(String)`: Single-character string (one Unicode scalar).
/// - `Err(AccessError)`: If the index is out of range.
pub fn str_char_at(s: &str, idx: i64) -> Result<String, AccessError> {
    let len = str_len(s);
    let pos = normalize_index(len, idx).ok_or(AccessError::IndexOutOfRange)?;
    s.chars()
        .nth(pos)
        .map(|ch| ch.to_string())
        .ok_or(AccessError::IndexOutOfRange)
}

/// Compute the element positions selected by a Python-like slice over a sequence of `len` items.
///
/// ## Parameters
/// - `len`: Sequence length.
/// - `start`: Optional start index (inclusive).
/// - `end`: Optional end index (exclusive).
/// - `step`: Optional step; defaults to `1`. Negative steps walk backwards.
///
/// ## Returns
/// - `Ok(Vec<usize>)`: Positions in selection order.
/// - `Err(AccessError)`: If `step == 0`.
pub fn slice_indices(
    len: usize,
    start: Option<i64>,
    end: Option<i64>,
    step: Option<i64>,
) -> Result<Vec<usize>, AccessError> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(AccessError::SliceStepZero);
    }

    let len = len as i64;
    let default_start = if step > 0 { 0 } else { len - 1 };
    let default_end = if step > 0 { len } else { -1 };

    let mut start_idx = start.unwrap_or(default_start);
    let mut end_idx = end.unwrap_or(default_end);

    if start.is_some() && start_idx < 0 {
        start_idx += len;
    }
    if end.is_some() && end_idx < 0 {
        end_idx += len;
    }

    if step > 0 {
        start_idx = start_idx.clamp(0, len);
        end_idx = end_idx.clamp(0, len);
    } else {
        start_idx = start_idx.clamp(-1, len - 1);
        end_idx = end_idx.clamp(-1, len - 1);
    }

    let mut out = Vec::new();
    let mut i = start_idx;
    if step > 0 {
        while i < end_idx {
            out.push(i as usize);
            i += step;
        }
    } else {
        while i > end_idx {
            out.push(i as usize);
            i += step;
        }
    }
    Ok(out)
}

/// Slice a string over Unicode scalars (Python-like semantics).
pub fn str_slice(s: &str, start: Option<i64>, end: Option<i64>, step: Option<i64>) -> Result<String, AccessError> {
    let chars: Vec<char> = s.chars().collect();
    let picked = slice_indices(chars.len(), start, end, step)?;
    Ok(picked.into_iter().filter_map(|i| chars.get(i)).collect())
}

/// Split a string the way Starlark's `str.split` does.
///
/// ## Parameters
/// - `s`: Input string.
/// - `sep`: Separator; `None` splits on runs of whitespace and drops empty fields.
/// - `maxsplit`: Maximum number of splits; negative means unlimited.
pub fn str_split(s: &str, sep: Option<&str>, maxsplit: i64) -> Vec<String> {
    match sep {
        Some(sep) => {
            if maxsplit < 0 {
                s.split(sep).map(str::to_string).collect()
            } else {
                s.splitn(maxsplit as usize + 1, sep).map(str::to_string).collect()
            }
        }
        None => {
            let mut out = Vec::new();
            let mut rest = s.trim_start();
            while !rest.is_empty() {
                if maxsplit >= 0 && out.len() as i64 == maxsplit {
                    out.push(rest.to_string());
                    break;
                }
                let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
                out.push(rest[..end].to_string());
                rest = rest[end..].trim_start();
            }
            out
        }
    }
}

/// Split a string from the right (Starlark `str.rsplit`).
pub fn str_rsplit(s: &str, sep: Option<&str>, maxsplit: i64) -> Vec<String> {
    match sep {
        Some(sep) => {
            let mut parts: Vec<String> = if maxsplit < 0 {
                s.rsplit(sep).map(str::to_string).collect()
            } else {
                s.rsplitn(maxsplit as usize + 1, sep).map(str::to_string).collect()
            };
            parts.reverse();
            parts
        }
        None if maxsplit < 0 => str_split(s, None, -1),
        None => {
            let mut out = Vec::new();
            let mut rest = s.trim_end();
            while !rest.is_empty() {
                if out.len() as i64 == maxsplit {
                    out.push(rest.to_string());
                    break;
                }
                let start = rest.rfind(char::is_whitespace).map(|i| i + 1).unwrap_or(0);
                out.push(rest[start..].to_string());
                rest = rest[..start].trim_end();
            }
            out.reverse();
            out
        }
    }
}

/// Strip characters from both ends; `None` strips whitespace.
pub fn str_strip(s: &str, chars: Option<&str>) -> String {
    match chars {
        Some(set) => s.trim_matches(|c| set.contains(c)).to_string(),
        None => s.trim().to_string(),
    }
}

/// Strip characters from the start; `None` strips whitespace.
pub fn str_lstrip(s: &str, chars: Option<&str>) -> String {
    match chars {
        Some(set) => s.trim_start_matches(|c| set.contains(c)).to_string(),
        None => s.trim_start().to_string(),
    }
}

/// Strip characters from the end; `None` strips whitespace.
pub fn str_rstrip(s: &str, chars: Option<&str>) -> String {
    match chars {
        Some(set) => s.trim_end_matches(|c| set.contains(c)).to_string(),
        None => s.trim_end().to_string(),
    }
}

/// Find the scalar index of `needle` in `haystack` (`-1` when missing).
pub fn str_find(haystack: &str, needle: &str) -> i64 {
    haystack
        .find(needle)
        .map(|byte| haystack[..byte].chars().count() as i64)
        .unwrap_or(-1)
}

/// Find the scalar index of the last `needle` in `haystack` (`-1` when missing).
pub fn str_rfind(haystack: &str, needle: &str) -> i64 {
    haystack
        .rfind(needle)
        .map(|byte| haystack[..byte].chars().count() as i64)
        .unwrap_or(-1)
}

/// Title-case a string: the first letter of every word upper-cased, the rest lower-cased.
pub fn str_title(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

/// Quote a string the way Starlark's `repr` does (double quotes, escapes).
pub fn str_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
