//! Response Repair & Parser: coerces raw model text into JSON.
//!
//! Strategy: parse the trimmed text directly; on failure run `repair` once and
//! parse again; on a second failure give up with an excerpt of the raw text.
//! Each repair rule is a standalone pure function applied in a fixed order.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Characters of raw output kept for diagnostics.
pub const EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Completion output is not valid JSON even after repair")]
pub struct MalformedResponse {
    pub excerpt: String,
}

pub fn parse_completion(raw: &str) -> Result<Value, MalformedResponse> {
    let trimmed = raw.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let repaired = repair(trimmed);
    debug!("Direct parse failed, retrying with repaired text: {repaired}");

    serde_json::from_str::<Value>(&repaired).map_err(|e| {
        debug!("Repaired text still unparseable: {e}");
        MalformedResponse {
            excerpt: excerpt(raw),
        }
    })
}

/// Applies every repair rule once, in order.
pub fn repair(text: &str) -> String {
    let text = strip_code_fences(text);
    let text = extract_json_span(&text);
    let text = quote_bare_keys(text);
    let text = single_to_double_quotes(&text);
    let text = remove_trailing_commas(&text);
    collapse_newlines(&text).trim().to_string()
}

/// First `EXCERPT_CHARS` characters, never splitting a code point.
pub fn excerpt(raw: &str) -> String {
    raw.trim().chars().take(EXCERPT_CHARS).collect()
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\n?```(?:json)?\n?").expect("valid regex"))
}

fn newline_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\r\n|\r|\n").expect("valid regex"))
}

/// a. Removes markdown code-fence markers.
pub fn strip_code_fences(text: &str) -> String {
    fence_re().replace_all(text, "").into_owned()
}

/// b. Drops everything before the first `{`/`[` and after the last `}`/`]`.
/// Text with no opening bracket yields an empty string.
pub fn extract_json_span(text: &str) -> &str {
    let Some(start) = text.find(|c: char| c == '{' || c == '[') else {
        return "";
    };
    match text.rfind(|c: char| c == '}' || c == ']') {
        Some(end) if end >= start => &text[start..=end],
        _ => &text[start..],
    }
}

/// c. Quotes bare object keys (`word:` becomes `"word":`).
///
/// A key that directly follows a value without a separating comma gets one
/// inserted, so `{a: 1 b: 2}` becomes `{"a": 1 ,"b": 2}`. String literals
/// (either quote style) are copied verbatim.
pub fn quote_bare_keys(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut last: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '"' || c == '\'' {
            let end = string_end(&chars, i);
            if next_non_whitespace(&chars, end + 1) == Some(':') && ends_value(last) {
                out.push(',');
            }
            out.extend(&chars[i..=end]);
            last = Some(c);
            i = end + 1;
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            if next_non_whitespace(&chars, i) == Some(':') {
                if ends_value(last) {
                    out.push(',');
                }
                out.push('"');
                out.push_str(&word);
                out.push('"');
            } else {
                out.push_str(&word);
            }
            last = word.chars().last();
            continue;
        }

        out.push(c);
        if !c.is_whitespace() {
            last = Some(c);
        }
        i += 1;
    }

    out
}

/// d. Rewrites single-quoted strings as double-quoted ones.
///
/// Apostrophes inside double-quoted strings are left alone; double quotes
/// inside single-quoted strings are escaped.
pub fn single_to_double_quotes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '"' => {
                let end = string_end(&chars, i);
                out.extend(&chars[i..=end]);
                i = end + 1;
            }
            '\'' => {
                let end = string_end(&chars, i);
                let inner_end = if end > i && chars[end] == '\'' { end } else { end + 1 };
                out.push('"');
                let mut j = i + 1;
                while j < inner_end {
                    match chars[j] {
                        '\\' if chars.get(j + 1) == Some(&'\'') => {
                            out.push('\'');
                            j += 2;
                            continue;
                        }
                        '\\' => {
                            out.push('\\');
                            if let Some(&escaped) = chars.get(j + 1) {
                                out.push(escaped);
                            }
                            j += 2;
                            continue;
                        }
                        '"' => out.push_str("\\\""),
                        other => out.push(other),
                    }
                    j += 1;
                }
                out.push('"');
                i = end + 1;
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }

    out
}

/// e. Removes commas directly before a closing `}` or `]`.
pub fn remove_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '"' => {
                let end = string_end(&chars, i);
                out.extend(&chars[i..=end]);
                i = end + 1;
            }
            ',' if matches!(next_non_whitespace(&chars, i + 1), Some('}') | Some(']')) => {
                i += 1;
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }

    out
}

/// f. Collapses embedded newlines to spaces.
pub fn collapse_newlines(text: &str) -> String {
    newline_re().replace_all(text, " ").into_owned()
}

/// Index of the quote closing the string literal opened at `start`, honoring
/// backslash escapes. An unterminated literal runs to the last character.
fn string_end(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => return i,
            _ => i += 1,
        }
    }
    chars.len() - 1
}

fn next_non_whitespace(chars: &[char], from: usize) -> Option<char> {
    chars.iter().skip(from).copied().find(|c| !c.is_whitespace())
}

/// True when `last` can terminate a JSON value.
fn ends_value(last: Option<char>) -> bool {
    matches!(last, Some(c) if c == '"' || c == '\'' || c == '}' || c == ']' || c.is_alphanumeric())
}
