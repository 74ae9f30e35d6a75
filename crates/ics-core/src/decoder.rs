//! iCalendar decoder: turns an RFC 5545 payload into a [`Component`] tree.
//!
//! Decoding happens in two passes:
//!
//! 1. **Unfolding**: physical lines starting with a space or tab continue the
//!    previous logical line. Both CRLF and bare LF line endings are accepted, since
//!    booking platforms are not consistent about it.
//! 2. **Structuring**: each logical line is split into name, parameters and value,
//!    and `BEGIN`/`END` lines drive a component stack.
//!
//! # Key design decisions
//!
//! - **Lenient lines, strict nesting**: a content line that cannot be split is
//!   reported as a [`Diagnostic`] and skipped. Broken `BEGIN`/`END` nesting or a
//!   payload without any `VCALENDAR` is a hard [`IcsError::Parse`].
//! - **Raw values**: property values are kept escaped; unescaping is only correct
//!   for TEXT values, so callers opt in through [`crate::Property::text`].

use crate::error::{IcsError, Result};
use crate::types::{Component, Property};

/// A recoverable problem found while decoding (the offending line was skipped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based physical line number where the logical line started.
    pub line: usize,
    pub message: String,
}

/// Decoder output: every top-level `VCALENDAR` plus the skipped-line report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Decoded {
    pub calendars: Vec<Component>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Decode a payload into its `VCALENDAR` components, discarding diagnostics.
pub fn decode(input: &str) -> Result<Vec<Component>> {
    decode_with_diagnostics(input).map(|d| d.calendars)
}

/// Decode raw bytes. Invalid UTF-8 sequences are replaced rather than rejected.
pub fn decode_bytes(bytes: &[u8]) -> Result<Decoded> {
    decode_with_diagnostics(&String::from_utf8_lossy(bytes))
}

/// Decode a payload, reporting skipped content lines as [`Diagnostic`]s.
///
/// # Errors
/// Returns `IcsError::Parse` if `BEGIN`/`END` lines do not nest, a component is
/// left open at end of input, or no `VCALENDAR` container is present.
pub fn decode_with_diagnostics(input: &str) -> Result<Decoded> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let lines = unfold(input);

    let mut out = Decoded::default();
    let mut stack: Vec<Component> = Vec::new();
    let mut last_line = 0;

    for (line_no, line) in lines {
        last_line = line_no;
        let property = match parse_content_line(&line) {
            Some(p) => p,
            None => {
                out.diagnostics.push(Diagnostic {
                    line: line_no,
                    message: format!("malformed content line: {}", truncate(&line, 60)),
                });
                continue;
            }
        };

        match property.name.as_str() {
            "BEGIN" => stack.push(Component::new(property.value.trim())),
            "END" => {
                let name = property.value.trim().to_ascii_uppercase();
                let Some(done) = stack.pop() else {
                    return Err(IcsError::Parse {
                        line: line_no,
                        message: format!("END:{} without matching BEGIN", name),
                    });
                };
                if done.name != name {
                    return Err(IcsError::Parse {
                        line: line_no,
                        message: format!("END:{} closes BEGIN:{}", name, done.name),
                    });
                }
                match stack.last_mut() {
                    Some(parent) => parent.push_component(done),
                    None if done.name == "VCALENDAR" => out.calendars.push(done),
                    None => out.diagnostics.push(Diagnostic {
                        line: line_no,
                        message: format!("top-level {} outside VCALENDAR ignored", done.name),
                    }),
                }
            }
            _ => match stack.last_mut() {
                Some(current) => current.push(property),
                None => out.diagnostics.push(Diagnostic {
                    line: line_no,
                    message: format!("property {} outside any component ignored", property.name),
                }),
            },
        }
    }

    if let Some(open) = stack.last() {
        return Err(IcsError::Parse {
            line: last_line,
            message: format!("unterminated BEGIN:{}", open.name),
        });
    }
    if out.calendars.is_empty() {
        return Err(IcsError::Parse {
            line: last_line,
            message: "no VCALENDAR container found".to_string(),
        });
    }

    Ok(out)
}

/// Join folded physical lines. Returns `(first physical line number, logical line)`.
fn unfold(input: &str) -> Vec<(usize, String)> {
    let mut logical: Vec<(usize, String)> = Vec::new();
    for (idx, raw) in input.split('\n').enumerate() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if raw.starts_with(' ') || raw.starts_with('\t') {
            if let Some((_, last)) = logical.last_mut() {
                last.push_str(&raw[1..]);
                continue;
            }
        }
        if raw.trim().is_empty() {
            continue;
        }
        logical.push((idx + 1, raw.to_string()));
    }
    logical
}

/// Split `NAME;P1=V1;P2="a;b":value` into a [`Property`].
///
/// Returns `None` when there is no unquoted `:` or the name/parameters are malformed.
fn parse_content_line(line: &str) -> Option<Property> {
    let mut in_quotes = false;
    let mut colon = None;
    for (i, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ':' if !in_quotes => {
                colon = Some(i);
                break;
            }
            _ => {}
        }
    }
    let colon = colon?;
    let head = &line[..colon];
    let value = &line[colon + 1..];

    let mut parts = split_unquoted(head, ';').into_iter();
    let name = parts.next()?.trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return None;
    }

    let mut params = Vec::new();
    for part in parts {
        let (key, val) = part.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        params.push((key.to_ascii_uppercase(), val.trim().trim_matches('"').to_string()));
    }

    Some(Property {
        name: name.to_ascii_uppercase(),
        params,
        value: value.to_string(),
    })
}

fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        if ch == '"' {
            in_quotes = !in_quotes;
        } else if ch == sep && !in_quotes {
            parts.push(&s[start..i]);
            start = i + ch.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Resolve RFC 5545 TEXT escapes. Unknown escapes are kept verbatim.
pub fn unescape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(',') => out.push(','),
            Some(';') => out.push(';'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
