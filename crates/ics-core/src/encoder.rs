//! iCalendar encoder: renders a [`Component`] tree as an RFC 5545 payload.
//!
//! Output is deterministic: properties and children are written in the order they
//! were pushed, every line ends with CRLF, and lines longer than 75 octets are
//! folded with a single leading space. Folding never splits a UTF-8 code point.

use crate::error::{IcsError, Result};
use crate::types::{Component, Property};

/// Maximum octets per physical line, excluding the CRLF.
pub const MAX_LINE_OCTETS: usize = 75;

/// Encode a component (normally a `VCALENDAR`) and everything nested in it.
///
/// # Errors
/// Returns `IcsError::Encode` if a component or property name is empty.
pub fn encode(component: &Component) -> Result<String> {
    let mut out = String::new();
    encode_component(component, &mut out)?;
    Ok(out)
}

fn encode_component(component: &Component, out: &mut String) -> Result<()> {
    if component.name.is_empty() {
        return Err(IcsError::Encode("component without a name".to_string()));
    }
    push_folded(&format!("BEGIN:{}", component.name), out);
    for property in &component.properties {
        push_folded(&content_line(property)?, out);
    }
    for child in &component.components {
        encode_component(child, out)?;
    }
    push_folded(&format!("END:{}", component.name), out);
    Ok(())
}

fn content_line(property: &Property) -> Result<String> {
    if property.name.is_empty() {
        return Err(IcsError::Encode("property without a name".to_string()));
    }
    let mut line = property.name.clone();
    for (key, value) in &property.params {
        line.push(';');
        line.push_str(key);
        line.push('=');
        if value.contains([':', ';', ',']) {
            line.push('"');
            line.push_str(value);
            line.push('"');
        } else {
            line.push_str(value);
        }
    }
    line.push(':');
    line.push_str(&property.value);
    Ok(line)
}

/// Append `line` to `out`, folded at [`MAX_LINE_OCTETS`] and terminated by CRLF.
fn push_folded(line: &str, out: &mut String) {
    let mut budget = MAX_LINE_OCTETS;
    let mut used = 0;
    for ch in line.chars() {
        let len = ch.len_utf8();
        if used + len > budget {
            out.push_str("\r\n ");
            // Continuation lines spend one octet on the leading space.
            budget = MAX_LINE_OCTETS - 1;
            used = 0;
        }
        out.push(ch);
        used += len;
    }
    out.push_str("\r\n");
}

/// Apply RFC 5545 TEXT escaping. Carriage returns are dropped.
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}
