//! CSS serialization helpers

use std::fmt::Write;

/// Escape a string for use as a CSS identifier (id or class name).
///
/// Follows the CSSOM `CSS.escape()` rules, so ordinary identifiers such as
/// `main-nav` pass through unchanged.
pub fn escape_ident(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    for (idx, &c) in chars.iter().enumerate() {
        let code = c as u32;
        if c == '\0' {
            out.push('\u{FFFD}');
        } else if (0x01..=0x1F).contains(&code)
            || code == 0x7F
            || (idx == 0 && c.is_ascii_digit())
            || (idx == 1 && c.is_ascii_digit() && chars[0] == '-')
        {
            let _ = write!(out, "\\{:x} ", code);
        } else if idx == 0 && c == '-' && chars.len() == 1 {
            out.push_str("\\-");
        } else if code >= 0x80 || c == '-' || c == '_' || c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

/// Escape a string for a double-quoted CSS attribute value.
pub fn escape_attr_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    for c in raw.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\a "),
            '\r' => out.push_str("\\d "),
            '\x0c' => out.push_str("\\c "),
            '\0' => out.push('\u{FFFD}'),
            other => out.push(other),
        }
    }
    out
}

/// `[name="value"]`
pub fn attribute_selector(name: &str, value: &str) -> String {
    format!("[{}=\"{}\"]", name, escape_attr_value(value))
}
