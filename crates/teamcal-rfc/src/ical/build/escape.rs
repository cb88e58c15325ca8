//! Escaping for TEXT values and parameter values.

use crate::ical::core::Parameter;

/// Escapes a TEXT value (RFC 5545 §3.3.11). CR characters are dropped.
#[must_use]
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ',' => out.push_str("\\,"),
            ';' => out.push_str("\\;"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Quotes a parameter value when it contains `:`, `;`, `,`, `"`, `^` or a
/// newline, applying RFC 6868 caret encoding inside the quotes.
#[must_use]
pub fn escape_param_value(s: &str) -> String {
    if !s.chars().any(|c| matches!(c, ':' | ';' | ',' | '"' | '^' | '\n')) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 4);
    out.push('"');
    for c in s.chars() {
        match c {
            '^' => out.push_str("^^"),
            '\n' => out.push_str("^n"),
            '"' => out.push_str("^'"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Renders parameters as `NAME=value;NAME=v1,v2` (no leading semicolon).
#[must_use]
pub fn format_parameters(params: &[Parameter]) -> String {
    params
        .iter()
        .map(|param| {
            let values = param
                .values
                .iter()
                .map(|v| escape_param_value(v))
                .collect::<Vec<_>>()
                .join(",");
            format!("{}={values}", param.name)
        })
        .collect::<Vec<_>>()
        .join(";")
}
