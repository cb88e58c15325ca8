//! Content line lexer (RFC 5545 §3.1).

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::ical::core::Parameter;

/// One unfolded `name *(";" param) ":" value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    /// Uppercased property name.
    pub name: String,
    pub params: Vec<Parameter>,
    /// Parameter text exactly as written, without the leading `;`.
    pub raw_params: String,
    /// Raw value text after the first unquoted colon.
    pub value: String,
}

impl ContentLine {
    #[must_use]
    pub fn param_value(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .and_then(Parameter::value)
    }
}

/// ## Summary
/// Splits input into unfolded content lines tagged with their 1-based
/// starting line number.
///
/// Accepts CRLF and bare LF. A line starting with SPACE or HTAB continues
/// the previous one (the whitespace character is dropped). Blank lines are
/// skipped, and a line without any colon is treated as a continuation of a
/// badly folded predecessor.
#[must_use]
pub fn split_lines(input: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();

    for (index, raw) in input.split('\n').enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if line.is_empty() {
            continue;
        }

        let continuation = line
            .strip_prefix(' ')
            .or_else(|| line.strip_prefix('\t'))
            .or_else(|| (!line.contains(':')).then_some(line));

        match (continuation, lines.last_mut()) {
            (Some(rest), Some((_, previous))) => previous.push_str(rest),
            _ => lines.push((index + 1, line.to_string())),
        }
    }

    lines
}

struct Cursor<'a> {
    chars: Vec<char>,
    pos: usize,
    line_num: usize,
    source: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str, line_num: usize) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line_num,
            source,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.line_num, self.pos + 1)
    }

    /// Consumes `[A-Za-z0-9-]+` and returns it uppercased.
    fn take_name(&mut self, kind: ParseErrorKind) -> ParseResult<String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '-' {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(self.error(kind));
        }
        Ok(self.chars[start..self.pos]
            .iter()
            .collect::<String>()
            .to_ascii_uppercase())
    }

    fn rest(&self) -> String {
        self.chars[self.pos..].iter().collect()
    }
}

/// ## Summary
/// Tokenizes a single unfolded content line.
///
/// ## Errors
/// Returns an error if the name is missing or malformed, a parameter is
/// malformed, a quoted parameter value is unterminated, or no colon
/// separates the value.
pub fn parse_content_line(line: &str, line_num: usize) -> ParseResult<ContentLine> {
    let mut cursor = Cursor::new(line, line_num);

    let name = match cursor.peek() {
        Some(c) if c.is_ascii_alphanumeric() => {
            cursor.take_name(ParseErrorKind::InvalidPropertyName)?
        }
        Some(':' | ';') | None => {
            return Err(cursor.error(ParseErrorKind::MissingPropertyName));
        }
        Some(_) => return Err(cursor.error(ParseErrorKind::InvalidPropertyName)),
    };

    let params_start = cursor.pos;
    let params = parse_params(&mut cursor)?;
    let raw_params = cursor.chars[params_start..cursor.pos]
        .iter()
        .skip(1)
        .collect();
    match cursor.bump() {
        Some(':') => {}
        Some(_) => return Err(cursor.error(ParseErrorKind::InvalidPropertyName)),
        None => return Err(cursor.error(ParseErrorKind::MissingColon)),
    }

    Ok(ContentLine {
        name,
        params,
        raw_params,
        value: cursor.rest(),
    })
}

/// ## Summary
/// Parses a bare parameter list such as `CN="Alice Balder, Example Inc.";ROLE=CHAIR`.
///
/// ## Errors
/// Returns an error if any parameter is malformed.
pub fn parse_parameter_list(input: &str) -> ParseResult<Vec<Parameter>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(Vec::new());
    }
    let prefixed = format!(";{input}:");
    let mut cursor = Cursor::new(&prefixed, 1);
    let params = parse_params(&mut cursor)?;
    if cursor.pos + 1 != cursor.chars.len() {
        return Err(cursor
            .error(ParseErrorKind::InvalidParameter)
            .with_context(cursor.source.to_string()));
    }
    Ok(params)
}

/// Parses `*(";" name "=" value *("," value))`, stopping before the colon.
fn parse_params(cursor: &mut Cursor<'_>) -> ParseResult<Vec<Parameter>> {
    let mut params = Vec::new();
    while cursor.peek() == Some(';') {
        cursor.bump();
        let name = cursor.take_name(ParseErrorKind::InvalidParameter)?;
        if cursor.bump() != Some('=') {
            return Err(cursor
                .error(ParseErrorKind::InvalidParameter)
                .with_context(format!("parameter {name} has no value")));
        }

        let mut values = vec![parse_param_value(cursor)?];
        while cursor.peek() == Some(',') {
            cursor.bump();
            values.push(parse_param_value(cursor)?);
        }
        params.push(Parameter::with_values(name, values));
    }
    Ok(params)
}

fn parse_param_value(cursor: &mut Cursor<'_>) -> ParseResult<String> {
    let mut value = String::new();

    if cursor.peek() == Some('"') {
        cursor.bump();
        loop {
            match cursor.bump() {
                Some('"') => return Ok(value),
                Some('^') => push_caret_escape(cursor, &mut value),
                Some(c) => value.push(c),
                None => return Err(cursor.error(ParseErrorKind::UnclosedQuote)),
            }
        }
    }

    while let Some(c) = cursor.peek() {
        match c {
            ';' | ':' | ',' => break,
            '"' => return Err(cursor.error(ParseErrorKind::InvalidParameter)),
            '^' => {
                cursor.bump();
                push_caret_escape(cursor, &mut value);
            }
            _ => {
                cursor.bump();
                value.push(c);
            }
        }
    }
    Ok(value)
}

/// RFC 6868: `^^` → `^`, `^n` → newline, `^'` → `"`; anything else is literal.
fn push_caret_escape(cursor: &mut Cursor<'_>, value: &mut String) {
    match cursor.peek() {
        Some('^') => {
            cursor.bump();
            value.push('^');
        }
        Some('n' | 'N') => {
            cursor.bump();
            value.push('\n');
        }
        Some('\'') => {
            cursor.bump();
            value.push('"');
        }
        _ => value.push('^'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_lines_unfolds_and_accepts_lf() {
        let input = "BEGIN:VEVENT\nDESCRIPTION:Beschreibung\n  des Termines\r\nEND:VEVENT\n";
        let lines = split_lines(input);
        assert_eq!(
            lines,
            vec![
                (1, "BEGIN:VEVENT".to_string()),
                (2, "DESCRIPTION:Beschreibung des Termines".to_string()),
                (4, "END:VEVENT".to_string()),
            ]
        );
    }

    #[test]
    fn quoted_param_keeps_separators() {
        let cl = parse_content_line(
            "ORGANIZER;CN=\"Alice Balder, Example Inc.\":MAILTO:alice@example.com",
            1,
        )
        .unwrap();
        assert_eq!(cl.name, "ORGANIZER");
        assert_eq!(cl.param_value("cn"), Some("Alice Balder, Example Inc."));
        assert_eq!(cl.value, "MAILTO:alice@example.com");
    }

    #[test]
    fn multi_valued_and_caret_params() {
        let cl = parse_content_line("ATTENDEE;MEMBER=a,b;CN=Bob ^'The^' Builder:mailto:b@x", 3)
            .unwrap();
        assert_eq!(cl.params[0].values, vec!["a", "b"]);
        assert_eq!(cl.param_value("CN"), Some("Bob \"The\" Builder"));
    }

    #[test]
    fn missing_colon_is_reported() {
        let err = parse_content_line("SUMMARY;LANGUAGE=de", 7).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingColon);
        assert_eq!(err.line, 7);
    }

    #[test]
    fn unclosed_quote_is_reported() {
        let err = parse_content_line("ORGANIZER;CN=\"Alice:MAILTO:a@x", 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnclosedQuote);
    }

    #[test]
    fn parameter_list_round() {
        let params = parse_parameter_list("CN=\"Alice Balder, Example Inc.\";ROLE=CHAIR").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[1], Parameter::role("CHAIR"));
        assert!(parse_parameter_list("").unwrap().is_empty());
        assert!(parse_parameter_list("CN").is_err());
    }
}
