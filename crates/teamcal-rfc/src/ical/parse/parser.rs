//! iCalendar document parser (RFC 5545 §3.4).

use base64::{Engine as _, engine::general_purpose::STANDARD};

use super::error::{ParseError, ParseErrorKind, ParseResult};
use super::lexer::{ContentLine, parse_content_line, split_lines};
use super::values::{
    parse_date, parse_date_list, parse_datetime, parse_datetime_list, parse_duration,
    parse_integer, parse_rrule, unescape_text,
};
use crate::ical::core::{Component, ICalendar, Property, Value};

/// ## Summary
/// Parses an iCalendar document rooted at `BEGIN:VCALENDAR`.
///
/// Content after the closing `END:VCALENDAR` is ignored with a warning.
///
/// ## Errors
/// Returns an error if the input is empty, does not start with a
/// VCALENDAR, has unbalanced BEGIN/END lines, or contains a malformed
/// content line or value.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
pub fn parse(input: &str) -> ParseResult<ICalendar> {
    let lines = split_lines(input);
    let Some(last_line) = lines.last().map(|(n, _)| *n) else {
        return Err(ParseError::new(ParseErrorKind::EmptyInput, 1, 1));
    };

    let mut stack: Vec<Component> = Vec::new();
    let mut root: Option<Component> = None;

    for (line_num, line) in lines {
        if root.is_some() {
            tracing::warn!(line = line_num, "Ignoring content after END:VCALENDAR");
            break;
        }

        let content = parse_content_line(&line, line_num)?;

        match content.name.as_str() {
            "BEGIN" => {
                let name = content.value.trim();
                if stack.is_empty() && !name.eq_ignore_ascii_case("VCALENDAR") {
                    return Err(ParseError::new(ParseErrorKind::MissingBegin, line_num, 1)
                        .with_context(format!("found BEGIN:{name}")));
                }
                stack.push(Component::named(name));
            }
            "END" => {
                let name = content.value.trim();
                let component = stack
                    .pop()
                    .filter(|c| c.name.eq_ignore_ascii_case(name))
                    .ok_or_else(|| {
                        ParseError::new(ParseErrorKind::MismatchedComponent, line_num, 1)
                            .with_context(format!("END:{name}"))
                    })?;
                match stack.last_mut() {
                    Some(parent) => parent.add_child(component),
                    None => root = Some(component),
                }
            }
            _ => {
                let Some(current) = stack.last_mut() else {
                    return Err(ParseError::new(ParseErrorKind::MissingBegin, line_num, 1));
                };
                let column = line.len() - content.value.len() + 1;
                current.add_property(parse_property(content, line_num, column)?);
            }
        }
    }

    let root = root.ok_or_else(|| {
        ParseError::new(ParseErrorKind::MissingEnd, last_line, 1)
            .with_context(stack.last().map(|c| c.name.clone()).unwrap_or_default())
    })?;

    tracing::debug!(events = root.events().len(), "Parsed iCalendar document");
    Ok(ICalendar { root })
}

/// Value kinds the parser distinguishes by property name.
enum ValueKind {
    DateOrDateTime,
    DateOrDateTimeList,
    Recur,
    Integer,
    Duration,
    CalAddress,
    Attachment,
    Uri,
    Text,
    Raw,
}

fn value_kind(name: &str) -> ValueKind {
    match name {
        "DTSTART" | "DTEND" | "DTSTAMP" | "DUE" | "RECURRENCE-ID" | "CREATED"
        | "LAST-MODIFIED" => ValueKind::DateOrDateTime,
        "EXDATE" | "RDATE" => ValueKind::DateOrDateTimeList,
        "RRULE" => ValueKind::Recur,
        "SEQUENCE" | "PRIORITY" | "PERCENT-COMPLETE" => ValueKind::Integer,
        "DURATION" => ValueKind::Duration,
        "ORGANIZER" | "ATTENDEE" => ValueKind::CalAddress,
        "ATTACH" => ValueKind::Attachment,
        "URL" | "TZURL" => ValueKind::Uri,
        "SUMMARY" | "DESCRIPTION" | "LOCATION" | "COMMENT" | "UID" | "PRODID" | "VERSION"
        | "METHOD" | "CALSCALE" | "CLASS" | "STATUS" | "TRANSP" | "CATEGORIES" | "CONTACT"
        | "RELATED-TO" | "TZID" | "TZNAME" => ValueKind::Text,
        other if other.starts_with("X-") => ValueKind::Text,
        _ => ValueKind::Raw,
    }
}

fn parse_property(content: ContentLine, line: usize, col: usize) -> ParseResult<Property> {
    let is_date = content
        .param_value("VALUE")
        .is_some_and(|v| v.eq_ignore_ascii_case("DATE"));
    let tzid = content.param_value("TZID");
    let raw = content.value.as_str();

    let value = match value_kind(&content.name) {
        ValueKind::DateOrDateTime => {
            if is_date || (raw.len() == 8 && !raw.contains('T')) {
                Value::Date(parse_date(raw, line, col)?)
            } else {
                Value::DateTime(parse_datetime(raw, tzid, line, col)?)
            }
        }
        ValueKind::DateOrDateTimeList if raw.contains('/') => Value::Unknown(raw.to_string()),
        ValueKind::DateOrDateTimeList => {
            let first = raw.split(',').next().unwrap_or_default();
            if is_date || (first.len() == 8 && !first.contains('T')) {
                Value::DateList(parse_date_list(raw, line, col)?)
            } else {
                Value::DateTimeList(parse_datetime_list(raw, tzid, line, col)?)
            }
        }
        ValueKind::Recur => Value::Recur(Box::new(parse_rrule(raw, line, col)?)),
        ValueKind::Integer => Value::Integer(parse_integer(raw, line, col)?),
        ValueKind::Duration => Value::Duration(parse_duration(raw, line, col)?),
        ValueKind::CalAddress => Value::CalAddress(raw.to_string()),
        ValueKind::Attachment => {
            let base64 = content
                .param_value("ENCODING")
                .is_some_and(|v| v.eq_ignore_ascii_case("BASE64"));
            if base64 {
                Value::Binary(STANDARD.decode(raw.trim()).map_err(|e| {
                    ParseError::new(ParseErrorKind::InvalidBinary, line, col)
                        .with_context(e.to_string())
                })?)
            } else {
                Value::Uri(raw.to_string())
            }
        }
        ValueKind::Uri => Value::Uri(raw.to_string()),
        ValueKind::Text => Value::Text(unescape_text(raw)),
        ValueKind::Raw => Value::Unknown(raw.to_string()),
    };

    let raw_params = (!content.params.is_empty()).then_some(content.raw_params);
    Ok(Property {
        name: content.name,
        params: content.params,
        raw_params,
        value,
    })
}
