//! iCalendar parsing (RFC 5545).
//!
//! - Lexer: line unfolding and content-line tokenizing
//! - Values: typed value parsers (DATE, DATE-TIME, RECUR, ...)
//! - Parser: component tree assembly

mod error;
mod lexer;
mod parser;
mod values;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use lexer::{ContentLine, parse_content_line, parse_parameter_list, split_lines};
pub use parser::parse;
pub use values::{
    parse_date, parse_date_list, parse_datetime, parse_datetime_list, parse_duration,
    parse_integer, parse_rrule, unescape_text,
};
