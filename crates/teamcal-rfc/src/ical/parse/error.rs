//! iCalendar parsing error types.

use std::fmt;

use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

/// A parse failure with its 1-based position in the unfolded input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub column: usize,
    pub context: Option<String>,
}

impl ParseError {
    #[must_use]
    pub const fn new(kind: ParseErrorKind, line: usize, column: usize) -> Self {
        Self {
            kind,
            line,
            column,
            context: None,
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}, column {}", self.kind, self.line, self.column)?;
        if let Some(ref ctx) = self.context {
            write!(f, ": {ctx}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("empty input")]
    EmptyInput,
    #[error("missing property name")]
    MissingPropertyName,
    #[error("invalid property name")]
    InvalidPropertyName,
    #[error("missing colon separator")]
    MissingColon,
    #[error("invalid parameter format")]
    InvalidParameter,
    #[error("unclosed quoted string")]
    UnclosedQuote,
    #[error("invalid date format")]
    InvalidDate,
    #[error("invalid date-time format")]
    InvalidDateTime,
    #[error("invalid duration format")]
    InvalidDuration,
    #[error("invalid integer value")]
    InvalidInteger,
    #[error("invalid binary value")]
    InvalidBinary,
    #[error("invalid recurrence rule")]
    InvalidRRule,
    #[error("invalid frequency")]
    InvalidFrequency,
    #[error("invalid weekday")]
    InvalidWeekday,
    #[error("UNTIL and COUNT are mutually exclusive")]
    UntilCountConflict,
    #[error("missing BEGIN:VCALENDAR")]
    MissingBegin,
    #[error("missing END line")]
    MissingEnd,
    #[error("mismatched BEGIN/END")]
    MismatchedComponent,
}
