use thiserror::Error;

use crate::ical::parse::ParseError;

/// RFC parsing and validation errors
#[derive(Error, Debug)]
pub enum RfcError {
    #[error(transparent)]
    ParseError(#[from] ParseError),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type RfcResult<T> = std::result::Result<T, RfcError>;
