use thiserror::Error;

/// Database layer errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Event record not found: id={0}")]
    NotFound(i64),

    #[error("Version conflict on event record {id}: expected {expected}, stored {stored}")]
    VersionConflict { id: i64, expected: i64, stored: i64 },

    #[error("Invalid event record: {0}")]
    InvalidRecord(String),

    #[error(transparent)]
    CoreError(#[from] teamcal_core::error::CoreError),
}

pub type DbResult<T> = std::result::Result<T, DbError>;
