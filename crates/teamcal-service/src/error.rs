use teamcal_db::error::DbError;
use thiserror::Error;

/// Message key reported for duration and ordering violations.
pub const DURATION_ERROR_KEY: &str = "plugins.teamcal.event.duration.error";

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    DatabaseError(DbError),

    #[error(transparent)]
    RfcError(#[from] teamcal_rfc::error::RfcError),

    #[error(transparent)]
    CoreError(#[from] teamcal_core::error::CoreError),

    #[error("Not found: {0}")]
    NotFound(String),

    /// User-facing validation failure, reported rather than retried.
    #[error("Validation failed for {field}: {message_key}")]
    Validation {
        message_key: &'static str,
        field: &'static str,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),
}

impl ServiceError {
    #[must_use]
    pub const fn duration(field: &'static str) -> Self {
        Self::Validation {
            message_key: DURATION_ERROR_KEY,
            field,
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::VersionConflict { .. } => Self::Conflict(err.to_string()),
            DbError::NotFound(id) => Self::NotFound(format!("event {id}")),
            other => Self::DatabaseError(other),
        }
    }
}

impl From<teamcal_rfc::ical::ParseError> for ServiceError {
    fn from(err: teamcal_rfc::ical::ParseError) -> Self {
        Self::RfcError(err.into())
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_conflict_surfaces_as_conflict() {
        let err = ServiceError::from(DbError::VersionConflict {
            id: 3,
            expected: 1,
            stored: 2,
        });
        assert!(matches!(err, ServiceError::Conflict(msg) if msg.contains("record 3")));
        assert!(matches!(
            ServiceError::from(DbError::NotFound(9)),
            ServiceError::NotFound(_)
        ));
    }

    #[test]
    fn duration_error_carries_key_and_field() {
        let err = ServiceError::duration("endDate");
        assert_eq!(
            err.to_string(),
            "Validation failed for endDate: plugins.teamcal.event.duration.error"
        );
    }
}
