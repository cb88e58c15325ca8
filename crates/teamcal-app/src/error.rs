use thiserror::Error;

/// Application-level errors (command line layer)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ServiceError(#[from] teamcal_service::error::ServiceError),

    #[error(transparent)]
    DatabaseError(#[from] teamcal_db::error::DbError),

    #[error(transparent)]
    CoreError(#[from] teamcal_core::error::CoreError),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type AppResult<T> = std::result::Result<T, AppError>;
