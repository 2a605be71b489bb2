use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Invalid month: {0} (expected 1-12)")]
    InvalidMonth(u32),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Occurrence {0} has already been superseded")]
    StaleOccurrence(Uuid),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
