use std::time::Duration;

use thiserror::Error;

use fieldform_forms::FormError;

/// Opaque error returned by a form handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("submission not found: {0}")]
    SubmissionNotFound(uuid::Uuid),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid submission payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error("no handler registered for form {0}")]
    NoHandler(fieldform_forms::FormKind),

    #[error("handler failed: {0}")]
    Handler(HandlerError),

    #[error("handler did not finish within {0:?}")]
    DispatchTimeout(Duration),

    #[error("worker error: {0}")]
    Worker(String),
}

impl From<fieldform_forms::MappingError> for PipelineError {
    fn from(err: fieldform_forms::MappingError) -> Self {
        Self::Form(err.into())
    }
}

impl From<fieldform_forms::MarkupError> for PipelineError {
    fn from(err: fieldform_forms::MarkupError) -> Self {
        Self::Form(err.into())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
