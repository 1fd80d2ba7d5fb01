use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("device not found: {0}")]
    NotFound(i64),

    #[error("device belongs to another user")]
    Forbidden,

    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
