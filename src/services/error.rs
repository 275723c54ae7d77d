use thiserror::Error;

use crate::database::manager::DatabaseError;

/// Failures surfaced by the access-controlled query service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid {field}: {message}")]
    ValidationError { field: String, message: String },

    #[error("Access denied: {0}")]
    AuthorizationError(String),

    #[error(transparent)]
    DatabaseError(#[from] DatabaseError),
}

impl ServiceError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn client_not_found(id: i64) -> Self {
        ServiceError::NotFound(format!("Client {}", id))
    }

    pub fn account_not_found(id: i64) -> Self {
        ServiceError::NotFound(format!("Account {}", id))
    }
}
