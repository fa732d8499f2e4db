use axum::http::StatusCode;
use thiserror::Error;

use crate::error::HttpError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Ticket {0} not found")]
    TicketNotFound(i32),

    #[error("User {0} not found")]
    UserNotFound(i32),

    #[error("User {0} is not active")]
    InactiveActor(i32),

    #[error("Invalid assignment: {0}")]
    InvalidAssignment(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::TicketNotFound(_) | ServiceError::UserNotFound(_) => {
                HttpError::not_found(error.to_string())
            }

            ServiceError::InactiveActor(_)
            | ServiceError::InvalidAssignment(_)
            | ServiceError::InvalidArgument(_) => HttpError::bad_request(error.to_string()),

            ServiceError::UniqueViolation(_) => {
                HttpError::unique_constraint_violation(error.to_string())
            }

            ServiceError::Database(_) => HttpError::server_error(error.to_string()),
        }
    }
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::TicketNotFound(_) | ServiceError::UserNotFound(_) => {
                StatusCode::NOT_FOUND
            }

            ServiceError::InactiveActor(_)
            | ServiceError::InvalidAssignment(_)
            | ServiceError::InvalidArgument(_) => StatusCode::BAD_REQUEST,

            ServiceError::UniqueViolation(_) => StatusCode::CONFLICT,

            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
