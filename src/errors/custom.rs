use crate::domain::TransitionError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::pooled_connection::deadpool::PoolError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CustomError {
    #[error("Database Error: {0}")]
    DatabaseError(#[from] DbError),

    #[error("Blocking Error: {0}")]
    BlockingError(String),

    #[error("Hashing Error: {0}")]
    HashingError(String),

    #[error("Validation Error: {0}")]
    ValidationError(String),

    #[error("Authentication Error: {0}")]
    AuthenticationError(#[from] AuthError),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid Transition: {0}")]
    InvalidTransition(#[from] TransitionError),
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Connection Error: {0}")]
    ConnectionError(String),

    #[error("Query Error: {0}")]
    QueryBuilderError(String),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Session Authentication Error: {0}")]
    SessionAuthenticationError(String),

    #[error("JWT Authentication Error: {0}")]
    JwtAuthenticationError(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Other Authentication Error: {0}")]
    OtherAuthenticationError(String),
}

impl From<DieselError> for CustomError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => CustomError::NotFound("Record not found".to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                CustomError::Conflict(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                CustomError::ValidationError(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
                CustomError::ValidationError(info.message().to_string())
            }
            other => CustomError::DatabaseError(DbError::QueryBuilderError(other.to_string())),
        }
    }
}

impl From<PoolError> for CustomError {
    fn from(err: PoolError) -> Self {
        CustomError::DatabaseError(DbError::ConnectionError(err.to_string()))
    }
}

impl From<actix_web::error::BlockingError> for CustomError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        CustomError::BlockingError(err.to_string())
    }
}

impl ResponseError for CustomError {
    fn status_code(&self) -> StatusCode {
        match self {
            CustomError::ValidationError(_) => StatusCode::BAD_REQUEST,
            CustomError::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            CustomError::Forbidden(_) => StatusCode::FORBIDDEN,
            CustomError::NotFound(_) => StatusCode::NOT_FOUND,
            CustomError::Conflict(_) | CustomError::InvalidTransition(_) => StatusCode::CONFLICT,
            CustomError::DatabaseError(_)
            | CustomError::BlockingError(_)
            | CustomError::HashingError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        HttpResponse::build(status).json(json!({
            "success": false,
            "message": self.to_string(),
        }))
    }
}
