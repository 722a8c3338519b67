use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

const PG_UNIQUE_VIOLATION: &str = "23505";
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";
const PG_STRING_DATA_RIGHT_TRUNCATION: &str = "22001";
const USERS_EMAIL_CONSTRAINT: &str = "users_email_key";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("User already exists with email: {0}")]
    DuplicateEmail(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is inactive")]
    AccountInactive,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Token is malformed")]
    TokenMalformed,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token signature is invalid")]
    TokenSignatureInvalid,

    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid driver: {0}")]
    InvalidDriver(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Too many requests")]
    RateLimited,

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable identifier sent alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "CONFIG",
            Error::DuplicateEmail(_) => "DUPLICATE_EMAIL",
            Error::InvalidCredentials => "INVALID_CREDENTIALS",
            Error::AccountInactive => "ACCOUNT_INACTIVE",
            Error::NotFound(_) => "NOT_FOUND",
            Error::TokenMalformed => "TOKEN_MALFORMED",
            Error::TokenExpired => "TOKEN_EXPIRED",
            Error::TokenSignatureInvalid => "TOKEN_SIGNATURE_INVALID",
            Error::InvalidPagination(_) => "INVALID_PAGINATION",
            Error::Validation(_) => "VALIDATION_FAILURE",
            Error::InvalidDriver(_) => "INVALID_DRIVER",
            Error::BadRequest(_) => "BAD_REQUEST",
            Error::Unauthorized(_) => "UNAUTHORIZED",
            Error::Forbidden(_) => "FORBIDDEN",
            Error::Conflict(_) => "CONFLICT",
            Error::RateLimited => "RATE_LIMITED",
            Error::Database(_) => "DATABASE",
            Error::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::DuplicateEmail(_) | Error::Conflict(_) => StatusCode::CONFLICT,
            Error::InvalidCredentials
            | Error::TokenMalformed
            | Error::TokenExpired
            | Error::TokenSignatureInvalid
            | Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::AccountInactive | Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidPagination(_)
            | Error::Validation(_)
            | Error::InvalidDriver(_)
            | Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Error::Config(_) | Error::Database(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let error_message = match &self {
            Error::Database(err) => {
                tracing::error!(error = %err, "database failure");
                "An unexpected error occurred".to_string()
            }
            Error::Internal(msg) | Error::Config(msg) => {
                tracing::error!(error = %msg, "internal failure");
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({ "error": error_message, "code": self.code() }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = err {
            return Error::NotFound("Resource not found".to_string());
        }
        let classified = err.as_database_error().map(|db| {
            (
                db.code().map(|c| c.into_owned()),
                db.constraint().map(str::to_string),
                db.message().to_string(),
            )
        });
        match classified {
            Some((Some(code), constraint, _))
                if code == PG_UNIQUE_VIOLATION
                    && constraint.as_deref() == Some(USERS_EMAIL_CONSTRAINT) =>
            {
                Error::DuplicateEmail("email is already registered".to_string())
            }
            Some((Some(code), _, message)) if code == PG_UNIQUE_VIOLATION => {
                Error::Conflict(message)
            }
            Some((Some(code), _, _)) if code == PG_FOREIGN_KEY_VIOLATION => Error::Conflict(
                "Record is still referenced by other records".to_string(),
            ),
            Some((Some(code), _, _)) if code == PG_STRING_DATA_RIGHT_TRUNCATION => {
                Error::BadRequest("Value is too long for its field".to_string())
            }
            _ => Error::Database(err),
        }
    }
}

impl From<argon2::password_hash::Error> for Error {
    fn from(err: argon2::password_hash::Error) -> Self {
        Error::Internal(format!("password hashing failed: {}", err))
    }
}
