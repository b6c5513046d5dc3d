//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::password::PasswordHashError;
use thiserror::Error;

use crate::application::token::TokenError;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Message sent to clients for any 5xx. Details stay in the logs.
const INTERNAL_MESSAGE: &str = "Internal server error. Please try again later.";

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing or malformed input field
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Email is not on the institutional allow-list
    #[error("Please use a valid university email address")]
    InvalidEmailDomain,

    /// Email or username collides with an existing account
    #[error("Email or username is already registered")]
    UserAlreadyExists,

    /// Unknown email or wrong password (deliberately indistinguishable)
    #[error("Email or password is incorrect")]
    InvalidCredentials,

    /// Account exists but `is_active` is false
    #[error("Your account has been deactivated. Please contact support.")]
    AccountDeactivated,

    /// No usable credential, or it no longer maps to an active user
    #[error("{0}")]
    Unauthenticated(&'static str),

    /// Token failed parsing or signature verification
    #[error("Invalid token")]
    InvalidToken,

    /// Token signature is valid but its lifetime has elapsed
    #[error("Token expired")]
    TokenExpired,

    /// Admission gate rejected the request
    #[error("{message}")]
    RateLimited {
        message: &'static str,
        retry_after: Duration,
    },

    /// User record vanished
    #[error("User profile not found")]
    NotFound,

    /// Database error
    #[error("Database error: {0}")]
    Store(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AuthError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation { .. } | AuthError::InvalidEmailDomain => ErrorKind::BadRequest,
            AuthError::UserAlreadyExists => ErrorKind::Conflict,
            AuthError::InvalidCredentials | AuthError::Unauthenticated(_) => {
                ErrorKind::Unauthorized
            }
            AuthError::AccountDeactivated | AuthError::InvalidToken | AuthError::TokenExpired => {
                ErrorKind::Forbidden
            }
            AuthError::RateLimited { .. } => ErrorKind::TooManyRequests,
            AuthError::NotFound => ErrorKind::NotFound,
            AuthError::Store(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Machine-readable code for clients
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Validation { .. } => "VALIDATION_ERROR",
            AuthError::InvalidEmailDomain => "INVALID_EMAIL_DOMAIN",
            AuthError::UserAlreadyExists => "USER_ALREADY_EXISTS",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::AccountDeactivated => "ACCOUNT_DEACTIVATED",
            AuthError::Unauthenticated(_) => "UNAUTHENTICATED",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::RateLimited { .. } => "RATE_LIMITED",
            AuthError::NotFound => "NOT_FOUND",
            AuthError::Store(_) | AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        if self.kind().is_server_error() {
            return AppError::new(self.kind(), INTERNAL_MESSAGE).with_code(self.code());
        }

        let err = AppError::new(self.kind(), self.to_string()).with_code(self.code());
        match self {
            AuthError::Validation { field, .. } => err.with_field(*field),
            AuthError::InvalidEmailDomain => err.with_field("email"),
            AuthError::InvalidToken | AuthError::TokenExpired => err.with_action("Please login again"),
            AuthError::AccountDeactivated => err.with_action("Contact support to restore access"),
            AuthError::RateLimited { retry_after, .. } => err.with_retry_after(*retry_after),
            _ => err,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Store(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::AccountDeactivated => {
                tracing::warn!("Login attempt on deactivated account");
            }
            _ => {
                tracing::debug!(error = %self, code = self.code(), "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Malformed | TokenError::InvalidSignature => AuthError::InvalidToken,
            TokenError::MissingSecret | TokenError::InvalidLifetime | TokenError::Signing(_) => {
                AuthError::Internal(err.to_string())
            }
        }
    }
}

impl From<PasswordHashError> for AuthError {
    fn from(err: PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
