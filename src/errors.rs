//! Centralized error handling.
//!
//! Provides a unified error type for the entire application,
//! with automatic HTTP response conversion.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::DomainError;
use serde::Serialize;
use thiserror::Error;

use crate::config::SUBSCRIPTION_OFFER_PATH;

/// Failures reported by the identity provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IdentityError {
    #[error("Wrong password")]
    WrongPassword,

    #[error("No account for this email")]
    UnknownAccount,

    #[error("Email already in use")]
    EmailInUse,

    #[error("{0}")]
    WeakPassword(String),

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Too many failed sign-in attempts")]
    TooManyAttempts,

    #[error("Password reset link is invalid or has expired")]
    InvalidResetToken,

    #[error("Session expired")]
    SessionExpired,

    #[error("Identity service unavailable: {0}")]
    Unavailable(String),
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication & Authorization
    #[error("Authentication required")]
    Unauthorized,

    #[error("Access denied")]
    Forbidden,

    // Resource errors
    #[error("Resource not found")]
    NotFound,

    // Request validation
    #[error("{0}")]
    Validation(String),

    // Business rules
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    // External service errors
    #[error("Database error")]
    Database(#[from] sea_orm::DbErr),

    #[error("Authentication error")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Session store error")]
    Cache(#[from] redis::RedisError),

    #[error("Storage error")]
    Storage(#[from] std::io::Error),

    // Internal
    #[error("Internal server error")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    /// Where the client should send the user next
    #[serde(skip_serializing_if = "Option::is_none")]
    offer: Option<&'static str>,
}

/// Diagnostic attached to server-error responses and picked up by the
/// error log middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub code: &'static str,
    pub detail: String,
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Forbidden => "FORBIDDEN",
            AppError::NotFound => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Domain(e) => match e {
                DomainError::Validation(_) => "VALIDATION_ERROR",
                DomainError::Password(_) => "WEAK_PASSWORD",
                DomainError::InvalidRating { .. } => "INVALID_RATING",
                DomainError::EventNotFound => "EVENT_NOT_FOUND",
                DomainError::ReviewNotFound => "REVIEW_NOT_FOUND",
                DomainError::UserNotFound => "USER_NOT_FOUND",
                DomainError::AlreadyRegistered => "ALREADY_REGISTERED",
                DomainError::RegistrationClosed => "REGISTRATION_CLOSED",
                DomainError::SubscriptionRequired => "SUBSCRIPTION_REQUIRED",
                DomainError::AlreadySubscribed => "ALREADY_SUBSCRIBED",
                DomainError::CapacityBelowRegistered { .. } => "CAPACITY_BELOW_REGISTERED",
                DomainError::PermissionDenied => "FORBIDDEN",
                DomainError::Internal(_) => "INTERNAL_ERROR",
            },
            AppError::Identity(e) => match e {
                IdentityError::WrongPassword | IdentityError::UnknownAccount => {
                    "INVALID_CREDENTIALS"
                }
                IdentityError::EmailInUse => "EMAIL_IN_USE",
                IdentityError::WeakPassword(_) => "WEAK_PASSWORD",
                IdentityError::InvalidEmail => "INVALID_EMAIL",
                IdentityError::TooManyAttempts => "TOO_MANY_ATTEMPTS",
                IdentityError::InvalidResetToken => "INVALID_RESET_TOKEN",
                IdentityError::SessionExpired => "SESSION_EXPIRED",
                IdentityError::Unavailable(_) => "SERVICE_UNAVAILABLE",
            },
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Jwt(_) => "AUTH_ERROR",
            AppError::Cache(_) => "SESSION_STORE_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Domain(e) => match e {
                DomainError::Validation(_)
                | DomainError::Password(_)
                | DomainError::InvalidRating { .. }
                | DomainError::CapacityBelowRegistered { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                DomainError::EventNotFound
                | DomainError::ReviewNotFound
                | DomainError::UserNotFound => StatusCode::NOT_FOUND,
                DomainError::AlreadyRegistered
                | DomainError::AlreadySubscribed
                | DomainError::RegistrationClosed => StatusCode::CONFLICT,
                DomainError::SubscriptionRequired => StatusCode::PAYMENT_REQUIRED,
                DomainError::PermissionDenied => StatusCode::FORBIDDEN,
                DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Identity(e) => match e {
                IdentityError::WrongPassword
                | IdentityError::UnknownAccount
                | IdentityError::SessionExpired => StatusCode::UNAUTHORIZED,
                IdentityError::EmailInUse => StatusCode::CONFLICT,
                IdentityError::WeakPassword(_) | IdentityError::InvalidEmail => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                IdentityError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
                IdentityError::InvalidResetToken => StatusCode::BAD_REQUEST,
                IdentityError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            AppError::Cache(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Identity(IdentityError::WrongPassword | IdentityError::UnknownAccount) => {
                "Invalid email or password".to_string()
            }
            AppError::Identity(IdentityError::Unavailable(_)) => {
                "Sign-in is temporarily unavailable".to_string()
            }
            AppError::Domain(DomainError::Internal(_)) | AppError::Internal(_) => {
                "An internal error occurred".to_string()
            }
            AppError::Database(_) => "A database error occurred".to_string(),
            AppError::Jwt(_) => "Invalid or expired token".to_string(),
            AppError::Cache(_) => "Service temporarily unavailable".to_string(),
            AppError::Storage(_) => "File storage failed".to_string(),

            // Client errors carry their own wording
            AppError::Unauthorized
            | AppError::Forbidden
            | AppError::NotFound
            | AppError::Validation(_)
            | AppError::Domain(_)
            | AppError::Identity(_) => self.to_string(),
        }
    }

    /// True for failures that are not the caller's fault
    pub fn is_unexpected(&self) -> bool {
        self.status().is_server_error()
    }

    /// Full diagnostic, never shown to clients
    pub fn detail(&self) -> String {
        match self {
            AppError::Database(e) => format!("Database error: {}", e),
            AppError::Jwt(e) => format!("JWT error: {}", e),
            AppError::Cache(e) => format!("Redis error: {}", e),
            AppError::Storage(e) => format!("Storage error: {}", e),
            AppError::Internal(msg) => format!("Internal error: {}", msg),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        if self.is_unexpected() {
            tracing::error!(code, detail = %self.detail(), "Request failed");
        }

        let offer = matches!(self, AppError::Domain(DomainError::SubscriptionRequired))
            .then_some(SUBSCRIPTION_OFFER_PATH);

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.user_message(),
                offer,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if self.is_unexpected() {
            response.extensions_mut().insert(ErrorReport {
                code,
                detail: self.detail(),
            });
        }
        response
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> AppResult<T> {
        self.ok_or(AppError::NotFound)
    }
}

/// Convenience constructors
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}
