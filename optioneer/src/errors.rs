use crate::db::errors::DbError;
use crate::selection::SelectionError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Authenticated but not entitled to the resource or action
    #[error("{message}")]
    Forbidden { message: String },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Conflict error, e.g., for unique constraint violations
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Too many requests against the in-process throttle
    #[error("{message}")]
    TooManyRequests { message: String },

    /// Primary-option plan capacity reached
    #[error("Plan limit reached: {used} of {limit} primary options in use")]
    PlanLimit { used: i64, limit: i64 },

    /// Embed request without a publicKey parameter
    #[error("Missing publicKey parameter")]
    MissingClientKey,

    /// Embed publicKey did not resolve to a client. Malformed and absent keys
    /// both land here so the error shape carries no enumeration signal.
    #[error("Client not found")]
    ClientNotFound,

    /// Embed request without an X-Embed-Origin header
    #[error("Missing X-Embed-Origin header")]
    MissingEmbedOrigin,

    /// Embed origin header could not be parsed as an origin
    #[error("Invalid embed origin: {origin}")]
    InvalidOrigin { origin: String },

    /// Client has no allowed domains configured; embeds require explicit opt-in
    #[error("No allowed origins configured for this client")]
    NoAllowedOrigins,

    /// Embed origin is not on the client's allow-list
    #[error("Origin {origin} is not in the allowed domains list")]
    OriginMismatch { origin: String },

    /// Client exhausted their monthly embed request quota
    #[error("Monthly request limit exceeded")]
    RequestLimitExceeded,

    /// A submitted selection violated the configurator's rules
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            Error::PlanLimit { .. } => StatusCode::FORBIDDEN,
            Error::MissingClientKey => StatusCode::BAD_REQUEST,
            Error::ClientNotFound => StatusCode::NOT_FOUND,
            Error::MissingEmbedOrigin => StatusCode::BAD_REQUEST,
            Error::InvalidOrigin { .. } => StatusCode::BAD_REQUEST,
            Error::NoAllowedOrigins => StatusCode::FORBIDDEN,
            Error::OriginMismatch { .. } => StatusCode::FORBIDDEN,
            Error::RequestLimitExceeded => StatusCode::FORBIDDEN,
            Error::Selection(_) => StatusCode::BAD_REQUEST,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code carried in the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Unauthenticated { .. } => "UNAUTHORIZED",
            Error::Forbidden { .. } => "FORBIDDEN",
            Error::BadRequest { .. } => "VALIDATION_ERROR",
            Error::NotFound { .. } => "NOT_FOUND",
            Error::Conflict { .. } => "CONFLICT",
            Error::TooManyRequests { .. } => "RATE_LIMIT",
            Error::PlanLimit { .. } => "PLAN_LIMIT",
            Error::MissingClientKey => "MISSING_CLIENT_KEY",
            Error::ClientNotFound => "CLIENT_NOT_FOUND",
            Error::MissingEmbedOrigin => "MISSING_EMBED_ORIGIN",
            Error::InvalidOrigin { .. } => "INVALID_ORIGIN",
            Error::NoAllowedOrigins => "NO_ALLOWED_ORIGINS",
            Error::OriginMismatch { .. } => "ORIGIN_MISMATCH",
            Error::RequestLimitExceeded => "REQUEST_LIMIT_EXCEEDED",
            Error::Selection(sel) => sel.code(),
            Error::Internal { .. } => "INTERNAL_ERROR",
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "NOT_FOUND",
                DbError::UniqueViolation { .. } => "CONFLICT",
                DbError::ForeignKeyViolation { .. } => "VALIDATION_ERROR",
                DbError::CheckViolation { .. } => "VALIDATION_ERROR",
                DbError::Other(_) => "INTERNAL_ERROR",
            },
            Error::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Other(_) => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, table, .. } => match (table.as_deref(), constraint.as_deref()) {
                    (Some("clients"), Some(c)) if c.contains("email") => {
                        "An account with this email address already exists".to_string()
                    }
                    (Some("quotes"), Some(c)) if c.contains("quote_code") => "A quote with this code already exists".to_string(),
                    (Some("block_purchases"), Some(c)) if c.contains("session_id") => {
                        "This payment session has already been processed".to_string()
                    }
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            // The remaining variants have display messages that are already user-safe
            other => other.to_string(),
        }
    }

    /// Embed-path errors are readable cross-origin so the embed script can
    /// surface them; no client context is established yet, hence the wildcard.
    fn is_embed_error(&self) -> bool {
        matches!(
            self,
            Error::MissingClientKey
                | Error::ClientNotFound
                | Error::MissingEmbedOrigin
                | Error::InvalidOrigin { .. }
                | Error::NoAllowedOrigins
                | Error::OriginMismatch { .. }
                | Error::RequestLimitExceeded
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) | Error::Conflict { .. } => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::Forbidden { .. } | Error::PlanLimit { .. } | Error::RequestLimitExceeded => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::TooManyRequests { .. } => {
                tracing::info!("Throttled request: {}", self);
            }
            _ => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let body = json!({
            "success": false,
            "error": self.user_message(),
            "code": self.code(),
        });

        let mut response = (status, axum::response::Json(body)).into_response();
        if self.is_embed_error() {
            response
                .headers_mut()
                .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, header::HeaderValue::from_static("*"));
        }
        response
    }
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_error_codes_and_statuses() {
        let cases: Vec<(Error, StatusCode, &str)> = vec![
            (Error::MissingClientKey, StatusCode::BAD_REQUEST, "MISSING_CLIENT_KEY"),
            (Error::ClientNotFound, StatusCode::NOT_FOUND, "CLIENT_NOT_FOUND"),
            (Error::MissingEmbedOrigin, StatusCode::BAD_REQUEST, "MISSING_EMBED_ORIGIN"),
            (
                Error::InvalidOrigin {
                    origin: "not a url".to_string(),
                },
                StatusCode::BAD_REQUEST,
                "INVALID_ORIGIN",
            ),
            (Error::NoAllowedOrigins, StatusCode::FORBIDDEN, "NO_ALLOWED_ORIGINS"),
            (
                Error::OriginMismatch {
                    origin: "https://evil.example".to_string(),
                },
                StatusCode::FORBIDDEN,
                "ORIGIN_MISMATCH",
            ),
            (Error::RequestLimitExceeded, StatusCode::FORBIDDEN, "REQUEST_LIMIT_EXCEEDED"),
        ];

        for (error, status, code) in cases {
            assert_eq!(error.status_code(), status, "status for {code}");
            assert_eq!(error.code(), code);
            assert!(error.is_embed_error());
        }
    }

    #[test]
    fn test_plan_limit_is_authorization_kind() {
        let error = Error::PlanLimit { used: 10, limit: 10 };
        assert_eq!(error.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(error.code(), "PLAN_LIMIT");
    }

    #[test]
    fn test_internal_errors_do_not_leak_detail() {
        let error = Error::Internal {
            operation: "connect to smtp relay at 10.0.0.3".to_string(),
        };
        assert_eq!(error.user_message(), "Internal server error");
        assert_eq!(error.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_origin_mismatch_names_the_origin() {
        // Domain-mismatch messages name the offending origin so the site owner
        // can fix their allow-list.
        let error = Error::OriginMismatch {
            origin: "https://shop.example.net".to_string(),
        };
        assert!(error.user_message().contains("https://shop.example.net"));
    }
}
