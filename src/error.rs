use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Error code presented to end users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorCode {
    pub code: u32,
    pub msg: &'static str,
}

/// The only error code that crosses the public boundary.
pub const SYSTEM_ERROR: ErrorCode = ErrorCode {
    code: 510001,
    msg: "系统错误",
};

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Search engine errors
    #[error("Search engine error: {0}")]
    Engine(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Messaging errors
    #[error("Messaging error: {0}")]
    Messaging(String),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Engine(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Messaging(_) => StatusCode::BAD_GATEWAY,
            AppError::Configuration(_)
            | AppError::Io(_)
            | AppError::Serialization(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Internal classification, used in logs only
    pub fn error_kind(&self) -> &'static str {
        match self {
            AppError::Engine(_) => "ENGINE_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Messaging(_) => "MESSAGING_ERROR",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Code shown to the caller. Every failure collapses into `SYSTEM_ERROR`.
    pub fn error_code(&self) -> ErrorCode {
        SYSTEM_ERROR
    }
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        tracing::error!(
            error_kind = self.error_kind(),
            status_code = status.as_u16(),
            message = %self,
            "Request error"
        );

        let body = Json(json!({
            "code": code.code,
            "msg": code.msg,
        }));

        (status, body).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
