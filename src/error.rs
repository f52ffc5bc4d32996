//! Error types for the pdf2zh relay

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::translator::{ParamError, TranslatorError};

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
///
/// Every variant ends the current request; nothing is retried.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid parameter: {0}")]
    Param(#[from] ParamError),

    #[error("Upload exceeds the size limit: {0}")]
    PayloadTooLarge(String),

    #[error("Failed to serialize parameters: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to stage upload: {0}")]
    Staging(#[source] std::io::Error),

    #[error("Translation failed: {0}")]
    Translator(#[from] TranslatorError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Param(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Serialization(_) | AppError::Staging(_) | AppError::Translator(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AppError::Translator(TranslatorError::Failed { code, stderr }) => {
                tracing::error!(exit_code = ?code, stderr = %stderr, "Translator failed");
            }
            AppError::Translator(e) => tracing::error!("Translator error: {}", e),
            AppError::Serialization(e) => tracing::error!("Serialization error: {}", e),
            AppError::Staging(e) => tracing::error!("Staging error: {}", e),
            _ => tracing::debug!("Rejected request: {}", self),
        }

        // Plain-text body; stderr stays in the logs
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::BadRequest("missing file".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(ParamError::NotAllowed("x".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::PayloadTooLarge("limit".into()).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            AppError::from(TranslatorError::TimedOut(Duration::from_secs(1))).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Staging(std::io::Error::other("disk full")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_stderr_not_in_message() {
        let err = AppError::from(TranslatorError::Failed {
            code: Some(1),
            stderr: "Traceback: secret path".into(),
        });
        let message = err.to_string();
        assert_eq!(message, "Translation failed: Translator exited with status 1");
        assert!(!message.contains("Traceback"));
    }

    #[test]
    fn test_response_is_plain_text() {
        let response = AppError::BadRequest("Missing 'file' field".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }
}
