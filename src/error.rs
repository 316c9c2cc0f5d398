use std::time::Duration;

use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures of a single translation request
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("JSON body required")]
    MissingBody,

    #[error("text, source_lang, target_lang required")]
    MissingFields,

    /// The model call failed; carries the backend's message verbatim
    #[error("{0}")]
    Generation(String),

    #[error("model busy: no exclusive access after {0:?}")]
    QueueTimeout(Duration),

    #[error("translation task failed: {0}")]
    Worker(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MissingBody | GatewayError::MissingFields => StatusCode::BAD_REQUEST,
            GatewayError::QueueTimeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Generation(_) | GatewayError::Worker(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Error returned from HTTP handlers; always rendered as `{"error": message}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self {
            status: err.status(),
            message: err.to_string(),
        }
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_shape_errors_are_bad_requests() {
        let err = ApiError::from(GatewayError::MissingBody);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "JSON body required");

        let err = ApiError::from(GatewayError::MissingFields);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "text, source_lang, target_lang required");
    }

    #[test]
    fn generation_errors_keep_backend_message() {
        let err = ApiError::from(GatewayError::Generation("CUDA out of memory".to_string()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "CUDA out of memory");
    }

    #[test]
    fn queue_timeout_is_unavailable() {
        let err = ApiError::from(GatewayError::QueueTimeout(Duration::from_secs(3)));
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.message.contains("3s"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GatewayError>();
    }
}
