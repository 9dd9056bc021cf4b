use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failure of the preprocessing pipeline.
///
/// Decoding is the only stage that can fail; everything after it operates on
/// a valid buffer.
#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("Invalid image format: {0}")]
    Decode(String),
}

/// Errors surfaced by the HTTP service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ServiceError::Preprocess(PreprocessError::Decode(_)) => {
                (StatusCode::BAD_REQUEST, "DECODE_ERROR")
            }
            ServiceError::ImageTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "IMAGE_TOO_LARGE")
            }
            ServiceError::MissingFile => (StatusCode::BAD_REQUEST, "MISSING_FILE"),
            ServiceError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ServiceError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}
