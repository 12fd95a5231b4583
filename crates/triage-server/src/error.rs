//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use triage_pipeline::PipelineError;

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Pipeline rejected the request or the store failed
    Pipeline(PipelineError),
    /// Malformed request parameters
    BadRequest(String),
}

impl AppError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Pipeline(PipelineError::UnsupportedInput(_)) => StatusCode::BAD_REQUEST,
            AppError::Pipeline(PipelineError::InputTooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Pipeline(PipelineError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Pipeline(PipelineError::StoreUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Pipeline(e) => {
                if status == StatusCode::SERVICE_UNAVAILABLE {
                    tracing::error!("Request failed: {}", e);
                }
                e.to_string()
            }
            AppError::BadRequest(msg) => msg,
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        AppError::Pipeline(e)
    }
}
