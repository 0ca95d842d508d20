//! Error types for the Formscope server
//!
//! Every failure a page can hit ends up as an [`AppError`], which knows the
//! alert (title and message) the user sees and the HTTP status it maps to.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::client::ClientError;
use crate::document::DocumentError;
use crate::poller::PollError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

pub const TIMEOUT_MESSAGE: &str = "Timed out, please try other file.";
pub const PREDICT_WITHOUT_TRAIN_MESSAGE: &str =
    "Prediction is not allowed before a model has been trained. Train a model first.";

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Network error: {0}")]
    NetworkFailure(String),

    #[error("Failed to fetch: {0}")]
    FetchFailed(String),

    #[error("Content-Type {0} not supported")]
    UnsupportedContentType(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("No trained model available")]
    PredictWithoutTrainForbidden,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("{0}")]
    OperationFailed(String),

    #[error("Operation timed out")]
    OperationTimedOut,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A newer request replaced the one this result belongs to
    #[error("Request superseded by a newer one")]
    Superseded,

    #[error("Failed to render document: {0}")]
    Render(String),

    #[error("Service error {status}: {message}")]
    Service { status: u16, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// What the user is shown for an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl AppError {
    pub fn alert(&self) -> Alert {
        let (title, message) = match self {
            AppError::NetworkFailure(_) => (
                "Fetch failed",
                "Network error or the remote server is unreachable".to_string(),
            ),
            AppError::FetchFailed(status) => ("Failed to fetch", status.clone()),
            AppError::UnsupportedContentType(content_type) => (
                "Content-Type not supported",
                format!("Content-Type {} not supported", content_type),
            ),
            AppError::UnsupportedFileType(_) => (
                "Not supported file type",
                "Sorry, we currently only support JPG/PNG/TIFF/PDF files.".to_string(),
            ),
            AppError::PredictWithoutTrainForbidden => (
                "Cannot predict without a trained model",
                PREDICT_WITHOUT_TRAIN_MESSAGE.to_string(),
            ),
            AppError::ModelNotFound(message) | AppError::OperationFailed(message) => {
                ("Prediction Failed", message.clone())
            }
            AppError::OperationTimedOut => ("Prediction Failed", TIMEOUT_MESSAGE.to_string()),
            AppError::Superseded => (
                "Prediction discarded",
                "The document changed while the prediction was running".to_string(),
            ),
            AppError::Render(message) => ("Failed loading document", message.clone()),
            AppError::Service { message, .. } => ("Prediction Failed", message.clone()),
            AppError::BadRequest(message)
            | AppError::NotFound(message)
            | AppError::Conflict(message) => ("Request failed", message.clone()),
            AppError::Internal(_) => ("Error", "An internal error occurred".to_string()),
        };

        Alert {
            title: title.to_string(),
            message,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NetworkFailure(_) | AppError::FetchFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::UnsupportedContentType(_) | AppError::UnsupportedFileType(_) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            AppError::PredictWithoutTrainForbidden => StatusCode::FORBIDDEN,
            AppError::ModelNotFound(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::OperationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::OperationTimedOut => StatusCode::GATEWAY_TIMEOUT,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) | AppError::Superseded => StatusCode::CONFLICT,
            AppError::Render(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Service { .. } => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            AppError::NetworkFailure(_) => "network_failure",
            AppError::FetchFailed(_) => "fetch_failed",
            AppError::UnsupportedContentType(_) => "unsupported_content_type",
            AppError::UnsupportedFileType(_) => "unsupported_file_type",
            AppError::PredictWithoutTrainForbidden => "predict_without_train_forbidden",
            AppError::ModelNotFound(_) => "model_not_found",
            AppError::OperationFailed(_) => "operation_failed",
            AppError::OperationTimedOut => "operation_timed_out",
            AppError::BadRequest(_) => "bad_request",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Superseded => "superseded",
            AppError::Render(_) => "render_error",
            AppError::Service { .. } => "service_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Network(e) => AppError::NetworkFailure(e.to_string()),
            ClientError::ModelNotFound(message) => AppError::ModelNotFound(message),
            ClientError::Service { status, message, .. } => AppError::Service { status, message },
            ClientError::MissingHeader(_) | ClientError::InvalidResponse(_) => {
                AppError::Service {
                    status: 502,
                    message: err.to_string(),
                }
            }
            ClientError::InvalidUrl(message) => AppError::Internal(message),
        }
    }
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::UnsupportedFileType(mime) => AppError::UnsupportedFileType(mime),
            DocumentError::UnsupportedContentType(mime) => AppError::UnsupportedContentType(mime),
            DocumentError::FetchFailed(message) => AppError::FetchFailed(message),
            DocumentError::Network(message) => AppError::NetworkFailure(message),
            DocumentError::PageOutOfRange { .. } => AppError::BadRequest(err.to_string()),
            DocumentError::Load(_) | DocumentError::Render(_) | DocumentError::Image(_) => {
                AppError::Render(err.to_string())
            }
        }
    }
}

impl<E: Into<AppError>> From<PollError<E>> for AppError {
    fn from(err: PollError<E>) -> Self {
        match err {
            PollError::Failed(message) => AppError::OperationFailed(message),
            PollError::TimedOut { .. } => AppError::OperationTimedOut,
            PollError::Probe(e) => e.into(),
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    title: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let Alert { title, message } = self.alert();
        let body = Json(ErrorResponse {
            error: self.error_type().to_string(),
            title,
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}
