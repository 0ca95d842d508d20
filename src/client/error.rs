//! Client error types

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Service returned {status}: {message}")]
    Service {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Response is missing the {0} header")]
    MissingHeader(&'static str),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ClientError {
    /// Convert a non-success response body into a typed error
    pub(crate) fn from_service_response(status: reqwest::StatusCode, body: &str) -> Self {
        let (code, message) = match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => (
                envelope.error.code,
                envelope.error.message.unwrap_or_else(|| body.to_string()),
            ),
            Err(_) if body.trim().is_empty() => (
                None,
                status.canonical_reason().unwrap_or("Unknown error").to_string(),
            ),
            Err(_) => (None, body.to_string()),
        };

        if status == reqwest::StatusCode::NOT_FOUND {
            return ClientError::ModelNotFound(message);
        }

        ClientError::Service {
            status: status.as_u16(),
            code,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_not_found_maps_to_model_not_found() {
        let err = ClientError::from_service_response(
            StatusCode::NOT_FOUND,
            r#"{"error":{"code":"1022","message":"Model with 'id=abc' not found."}}"#,
        );
        assert!(matches!(err, ClientError::ModelNotFound(m) if m == "Model with 'id=abc' not found."));
    }

    #[test]
    fn test_service_error_keeps_code() {
        let err = ClientError::from_service_response(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"code":"InvalidImage","message":"bad image"}}"#,
        );
        match err {
            ClientError::Service { status, code, message } => {
                assert_eq!(status, 400);
                assert_eq!(code.as_deref(), Some("InvalidImage"));
                assert_eq!(message, "bad image");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_plain_body() {
        let err = ClientError::from_service_response(StatusCode::UNAUTHORIZED, "");
        assert_eq!(err.to_string(), "Service returned 401: Unauthorized");
    }
}
