//! Maps failures to HTTP responses.
//!
//! Every handler returns `Result<_, ApiError>`, so this is the one place
//! where a failure becomes a status code and an `{ "error": ... }` body.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::Error;

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human readable description.
    pub error: String,
}

impl ErrorBody {
    /// Build a body from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// A failed request.
#[derive(Debug)]
pub enum ApiError {
    /// A create request arrived without a `name`.
    ContentMissing,
    /// The body was not acceptable JSON.
    InvalidBody(JsonRejection),
    /// The store rejected or failed the operation.
    Store(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Store(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection)
    }
}

impl ApiError {
    /// The status code and message sent to the client.
    #[must_use]
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::ContentMissing => (StatusCode::BAD_REQUEST, "content missing".to_string()),
            Self::InvalidBody(rejection) => (rejection.status(), rejection.body_text()),
            Self::Store(Error::MalformedId { .. }) => {
                (StatusCode::BAD_REQUEST, "malformatted id".to_string())
            }
            Self::Store(Error::Validation(err)) => (StatusCode::BAD_REQUEST, err.to_string()),
            Self::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        match &self {
            Self::Store(err) if status.is_server_error() => error!("{err}"),
            Self::Store(err) => warn!("{err}"),
            _ => warn!("{message}"),
        }

        (status, Json(ErrorBody::new(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{FieldError, ValidationError};

    #[test]
    fn test_content_missing() {
        let (status, message) = ApiError::ContentMissing.status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "content missing");
    }

    #[test]
    fn test_malformed_id() {
        let err = ApiError::from(Error::malformed_id("123"));
        assert_eq!(
            err.status_and_message(),
            (StatusCode::BAD_REQUEST, "malformatted id".to_string())
        );
    }

    #[test]
    fn test_validation_message_is_forwarded() {
        let validation = ValidationError::new(vec![FieldError::required("number")]);
        let expected = validation.to_string();
        let err = ApiError::from(Error::from(validation));
        assert_eq!(
            err.status_and_message(),
            (StatusCode::BAD_REQUEST, expected)
        );
    }

    #[test]
    fn test_unrecognized_failure_is_internal() {
        let err = ApiError::from(Error::internal("disk on fire"));
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!message.contains("disk"));
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::ContentMissing.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
