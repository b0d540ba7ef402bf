//! JSON error responses for API handlers

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::Error;

/// API errors
#[derive(Debug)]
pub enum ApiError {
    NotConfigured(String),
    BadRequest(String),
    NotFound(String),
    TranscriptionFailed(String),
    SynthesisFailed(String),
    /// Request could not be extracted (bad JSON, bad id, oversized body)
    Rejected(StatusCode, String),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        match error {
            Error::Config(msg) => Self::NotConfigured(msg),
            Error::EmptyUtterance => Self::BadRequest(error.to_string()),
            Error::SessionNotFound(_) | Error::NotFound(_) => Self::NotFound(error.to_string()),
            Error::Transcription(msg) => Self::TranscriptionFailed(msg),
            Error::Synthesis(msg) => Self::SynthesisFailed(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message) = match self {
            Self::NotConfigured(msg) => (StatusCode::SERVICE_UNAVAILABLE, "not_configured", msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            // Unusable audio is the caller's problem, not ours
            Self::TranscriptionFailed(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "transcription_failed", msg)
            }
            Self::SynthesisFailed(msg) => (StatusCode::BAD_GATEWAY, "synthesis_failed", msg),
            Self::Rejected(status, msg) if status == StatusCode::PAYLOAD_TOO_LARGE => {
                (status, "payload_too_large", msg)
            }
            Self::Rejected(status, msg) => (status, "invalid_request", msg),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "internal API error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg)
            }
        };

        (status, Json(ErrorResponse { error: ErrorBody { code, message } })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_domain_errors_to_status() {
        let cases = [
            (Error::EmptyUtterance, StatusCode::BAD_REQUEST),
            (Error::SessionNotFound("x".to_string()), StatusCode::NOT_FOUND),
            (Error::Config("no key".to_string()), StatusCode::SERVICE_UNAVAILABLE),
            (Error::Transcription("silent".to_string()), StatusCode::UNPROCESSABLE_ENTITY),
            (Error::Synthesis("503".to_string()), StatusCode::BAD_GATEWAY),
        ];

        for (error, status) in cases {
            let response = ApiError::from(error).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[test]
    fn rejections_keep_their_status() {
        let response =
            ApiError::Rejected(StatusCode::UNPROCESSABLE_ENTITY, "unknown variant".to_string())
                .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response =
            ApiError::Rejected(StatusCode::PAYLOAD_TOO_LARGE, "too big".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
