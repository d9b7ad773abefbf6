use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kitten_core::ValidationError;
use kitten_pipeline::PipelineError;
use std::time::Duration;

/// An HTTP error rendered as `{"detail": "<message>"}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Speech generation failed: {:#}", err),
        )
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            StatusCode::GATEWAY_TIMEOUT,
            format!("Speech generation timed out after {}s", after.as_secs()),
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let status = match &err {
            PipelineError::Validation(ValidationError::TooLong { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            PipelineError::Validation(_) | PipelineError::UnknownVoice(_) => {
                StatusCode::BAD_REQUEST
            }
            PipelineError::EngineNotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            PipelineError::Cancelled => StatusCode::GATEWAY_TIMEOUT,
            PipelineError::NoSegmentsProduced
            | PipelineError::Synthesis { .. }
            | PipelineError::Assembly(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("{} {}", self.status.as_u16(), self.detail);
        } else {
            tracing::debug!("{} {}", self.status.as_u16(), self.detail);
        }
        (self.status, Json(serde_json::json!({ "detail": self.detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kitten_core::{EngineNotReady, UnknownVoice};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (PipelineError::from(ValidationError::EmptyInput), 400),
            (
                PipelineError::from(ValidationError::TooShort { min: 3, actual: 1 }),
                400,
            ),
            (
                PipelineError::from(ValidationError::TooLong {
                    limit: 50_000,
                    actual: 60_000,
                }),
                413,
            ),
            (
                PipelineError::from(UnknownVoice {
                    name: "x".into(),
                    available: vec![],
                }),
                400,
            ),
            (PipelineError::from(EngineNotReady), 503),
            (PipelineError::NoSegmentsProduced, 500),
            (PipelineError::Cancelled, 504),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status().as_u16(), expected);
        }
    }

    #[test]
    fn test_too_long_detail_names_sizes() {
        let err = ApiError::from(PipelineError::from(ValidationError::TooLong {
            limit: 50_000,
            actual: 60_000,
        }));
        assert!(err.detail().contains("50000"));
        assert!(err.detail().contains("60000"));
    }

    #[test]
    fn test_synthesis_detail_names_chunk() {
        let err = ApiError::from(PipelineError::Synthesis {
            chunk_index: 4,
            chunk_count: 7,
            cause: anyhow::anyhow!("boom"),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.detail().contains("chunk 4 of 7"));
    }
}
