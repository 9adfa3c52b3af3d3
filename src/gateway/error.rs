use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::PRODO_STATUS_HEADER;
use crate::gate::GateError;
use crate::jobs::JobError;
use crate::pipeline::PipelineError;

/// Seconds suggested to overloaded clients before retrying.
pub const RETRY_AFTER_SECS: u64 = 1;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("service overloaded: no capacity after {waited_ms}ms")]
    Overloaded { waited_ms: u64 },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("pipeline failed: {0}")]
    PipelineFailed(String),

    #[error("job queue error: {0}")]
    JobQueue(String),
}

impl From<GateError> for GatewayError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::Overloaded { waited_ms } => Self::Overloaded { waited_ms },
        }
    }
}

impl From<PipelineError> for GatewayError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidRequest(msg) => Self::InvalidRequest(msg),
            other => Self::PipelineFailed(other.to_string()),
        }
    }
}

impl From<JobError> for GatewayError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::InvalidRequest(msg) => Self::InvalidRequest(msg),
            other => Self::JobQueue(other.to_string()),
        }
    }
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, prodo_status) = match &self {
            GatewayError::Overloaded { .. } => (StatusCode::TOO_MANY_REQUESTS, "overloaded"),
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            GatewayError::JobNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            GatewayError::PipelineFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "pipeline_error")
            }
            GatewayError::JobQueue(_) => (StatusCode::INTERNAL_SERVER_ERROR, "job_queue_error"),
        };

        let mut headers = HeaderMap::new();
        headers.insert(PRODO_STATUS_HEADER, HeaderValue::from_static(prodo_status));
        if matches!(self, GatewayError::Overloaded { .. }) {
            headers.insert(RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECS));
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, headers, body).into_response()
    }
}
