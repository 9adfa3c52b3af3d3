use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::gateway::error::GatewayError;
use crate::gateway::state::AppState;
use crate::pipeline::{IndexRequest, QueryRequest};

/// Reply to an index request that was queued instead of run.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundAccepted {
    pub job_id: String,
    pub background: bool,
}

#[derive(Debug, Deserialize)]
pub struct RepoParams {
    #[serde(rename = "repoId", default)]
    pub repo_id: Option<String>,
}

/// Outcome of a namespace delete. Backend failures are reported here, not as an
/// HTTP error.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn parse_body<T: serde::de::DeserializeOwned>(body: serde_json::Value) -> Result<T, GatewayError> {
    serde_json::from_value(body)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request schema: {}", e)))
}

#[instrument(skip(state, body))]
pub async fn index_handler(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, GatewayError> {
    let request: IndexRequest = parse_body(body)?;

    if state.background_indexing {
        let job_id = state.jobs.submit(request).await?;
        return Ok((
            StatusCode::ACCEPTED,
            Json(BackgroundAccepted {
                job_id,
                background: true,
            }),
        )
            .into_response());
    }

    let _permit = state.gate.try_acquire(state.acquire_timeout).await?;
    let result = state.pipeline.index_repo(&request).await?;
    Ok(Json(result).into_response())
}

#[instrument(skip(state, body))]
pub async fn query_handler(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, GatewayError> {
    let request: QueryRequest = parse_body(body)?;

    let _permit = state.gate.try_acquire(state.acquire_timeout).await?;
    let response = state.pipeline.query(&request).await?;
    Ok(Json(response).into_response())
}

/// Deletes every vector in `?repoId=`. Serves both `/rag/reset` and `/rag/delete`.
#[instrument(skip(state))]
pub async fn delete_handler(
    State(state): State<AppState>,
    Query(params): Query<RepoParams>,
) -> Result<Json<DeleteResponse>, GatewayError> {
    let namespace = params
        .repo_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| GatewayError::InvalidRequest("repoId is required".to_string()))?;

    let response = match state.pipeline.reset_repo(&namespace).await {
        Ok(()) => DeleteResponse {
            deleted: true,
            namespace,
            error: None,
        },
        Err(e) => {
            warn!(namespace = %namespace, error = %e, "namespace delete failed");
            DeleteResponse {
                deleted: false,
                namespace,
                error: Some(e.to_string()),
            }
        }
    };
    Ok(Json(response))
}

/// Live record from the queue, else the persisted document.
#[instrument(skip(state))]
pub async fn job_status_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Response, GatewayError> {
    if let Some(record) = state.jobs.get_status(&job_id) {
        return Ok(Json(record).into_response());
    }

    debug!("job not in memory, checking metadata store");
    match state.pipeline.metadata().load_job(&job_id).await {
        Some(doc) => Ok(Json(doc).into_response()),
        None => Err(GatewayError::JobNotFound(job_id)),
    }
}
