//! HTTP gateway (axum) over the indexing and query pipelines.
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /` | fixed greeting |
//! | `GET /rag/health` | `{"status":"ok"}` |
//! | `POST /rag/index` | [`index_handler`] |
//! | `POST /rag/query` | [`query_handler`] |
//! | `DELETE /rag/reset`, `DELETE /rag/delete` | [`delete_handler`] |
//! | `GET /rag/jobs/{job_id}` | [`job_status_handler`] |

pub mod error;
pub mod handler;
pub mod state;


use axum::{
    Json, Router,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use handler::{delete_handler, index_handler, job_status_handler, query_handler};
pub use state::AppState;

/// Response header carrying a short machine-readable outcome on errors.
pub const PRODO_STATUS_HEADER: &str = "x-prodo-status";

pub const HOME_GREETING: &str = "Hello, PRODO RAG!";

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/rag/health", get(health_handler))
        .route("/rag/index", post(index_handler))
        .route("/rag/query", post(query_handler))
        .route("/rag/reset", delete(delete_handler))
        .route("/rag/delete", delete(delete_handler))
        .route("/rag/jobs/{job_id}", get(job_status_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn home_handler() -> &'static str {
    HOME_GREETING
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
