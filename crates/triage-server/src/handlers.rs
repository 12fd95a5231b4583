//! HTTP request handlers
//!
//! Thin adapters: each handler turns the request into a pipeline call and
//! the pipeline's answer into JSON.

use crate::error::AppError;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    response::Json,
    routing::{get, post},
    Router as AxumRouter,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use triage_domain::{ProcessingContext, RawInput, ThreadId};
use triage_pipeline::{Pipeline, Submission};
use triage_store::StoreHealth;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The submission pipeline
    pub pipeline: Arc<Pipeline>,
}

/// Query parameters for raw uploads
#[derive(Debug, Default, Deserialize)]
pub struct ProcessParams {
    /// Origin tag; `file_upload` when absent
    pub source: Option<String>,
    /// Original file name, used as a format hint
    pub filename: Option<String>,
}

/// Body of `POST /process_api`
#[derive(Debug, Deserialize)]
pub struct ApiSubmission {
    /// Origin tag; `api_call` when absent
    #[serde(default)]
    pub source: Option<String>,
    /// Document text, or a JSON value submitted as-is
    pub input_data: Value,
}

/// Query parameters for listing
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Maximum number of contexts
    pub limit: Option<usize>,
}

/// Listing response
#[derive(Debug, Serialize, Deserialize)]
pub struct ContextList {
    /// Number of contexts returned
    pub count: usize,
    /// Contexts, oldest first
    pub contexts: Vec<ProcessingContext>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy", or "degraded" once the store runs on its local backend
    pub status: &'static str,
    /// Store backend state
    pub store: StoreHealth,
}

/// Service description served at `/`
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    /// Service name
    pub service: &'static str,
    /// Crate version
    pub version: &'static str,
    /// Available routes
    pub endpoints: Vec<&'static str>,
}

/// POST /process - Submit a raw document
async fn process_upload(
    State(state): State<AppState>,
    Query(params): Query<ProcessParams>,
    body: Bytes,
) -> Result<Json<Submission>, AppError> {
    let mut input = RawInput::new(body.to_vec());
    if let Some(filename) = params.filename.filter(|f| !f.trim().is_empty()) {
        input = input.with_filename(filename);
    }
    let source = params.source.as_deref().unwrap_or("file_upload");

    let submission = state.pipeline.submit(input, Some(source)).await?;
    Ok(Json(submission))
}

/// POST /process_api - Submit a document wrapped in JSON
async fn process_api(
    State(state): State<AppState>,
    Json(request): Json<ApiSubmission>,
) -> Result<Json<Submission>, AppError> {
    let input = match request.input_data {
        Value::String(text) => RawInput::from(text),
        Value::Null => {
            return Err(AppError::BadRequest("input_data must not be null".to_string()));
        }
        other => RawInput::from(other.to_string()),
    };
    let source = request.source.as_deref().unwrap_or("api_call");

    let submission = state.pipeline.submit(input, Some(source)).await?;
    Ok(Json(submission))
}

/// GET /context/:thread_id - Full processing context
async fn get_context(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Json<ProcessingContext>, AppError> {
    let id: ThreadId = thread_id.parse().map_err(AppError::BadRequest)?;
    let ctx = state.pipeline.fetch(id).await?;
    Ok(Json(ctx))
}

/// GET /contexts - Bounded listing for debugging
async fn list_contexts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ContextList>, AppError> {
    let contexts = state.pipeline.list(params.limit).await?;
    Ok(Json(ContextList {
        count: contexts.len(),
        contexts,
    }))
}

/// GET /health - Store reachability
///
/// Always answers 200; a degraded store still accepts submissions.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.pipeline.health().await;
    let status = if store.degraded { "degraded" } else { "healthy" };
    Json(HealthResponse { status, store })
}

/// GET / - Service description
async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "triage",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            "POST /process",
            "POST /process_api",
            "GET /context/:thread_id",
            "GET /contexts",
            "GET /health",
        ],
    })
}

/// Create the axum router with all routes
///
/// Bodies up to twice the pipeline's input limit are read so that JSON
/// and base64 envelopes reach the pipeline's own size check.
pub fn create_router(state: AppState) -> AxumRouter {
    let body_limit = state.pipeline.config().max_input_bytes.saturating_mul(2);
    AxumRouter::new()
        .route("/", get(service_info))
        .route("/process", post(process_upload))
        .route("/process_api", post(process_api))
        .route("/context/:thread_id", get(get_context))
        .route("/contexts", get(list_contexts))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt; // for oneshot
    use triage_llm::OfflineCapability;
    use triage_pipeline::PipelineConfig;
    use triage_store::{ContextStore, StoreConfig};

    fn create_test_state() -> AppState {
        let store = Arc::new(ContextStore::in_memory(&StoreConfig::default()));
        let config = PipelineConfig {
            max_input_bytes: 4096,
            ..Default::default()
        };
        AppState {
            pipeline: Arc::new(Pipeline::new(store, Arc::new(OfflineCapability), config)),
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(create_test_state());

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_service_info() {
        let app = create_router(create_test_state());

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_process_upload() {
        let app = create_router(create_test_state());

        let request = Request::builder()
            .method("POST")
            .uri("/process?source=file_upload&filename=order.json")
            .body(Body::from(r#"{"order_id": 1}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_empty_upload_rejected() {
        let app = create_router(create_test_state());

        let request = Request::builder()
            .method("POST")
            .uri("/process")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_thread_id() {
        let app = create_router(create_test_state());

        let request = Request::builder()
            .uri("/context/not-a-uuid")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_null_input_data_rejected() {
        let app = create_router(create_test_state());

        let request = Request::builder()
            .method("POST")
            .uri("/process_api")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"input_data": null}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
