//! HTTP service endpoint.
//!
//! Exposes the recommendation pipeline as a small JSON API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/recommend` | Full query path: `{"query": "..."}` → recommendation bundle |
//! | `POST` | `/search` | Retrieval only: `{"query": "..."}` → candidates |
//! | `GET`  | `/summary?title=...` | Synopsis for a title from the corpus |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `upstream_error` (502, an embedding or
//! completion backend failed), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, warn};

use librarian_core::retrieve::Retrieval;
use librarian_core::{GatewayError, Librarian, Recommendation};

use crate::app::open_librarian;
use crate::config::Config;

/// Shared state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    librarian: Arc<Librarian>,
}

/// Build the router over an assembled [`Librarian`].
pub fn router(librarian: Arc<Librarian>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/recommend", post(handle_recommend))
        .route("/search", post(handle_search))
        .route("/summary", get(handle_summary))
        .layer(cors)
        .with_state(AppState { librarian })
}

/// Starts the HTTP server on `[server].bind` and runs until the process is
/// terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let librarian = Arc::new(open_librarian(config).await?);
    let app = router(librarian);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    println!("Librarian server listening on http://{}", config.server.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

/// Upstream gateway failures become 502; everything else is a 500.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        let message = format!("{:#}", err);
        if err.downcast_ref::<GatewayError>().is_some() {
            warn!(error = %message, "upstream failure");
            AppError {
                status: StatusCode::BAD_GATEWAY,
                code: "upstream_error",
                message,
            }
        } else {
            error!(error = %message, "request failed");
            AppError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "internal",
                message,
            }
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /recommend, POST /search ============

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
}

fn require_query(req: &QueryRequest) -> Result<&str, AppError> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err(bad_request("query must not be empty"));
    }
    Ok(query)
}

async fn handle_recommend(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<Recommendation>, AppError> {
    let query = require_query(&req)?;
    Ok(Json(state.librarian.recommend(query).await?))
}

async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<Retrieval>, AppError> {
    let query = require_query(&req)?;
    Ok(Json(state.librarian.search(query).await?))
}

// ============ GET /summary ============

#[derive(Deserialize)]
struct SummaryParams {
    #[serde(default)]
    title: String,
}

#[derive(Serialize)]
struct SummaryResponse {
    title: String,
    summary: String,
}

async fn handle_summary(
    State(state): State<AppState>,
    Query(params): Query<SummaryParams>,
) -> Result<Json<SummaryResponse>, AppError> {
    let title = params.title.trim();
    if title.is_empty() {
        return Err(bad_request("title must not be empty"));
    }
    Ok(Json(SummaryResponse {
        title: title.to_string(),
        summary: state.librarian.summary_for(title),
    }))
}
