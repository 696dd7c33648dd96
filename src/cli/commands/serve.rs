//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for search and library listing.

use super::{create_embedder, open_store};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::SampledexError;
use crate::search::{QueryEngine, SearchHit};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared application state.
struct AppState {
    engine: QueryEngine,
    default_top_k: usize,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    // The store must exist before the server accepts queries.
    let store = open_store(&settings)?;
    let engine = QueryEngine::new(create_embedder(&settings)?, store);

    let state = Arc::new(AppState {
        engine,
        default_top_k: settings.server.top_k,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state).layer(cors);

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Sampledex API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Search", "POST /search");
    Output::kv("List Samples", "GET  /samples");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/search", post(search))
        .route("/samples", get(list_samples))
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    top_k: Option<usize>,
}

#[derive(Serialize, Deserialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

#[derive(Serialize)]
struct SampleInfo {
    filename: Option<String>,
    route: String,
    duration_seconds: Option<f64>,
}

#[derive(Serialize)]
struct SampleListResponse {
    samples: Vec<SampleInfo>,
    total: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(e: &SampledexError) -> axum::response::Response {
    let status = match e {
        SampledexError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        SampledexError::Embedding(_) | SampledexError::StoreUnavailable { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> impl IntoResponse {
    let top_k = req.top_k.unwrap_or(state.default_top_k);

    match state.engine.search(&req.query, top_k).await {
        Ok(results) => Json(SearchResponse { results }).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn list_samples(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.engine.vector_store().list().await {
        Ok(samples) => Json(SampleListResponse {
            total: samples.len(),
            samples: samples
                .into_iter()
                .map(|s| SampleInfo {
                    filename: s.filename,
                    route: s.identity,
                    duration_seconds: s.duration_seconds,
                })
                .collect(),
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}
