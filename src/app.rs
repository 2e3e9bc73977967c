use crate::config::Config;
use crate::error::CoreError;
use crate::lookup::MovieLookupService;
use crate::models::{LookupPayload, MovieLookupResult, Ownership};
use crate::ownership::OwnershipService;
use crate::store::OdsRecordStore;
use crate::tmdb::TmdbClient;
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use constant_time_eq::constant_time_eq;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub lookup: Arc<MovieLookupService>,
    pub ownership: Arc<OwnershipService>,
    pub api_token: Arc<str>,
}

pub async fn run_server(config: Config) -> Result<()> {
    let api_token = config
        .api_token
        .clone()
        .ok_or_else(|| anyhow::anyhow!("FILMVAULT_API_TOKEN must be set"))?;

    let tmdb = Arc::new(TmdbClient::new(&config.tmdb)?);
    let lookup = Arc::new(MovieLookupService::new(tmdb, config.tmdb.image_base.clone()));

    let store = Arc::new(OdsRecordStore::from_config(&config.store));
    info!(
        "Using movie list {} (sheet '{}')",
        store.path().display(),
        config.store.sheet
    );
    let ownership = Arc::new(OwnershipService::new(store));

    let state = AppState {
        lookup,
        ownership,
        api_token: api_token.into(),
    };
    let app = build_router(state);

    info!("Listening on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/movies", get(list_movies))
        .route("/movies/lookup", get(lookup_movie))
        .route("/movies/ownership", post(set_ownership))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    keyword: String,
}

#[derive(Debug, Deserialize)]
struct LookupQuery {
    title: String,
    year: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OwnershipRequest {
    title: String,
    year: i32,
    owned: bool,
}

type ApiResponse = (StatusCode, Json<Value>);

async fn list_movies(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> ApiResponse {
    if let Err(denied) = authorize(&headers, &state.api_token) {
        return denied;
    }
    match state.ownership.list_movies(&query.keyword).await {
        Ok(movies) => (StatusCode::OK, Json(json!(movies))),
        Err(e) => core_failure(e),
    }
}

async fn lookup_movie(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<LookupQuery>,
) -> ApiResponse {
    if let Err(denied) = authorize(&headers, &state.api_token) {
        return denied;
    }
    let title = query.title.trim();
    if title.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"status": "error", "message": "title must not be empty"})),
        );
    }

    let result = state.lookup.lookup_movie(title, query.year).await;
    let status = match &result {
        MovieLookupResult::Found(_) => StatusCode::OK,
        MovieLookupResult::NotFound => StatusCode::NOT_FOUND,
        MovieLookupResult::Unavailable(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(json!(LookupPayload::from(&result))))
}

async fn set_ownership(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<OwnershipRequest>,
) -> ApiResponse {
    if let Err(denied) = authorize(&headers, &state.api_token) {
        return denied;
    }
    let desired = Ownership::from(request.owned);
    match state
        .ownership
        .set_ownership(&request.title, request.year, desired)
        .await
    {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({"outcome": outcome.kind(), "message": outcome.to_string()})),
        ),
        Err(e) => core_failure(e),
    }
}

fn authorize(headers: &HeaderMap, token: &str) -> Result<(), ApiResponse> {
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);
    match presented {
        Some(p) if p.len() == token.len() && constant_time_eq(p.as_bytes(), token.as_bytes()) => {
            Ok(())
        }
        _ => {
            warn!("Rejecting request with invalid or missing API token");
            Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({"status": "error", "message": "Invalid or missing API token"})),
            ))
        }
    }
}

fn core_failure(err: CoreError) -> ApiResponse {
    error!("Request failed: {}", err);
    let status = match err {
        CoreError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        CoreError::CatalogUnavailable(_) => StatusCode::BAD_GATEWAY,
    };
    (
        status,
        Json(json!({"status": "error", "message": err.to_string()})),
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
