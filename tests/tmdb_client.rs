use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use filmvault::config::TmdbConfig;
use filmvault::error::CatalogError;
use filmvault::lookup::MovieLookupService;
use filmvault::tmdb::{CatalogApi, TmdbClient};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const TOKEN: &str = "catalog-token";

#[derive(Clone, Default)]
struct Seen {
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    auth: Arc<Mutex<Vec<String>>>,
}

async fn search(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    seen.auth.lock().unwrap().push(
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string(),
    );
    seen.queries.lock().unwrap().push(params);
    Json(json!({
        "page": 1,
        "results": [
            { "id": 1678, "title": "Godzilla", "release_date": "1954-11-03" },
            { "id": 940721, "title": "Godzilla Minus One", "release_date": "2023-11-03" }
        ],
        "total_results": 2
    }))
}

async fn details(Path(id): Path<i64>) -> Result<Json<Value>, StatusCode> {
    match id {
        940721 => Ok(Json(json!({
            "id": 940721,
            "title": "Godzilla Minus One",
            "poster_path": "/poster.jpg",
            "vote_average": 7.6
        }))),
        500 => Err(StatusCode::INTERNAL_SERVER_ERROR),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

async fn credits(Path(id): Path<i64>) -> Json<Value> {
    Json(json!({
        "id": id,
        "cast": [{ "name": "Ryunosuke Kamiki", "character": "Koichi Shikishima", "order": 0 }],
        "crew": [{ "name": "Takashi Yamazaki", "department": "Directing", "job": "Director" }]
    }))
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({}))
}

async fn spawn_catalog() -> (SocketAddr, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/3/search/movie", get(search))
        .route("/3/movie/:id", get(details))
        .route("/3/movie/:id/credits", get(credits))
        .route("/slow/movie/:id", get(slow))
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, seen)
}

fn config(base_url: String, timeout: Duration) -> TmdbConfig {
    TmdbConfig {
        access_token: TOKEN.to_string(),
        base_url,
        image_base: "https://image.tmdb.org/t/p/w500".to_string(),
        timeout,
    }
}

#[tokio::test]
async fn search_sends_query_year_and_bearer_token() {
    let (addr, seen) = spawn_catalog().await;
    let client = TmdbClient::new(&config(format!("http://{addr}/3"), Duration::from_secs(5))).unwrap();

    let results = client
        .search("Godzilla Minus One", Some(2023), true)
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[1].id, 940721);

    let queries = seen.queries.lock().unwrap().clone();
    assert_eq!(queries[0].get("query").map(String::as_str), Some("Godzilla Minus One"));
    assert_eq!(queries[0].get("primary_release_year").map(String::as_str), Some("2023"));
    assert_eq!(queries[0].get("include_adult").map(String::as_str), Some("true"));
    assert_eq!(seen.auth.lock().unwrap()[0], format!("Bearer {TOKEN}"));
}

#[tokio::test]
async fn search_without_year_omits_filter() {
    let (addr, seen) = spawn_catalog().await;
    let client = TmdbClient::new(&config(format!("http://{addr}/3"), Duration::from_secs(5))).unwrap();
    client.search("Rodan", None, true).await.unwrap();
    let queries = seen.queries.lock().unwrap().clone();
    assert!(!queries[0].contains_key("primary_release_year"));
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let (addr, _) = spawn_catalog().await;
    let client = TmdbClient::new(&config(format!("http://{addr}/3"), Duration::from_secs(5))).unwrap();

    let err = client.fetch_details(500).await.unwrap_err();
    assert!(matches!(err, CatalogError::Status { status: 500, .. }));
    let err = client.fetch_details(42).await.unwrap_err();
    assert!(matches!(err, CatalogError::Status { status: 404, .. }));
}

#[tokio::test]
async fn slow_catalog_times_out() {
    let (addr, _) = spawn_catalog().await;
    let client =
        TmdbClient::new(&config(format!("http://{addr}/slow"), Duration::from_millis(200))).unwrap();
    let err = client.fetch_details(1).await.unwrap_err();
    assert!(matches!(err, CatalogError::Timeout), "got {err:?}");
}

#[tokio::test]
async fn lookup_runs_end_to_end_over_http() {
    let (addr, _) = spawn_catalog().await;
    let cfg = config(format!("http://{addr}/3"), Duration::from_secs(5));
    let client = Arc::new(TmdbClient::new(&cfg).unwrap());
    let service = MovieLookupService::new(client, cfg.image_base.clone());

    let result = service.lookup_movie("Godzila Minus One", Some(2023)).await;
    let found = result.found().expect("lookup should succeed");
    assert_eq!(found.details.title, "Godzilla Minus One");
    assert_eq!(found.poster, "https://image.tmdb.org/t/p/w500/poster.jpg");
    assert_eq!(found.credits.directors[0].name, "Takashi Yamazaki");
    assert_eq!(found.credits.actors.len(), 1);
}
