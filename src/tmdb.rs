use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::TmdbConfig;
use crate::error::CatalogError;
use crate::models::SearchCandidate;

/// Undecoded catalog response; only `normalize` looks inside it.
pub type RawPayload = Value;

#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn search(
        &self,
        title: &str,
        year: Option<i32>,
        include_adult: bool,
    ) -> Result<Vec<SearchCandidate>, CatalogError>;
    async fn fetch_details(&self, id: i64) -> Result<RawPayload, CatalogError>;
    async fn fetch_credits(&self, id: i64) -> Result<RawPayload, CatalogError>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.access_token))
            .context("TMDB access token is not a valid header value")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let user_agent = format!("filmvault/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(config.timeout.min(std::time::Duration::from_secs(5)))
            .timeout(config.timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json(&self, url: &str) -> Result<Value, CatalogError> {
        let res = self.client.get(url).send().await.map_err(|e| {
            warn!("TMDB request to {} failed: {}", url, e);
            CatalogError::from(e)
        })?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            warn!("TMDB returned {} for {}", status, url);
            return Err(CatalogError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn search(
        &self,
        title: &str,
        year: Option<i32>,
        include_adult: bool,
    ) -> Result<Vec<SearchCandidate>, CatalogError> {
        let mut url = format!(
            "{}/search/movie?query={}&include_adult={}",
            self.base_url,
            urlencoding::encode(title),
            include_adult
        );
        if let Some(year) = year.filter(|y| *y > 0) {
            url.push_str(&format!("&primary_release_year={year}"));
        }
        let data = self.get_json(&url).await?;
        let candidates = parse_search_results(&data);
        debug!("TMDB search '{}' returned {} candidates", title, candidates.len());
        Ok(candidates)
    }

    async fn fetch_details(&self, id: i64) -> Result<RawPayload, CatalogError> {
        let url = format!("{}/movie/{id}", self.base_url);
        self.get_json(&url).await
    }

    async fn fetch_credits(&self, id: i64) -> Result<RawPayload, CatalogError> {
        let url = format!("{}/movie/{id}/credits", self.base_url);
        self.get_json(&url).await
    }
}

/// Entries without an integer `id` cannot be fetched later and are skipped.
pub fn parse_search_results(data: &Value) -> Vec<SearchCandidate> {
    data.get("results")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .filter_map(|r| {
                    let id = r.get("id").and_then(Value::as_i64)?;
                    Some(SearchCandidate {
                        id,
                        title: r
                            .get("title")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        release_date: r
                            .get("release_date")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}
