use std::sync::Arc;
use tracing::{info, warn};

use crate::error::CatalogError;
use crate::models::{MovieLookup, MovieLookupResult, SearchCandidate};
use crate::normalize::{normalize_credits, normalize_details, DEFAULT_TOP_CAST};
use crate::resolve::TitleResolver;
use crate::tmdb::CatalogApi;

/// Title in, normalized details and credits out.
#[derive(Clone)]
pub struct MovieLookupService {
    catalog: Arc<dyn CatalogApi>,
    resolver: TitleResolver,
    image_base: String,
    top_cast: usize,
}

impl MovieLookupService {
    pub fn new(catalog: Arc<dyn CatalogApi>, image_base: impl Into<String>) -> Self {
        Self {
            resolver: TitleResolver::new(catalog.clone()),
            catalog,
            image_base: image_base.into(),
            top_cast: DEFAULT_TOP_CAST,
        }
    }

    pub fn with_top_cast(mut self, top_cast: usize) -> Self {
        self.top_cast = top_cast;
        self
    }

    pub async fn lookup_movie(&self, title: &str, year: Option<i32>) -> MovieLookupResult {
        match self.try_lookup(title, year).await {
            Ok(Some(found)) => MovieLookupResult::Found(Box::new(found)),
            Ok(None) => {
                info!("No catalog match for '{}' ({:?})", title, year);
                MovieLookupResult::NotFound
            }
            Err(e) => {
                warn!("Catalog lookup for '{}' failed: {}", title, e);
                MovieLookupResult::Unavailable(format!("Catalog unavailable: {e}"))
            }
        }
    }

    async fn try_lookup(
        &self,
        title: &str,
        year: Option<i32>,
    ) -> Result<Option<MovieLookup>, CatalogError> {
        let Some(candidate) = self.resolver.resolve(title, year).await? else {
            return Ok(None);
        };
        log_match(title, &candidate);

        let raw_details = self.catalog.fetch_details(candidate.id).await?;
        let details = normalize_details(&raw_details);
        let raw_credits = self.catalog.fetch_credits(candidate.id).await?;
        let credits = normalize_credits(&raw_credits, self.top_cast);

        Ok(Some(MovieLookup {
            poster: self.poster_url(&details.poster_path),
            details,
            credits,
        }))
    }

    fn poster_url(&self, poster_path: &str) -> String {
        if poster_path.is_empty() {
            String::new()
        } else {
            format!("{}{}", self.image_base, poster_path)
        }
    }
}

fn log_match(query: &str, candidate: &SearchCandidate) {
    info!(
        "Matched '{}' -> '{}' (tmdb id {}, year {:?})",
        query,
        candidate.title,
        candidate.id,
        candidate.release_year()
    );
}
