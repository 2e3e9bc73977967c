//! Run one catalog lookup and print the normalized result as JSON.
//! Usage:
//!   cargo run --bin lookup_probe -- "Godzila Minus One" 2023
//! Requires TMDB_ACCESS in the environment (.env supported).

use anyhow::{Context, Result};
use dotenvy::dotenv;
use filmvault::config::Config;
use filmvault::lookup::MovieLookupService;
use filmvault::models::LookupPayload;
use filmvault::tmdb::TmdbClient;
use std::env;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_target(false)
        .compact()
        .init();

    let mut args = env::args().skip(1);
    let title = args
        .next()
        .context("usage: lookup_probe <title> [year]")?;
    let year = args
        .next()
        .map(|y| y.parse::<i32>())
        .transpose()
        .context("year must be a number")?;

    let config = Config::from_env()?;
    let tmdb = Arc::new(TmdbClient::new(&config.tmdb)?);
    let service = MovieLookupService::new(tmdb, config.tmdb.image_base.clone());

    let result = service.lookup_movie(&title, year).await;
    let rendered = serde_json::to_string_pretty(&LookupPayload::from(&result))
        .context("Failed to render lookup result")?;
    println!("{rendered}");
    Ok(())
}
