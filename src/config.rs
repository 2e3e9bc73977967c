use anyhow::{anyhow, Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TMDB_BASE: &str = "https://api.themoviedb.org/3";
const DEFAULT_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MOVIE_LIST: &str = "GodZilla_Films.ods";
const DEFAULT_SHEET: &str = "Movie List";
const DEFAULT_BIND: &str = "0.0.0.0:3146";

/// Catalog connection settings, handed to `TmdbClient::new`.
#[derive(Debug, Clone)]
pub struct TmdbConfig {
    pub access_token: String,
    pub base_url: String,
    pub image_base: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub sheet: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub tmdb: TmdbConfig,
    pub store: StoreConfig,
    pub api_token: Option<String>,
    pub bind: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let access_token = get("TMDB_ACCESS")
            .ok_or_else(|| anyhow!("Missing required environment variable: TMDB_ACCESS"))?;
        let timeout_secs = match get("TMDB_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("TMDB_TIMEOUT_SECS is not a number: {raw}"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let bind = get("FILMVAULT_BIND")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse::<SocketAddr>()
            .context("FILMVAULT_BIND is not a socket address")?;

        Ok(Self {
            tmdb: TmdbConfig {
                access_token,
                base_url: trim_slash(get("TMDB_BASE_URL").unwrap_or_else(|| DEFAULT_TMDB_BASE.into())),
                image_base: trim_slash(
                    get("TMDB_IMAGE_BASE").unwrap_or_else(|| DEFAULT_IMAGE_BASE.into()),
                ),
                timeout: Duration::from_secs(timeout_secs),
            },
            store: StoreConfig {
                path: PathBuf::from(get("MOVIE_LIST_PATH").unwrap_or_else(|| DEFAULT_MOVIE_LIST.into())),
                sheet: get("MOVIE_LIST_SHEET").unwrap_or_else(|| DEFAULT_SHEET.into()),
            },
            api_token: get("FILMVAULT_API_TOKEN"),
            bind,
        })
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_fill_optional_values() {
        let config = Config::from_lookup(lookup(&[("TMDB_ACCESS", "token")])).unwrap();
        assert_eq!(config.tmdb.base_url, DEFAULT_TMDB_BASE);
        assert_eq!(config.tmdb.image_base, DEFAULT_IMAGE_BASE);
        assert_eq!(config.tmdb.timeout, Duration::from_secs(10));
        assert_eq!(config.store.sheet, "Movie List");
        assert!(config.api_token.is_none());
        assert_eq!(config.bind.port(), 3146);
    }

    #[test]
    fn missing_token_is_an_error() {
        let err = Config::from_lookup(lookup(&[("TMDB_ACCESS", "  ")])).unwrap_err();
        assert!(err.to_string().contains("TMDB_ACCESS"));
    }

    #[test]
    fn overrides_are_respected() {
        let config = Config::from_lookup(lookup(&[
            ("TMDB_ACCESS", "token"),
            ("TMDB_BASE_URL", "http://127.0.0.1:9000/"),
            ("TMDB_TIMEOUT_SECS", "3"),
            ("MOVIE_LIST_PATH", "/data/films.ods"),
            ("FILMVAULT_API_TOKEN", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.tmdb.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.tmdb.timeout, Duration::from_secs(3));
        assert_eq!(config.store.path, PathBuf::from("/data/films.ods"));
        assert_eq!(config.api_token.as_deref(), Some("secret"));
    }

    #[test]
    fn rejects_bad_timeout() {
        assert!(Config::from_lookup(lookup(&[
            ("TMDB_ACCESS", "token"),
            ("TMDB_TIMEOUT_SECS", "soon"),
        ]))
        .is_err());
    }
}
