//! Error types shared by the store, the catalog client and the services on top of them.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the backing spreadsheet.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("movie list not found at {0}")]
    Missing(PathBuf),

    #[error("failed to read movie list: {0}")]
    Read(String),

    #[error("movie list failed validation: {0}")]
    Schema(String),

    #[error("failed to write movie list: {0}")]
    Write(String),
}

/// Failures talking to the remote catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Transport(String),

    #[error("catalog request timed out")]
    Timeout,

    #[error("catalog returned HTTP {status} for {url}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("catalog returned malformed JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CatalogError::Timeout
        } else {
            CatalogError::Transport(err.to_string())
        }
    }
}

/// What callers of the core see. Not-found and no-op outcomes are results, not errors.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),

    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(#[from] CatalogError),
}
