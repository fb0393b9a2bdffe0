//! Error types for each stage of the poll loop.
//!
//! Library modules return these `thiserror` enums; `main` wraps the fatal
//! ones in `anyhow` for reporting.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cover directory {path} is unreadable: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write cover {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {0}")]
    Status(u16),

    #[error("empty response body")]
    Empty,
}

#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("matrix driver: {0}")]
    Driver(String),

    #[error("output: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that end the process.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("missing Spotify credentials (set SPOTIPY_CLIENT_ID, SPOTIPY_CLIENT_SECRET and SPOTIPY_REDIRECT_URI)")]
    MissingCredentials,

    #[error("failed to build Spotify client: {0}")]
    ProviderSetup(#[source] ProviderError),

    #[error("giving up after {attempts} failed recovery attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}
