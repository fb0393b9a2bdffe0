use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

use crate::error::DownloadError;

const USER_AGENT: &str = concat!("cover-matrix/", env!("CARGO_PKG_VERSION"));
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);

pub trait CoverFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError>;
}

pub struct HttpCoverFetcher {
    client: reqwest::blocking::Client,
}

impl HttpCoverFetcher {
    pub fn new() -> Result<Self, DownloadError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(DOWNLOAD_TIMEOUT)
            .build()?;

        Ok(Self { client })
    }
}

impl CoverFetcher for HttpCoverFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        let bytes = response.bytes()?;

        let cover = cover_from_response(status, &bytes)?;
        debug!(url, size = cover.len(), "downloaded cover");
        Ok(cover)
    }
}

/// Accept a download only when it succeeded and carried a body.
pub fn cover_from_response(status: StatusCode, bytes: &[u8]) -> Result<Vec<u8>, DownloadError> {
    if !status.is_success() {
        return Err(DownloadError::Status(status.as_u16()));
    }
    if bytes.is_empty() {
        return Err(DownloadError::Empty);
    }
    Ok(bytes.to_vec())
}
