mod api;
mod auth;

use self::api::SpotifyApi;
use self::auth::SpotifyAuth;
use crate::error::ProviderError;
use crate::models::Playback;
use crate::providers::NowPlayingProvider;
use std::path::PathBuf;
use std::time::Duration;

const USER_AGENT: &str = concat!("cover-matrix/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SpotifyProvider {
    api: SpotifyApi,
}

impl SpotifyProvider {
    pub fn new(
        client_id: String,
        client_secret: String,
        redirect_uri: String,
        token_cache: PathBuf,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let auth = SpotifyAuth::new(
            client.clone(),
            client_id,
            client_secret,
            redirect_uri,
            token_cache,
        );

        Ok(Self {
            api: SpotifyApi::new(client, auth),
        })
    }
}

impl NowPlayingProvider for SpotifyProvider {
    fn authenticate(&mut self) -> Result<(), ProviderError> {
        self.api.auth.authenticate()
    }

    fn currently_playing(&mut self) -> Result<Playback, ProviderError> {
        self.api.currently_playing()
    }
}
