use crate::config::Config;
use crate::error::AppError;
use crate::providers::spotify::SpotifyProvider;

pub fn create_spotify_provider(config: &Config) -> Result<SpotifyProvider, AppError> {
    if !config.has_spotify_credentials() {
        return Err(AppError::MissingCredentials);
    }

    SpotifyProvider::new(
        config.spotify_client_id.clone().unwrap_or_default(),
        config.spotify_client_secret.clone().unwrap_or_default(),
        config.spotify_redirect_uri.clone().unwrap_or_default(),
        config.token_cache.clone(),
    )
    .map_err(AppError::ProviderSetup)
}
