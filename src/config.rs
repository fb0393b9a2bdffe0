use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::app::LoopSettings;

const DEFAULT_COVER_DIR: &str = "covers";
const DEFAULT_IDLE_IMAGE: &str = "unicorn.jpg";
const DEFAULT_TOKEN_CACHE: &str = ".cache";
const DEFAULT_HARDWARE_MAPPING: &str = "regular";
const DEFAULT_BRIGHTNESS: u8 = 80;

#[derive(Debug, Clone)]
pub struct Config {
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub spotify_redirect_uri: Option<String>,
    pub cover_dir: PathBuf,
    pub idle_image: PathBuf,
    pub token_cache: PathBuf,
    pub loop_settings: LoopSettings,
    pub matrix_hardware_mapping: String,
    pub matrix_brightness: u8,
}

impl Config {
    pub fn from_env() -> Self {
        let spotify_client_id = std::env::var("SPOTIPY_CLIENT_ID").ok();
        let spotify_client_secret = std::env::var("SPOTIPY_CLIENT_SECRET").ok();
        let spotify_redirect_uri = std::env::var("SPOTIPY_REDIRECT_URI").ok();

        let path_var = |name: &str, default: &str| {
            PathBuf::from(std::env::var(name).unwrap_or_else(|_| default.to_string()))
        };

        let mut loop_settings = LoopSettings::default();
        if let Some(secs) = parse_var::<u64>("POLL_INTERVAL_SECS") {
            loop_settings.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>("IDLE_TIMEOUT_SECS") {
            loop_settings.idle_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = parse_var::<u32>("MAX_RETRIES") {
            loop_settings.max_retries = retries;
        }

        Self {
            spotify_client_id,
            spotify_client_secret,
            spotify_redirect_uri,
            cover_dir: path_var("COVER_DIR", DEFAULT_COVER_DIR),
            idle_image: path_var("IDLE_IMAGE", DEFAULT_IDLE_IMAGE),
            token_cache: path_var("TOKEN_CACHE", DEFAULT_TOKEN_CACHE),
            loop_settings,
            matrix_hardware_mapping: std::env::var("MATRIX_HARDWARE_MAPPING")
                .unwrap_or_else(|_| DEFAULT_HARDWARE_MAPPING.to_string()),
            matrix_brightness: parse_var::<u8>("MATRIX_BRIGHTNESS")
                .map(|b| b.clamp(1, 100))
                .unwrap_or(DEFAULT_BRIGHTNESS),
        }
    }

    pub fn has_spotify_credentials(&self) -> bool {
        self.spotify_client_id.is_some()
            && self.spotify_client_secret.is_some()
            && self.spotify_redirect_uri.is_some()
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = name, value = %raw, "ignoring invalid value, using default");
            None
        }
    }
}
