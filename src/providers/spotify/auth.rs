use serde::{Deserialize, Serialize};
use std::fs;
use std::io::BufRead;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use crate::error::ProviderError;

const AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const SCOPE: &str = "user-read-currently-playing";
// Refresh this many seconds before the token actually expires
const EXPIRY_MARGIN_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Token as persisted in the cache file. Same layout spotipy uses, so an
/// existing `.cache` keeps working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    pub expires_at: u64,
}

impl CachedToken {
    fn from_response(response: TokenResponse, now: u64, previous_refresh: Option<String>) -> Self {
        Self {
            expires_at: now + response.expires_in,
            access_token: response.access_token,
            token_type: response.token_type,
            expires_in: response.expires_in,
            // Spotify may omit the refresh token when refreshing
            refresh_token: response.refresh_token.or(previous_refresh),
            scope: response.scope,
        }
    }

    fn is_expired(&self, now: u64) -> bool {
        now + EXPIRY_MARGIN_SECS >= self.expires_at
    }
}

pub struct SpotifyAuth {
    client: reqwest::blocking::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    cache_path: PathBuf,
    token: Option<CachedToken>,
}

impl SpotifyAuth {
    pub fn new(
        client: reqwest::blocking::Client,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
        cache_path: PathBuf,
    ) -> Self {
        Self {
            client,
            client_id,
            client_secret,
            redirect_uri,
            cache_path,
            token: None,
        }
    }

    pub fn authorize_url(&self) -> String {
        format!(
            "{AUTHORIZE_URL}?client_id={}&response_type=code&redirect_uri={}&scope={}",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(SCOPE),
        )
    }

    /// Refresh the cached session, or walk the user through authorizing
    /// this app when there is nothing to refresh.
    pub fn authenticate(&mut self) -> Result<(), ProviderError> {
        if self.token.is_none() {
            self.token = self.load_cached_token();
        }

        if let Some(refresh_token) = self.token.as_ref().and_then(|t| t.refresh_token.clone()) {
            match self.refresh(&refresh_token) {
                Ok(()) => return Ok(()),
                Err(ProviderError::Status { status: 400, body }) => {
                    // invalid_grant: the refresh token was revoked
                    warn!(%body, "refresh token rejected, re-authorization required");
                    self.token = None;
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(ref token) = self.token {
            if !token.is_expired(unix_now()) {
                return Ok(());
            }
        }

        self.authorize_interactively()
    }

    /// A bearer token valid for at least the next minute.
    pub fn access_token(&mut self) -> Result<String, ProviderError> {
        let token = self
            .token
            .as_ref()
            .ok_or_else(|| ProviderError::Auth("not authenticated".to_string()))?;

        if !token.is_expired(unix_now()) {
            return Ok(token.access_token.clone());
        }

        let refresh_token = token
            .refresh_token
            .clone()
            .ok_or_else(|| ProviderError::Auth("token expired and cannot be refreshed".to_string()))?;
        self.refresh(&refresh_token)?;

        self.token
            .as_ref()
            .map(|t| t.access_token.clone())
            .ok_or_else(|| ProviderError::Auth("not authenticated".to_string()))
    }

    fn refresh(&mut self, refresh_token: &str) -> Result<(), ProviderError> {
        debug!("refreshing access token");
        let response = self.request_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])?;
        self.store(response, Some(refresh_token.to_string()));
        Ok(())
    }

    fn exchange_code(&mut self, code: &str) -> Result<(), ProviderError> {
        let response = self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ])?;
        self.store(response, None);
        Ok(())
    }

    fn request_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse, ProviderError> {
        let response = self
            .client
            .post(TOKEN_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(params)
            .send()?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Status { status, body });
        }

        Ok(response.json()?)
    }

    fn store(&mut self, response: TokenResponse, previous_refresh: Option<String>) {
        let token = CachedToken::from_response(response, unix_now(), previous_refresh);
        if let Err(e) = self.save_cached_token(&token) {
            warn!(path = %self.cache_path.display(), "failed to write token cache: {e}");
        }
        self.token = Some(token);
    }

    fn load_cached_token(&self) -> Option<CachedToken> {
        let contents = fs::read_to_string(&self.cache_path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(path = %self.cache_path.display(), "ignoring unreadable token cache: {e}");
                None
            }
        }
    }

    fn save_cached_token(&self, token: &CachedToken) -> Result<(), ProviderError> {
        let json = serde_json::to_string(token)
            .map_err(|e| ProviderError::Auth(format!("cannot serialize token: {e}")))?;
        fs::write(&self.cache_path, json)?;
        Ok(())
    }

    fn authorize_interactively(&mut self) -> Result<(), ProviderError> {
        info!("no cached Spotify session, starting authorization");
        println!("Open this URL in a browser and authorize the app:");
        println!();
        println!("  {}", self.authorize_url());
        println!();
        println!("Then paste the URL you were redirected to:");

        let code = read_redirect_code(std::io::stdin().lock())?;
        self.exchange_code(&code)
    }
}

/// Read one line holding the redirect URL and pull the authorization code out of it.
pub fn read_redirect_code(mut reader: impl BufRead) -> Result<String, ProviderError> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(ProviderError::Auth("no redirect URL provided".to_string()));
    }
    parse_redirect_code(line.trim())
}

pub fn parse_redirect_code(redirect: &str) -> Result<String, ProviderError> {
    let url = reqwest::Url::parse(redirect)
        .map_err(|e| ProviderError::Auth(format!("invalid redirect URL: {e}")))?;

    let mut code = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error" => {
                return Err(ProviderError::Auth(format!("authorization denied: {value}")));
            }
            _ => {}
        }
    }

    code.filter(|c| !c.is_empty())
        .ok_or_else(|| ProviderError::Auth("redirect URL has no code parameter".to_string()))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_auth(cache_path: PathBuf) -> SpotifyAuth {
        SpotifyAuth::new(
            reqwest::blocking::Client::new(),
            "test_id".to_string(),
            "test_secret".to_string(),
            "http://127.0.0.1:8888/callback".to_string(),
            cache_path,
        )
    }

    fn token(expires_at: u64, refresh_token: Option<&str>) -> CachedToken {
        CachedToken {
            access_token: "BQD-access".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 3600,
            refresh_token: refresh_token.map(str::to_string),
            scope: Some(SCOPE.to_string()),
            expires_at,
        }
    }

    #[test]
    fn test_no_token_initially() {
        let auth = test_auth(PathBuf::from(".cache"));
        assert!(auth.token.is_none());
    }

    #[test]
    fn test_authorize_url() {
        let auth = test_auth(PathBuf::from(".cache"));
        assert_eq!(
            auth.authorize_url(),
            "https://accounts.spotify.com/authorize?client_id=test_id&response_type=code\
             &redirect_uri=http%3A%2F%2F127.0.0.1%3A8888%2Fcallback\
             &scope=user-read-currently-playing"
        );
    }

    #[test]
    fn test_token_expiry_margin() {
        let t = token(10_000, None);
        assert!(!t.is_expired(9_000));
        // Within the last minute counts as expired
        assert!(t.is_expired(9_950));
        assert!(t.is_expired(10_000));
        assert!(t.is_expired(20_000));
    }

    #[test]
    fn test_from_response_keeps_previous_refresh_token() {
        let response = TokenResponse {
            access_token: "new".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 3600,
            refresh_token: None,
            scope: None,
        };

        let t = CachedToken::from_response(response, 1_000, Some("old-refresh".to_string()));
        assert_eq!(t.access_token, "new");
        assert_eq!(t.expires_at, 4_600);
        assert_eq!(t.refresh_token, Some("old-refresh".to_string()));
    }

    #[test]
    fn test_access_token_from_valid_token() {
        let mut auth = test_auth(PathBuf::from(".cache"));
        auth.token = Some(token(unix_now() + 3600, None));

        assert_eq!(auth.access_token().unwrap(), "BQD-access");
    }

    #[test]
    fn test_access_token_requires_session() {
        let mut auth = test_auth(PathBuf::from(".cache"));
        assert!(matches!(auth.access_token(), Err(ProviderError::Auth(_))));

        // Expired without a refresh token cannot recover on its own
        auth.token = Some(token(0, None));
        assert!(matches!(auth.access_token(), Err(ProviderError::Auth(_))));
    }

    #[test]
    fn test_token_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let auth = test_auth(dir.path().join(".cache"));
        let t = token(1_700_000_000, Some("refresh"));

        auth.save_cached_token(&t).unwrap();
        assert_eq!(auth.load_cached_token(), Some(t));
    }

    #[test]
    fn test_load_spotipy_cache_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".cache");
        fs::write(
            &path,
            r#"{"access_token": "BQC", "token_type": "Bearer", "expires_in": 3600,
                "refresh_token": "AQD", "scope": "user-read-currently-playing",
                "expires_at": 1700003600}"#,
        )
        .unwrap();

        let auth = test_auth(path);
        let t = auth.load_cached_token().unwrap();
        assert_eq!(t.access_token, "BQC");
        assert_eq!(t.refresh_token, Some("AQD".to_string()));
        assert_eq!(t.expires_at, 1_700_003_600);
    }

    #[test]
    fn test_load_garbage_cache_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".cache");
        fs::write(&path, "not json").unwrap();

        assert!(test_auth(path).load_cached_token().is_none());
    }

    #[test]
    fn test_parse_redirect_code() {
        let code =
            parse_redirect_code("http://127.0.0.1:8888/callback?code=AQBx-y_z&state=abc").unwrap();
        assert_eq!(code, "AQBx-y_z");
    }

    #[test]
    fn test_parse_redirect_code_errors() {
        assert!(matches!(
            parse_redirect_code("http://127.0.0.1:8888/callback?error=access_denied"),
            Err(ProviderError::Auth(msg)) if msg.contains("access_denied")
        ));
        assert!(parse_redirect_code("http://127.0.0.1:8888/callback").is_err());
        assert!(parse_redirect_code("http://127.0.0.1:8888/callback?code=").is_err());
        assert!(parse_redirect_code("not a url").is_err());
    }

    #[test]
    fn test_read_redirect_code() {
        let input = b"http://localhost/cb?code=abc123\n";
        assert_eq!(read_redirect_code(&input[..]).unwrap(), "abc123");

        let empty: &[u8] = b"";
        assert!(matches!(read_redirect_code(empty), Err(ProviderError::Auth(_))));
    }
}
