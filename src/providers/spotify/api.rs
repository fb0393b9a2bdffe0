use super::auth::SpotifyAuth;
use crate::error::ProviderError;
use crate::models::{Playback, Track};
use reqwest::StatusCode;
use serde_json::Value;

const API_BASE_URL: &str = "https://api.spotify.com/v1";
// Spotify lists album images widest first; index 2 is the 64x64 thumbnail
const COVER_IMAGE_INDEX: usize = 2;

pub struct SpotifyApi {
    client: reqwest::blocking::Client,
    pub(super) auth: SpotifyAuth,
}

impl SpotifyApi {
    pub fn new(client: reqwest::blocking::Client, auth: SpotifyAuth) -> Self {
        Self { client, auth }
    }

    pub fn currently_playing(&mut self) -> Result<Playback, ProviderError> {
        let token = self.auth.access_token()?;

        let response = self
            .client
            .get(format!("{API_BASE_URL}/me/player/currently-playing"))
            .bearer_auth(&token)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        playback_from_response(status, &body)
    }
}

/// Map a currently-playing HTTP response onto `Playback`.
pub fn playback_from_response(status: StatusCode, body: &str) -> Result<Playback, ProviderError> {
    // Nothing is loaded in any player
    if status == StatusCode::NO_CONTENT {
        return Ok(Playback::NotPlaying);
    }

    if !status.is_success() {
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body: body.to_string(),
        });
    }

    let json: Value = serde_json::from_str(body)
        .map_err(|e| ProviderError::MalformedResponse(format!("invalid JSON: {e}")))?;
    parse_currently_playing(&json)
}

pub fn parse_currently_playing(json: &Value) -> Result<Playback, ProviderError> {
    let is_playing = json
        .get("is_playing")
        .and_then(|v| v.as_bool())
        .ok_or_else(|| missing("is_playing"))?;

    if !is_playing {
        return Ok(Playback::NotPlaying);
    }

    // Ads and podcast episodes have no album art to show
    if let Some(kind) = json.get("currently_playing_type").and_then(|v| v.as_str()) {
        if kind != "track" {
            return Ok(Playback::NotPlaying);
        }
    }

    let item = json
        .get("item")
        .filter(|v| !v.is_null())
        .ok_or_else(|| missing("item"))?;
    let album = item.get("album").ok_or_else(|| missing("item.album"))?;

    let title = string_field(item, "name", "item.name")?;
    let artist = item
        .get("artists")
        .and_then(|v| v.as_array())
        .and_then(|artists| artists.first())
        .map(|artist| string_field(artist, "name", "item.artists[0].name"))
        .ok_or_else(|| missing("item.artists[0]"))??;
    let cover_url = album
        .get("images")
        .and_then(|v| v.as_array())
        .and_then(|images| images.get(COVER_IMAGE_INDEX))
        .map(|image| string_field(image, "url", "item.album.images[2].url"))
        .ok_or_else(|| missing("item.album.images[2]"))??;
    let track_id = string_field(item, "id", "item.id")?;
    let album_id = string_field(album, "id", "item.album.id")?;

    Ok(Playback::Playing(Track {
        title,
        artist,
        cover_url,
        track_id,
        album_id,
    }))
}

fn string_field(value: &Value, key: &str, path: &str) -> Result<String, ProviderError> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or_else(|| missing(path))
}

fn missing(path: &str) -> ProviderError {
    ProviderError::MalformedResponse(format!("missing {path}"))
}
