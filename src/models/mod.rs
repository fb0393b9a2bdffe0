/// A track as reported by the streaming service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    pub artist: String,
    pub cover_url: String,
    pub track_id: String,
    pub album_id: String,
}

impl Track {
    /// Two tracks share a cover when they come from the same album.
    pub fn same_cover(&self, other: &Track) -> bool {
        self.album_id == other.album_id
    }
}

/// Successful result of polling the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Playback {
    Playing(Track),
    NotPlaying,
}
