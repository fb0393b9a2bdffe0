use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CacheError;

const COVER_EXTENSION: &str = "jpg";

/// Album covers on disk, one `<album_id>.jpg` per album.
///
/// The in-memory set mirrors the directory contents at startup and grows as
/// covers are stored. Nothing is ever evicted.
pub struct CoverCache {
    pub cache_dir: PathBuf,
    albums: HashSet<String>,
}

impl CoverCache {
    pub fn load(cache_dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let cache_dir = cache_dir.into();
        let unreadable = |source| CacheError::Unreadable {
            path: cache_dir.clone(),
            source,
        };

        // Create cache directory if it doesn't exist
        fs::create_dir_all(&cache_dir).map_err(unreadable)?;

        let mut albums = HashSet::new();
        for entry in fs::read_dir(&cache_dir).map_err(unreadable)? {
            let path = entry.map_err(unreadable)?.path();
            if let Some(album_id) = album_id_from_path(&path) {
                albums.insert(album_id);
            }
        }

        debug!(dir = %cache_dir.display(), count = albums.len(), "scanned cover cache");
        Ok(Self { cache_dir, albums })
    }

    pub fn has(&self, album_id: &str) -> bool {
        self.albums.contains(album_id)
    }

    pub fn add(&mut self, album_id: &str) {
        self.albums.insert(album_id.to_string());
    }

    pub fn len(&self) -> usize {
        self.albums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.albums.is_empty()
    }

    pub fn path_for(&self, album_id: &str) -> PathBuf {
        self.cache_dir.join(format!("{album_id}.{COVER_EXTENSION}"))
    }

    /// Write a downloaded cover and record it.
    ///
    /// The bytes land in a `.part` sibling first and are renamed into place;
    /// the album is only recorded once the rename succeeds.
    pub fn store(&mut self, album_id: &str, bytes: &[u8]) -> Result<PathBuf, CacheError> {
        let path = self.path_for(album_id);
        let partial = self.cache_dir.join(format!("{album_id}.{COVER_EXTENSION}.part"));

        let write_err = |source| CacheError::Write {
            path: path.clone(),
            source,
        };
        fs::write(&partial, bytes).map_err(write_err)?;
        if let Err(e) = fs::rename(&partial, &path) {
            let _ = fs::remove_file(&partial);
            return Err(write_err(e));
        }

        self.add(album_id);
        Ok(path)
    }
}

fn album_id_from_path(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    if path.extension().and_then(|s| s.to_str()) != Some(COVER_EXTENSION) {
        return None;
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
