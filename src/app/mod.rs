//! The poll loop: ask the provider what is playing, make sure the cover is
//! on disk, and push it to the display when the album changes.

mod state;

pub use state::{backoff, OperatingState, PollOutcome};

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::artwork::CoverFetcher;
use crate::cache::CoverCache;
use crate::display::CoverDisplay;
use crate::error::AppError;
use crate::models::{Playback, Track};
use crate::providers::NowPlayingProvider;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSettings {
    /// Pause between polls while a track is playing.
    pub poll_interval: Duration,
    /// Pause between polls in every other state.
    pub tick_interval: Duration,
    /// How long nothing may play before the placeholder goes up.
    pub idle_timeout: Duration,
    /// Pause between polls once the placeholder is showing.
    pub idle_poll_interval: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    /// Consecutive failures tolerated before giving up.
    pub max_retries: u32,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            tick_interval: Duration::from_secs(1),
            idle_timeout: Duration::from_secs(10),
            idle_poll_interval: Duration::from_secs(5),
            backoff_base: Duration::from_secs(1),
            backoff_max: Duration::from_secs(60),
            max_retries: 8,
        }
    }
}

pub struct CoverLoop<P, F, D> {
    provider: P,
    fetcher: F,
    display: D,
    cache: CoverCache,
    settings: LoopSettings,
    state: OperatingState,
    displayed: Option<Track>,
    last_error: Option<String>,
}

impl<P, F, D> CoverLoop<P, F, D>
where
    P: NowPlayingProvider,
    F: CoverFetcher,
    D: CoverDisplay,
{
    pub fn new(provider: P, fetcher: F, display: D, cache: CoverCache, settings: LoopSettings) -> Self {
        Self {
            provider,
            fetcher,
            display,
            cache,
            settings,
            state: OperatingState::Idle,
            displayed: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> OperatingState {
        self.state
    }

    pub fn displayed(&self) -> Option<&Track> {
        self.displayed.as_ref()
    }

    /// First authentication. A failure does not abort; the loop starts in
    /// `Error` and retries with backoff.
    pub fn start(&mut self) {
        match self.provider.authenticate() {
            Ok(()) => info!("Authenticated with Spotify"),
            Err(e) => {
                error!("Authentication failed: {e}");
                self.last_error = Some(e.to_string());
                self.state = OperatingState::Error { failures: 1 };
            }
        }
    }

    /// Runs until recovery gives up.
    pub fn run(&mut self) -> Result<(), AppError> {
        self.start();
        loop {
            let pause = self.tick(Instant::now())?;
            thread::sleep(pause);
        }
    }

    /// One iteration of the loop. Returns how long to sleep before the next.
    pub fn tick(&mut self, now: Instant) -> Result<Duration, AppError> {
        match self.state {
            OperatingState::Idle | OperatingState::Playing => {}
            OperatingState::Stopped { .. } => {
                if self.state.idle_due(now, self.settings.idle_timeout) {
                    self.show_idle();
                }
            }
            OperatingState::Error { failures } => {
                if let Err(e) = self.provider.authenticate() {
                    warn!(attempt = failures, "Re-authentication failed: {e}");
                    self.last_error = Some(e.to_string());
                    self.state = self.state.on_recovery_failed();
                    self.check_retries()?;
                    return Ok(self.backoff());
                }
                info!("Re-authenticated after {failures} failure(s)");
            }
        }

        let outcome = match self.provider.currently_playing() {
            Ok(Playback::Playing(track)) => {
                self.on_track(track);
                PollOutcome::Playing
            }
            Ok(Playback::NotPlaying) => PollOutcome::NotPlaying,
            Err(e) => {
                warn!("Failed to fetch currently playing: {e}");
                self.last_error = Some(e.to_string());
                PollOutcome::Failed
            }
        };

        let previous = self.state;
        self.state = self.state.on_poll(outcome, now);
        if std::mem::discriminant(&previous) != std::mem::discriminant(&self.state) {
            debug!(from = ?previous, to = ?self.state, "state changed");
            if matches!(self.state, OperatingState::Stopped { .. }) {
                info!("Playback stopped");
            }
        }
        self.check_retries()?;

        Ok(self.next_pause())
    }

    fn on_track(&mut self, track: Track) {
        let same_cover = self
            .displayed
            .as_ref()
            .is_some_and(|current| current.same_cover(&track));

        if !same_cover {
            info!(title = %track.title, artist = %track.artist, album = %track.album_id, "New track playing");
            self.show_cover(track);
            return;
        }

        let same_track = self
            .displayed
            .as_ref()
            .is_some_and(|current| current.track_id == track.track_id);
        if !same_track {
            info!(title = %track.title, artist = %track.artist, "Next track, same album");
            self.displayed = Some(track);
        }
    }

    /// Download the cover if it is not cached yet, then render it.
    fn show_cover(&mut self, track: Track) {
        if !self.cache.has(&track.album_id) {
            info!(url = %track.cover_url, album = %track.album_id, "Downloading cover");
            let bytes = match self.fetcher.fetch(&track.cover_url) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(album = %track.album_id, "Cover download failed, retrying next poll: {e}");
                    return;
                }
            };
            if let Err(e) = self.cache.store(&track.album_id, &bytes) {
                warn!("{e}");
                return;
            }
        }

        let path = self.cache.path_for(&track.album_id);
        info!(path = %path.display(), "Displaying cover");
        match self.display.render_cover(&path) {
            Ok(()) => self.displayed = Some(track),
            Err(e) => warn!("Failed to display cover: {e}"),
        }
    }

    fn show_idle(&mut self) {
        info!("Nothing playing for {:?}, showing idle image", self.settings.idle_timeout);
        if let Err(e) = self.display.render_idle() {
            warn!("Failed to display idle image: {e}");
        }
        // The placeholder replaced whatever cover was up
        self.displayed = None;
        self.state = self.state.on_idle_shown();
    }

    fn check_retries(&self) -> Result<(), AppError> {
        let failures = self.state.failures();
        if failures > self.settings.max_retries {
            return Err(AppError::RetriesExhausted {
                attempts: failures,
                last: self.last_error.clone().unwrap_or_default(),
            });
        }
        Ok(())
    }

    fn backoff(&self) -> Duration {
        backoff(
            self.state.failures(),
            self.settings.backoff_base,
            self.settings.backoff_max,
        )
    }

    fn next_pause(&self) -> Duration {
        match self.state {
            OperatingState::Playing => self.settings.poll_interval,
            OperatingState::Stopped {
                idle_shown: true, ..
            } => self.settings.idle_poll_interval,
            OperatingState::Error { .. } => self.backoff(),
            _ => self.settings.tick_interval,
        }
    }
}
