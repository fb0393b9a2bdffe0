use crate::error::ProviderError;
use crate::models::Playback;

pub mod spotify;

/// Source of "what is playing right now".
pub trait NowPlayingProvider {
    /// Establish (or re-establish) an authorized session.
    fn authenticate(&mut self) -> Result<(), ProviderError>;

    fn currently_playing(&mut self) -> Result<Playback, ProviderError>;
}
