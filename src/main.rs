use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cover_matrix::{
    app::CoverLoop,
    artwork::HttpCoverFetcher,
    cache::CoverCache,
    config::Config,
    display::{CoverDisplay, Display},
    error::AppError,
    provider_factory,
    providers::NowPlayingProvider,
};

fn main() -> Result<()> {
    // Load .env file if it exists
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cover_matrix=info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env();

    let cache = CoverCache::load(&config.cover_dir).map_err(AppError::from)?;
    info!("{} cached covers loaded from {}", cache.len(), config.cover_dir.display());

    if !config.idle_image.exists() {
        warn!("Idle image {} not found", config.idle_image.display());
    }

    let provider = provider_factory::create_spotify_provider(&config)?;
    let fetcher = HttpCoverFetcher::new().context("failed to build HTTP client")?;

    run(provider, fetcher, open_display(&config)?, cache, &config)
}

fn run<P: NowPlayingProvider, D: CoverDisplay>(
    provider: P,
    fetcher: HttpCoverFetcher,
    display: D,
    cache: CoverCache,
    config: &Config,
) -> Result<()> {
    let mut cover_loop = CoverLoop::new(provider, fetcher, display, cache, config.loop_settings.clone());
    cover_loop.run().context("cover loop stopped")?;
    Ok(())
}

#[cfg(feature = "hardware")]
fn open_display(config: &Config) -> Result<Display<cover_matrix::display::matrix::LedMatrixSink>> {
    let sink = cover_matrix::display::matrix::LedMatrixSink::new(
        &config.matrix_hardware_mapping,
        config.matrix_brightness,
    )
    .context("failed to initialize LED matrix")?;
    Ok(Display::new(sink, config.idle_image.clone()))
}

#[cfg(not(feature = "hardware"))]
fn open_display(config: &Config) -> Result<Display<cover_matrix::display::TerminalPreview<std::io::Stdout>>> {
    info!("Built without the hardware feature, previewing covers in the terminal");
    Ok(Display::new(
        cover_matrix::display::TerminalPreview::stdout(),
        config.idle_image.clone(),
    ))
}
