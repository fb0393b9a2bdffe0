pub mod decode;
#[cfg(feature = "hardware")]
pub mod matrix;
pub mod terminal;

pub use decode::{load_cover, load_placeholder};
pub use terminal::TerminalPreview;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::DisplayError;

/// Panel edge length in pixels.
pub const MATRIX_SIZE: u32 = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub pixels: Vec<Vec<(u8, u8, u8)>>, // RGB rows, top to bottom
}

impl Frame {
    pub fn width(&self) -> u32 {
        self.pixels.first().map_or(0, |row| row.len() as u32)
    }

    pub fn height(&self) -> u32 {
        self.pixels.len() as u32
    }
}

/// Whatever finally shows a frame: the LED panel or a stand-in.
pub trait FrameSink {
    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError>;
}

/// What the poll loop needs from a display.
pub trait CoverDisplay {
    fn render_cover(&mut self, path: &Path) -> Result<(), DisplayError>;
    fn render_idle(&mut self) -> Result<(), DisplayError>;
}

pub struct Display<S> {
    sink: S,
    size: u32,
    idle_image: PathBuf,
}

impl<S: FrameSink> Display<S> {
    pub fn new(sink: S, idle_image: PathBuf) -> Self {
        Self {
            sink,
            size: MATRIX_SIZE,
            idle_image,
        }
    }
}

impl<S: FrameSink> CoverDisplay for Display<S> {
    fn render_cover(&mut self, path: &Path) -> Result<(), DisplayError> {
        let frame = load_cover(path, self.size)?;
        debug!(path = %path.display(), "pushing cover");
        self.sink.show(&frame)
    }

    fn render_idle(&mut self) -> Result<(), DisplayError> {
        let frame = load_placeholder(&self.idle_image, self.size)?;
        debug!(path = %self.idle_image.display(), "pushing idle placeholder");
        self.sink.show(&frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[derive(Default)]
    struct RecordingSink {
        frames: Vec<Frame>,
    }

    impl FrameSink for RecordingSink {
        fn show(&mut self, frame: &Frame) -> Result<(), DisplayError> {
            self.frames.push(frame.clone());
            Ok(())
        }
    }

    #[test]
    fn test_render_cover_pushes_matrix_sized_frame() {
        let dir = tempfile::tempdir().unwrap();
        let cover = dir.path().join("X1.jpg");
        RgbImage::from_pixel(300, 300, Rgb([200, 10, 10]))
            .save(&cover)
            .unwrap();

        let mut display = Display::new(RecordingSink::default(), dir.path().join("idle.png"));
        display.render_cover(&cover).unwrap();

        assert_eq!(display.sink.frames.len(), 1);
        let frame = &display.sink.frames[0];
        assert_eq!(frame.width(), MATRIX_SIZE);
        assert_eq!(frame.height(), MATRIX_SIZE);
    }

    #[test]
    fn test_render_idle_uses_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let idle = dir.path().join("unicorn.png");
        RgbImage::from_pixel(128, 64, Rgb([255, 255, 255]))
            .save(&idle)
            .unwrap();

        let mut display = Display::new(RecordingSink::default(), idle);
        display.render_idle().unwrap();

        let frame = &display.sink.frames[0];
        assert_eq!(frame.height(), MATRIX_SIZE);
        // Letterboxed: black bars above and below the 64x32 image
        assert_eq!(frame.pixels[0][0], (0, 0, 0));
        let (r, g, b) = frame.pixels[32][32];
        assert!(r > 250 && g > 250 && b > 250);
    }

    #[test]
    fn test_render_missing_file_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut display = Display::new(RecordingSink::default(), dir.path().join("nope.png"));

        assert!(matches!(
            display.render_cover(&dir.path().join("missing.jpg")),
            Err(DisplayError::Decode { .. })
        ));
        assert!(display.render_idle().is_err());
        assert!(display.sink.frames.is_empty());
    }
}
