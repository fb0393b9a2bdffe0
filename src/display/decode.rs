use std::path::Path;

use image::{imageops::FilterType, DynamicImage, GenericImageView, RgbImage};

use super::Frame;
use crate::error::DisplayError;

/// Decode a cached cover and scale it to exactly `size` x `size`.
pub fn load_cover(path: &Path, size: u32) -> Result<Frame, DisplayError> {
    let img = open(path)?;

    let img = if img.dimensions() == (size, size) {
        img
    } else {
        img.resize_exact(size, size, FilterType::Lanczos3)
    };

    Ok(frame_from_image(&img.to_rgb8()))
}

/// Decode the idle placeholder, shrink it to fit while keeping its aspect
/// ratio, and center it on a black `size` x `size` frame.
pub fn load_placeholder(path: &Path, size: u32) -> Result<Frame, DisplayError> {
    let img = open(path)?;

    // Like a thumbnail: shrink only
    let (width, height) = img.dimensions();
    let img = if width > size || height > size {
        img.resize(size, size, FilterType::Lanczos3)
    } else {
        img
    };

    let fitted = img.to_rgb8();
    let mut canvas = RgbImage::new(size, size);
    let x = (size - fitted.width()) / 2;
    let y = (size - fitted.height()) / 2;
    image::imageops::overlay(&mut canvas, &fitted, x as i64, y as i64);

    Ok(frame_from_image(&canvas))
}

fn open(path: &Path) -> Result<DynamicImage, DisplayError> {
    image::open(path).map_err(|source| DisplayError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn frame_from_image(img: &RgbImage) -> Frame {
    let mut pixels = Vec::with_capacity(img.height() as usize);

    for y in 0..img.height() {
        let mut row = Vec::with_capacity(img.width() as usize);
        for x in 0..img.width() {
            let image::Rgb([r, g, b]) = *img.get_pixel(x, y);
            row.push((r, g, b));
        }
        pixels.push(row);
    }

    Frame { pixels }
}
