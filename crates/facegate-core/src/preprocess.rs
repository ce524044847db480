//! Image → model input tensor.
//!
//! Any decodable image is resampled to 224x224 and written channel-major
//! (all red, then all green, then all blue) with each intensity scaled to
//! [0, 1]. Alpha is dropped before resampling.

use image::imageops::{self, FilterType};
use image::DynamicImage;
use ndarray::Array4;
use thiserror::Error;

// --- Named constants ---
pub const INPUT_SIZE: usize = 224;
pub const INPUT_CHANNELS: usize = 3;
const PIXEL_SCALE: f32 = 255.0;

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("image could not be decoded: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decode encoded image bytes (PNG, JPEG, ...) and build the input tensor.
pub fn preprocess_bytes(bytes: &[u8]) -> Result<Array4<f32>, PreprocessError> {
    let image = image::load_from_memory(bytes)?;
    tracing::debug!(
        width = image.width(),
        height = image.height(),
        color = ?image.color(),
        "decoded captured image"
    );
    Ok(preprocess(&image))
}

/// Build the `[1, 3, 224, 224]` input tensor from an already decoded image.
pub fn preprocess(image: &DynamicImage) -> Array4<f32> {
    let size = INPUT_SIZE as u32;
    let rgb = image.to_rgb8();
    let resized = imageops::resize(&rgb, size, size, FilterType::Triangle);

    let mut tensor = Array4::<f32>::zeros((1, INPUT_CHANNELS, INPUT_SIZE, INPUT_SIZE));

    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        let [r, g, b] = pixel.0;
        tensor[[0, 0, y, x]] = r as f32 / PIXEL_SCALE;
        tensor[[0, 1, y, x]] = g as f32 / PIXEL_SCALE;
        tensor[[0, 2, y, x]] = b as f32 / PIXEL_SCALE;
    }

    tensor
}
