use std::path::Path;

use crate::shared::error::BridgeError;
use crate::shared::pixel_matrix::PixelMatrix;
use crate::video::domain::image_encoder::ImageEncoder;

/// Writes a pixel matrix to an image file using the `image` crate.
///
/// Expects gray, BGR or BGRA bytes. The container is picked from the path
/// extension; formats without alpha support get the alpha channel dropped.
pub struct ImageFileEncoder;

impl ImageFileEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileEncoder {
    fn default() -> Self {
        Self::new()
    }
}

fn to_dynamic_image(matrix: &PixelMatrix) -> Result<image::DynamicImage, BridgeError> {
    let (width, height) = (matrix.width(), matrix.height());
    let mut data = matrix.to_packed();

    let img = match matrix.channels() {
        1 => image::GrayImage::from_raw(width, height, data).map(image::DynamicImage::ImageLuma8),
        3 => {
            data.chunks_exact_mut(3).for_each(|px| px.swap(0, 2));
            image::RgbImage::from_raw(width, height, data).map(image::DynamicImage::ImageRgb8)
        }
        4 => {
            data.chunks_exact_mut(4).for_each(|px| px.swap(0, 2));
            image::RgbaImage::from_raw(width, height, data).map(image::DynamicImage::ImageRgba8)
        }
        other => {
            return Err(BridgeError::Configuration(format!(
                "can't encode {other}-channel images"
            )))
        }
    };

    img.ok_or_else(|| BridgeError::Configuration("pixel data does not match dimensions".into()))
}

impl ImageEncoder for ImageFileEncoder {
    fn encode(&self, path: &Path, matrix: &PixelMatrix) -> Result<(), BridgeError> {
        if matrix.is_empty() {
            return Err(BridgeError::EmptyImage);
        }

        let mut img = to_dynamic_image(matrix)?;
        let format = image::ImageFormat::from_path(path).map_err(|e| BridgeError::encode(path, e))?;
        if format == image::ImageFormat::Jpeg && img.color().has_alpha() {
            img = image::DynamicImage::ImageRgb8(img.to_rgb8());
        }

        img.save_with_format(path, format)
            .map_err(|e| BridgeError::encode(path, e))
    }
}
