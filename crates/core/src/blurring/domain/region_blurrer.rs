use crate::shared::error::BridgeError;
use crate::shared::pixel_matrix::PixelMatrix;
use crate::shared::pixel_rect::PixelRect;

/// Domain interface for blurring rectangles inside an interleaved matrix.
///
/// Implementations modify the matrix in-place and must reject rectangles
/// that reach outside it rather than touch memory beyond the image.
pub trait RegionBlurrer: Send {
    fn blur(&self, matrix: &mut PixelMatrix, rects: &[PixelRect]) -> Result<(), BridgeError>;
}
