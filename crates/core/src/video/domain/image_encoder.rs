use std::path::Path;

use crate::shared::error::BridgeError;
use crate::shared::pixel_matrix::PixelMatrix;

/// Encodes an interleaved matrix to an image file.
///
/// Expects the codec's byte order (BGR, or BGRA with alpha). The file
/// format follows the path's extension.
pub trait ImageEncoder: Send {
    fn encode(&self, path: &Path, matrix: &PixelMatrix) -> Result<(), BridgeError>;
}
