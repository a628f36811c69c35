//! Conversions between the planar float domain ([`ImageBuffer`]) and the
//! interleaved byte domain ([`PixelMatrix`]).
//!
//! Every function here is total: a sentinel converts to an empty matrix and
//! an empty matrix converts back to the sentinel.

use crate::shared::error::BridgeError;
use crate::shared::image_buffer::ImageBuffer;
use crate::shared::pixel_matrix::PixelMatrix;

/// Converts to a tightly packed interleaved matrix.
///
/// Each value is scaled by 255 and truncated. Nothing is clamped first;
/// out-of-range floats saturate at 0 or 255 (NaN becomes 0). Call
/// [`clamp01`] beforehand when the input may leave `[0, 1]`.
pub fn planar_to_interleaved(image: &ImageBuffer) -> PixelMatrix {
    let stride = image.width() as usize * image.channels() as usize;
    planar_to_interleaved_with_stride(image, stride)
}

/// Same as [`planar_to_interleaved`] but rows start `stride` bytes apart.
/// Padding bytes are left zeroed.
pub fn planar_to_interleaved_with_stride(image: &ImageBuffer, stride: usize) -> PixelMatrix {
    let w = image.width() as usize;
    let h = image.height() as usize;
    let c = image.channels() as usize;

    let mut matrix =
        PixelMatrix::with_stride(image.width(), image.height(), image.channels(), stride);
    let stride = matrix.stride();
    let planes = image.as_ndarray();
    let out = matrix.data_mut();

    for y in 0..h {
        for x in 0..w {
            for k in 0..c {
                out[y * stride + x * c + k] = to_byte(planes[[k, y, x]]);
            }
        }
    }
    matrix
}

/// Inverse of [`planar_to_interleaved`]: every byte is divided by 255 into
/// its channel plane. Row padding is skipped.
pub fn interleaved_to_planar(matrix: &PixelMatrix) -> ImageBuffer {
    let w = matrix.width() as usize;
    let h = matrix.height() as usize;
    let c = matrix.channels() as usize;
    let plane = w * h;

    let mut image = ImageBuffer::new(matrix.width(), matrix.height(), matrix.channels());
    let out = image.data_mut();

    for y in 0..h {
        let row = matrix.row(y);
        for k in 0..c {
            for x in 0..w {
                out[k * plane + y * w + x] = row[x * c + k] as f32 / 255.0;
            }
        }
    }
    image
}

/// Swaps channel planes 0 and 2, converting between RGB and BGR ordering.
///
/// Applying it twice restores the original buffer exactly.
pub fn swap_channel_order(image: &mut ImageBuffer) -> Result<(), BridgeError> {
    if image.channels() < 3 {
        return Err(BridgeError::Configuration(format!(
            "channel swap needs at least 3 channels, got {}",
            image.channels()
        )));
    }
    swap_red_blue_planes(image);
    Ok(())
}

/// Swaps planes 0 and 2 of a three-channel image and leaves any other
/// shape alone.
///
/// Codec-facing bytes use BGR order while buffers handed to callers use RGB;
/// this is the single crossing point between the two conventions.
pub fn normalize_color_order(image: &mut ImageBuffer) {
    if image.channels() == 3 {
        swap_red_blue_planes(image);
    }
}

/// Clamps every value into `[0, 1]`. NaN maps to 0.
pub fn clamp01(image: &mut ImageBuffer) {
    for v in image.data_mut() {
        *v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
    }
}

fn swap_red_blue_planes(image: &mut ImageBuffer) {
    let plane = image.plane_len();
    let (first, rest) = image.data_mut().split_at_mut(plane);
    first.swap_with_slice(&mut rest[plane..2 * plane]);
}

#[inline]
fn to_byte(value: f32) -> u8 {
    (value * 255.0) as u8
}
