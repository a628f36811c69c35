use crate::shared::error::BridgeError;
use crate::shared::pixel_matrix::PixelMatrix;

/// Native capture primitive behind a [`VideoSource`](super::video_source::VideoSource).
///
/// Implementations own the underlying device or file handle. Frames come
/// back in the codec's byte convention (BGR for three channels).
pub trait FrameGrabber: Send {
    /// Reads the next frame. `Ok(None)` marks the end of the stream.
    fn grab(&mut self) -> Result<Option<PixelMatrix>, BridgeError>;

    /// Releases the underlying resource. Must tolerate repeated calls.
    fn release(&mut self);
}
