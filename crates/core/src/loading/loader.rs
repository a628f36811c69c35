use std::path::Path;

use crate::bridge::format_bridge::{interleaved_to_planar, normalize_color_order};
use crate::shared::constants::{PLACEHOLDER_CHANNELS, PLACEHOLDER_HEIGHT, PLACEHOLDER_WIDTH};
use crate::shared::error::BridgeError;
use crate::shared::image_buffer::ImageBuffer;
use crate::video::domain::image_decoder::{ChannelMode, ImageDecoder};

use super::failure_log::FailureLog;

/// Result of [`Loader::load_image_or_placeholder`].
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(ImageBuffer),
    /// The load failed; `image` is the all-black fallback.
    Placeholder {
        image: ImageBuffer,
        error: BridgeError,
    },
}

impl LoadOutcome {
    pub fn image(&self) -> &ImageBuffer {
        match self {
            Self::Loaded(image) | Self::Placeholder { image, .. } => image,
        }
    }

    pub fn into_image(self) -> ImageBuffer {
        match self {
            Self::Loaded(image) | Self::Placeholder { image, .. } => image,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }
}

/// Loads image files into planar buffers.
///
/// Plane order follows the channel count: three-channel images come back
/// as RGB, four-channel images keep the decoder's BGRA order, and gray
/// images have a single plane.
///
/// Every failure is logged, and the failing path is handed to the
/// [`FailureLog`] before the error is returned.
pub struct Loader {
    decoder: Box<dyn ImageDecoder>,
    failure_log: Box<dyn FailureLog>,
}

impl Loader {
    pub fn new(decoder: Box<dyn ImageDecoder>, failure_log: Box<dyn FailureLog>) -> Self {
        Self {
            decoder,
            failure_log,
        }
    }

    /// Decodes `path` with `requested_channels` of 0 (as stored), 1 or 3.
    pub fn load_image(
        &self,
        path: &Path,
        requested_channels: u8,
    ) -> Result<ImageBuffer, BridgeError> {
        self.try_load(path, requested_channels).map_err(|e| {
            self.report_failure(path, &e);
            e
        })
    }

    /// Same as [`load_image`](Self::load_image) but never fails: errors come
    /// back as a 10x10x3 black placeholder tagged with the cause.
    pub fn load_image_or_placeholder(&self, path: &Path, requested_channels: u8) -> LoadOutcome {
        match self.load_image(path, requested_channels) {
            Ok(image) => LoadOutcome::Loaded(image),
            Err(error) => LoadOutcome::Placeholder {
                image: ImageBuffer::new(
                    PLACEHOLDER_WIDTH,
                    PLACEHOLDER_HEIGHT,
                    PLACEHOLDER_CHANNELS,
                ),
                error,
            },
        }
    }

    fn try_load(&self, path: &Path, requested_channels: u8) -> Result<ImageBuffer, BridgeError> {
        let mode = ChannelMode::try_from(requested_channels)?;
        let matrix = self.decoder.decode(path, mode)?;
        if matrix.is_empty() {
            return Err(BridgeError::decode(path, "decoded image is empty"));
        }

        let mut image = interleaved_to_planar(&matrix);
        normalize_color_order(&mut image);
        log::debug!(
            "Loaded {} ({}x{}x{})",
            path.display(),
            image.width(),
            image.height(),
            image.channels()
        );
        Ok(image)
    }

    fn report_failure(&self, path: &Path, error: &BridgeError) {
        log::warn!("{error}");
        if let Err(e) = self.failure_log.record(path) {
            log::error!("Failed to record {} in failure log: {e}", path.display());
        }
    }
}
