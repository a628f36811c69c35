use std::path::PathBuf;

use thiserror::Error;

use super::pixel_rect::PixelRect;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("unsupported channel configuration: {0}")]
    Configuration(String),
    #[error("cannot load image \"{}\": {reason}", path.display())]
    Decode { path: PathBuf, reason: String },
    #[error("capture failed: {0}")]
    Capture(String),
    #[error("rectangle {rect:?} lies outside a {width}x{height} image")]
    BoundsViolation {
        rect: PixelRect,
        width: u32,
        height: u32,
    },
    #[error("failed to encode {}: {reason}", path.display())]
    Encode { path: PathBuf, reason: String },
    #[error("image has no pixel data")]
    EmptyImage,
}

impl BridgeError {
    pub(crate) fn decode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn encode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Encode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
