use std::path::Path;

use crate::shared::error::BridgeError;
use crate::shared::pixel_matrix::PixelMatrix;

/// Channel layout requested from the decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelMode {
    /// Keep whatever the file stores (gray, color, or color with alpha).
    Auto,
    Grayscale,
    Color,
}

impl TryFrom<u8> for ChannelMode {
    type Error = BridgeError;

    fn try_from(channels: u8) -> Result<Self, Self::Error> {
        match channels {
            0 => Ok(Self::Auto),
            1 => Ok(Self::Grayscale),
            3 => Ok(Self::Color),
            other => Err(BridgeError::Configuration(format!(
                "can't force load with {other} channels"
            ))),
        }
    }
}

/// Decodes a still image file into an interleaved matrix.
///
/// Color output uses the codec's byte order (BGR, or BGRA with alpha).
pub trait ImageDecoder: Send {
    fn decode(&self, path: &Path, mode: ChannelMode) -> Result<PixelMatrix, BridgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, ChannelMode::Auto)]
    #[case(1, ChannelMode::Grayscale)]
    #[case(3, ChannelMode::Color)]
    fn test_supported_channel_counts(#[case] channels: u8, #[case] expected: ChannelMode) {
        assert_eq!(ChannelMode::try_from(channels).unwrap(), expected);
    }

    #[rstest]
    #[case(2)]
    #[case(4)]
    #[case(255)]
    fn test_unsupported_channel_counts(#[case] channels: u8) {
        let err = ChannelMode::try_from(channels).unwrap_err();
        assert!(matches!(err, BridgeError::Configuration(_)));
        assert!(err.to_string().contains(&channels.to_string()));
    }
}
