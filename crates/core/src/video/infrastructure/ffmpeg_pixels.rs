use ffmpeg_next::format::Pixel;
use ffmpeg_next::util::frame::video::Video;
use ffmpeg_next::Packet;

use crate::shared::error::BridgeError;
use crate::shared::pixel_matrix::PixelMatrix;

/// Copies plane 0 of a packed ffmpeg frame, keeping its row stride.
///
/// ffmpeg pads rows for alignment, so the stride is carried over as-is
/// instead of being stripped.
pub(crate) fn matrix_from_frame(frame: &Video, channels: u8) -> PixelMatrix {
    let width = frame.width();
    let height = frame.height();
    let stride = frame.stride(0);
    let len = PixelMatrix::required_len(width, height, channels, stride);
    PixelMatrix::from_data(frame.data(0)[..len].to_vec(), width, height, channels, stride)
}

/// Packed output format for a channel count: gray, BGR or BGRA.
pub(crate) fn pixel_for_channels(channels: u8) -> Pixel {
    match channels {
        1 => Pixel::GRAY8,
        4 => Pixel::BGRA,
        _ => Pixel::BGR24,
    }
}

/// Channel count that keeps a source format's components: gray sources
/// stay single-channel, sources with alpha keep it.
pub(crate) fn channels_for_components(components: u8) -> u8 {
    match components {
        1 | 2 => 1,
        4 => 4,
        _ => 3,
    }
}

/// Reads packets until one belongs to `stream_index`.
///
/// `Ok(None)` marks end of input. Any other read failure is returned as-is
/// rather than retried, so a dead device or a broken container ends the
/// read instead of spinning.
pub(crate) fn next_stream_packet(
    mut read: impl FnMut(&mut Packet) -> Result<(), ffmpeg_next::Error>,
    stream_index: usize,
) -> Result<Option<Packet>, ffmpeg_next::Error> {
    loop {
        let mut packet = Packet::empty();
        match read(&mut packet) {
            Ok(()) if packet.stream() == stream_index => return Ok(Some(packet)),
            Ok(()) => continue,
            Err(ffmpeg_next::Error::Eof) => return Ok(None),
            Err(e) => return Err(e),
        }
    }
}

pub(crate) fn capture_error(e: ffmpeg_next::Error) -> BridgeError {
    BridgeError::Capture(e.to_string())
}
