use std::path::Path;

use crate::shared::error::BridgeError;
use crate::shared::pixel_matrix::PixelMatrix;
use crate::video::domain::image_decoder::{ChannelMode, ImageDecoder};

use super::ffmpeg_pixels::{
    channels_for_components, matrix_from_frame, next_stream_packet, pixel_for_channels,
};

/// Decodes still images through ffmpeg.
///
/// Treats the file as a one-frame stream and converts the frame to a packed
/// gray, BGR or BGRA matrix depending on the requested [`ChannelMode`].
pub struct FfmpegImageDecoder;

impl FfmpegImageDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FfmpegImageDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn output_channels(mode: ChannelMode, source: ffmpeg_next::format::Pixel) -> u8 {
    match mode {
        ChannelMode::Grayscale => 1,
        ChannelMode::Color => 3,
        ChannelMode::Auto => source
            .descriptor()
            .map(|d| channels_for_components(d.nb_components()))
            .unwrap_or(3),
    }
}

fn decode_single_frame(
    ictx: &mut ffmpeg_next::format::context::Input,
    decoder: &mut ffmpeg_next::decoder::Video,
    scaler: &mut ffmpeg_next::software::scaling::Context,
    video_stream_index: usize,
    channels: u8,
) -> Result<Option<PixelMatrix>, ffmpeg_next::Error> {
    while let Some(packet) = next_stream_packet(|p| p.read(ictx), video_stream_index)? {
        decoder.send_packet(&packet)?;
        if let Some(matrix) = try_receive_frame(decoder, scaler, channels)? {
            return Ok(Some(matrix));
        }
    }

    // Flush decoder for formats that buffer the single frame
    let _ = decoder.send_eof();
    try_receive_frame(decoder, scaler, channels)
}

fn try_receive_frame(
    decoder: &mut ffmpeg_next::decoder::Video,
    scaler: &mut ffmpeg_next::software::scaling::Context,
    channels: u8,
) -> Result<Option<PixelMatrix>, ffmpeg_next::Error> {
    let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
    if decoder.receive_frame(&mut decoded).is_ok() {
        let mut packed = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&decoded, &mut packed)?;
        Ok(Some(matrix_from_frame(&packed, channels)))
    } else {
        Ok(None)
    }
}

impl ImageDecoder for FfmpegImageDecoder {
    fn decode(&self, path: &Path, mode: ChannelMode) -> Result<PixelMatrix, BridgeError> {
        let fail = |reason: ffmpeg_next::Error| BridgeError::decode(path, reason);

        ffmpeg_next::init().map_err(fail)?;
        let mut ictx = ffmpeg_next::format::input(path).map_err(fail)?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| BridgeError::decode(path, "no image data found"))?;
        let video_stream_index = stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(fail)?;
        let mut decoder = codec_ctx.decoder().video().map_err(fail)?;

        let width = decoder.width();
        let height = decoder.height();
        let channels = output_channels(mode, decoder.format());

        let mut scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            pixel_for_channels(channels),
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(fail)?;

        decode_single_frame(
            &mut ictx,
            &mut decoder,
            &mut scaler,
            video_stream_index,
            channels,
        )
        .map_err(fail)?
        .ok_or_else(|| BridgeError::decode(path, "failed to decode image"))
    }
}
