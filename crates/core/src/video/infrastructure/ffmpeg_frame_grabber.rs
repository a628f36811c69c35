use crate::shared::error::BridgeError;
use crate::shared::pixel_matrix::PixelMatrix;
use crate::video::domain::frame_grabber::FrameGrabber;
use crate::video::domain::video_source::{CaptureHints, CaptureSource, VideoSource};

use super::ffmpeg_pixels::{
    capture_error, matrix_from_frame, next_stream_packet, pixel_for_channels,
};

const FRAME_CHANNELS: u8 = 3;

/// Opens `source` and wraps it in a [`VideoSource`] that yields planar frames.
pub fn open_video_source(
    source: &CaptureSource,
    hints: CaptureHints,
) -> Result<VideoSource, BridgeError> {
    let grabber = FfmpegFrameGrabber::open(source, hints)?;
    Ok(VideoSource::new(Box::new(grabber)))
}

/// Pulls BGR frames from a video file or capture device via ffmpeg-next.
///
/// Decodes lazily, one frame per [`grab`](FrameGrabber::grab) call.
pub struct FfmpegFrameGrabber {
    session: Option<Session>,
}

// Safety: FfmpegFrameGrabber is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegFrameGrabber {}

struct Session {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    video_stream_index: usize,
    flushing: bool,
    done: bool,
}

impl FfmpegFrameGrabber {
    /// Opens the stream. Hints only reach capture devices; files are
    /// decoded at their native size and rate.
    pub fn open(source: &CaptureSource, hints: CaptureHints) -> Result<Self, BridgeError> {
        ffmpeg_next::init().map_err(capture_error)?;

        let ictx = match source {
            CaptureSource::File(path) => {
                if hints != CaptureHints::default() {
                    log::debug!("Ignoring capture hints for file source {}", path.display());
                }
                ffmpeg_next::format::input(path).map_err(|e| {
                    BridgeError::Capture(format!("cannot open {}: {e}", path.display()))
                })?
            }
            CaptureSource::Device(index) => open_device(*index, hints)?,
        };

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| BridgeError::Capture("no video stream found".into()))?;
        let video_stream_index = stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(capture_error)?;
        let decoder = codec_ctx.decoder().video().map_err(capture_error)?;

        let (out_width, out_height) = match source {
            CaptureSource::File(_) => (decoder.width(), decoder.height()),
            CaptureSource::Device(_) => output_size(hints, decoder.width(), decoder.height()),
        };

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            pixel_for_channels(FRAME_CHANNELS),
            out_width,
            out_height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(capture_error)?;

        log::debug!(
            "Opened {source:?}: {}x{} -> {out_width}x{out_height}",
            decoder.width(),
            decoder.height()
        );

        Ok(Self {
            session: Some(Session {
                ictx,
                decoder,
                scaler,
                video_stream_index,
                flushing: false,
                done: false,
            }),
        })
    }
}

impl Session {
    fn try_receive(&mut self) -> Result<Option<PixelMatrix>, BridgeError> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_ok() {
            let mut packed = ffmpeg_next::util::frame::video::Video::empty();
            self.scaler
                .run(&decoded, &mut packed)
                .map_err(capture_error)?;
            Ok(Some(matrix_from_frame(&packed, FRAME_CHANNELS)))
        } else {
            Ok(None)
        }
    }

    fn next_matrix(&mut self) -> Result<Option<PixelMatrix>, BridgeError> {
        if self.done {
            return Ok(None);
        }

        if let Some(matrix) = self.try_receive()? {
            return Ok(Some(matrix));
        }

        if self.flushing {
            self.done = true;
            return Ok(None);
        }

        loop {
            let next = next_stream_packet(|p| p.read(&mut self.ictx), self.video_stream_index)
                .map_err(capture_error)?;
            let Some(packet) = next else {
                let _ = self.decoder.send_eof();
                self.flushing = true;
                let tail = self.try_receive()?;
                self.done = tail.is_none();
                return Ok(tail);
            };

            if self.decoder.send_packet(&packet).is_err() {
                continue;
            }

            if let Some(matrix) = self.try_receive()? {
                return Ok(Some(matrix));
            }
        }
    }
}

impl FrameGrabber for FfmpegFrameGrabber {
    fn grab(&mut self) -> Result<Option<PixelMatrix>, BridgeError> {
        match self.session.as_mut() {
            Some(session) => session.next_matrix(),
            None => Ok(None),
        }
    }

    fn release(&mut self) {
        self.session = None;
    }
}

fn open_device(
    index: u32,
    hints: CaptureHints,
) -> Result<ffmpeg_next::format::context::Input, BridgeError> {
    ffmpeg_next::device::register_all();

    let (format_name, url) = device_url(index)?;
    let format = ffmpeg_next::device::input::video()
        .find(|f| is_named_input(f, format_name))
        .ok_or_else(|| BridgeError::Capture(format!("{format_name} capture is not available")))?;

    let mut options = ffmpeg_next::Dictionary::new();
    for (key, value) in device_options(hints) {
        options.set(key, &value);
    }

    let ctx = ffmpeg_next::format::open_with(&url, &format, options)
        .map_err(|e| BridgeError::Capture(format!("cannot open device {index}: {e}")))?;

    match ctx {
        ffmpeg_next::format::context::Context::Input(ictx) => Ok(ictx),
        ffmpeg_next::format::context::Context::Output(_) => Err(BridgeError::Capture(format!(
            "device {index} did not open as an input"
        ))),
    }
}

/// Whether `format` is a usable input device registered under `name`.
///
/// The device iterator can hand out a null format when no devices are
/// registered, so those are rejected before the name is read.
fn is_named_input(format: &ffmpeg_next::format::format::Format, name: &str) -> bool {
    match format {
        ffmpeg_next::format::format::Format::Input(input) => {
            // Safety: only the address is inspected.
            let registered = !unsafe { input.as_ptr() }.is_null();
            registered && input.name().split(',').any(|alias| alias == name)
        }
        ffmpeg_next::format::format::Format::Output(_) => false,
    }
}

/// Demuxer options for a capture device.
///
/// The frame size is negotiated as a pair, so it is only requested when both
/// dimensions are hinted. The frame rate is requested on its own.
fn device_options(hints: CaptureHints) -> Vec<(&'static str, String)> {
    let mut options = Vec::new();
    if let (Some(width), Some(height)) = (hints.width, hints.height) {
        options.push(("video_size", format!("{width}x{height}")));
    }
    if let Some(fps) = hints.fps {
        options.push(("framerate", fps.to_string()));
    }
    options
}

/// Size frames are scaled to. Each dimension follows its own hint and falls
/// back to what the device delivers.
fn output_size(hints: CaptureHints, native_width: u32, native_height: u32) -> (u32, u32) {
    (
        hints.width.unwrap_or(native_width),
        hints.height.unwrap_or(native_height),
    )
}

#[cfg(target_os = "linux")]
fn device_url(index: u32) -> Result<(&'static str, String), BridgeError> {
    Ok(("video4linux2", format!("/dev/video{index}")))
}

#[cfg(target_os = "macos")]
fn device_url(index: u32) -> Result<(&'static str, String), BridgeError> {
    Ok(("avfoundation", index.to_string()))
}

#[cfg(target_os = "windows")]
fn device_url(index: u32) -> Result<(&'static str, String), BridgeError> {
    Ok(("vfwcap", index.to_string()))
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn device_url(index: u32) -> Result<(&'static str, String), BridgeError> {
    Err(BridgeError::Capture(format!(
        "device capture is not supported on this platform (device {index})"
    )))
}
