use std::path::PathBuf;

use crate::bridge::format_bridge::{interleaved_to_planar, normalize_color_order};
use crate::shared::image_buffer::ImageBuffer;

use super::frame_grabber::FrameGrabber;

/// Where frames come from, fixed at open time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureSource {
    File(PathBuf),
    Device(u32),
}

impl CaptureSource {
    /// Numeric strings name a device index; anything else is a file path.
    pub fn parse(source: &str) -> Self {
        match source.parse::<u32>() {
            Ok(index) => Self::Device(index),
            Err(_) => Self::File(PathBuf::from(source)),
        }
    }
}

/// Best-effort capture settings. Each hint drives only its own property
/// and a device is free to ignore any of them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptureHints {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<u32>,
}

impl CaptureHints {
    /// Builds hints from raw values where `0` means "not requested".
    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        let nonzero = |v: u32| (v != 0).then_some(v);
        Self {
            width: nonzero(width),
            height: nonzero(height),
            fps: nonzero(fps),
        }
    }
}

/// Exclusively owned frame stream.
///
/// Hands out one planar frame per [`next_frame`](Self::next_frame) call.
/// Once the stream ends or a read fails it returns the sentinel image on
/// every later call without touching the grabber again. The grabber is
/// released on [`close`](Self::close) or drop, whichever comes first.
pub struct VideoSource {
    grabber: Option<Box<dyn FrameGrabber>>,
    exhausted: bool,
    frames_read: usize,
}

impl VideoSource {
    pub fn new(grabber: Box<dyn FrameGrabber>) -> Self {
        Self {
            grabber: Some(grabber),
            exhausted: false,
            frames_read: 0,
        }
    }

    /// Pulls and converts the next frame, or returns the sentinel.
    pub fn next_frame(&mut self) -> ImageBuffer {
        if self.exhausted {
            return ImageBuffer::sentinel();
        }
        let Some(grabber) = self.grabber.as_mut() else {
            self.exhausted = true;
            return ImageBuffer::sentinel();
        };

        match grabber.grab() {
            Ok(Some(matrix)) if !matrix.is_empty() => {
                let mut image = interleaved_to_planar(&matrix);
                normalize_color_order(&mut image);
                self.frames_read += 1;
                image
            }
            Ok(_) => {
                log::debug!("Video stream ended after {} frames", self.frames_read);
                self.exhausted = true;
                ImageBuffer::sentinel()
            }
            Err(e) => {
                log::warn!("Stopping video stream after {} frames: {e}", self.frames_read);
                self.exhausted = true;
                ImageBuffer::sentinel()
            }
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn frames_read(&self) -> usize {
        self.frames_read
    }

    /// Releases the capture resource. Later calls are no-ops.
    pub fn close(&mut self) {
        if let Some(mut grabber) = self.grabber.take() {
            grabber.release();
        }
        self.exhausted = true;
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::error::BridgeError;
    use crate::shared::pixel_matrix::PixelMatrix;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    type Script = VecDeque<Result<Option<PixelMatrix>, BridgeError>>;

    #[derive(Default)]
    struct Calls {
        grabs: usize,
        releases: usize,
    }

    struct StubGrabber {
        script: Script,
        calls: Arc<Mutex<Calls>>,
    }

    impl StubGrabber {
        fn new(script: Script) -> (Self, Arc<Mutex<Calls>>) {
            let calls = Arc::new(Mutex::new(Calls::default()));
            (
                Self {
                    script,
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    impl FrameGrabber for StubGrabber {
        fn grab(&mut self) -> Result<Option<PixelMatrix>, BridgeError> {
            self.calls.lock().unwrap().grabs += 1;
            self.script.pop_front().unwrap_or(Ok(None))
        }

        fn release(&mut self) {
            self.calls.lock().unwrap().releases += 1;
        }
    }

    /// 2x1 BGR frame: pixel 0 = (b=0, g=0, r=255), pixel 1 = (255, 0, 0).
    fn bgr_frame() -> PixelMatrix {
        PixelMatrix::from_data(vec![0, 0, 255, 255, 0, 0], 2, 1, 3, 6)
    }

    fn frames(n: usize) -> Script {
        (0..n).map(|_| Ok(Some(bgr_frame()))).collect()
    }

    #[test]
    fn test_next_frame_converts_to_rgb_planar() {
        let (grabber, _) = StubGrabber::new(frames(1));
        let mut source = VideoSource::new(Box::new(grabber));

        let img = source.next_frame();
        assert_eq!((img.width(), img.height(), img.channels()), (2, 1, 3));
        // Plane 0 is red after normalization
        assert_eq!(img.plane(0), &[1.0, 0.0]);
        assert_eq!(img.plane(2), &[0.0, 1.0]);
    }

    #[test]
    fn test_gray_frames_are_not_swapped() {
        let gray = PixelMatrix::from_data(vec![0, 255], 2, 1, 1, 2);
        let (grabber, _) = StubGrabber::new(VecDeque::from([Ok(Some(gray))]));
        let mut source = VideoSource::new(Box::new(grabber));
        assert_eq!(source.next_frame().data(), &[0.0, 1.0]);
    }

    #[test]
    fn test_padded_frames_convert_by_stride() {
        let mut data = vec![9u8; 16];
        data[0..6].copy_from_slice(&[0, 0, 255, 0, 0, 255]);
        data[8..14].copy_from_slice(&[255, 0, 0, 255, 0, 0]);
        let padded = PixelMatrix::from_data(data, 2, 2, 3, 8);
        let (grabber, _) = StubGrabber::new(VecDeque::from([Ok(Some(padded))]));
        let mut source = VideoSource::new(Box::new(grabber));

        let img = source.next_frame();
        assert_eq!(img.plane(0), &[1.0, 1.0, 0.0, 0.0]);
        assert_eq!(img.plane(1), &[0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_exhaustion_returns_sentinel_forever() {
        let (grabber, calls) = StubGrabber::new(frames(2));
        let mut source = VideoSource::new(Box::new(grabber));

        assert!(!source.next_frame().is_sentinel());
        assert!(!source.next_frame().is_sentinel());
        assert!(source.next_frame().is_sentinel());
        assert!(source.is_exhausted());
        for _ in 0..5 {
            assert!(source.next_frame().is_sentinel());
        }
        assert_eq!(calls.lock().unwrap().grabs, 3, "no reads after exhaustion");
        assert_eq!(source.frames_read(), 2);
    }

    #[test]
    fn test_read_error_latches_sentinel() {
        let mut script = frames(1);
        script.push_back(Err(BridgeError::Capture("device unplugged".into())));
        script.extend(frames(3));
        let (grabber, calls) = StubGrabber::new(script);
        let mut source = VideoSource::new(Box::new(grabber));

        assert!(!source.next_frame().is_sentinel());
        assert!(source.next_frame().is_sentinel());
        assert!(source.next_frame().is_sentinel(), "no resurrection after an error");
        assert_eq!(calls.lock().unwrap().grabs, 2);
    }

    #[test]
    fn test_empty_matrix_counts_as_end_of_stream() {
        let script = VecDeque::from([Ok(Some(PixelMatrix::new(0, 0, 0))), Ok(Some(bgr_frame()))]);
        let (grabber, _) = StubGrabber::new(script);
        let mut source = VideoSource::new(Box::new(grabber));
        assert!(source.next_frame().is_sentinel());
        assert!(source.next_frame().is_sentinel());
    }

    #[test]
    fn test_close_releases_once() {
        let (grabber, calls) = StubGrabber::new(frames(3));
        let mut source = VideoSource::new(Box::new(grabber));
        source.close();
        source.close();
        drop(source);
        assert_eq!(calls.lock().unwrap().releases, 1);
    }

    #[test]
    fn test_drop_releases() {
        let (grabber, calls) = StubGrabber::new(frames(3));
        {
            let mut source = VideoSource::new(Box::new(grabber));
            source.next_frame();
        }
        assert_eq!(calls.lock().unwrap().releases, 1);
    }

    #[test]
    fn test_next_frame_after_close_is_sentinel() {
        let (grabber, calls) = StubGrabber::new(frames(3));
        let mut source = VideoSource::new(Box::new(grabber));
        source.close();
        assert!(source.next_frame().is_sentinel());
        assert_eq!(calls.lock().unwrap().grabs, 0);
    }

    #[test]
    fn test_capture_source_parse() {
        assert_eq!(CaptureSource::parse("0"), CaptureSource::Device(0));
        assert_eq!(CaptureSource::parse("2"), CaptureSource::Device(2));
        assert_eq!(
            CaptureSource::parse("clip.mp4"),
            CaptureSource::File(PathBuf::from("clip.mp4"))
        );
    }

    #[test]
    fn test_capture_hints_zero_means_unset() {
        let hints = CaptureHints::new(640, 0, 15);
        assert_eq!(hints.width, Some(640));
        assert_eq!(hints.height, None);
        assert_eq!(hints.fps, Some(15));
    }
}
