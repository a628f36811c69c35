use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::blurring::domain::region_blurrer::RegionBlurrer;
use crate::bridge::format_bridge::{
    interleaved_to_planar, normalize_color_order, planar_to_interleaved,
};
use crate::shared::constants::OUTPUT_SUFFIX;
use crate::shared::detection::Detection;
use crate::shared::error::BridgeError;
use crate::shared::image_buffer::ImageBuffer;
use crate::shared::pixel_rect::PixelRect;
use crate::video::domain::image_encoder::ImageEncoder;

/// What [`Redactor::redact_and_save`] did.
#[derive(Clone, Debug, PartialEq)]
pub struct RedactionReport {
    /// Clamped rectangles that were blurred, in detection order.
    pub rects: Vec<PixelRect>,
    pub output_path: PathBuf,
}

/// Blurs confident detections out of an image and writes the result.
pub struct Redactor {
    blurrer: Box<dyn RegionBlurrer>,
    encoder: Box<dyn ImageEncoder>,
}

impl Redactor {
    pub fn new(blurrer: Box<dyn RegionBlurrer>, encoder: Box<dyn ImageEncoder>) -> Self {
        Self { blurrer, encoder }
    }

    /// Blurs every detection with a class probability above `threshold`
    /// among its first `class_count` classes, then saves to `output` with
    /// `.jpg` appended.
    ///
    /// Three-channel images are expected in RGB plane order, as [`Loader`]
    /// and [`VideoSource`] produce them, and get swapped to the encoder's
    /// BGR order before saving. Other channel counts are saved unswapped, so
    /// four-channel planes must already be in BGRA order.
    ///
    /// [`Loader`]: crate::loading::loader::Loader
    /// [`VideoSource`]: crate::video::domain::video_source::VideoSource
    pub fn redact_and_save(
        &self,
        image: &ImageBuffer,
        detections: &[Detection],
        class_count: usize,
        threshold: f32,
        output: &Path,
    ) -> Result<RedactionReport, BridgeError> {
        if image.is_sentinel() {
            return Err(BridgeError::EmptyImage);
        }

        let rects = redaction_rects(image, detections, class_count, threshold);

        let mut matrix = planar_to_interleaved(image);
        self.blurrer.blur(&mut matrix, &rects)?;

        let mut redacted = interleaved_to_planar(&matrix);
        normalize_color_order(&mut redacted);

        let output_path = with_output_suffix(output);
        self.encoder.encode(&output_path, &planar_to_interleaved(&redacted))?;

        log::debug!(
            "Redacted {} of {} detections into {}",
            rects.len(),
            detections.len(),
            output_path.display()
        );

        Ok(RedactionReport { rects, output_path })
    }
}

/// Pixel rectangles for every detection that passes the threshold, clamped
/// to the image. Detections whose rectangle ends up empty are dropped.
pub fn redaction_rects(
    image: &ImageBuffer,
    detections: &[Detection],
    class_count: usize,
    threshold: f32,
) -> Vec<PixelRect> {
    let (width, height) = (image.width(), image.height());
    detections
        .iter()
        .filter(|d| d.first_class_above(class_count, threshold).is_some())
        .map(|d| PixelRect::from_normalized(&d.bbox, width, height).clamp(width, height))
        .filter(|r| !r.is_empty())
        .collect()
}

fn with_output_suffix(output: &Path) -> PathBuf {
    let mut name = OsString::from(output.as_os_str());
    name.push(".");
    name.push(OUTPUT_SUFFIX);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blurring::infrastructure::cpu_rectangular_blurrer::CpuRectangularBlurrer;
    use crate::shared::detection::NormalizedBox;
    use crate::shared::pixel_matrix::PixelMatrix;
    use crate::video::infrastructure::image_file_encoder::ImageFileEncoder;
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Option<(PathBuf, PixelMatrix)>>>;

    struct CapturingEncoder {
        captured: Captured,
    }

    impl ImageEncoder for CapturingEncoder {
        fn encode(&self, path: &Path, matrix: &PixelMatrix) -> Result<(), BridgeError> {
            *self.captured.lock().unwrap() = Some((path.to_path_buf(), matrix.clone()));
            Ok(())
        }
    }

    struct FailingEncoder;

    impl ImageEncoder for FailingEncoder {
        fn encode(&self, path: &Path, _matrix: &PixelMatrix) -> Result<(), BridgeError> {
            Err(BridgeError::encode(path, "disk full"))
        }
    }

    fn capturing_redactor() -> (Redactor, Captured) {
        let captured = Captured::default();
        let redactor = Redactor::new(
            Box::new(CpuRectangularBlurrer::default()),
            Box::new(CapturingEncoder {
                captured: captured.clone(),
            }),
        );
        (redactor, captured)
    }

    fn saved(captured: &Captured) -> PixelMatrix {
        captured.lock().unwrap().as_ref().unwrap().1.clone()
    }

    fn checkerboard(width: u32, height: u32, channels: u8) -> ImageBuffer {
        let mut img = ImageBuffer::new(width, height, channels);
        let (w, h) = (width as usize, height as usize);
        for k in 0..channels as usize {
            for y in 0..h {
                for x in 0..w {
                    img.data_mut()[k * w * h + y * w + x] = ((x + y) % 2) as f32;
                }
            }
        }
        img
    }

    fn detection(x: f32, y: f32, w: f32, h: f32, prob: Vec<f32>) -> Detection {
        Detection::new(NormalizedBox { x, y, w, h }, prob)
    }

    fn centered_quarter(prob: Vec<f32>) -> Detection {
        detection(0.25, 0.25, 0.25, 0.25, prob)
    }

    fn variance(m: &PixelMatrix, rect: PixelRect) -> f64 {
        let values: Vec<f64> = (rect.y0..rect.y1)
            .flat_map(|y| (rect.x0..rect.x1).map(move |x| (y as usize, x as usize)))
            .map(|(y, x)| m.data()[m.offset(y, x, 0)] as f64)
            .collect();
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
    }

    #[test]
    fn test_blurs_only_inside_rect() {
        let img = checkerboard(100, 100, 3);
        let (redactor, captured) = capturing_redactor();

        redactor
            .redact_and_save(&img, &[], 1, 0.5, Path::new("base"))
            .unwrap();
        let baseline = saved(&captured);

        let report = redactor
            .redact_and_save(&img, &[centered_quarter(vec![0.9])], 1, 0.5, Path::new("out"))
            .unwrap();
        let redacted = saved(&captured);

        let rect = PixelRect::new(13, 13, 36, 36);
        assert_eq!(report.rects, vec![rect]);

        for y in 0..100 {
            for x in 0..100 {
                let inside = (13..36).contains(&x) && (13..36).contains(&y);
                if inside {
                    continue;
                }
                for c in 0..3 {
                    let idx = redacted.offset(y as usize, x as usize, c);
                    assert_eq!(redacted.data()[idx], baseline.data()[idx], "({x},{y},{c})");
                }
            }
        }
        assert!(variance(&redacted, rect) < variance(&baseline, rect));
    }

    #[test]
    fn test_detection_at_threshold_changes_nothing() {
        let img = checkerboard(100, 100, 3);
        let (redactor, captured) = capturing_redactor();

        redactor
            .redact_and_save(&img, &[], 1, 0.5, Path::new("base"))
            .unwrap();
        let baseline = saved(&captured);

        let report = redactor
            .redact_and_save(&img, &[centered_quarter(vec![0.5])], 1, 0.5, Path::new("out"))
            .unwrap();
        assert!(report.rects.is_empty());
        assert_eq!(saved(&captured), baseline);
    }

    #[test]
    fn test_only_first_class_count_probabilities_considered() {
        let img = checkerboard(100, 100, 3);
        let dets = [centered_quarter(vec![0.1, 0.9])];
        assert!(redaction_rects(&img, &dets, 1, 0.5).is_empty());
        assert_eq!(redaction_rects(&img, &dets, 2, 0.5).len(), 1);
        assert_eq!(redaction_rects(&img, &dets, 10, 0.5).len(), 1);
    }

    #[test]
    fn test_border_box_is_clamped() {
        let img = checkerboard(100, 100, 3);
        let dets = [detection(0.0, 0.0, 0.5, 0.5, vec![1.0])];
        assert_eq!(
            redaction_rects(&img, &dets, 1, 0.5),
            vec![PixelRect::new(0, 0, 24, 24)]
        );

        let (redactor, _) = capturing_redactor();
        assert!(redactor
            .redact_and_save(&img, &dets, 1, 0.5, Path::new("out"))
            .is_ok());
    }

    #[test]
    fn test_far_corner_box_is_clamped() {
        let img = checkerboard(80, 60, 3);
        let dets = [detection(1.0, 1.0, 0.5, 0.5, vec![1.0])];
        let rects = redaction_rects(&img, &dets, 1, 0.5);
        assert_eq!(rects, vec![PixelRect::new(61, 46, 80, 60)]);
        assert!(rects.iter().all(|r| r.fits_within(80, 60)));
    }

    #[test]
    fn test_off_image_box_skipped() {
        let img = checkerboard(100, 100, 3);
        let dets = [detection(3.0, 3.0, 0.2, 0.2, vec![1.0])];
        assert!(redaction_rects(&img, &dets, 1, 0.5).is_empty());
    }

    #[test]
    fn test_tiny_box_still_blurs_a_strip() {
        let img = checkerboard(100, 100, 3);
        let dets = [detection(0.5, 0.5, 0.001, 0.2, vec![1.0])];
        let rects = redaction_rects(&img, &dets, 1, 0.5);
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0].width(), 1);
    }

    #[test]
    fn test_color_output_is_bgr() {
        let mut img = ImageBuffer::new(2, 2, 3);
        img.data_mut()[..4].fill(1.0); // red plane
        let (redactor, captured) = capturing_redactor();
        redactor
            .redact_and_save(&img, &[], 1, 0.5, Path::new("out"))
            .unwrap();
        assert_eq!(&saved(&captured).row(0)[..3], &[0, 0, 255]);
    }

    #[test]
    fn test_four_channel_output_is_not_swapped() {
        let mut img = ImageBuffer::new(1, 1, 4);
        img.data_mut().copy_from_slice(&[1.0, 0.0, 0.0, 1.0]);
        let (redactor, captured) = capturing_redactor();
        redactor
            .redact_and_save(&img, &[], 1, 0.5, Path::new("out"))
            .unwrap();
        assert_eq!(saved(&captured).data(), &[255, 0, 0, 255]);
    }

    #[test]
    fn test_gray_output_is_not_swapped() {
        let mut img = ImageBuffer::new(2, 1, 1);
        img.data_mut()[0] = 1.0;
        let (redactor, captured) = capturing_redactor();
        redactor
            .redact_and_save(&img, &[], 1, 0.5, Path::new("out"))
            .unwrap();
        assert_eq!(saved(&captured).data(), &[255, 0]);
    }

    #[test]
    fn test_output_path_gets_jpg_suffix() {
        let img = checkerboard(4, 4, 3);
        let (redactor, captured) = capturing_redactor();

        let report = redactor
            .redact_and_save(&img, &[], 1, 0.5, Path::new("out/photo.png"))
            .unwrap();
        assert_eq!(report.output_path, PathBuf::from("out/photo.png.jpg"));
        assert_eq!(
            captured.lock().unwrap().as_ref().unwrap().0,
            PathBuf::from("out/photo.png.jpg")
        );
    }

    #[test]
    fn test_sentinel_rejected() {
        let (redactor, captured) = capturing_redactor();
        let err = redactor
            .redact_and_save(&ImageBuffer::sentinel(), &[], 1, 0.5, Path::new("out"))
            .unwrap_err();
        assert!(matches!(err, BridgeError::EmptyImage));
        assert!(captured.lock().unwrap().is_none());
    }

    #[test]
    fn test_encode_failure_surfaces() {
        let redactor = Redactor::new(
            Box::new(CpuRectangularBlurrer::default()),
            Box::new(FailingEncoder),
        );
        let err = redactor
            .redact_and_save(&checkerboard(4, 4, 3), &[], 1, 0.5, Path::new("out"))
            .unwrap_err();
        assert!(matches!(err, BridgeError::Encode { .. }));
    }

    #[test]
    fn test_writes_jpeg_file() {
        let dir = tempfile::tempdir().unwrap();
        let redactor = Redactor::new(
            Box::new(CpuRectangularBlurrer::default()),
            Box::new(ImageFileEncoder::new()),
        );
        let report = redactor
            .redact_and_save(
                &checkerboard(64, 48, 3),
                &[centered_quarter(vec![0.9])],
                1,
                0.5,
                &dir.path().join("redacted"),
            )
            .unwrap();

        assert_eq!(report.output_path, dir.path().join("redacted.jpg"));
        let img = image::open(&report.output_path).unwrap();
        assert_eq!((img.width(), img.height()), (64, 48));
    }
}
