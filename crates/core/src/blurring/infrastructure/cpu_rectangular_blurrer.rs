use std::cell::RefCell;

use crate::blurring::domain::region_blurrer::RegionBlurrer;
use crate::shared::constants::BLUR_KERNEL_SIZE;
use crate::shared::error::BridgeError;
use crate::shared::pixel_matrix::PixelMatrix;
use crate::shared::pixel_rect::PixelRect;

use super::gaussian::{self, RoiRect};

/// CPU rectangular blurrer using separable Gaussian blur.
///
/// Only pixels inside each rectangle are written. The kernel still reads up
/// to half its size of surrounding image context, and reflects at the image
/// border, so a blurred rectangle matches the same area of a whole-image
/// blur.
pub struct CpuRectangularBlurrer {
    kernel: Vec<f32>,
    roi_buf: RefCell<Vec<u8>>,
    blur_temp: RefCell<Vec<f32>>,
}

impl CpuRectangularBlurrer {
    /// `kernel_size` must be odd and >= 1.
    pub fn new(kernel_size: usize) -> Self {
        Self {
            kernel: gaussian::gaussian_kernel_1d(kernel_size),
            roi_buf: RefCell::new(Vec::new()),
            blur_temp: RefCell::new(Vec::new()),
        }
    }
}

impl Default for CpuRectangularBlurrer {
    fn default() -> Self {
        Self::new(BLUR_KERNEL_SIZE)
    }
}

impl RegionBlurrer for CpuRectangularBlurrer {
    fn blur(&self, matrix: &mut PixelMatrix, rects: &[PixelRect]) -> Result<(), BridgeError> {
        let (width, height) = (matrix.width(), matrix.height());
        let channels = matrix.channels() as usize;
        let stride = matrix.stride();
        let margin = self.kernel.len() / 2;

        for r in rects {
            if r.is_empty() {
                continue;
            }
            if !r.fits_within(width, height) {
                return Err(BridgeError::BoundsViolation {
                    rect: *r,
                    width,
                    height,
                });
            }

            let rect = RoiRect {
                x: r.x0 as usize,
                y: r.y0 as usize,
                w: r.width() as usize,
                h: r.height() as usize,
            };
            let context = rect.expand(margin, width as usize, height as usize);

            let mut roi = self.roi_buf.borrow_mut();
            let mut temp = self.blur_temp.borrow_mut();
            gaussian::extract_roi(matrix.data(), stride, channels, context, &mut roi);
            gaussian::separable_gaussian_blur_with_kernel(
                &mut roi,
                context.w,
                context.h,
                channels,
                &self.kernel,
                &mut temp,
            );
            gaussian::write_roi_back(matrix.data_mut(), &roi, stride, channels, context, rect);
        }

        Ok(())
    }
}
