use super::detection::NormalizedBox;

/// Half-open pixel rectangle `[x0, x1) × [y0, y1)`.
///
/// Built from normalized detection geometry, which may spill past the image
/// edges; call [`clamp`](Self::clamp) before touching pixel storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl PixelRect {
    /// Creates a rectangle from two corners, in either order.
    pub fn new(xa: i32, ya: i32, xb: i32, yb: i32) -> Self {
        Self {
            x0: xa.min(xb),
            y0: ya.min(yb),
            x1: xa.max(xb),
            y1: ya.max(yb),
        }
    }

    /// Maps a normalized center/size box onto a `width × height` image.
    ///
    /// Each edge is inset by one pixel so the literal box border stays
    /// untouched. Coordinates truncate toward zero. When a box is narrower
    /// than the two-pixel inset the insets cross, and the corners are
    /// reordered into a thin strip.
    pub fn from_normalized(bbox: &NormalizedBox, width: u32, height: u32) -> Self {
        let (cx, cy) = (bbox.x as f64, bbox.y as f64);
        let (half_w, half_h) = (bbox.w as f64 / 2.0, bbox.h as f64 / 2.0);
        let (w, h) = (width as f64, height as f64);

        let left = ((cx - half_w) * w + 1.0) as i32;
        let right = ((cx + half_w) * w - 1.0) as i32;
        let top = ((cy - half_h) * h + 1.0) as i32;
        let bottom = ((cy + half_h) * h - 1.0) as i32;

        Self::new(left, top, right, bottom)
    }

    /// Intersects with `[0, width) × [0, height)`.
    pub fn clamp(&self, width: u32, height: u32) -> Self {
        let w = i32::try_from(width).unwrap_or(i32::MAX);
        let h = i32::try_from(height).unwrap_or(i32::MAX);
        Self {
            x0: self.x0.clamp(0, w),
            y0: self.y0.clamp(0, h),
            x1: self.x1.clamp(0, w),
            y1: self.y1.clamp(0, h),
        }
    }

    pub fn width(&self) -> i32 {
        (self.x1 - self.x0).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.y1 - self.y0).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// True when every covered pixel lies inside a `width × height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x0 >= 0
            && self.y0 >= 0
            && (self.x1 as i64) <= width as i64
            && (self.y1 as i64) <= height as i64
    }
}
