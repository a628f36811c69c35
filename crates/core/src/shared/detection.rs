use serde::Deserialize;

/// Box geometry as fractions of the image size: center `(x, y)` and
/// extent `(w, h)`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct NormalizedBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// An externally produced detection: one box plus a probability per class.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Detection {
    pub bbox: NormalizedBox,
    pub prob: Vec<f32>,
}

impl Detection {
    pub fn new(bbox: NormalizedBox, prob: Vec<f32>) -> Self {
        Self { bbox, prob }
    }

    /// Lowest class index among the first `class_count` whose probability
    /// is strictly above `threshold`.
    pub fn first_class_above(&self, class_count: usize, threshold: f32) -> Option<usize> {
        self.prob
            .iter()
            .take(class_count)
            .position(|&p| p > threshold)
    }
}
