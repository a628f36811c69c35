use ndarray::{ArrayView3, ArrayViewMut3};

/// A planar float image: all of channel 0, then channel 1, and so on.
///
/// Values are conventionally in `[0, 1]` but nothing enforces that except
/// [`clamp01`](crate::bridge::format_bridge::clamp01). The `(0, 0, 0)` shape
/// is reserved as the sentinel meaning "no image" and carries no storage.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageBuffer {
    data: Vec<f32>,
    width: u32,
    height: u32,
    channels: u8,
}

impl ImageBuffer {
    /// Allocates a zero-filled buffer of `width * height * channels` floats.
    pub fn new(width: u32, height: u32, channels: u8) -> Self {
        let len = (width as usize) * (height as usize) * (channels as usize);
        Self {
            data: vec![0.0; len],
            width,
            height,
            channels,
        }
    }

    pub fn from_data(data: Vec<f32>, width: u32, height: u32, channels: u8) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
        }
    }

    pub fn sentinel() -> Self {
        Self {
            data: Vec::new(),
            width: 0,
            height: 0,
            channels: 0,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.width == 0 && self.height == 0 && self.channels == 0
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Number of floats in a single channel plane.
    pub fn plane_len(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    pub fn plane(&self, channel: usize) -> &[f32] {
        let len = self.plane_len();
        &self.data[channel * len..(channel + 1) * len]
    }

    /// Frees the pixel storage. Consuming `self` makes a second release
    /// impossible.
    pub fn release(self) {}

    /// View shaped `(channels, height, width)`.
    pub fn as_ndarray(&self) -> ArrayView3<'_, f32> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("ImageBuffer data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, f32> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("ImageBuffer data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.channels as usize,
            self.height as usize,
            self.width as usize,
        )
    }
}
