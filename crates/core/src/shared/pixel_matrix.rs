/// Interleaved 8-bit pixels as exchanged with the native codec.
///
/// Each row holds all channels of pixel 0, then pixel 1, and so on. Rows
/// start `stride` bytes apart; the stride may exceed `width * channels`
/// because decoders pad rows for alignment, so every access goes through
/// [`offset`](Self::offset).
#[derive(Clone, Debug, PartialEq)]
pub struct PixelMatrix {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    stride: usize,
}

impl PixelMatrix {
    /// Allocates a zeroed, tightly packed matrix.
    pub fn new(width: u32, height: u32, channels: u8) -> Self {
        let stride = (width as usize) * (channels as usize);
        Self::with_stride(width, height, channels, stride)
    }

    /// Allocates a zeroed matrix whose rows are `stride` bytes apart.
    pub fn with_stride(width: u32, height: u32, channels: u8, stride: usize) -> Self {
        let row = (width as usize) * (channels as usize);
        let stride = stride.max(row);
        Self {
            data: vec![0; stride * height as usize],
            width,
            height,
            channels,
            stride,
        }
    }

    pub fn from_data(data: Vec<u8>, width: u32, height: u32, channels: u8, stride: usize) -> Self {
        debug_assert!(
            stride >= (width as usize) * (channels as usize),
            "stride must be at least width * channels"
        );
        debug_assert!(
            data.len() >= Self::required_len(width, height, channels, stride),
            "data too short for dimensions and stride"
        );
        Self {
            data,
            width,
            height,
            channels,
            stride,
        }
    }

    /// Minimum buffer length: the final row need not carry padding.
    pub fn required_len(width: u32, height: u32, channels: u8, stride: usize) -> usize {
        if height == 0 {
            return 0;
        }
        stride * (height as usize - 1) + (width as usize) * (channels as usize)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
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

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.channels == 0
    }

    /// Byte offset of `(row, col, channel)`.
    #[inline]
    pub fn offset(&self, row: usize, col: usize, channel: usize) -> usize {
        row * self.stride + col * self.channels as usize + channel
    }

    /// The visible bytes of one row, padding excluded.
    pub fn row(&self, row: usize) -> &[u8] {
        let start = row * self.stride;
        &self.data[start..start + self.row_len()]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [u8] {
        let start = row * self.stride;
        let len = self.row_len();
        &mut self.data[start..start + len]
    }

    /// Copies the visible pixels into a tightly packed buffer.
    pub fn to_packed(&self) -> Vec<u8> {
        let mut packed = Vec::with_capacity(self.row_len() * self.height as usize);
        for row in 0..self.height as usize {
            packed.extend_from_slice(self.row(row));
        }
        packed
    }

    fn row_len(&self) -> usize {
        (self.width as usize) * (self.channels as usize)
    }
}
