pub mod constants;
pub mod detection;
pub mod error;
pub mod image_buffer;
pub mod pixel_matrix;
pub mod pixel_rect;
