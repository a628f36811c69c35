pub mod frame_grabber;
pub mod image_decoder;
pub mod image_encoder;
pub mod video_source;
