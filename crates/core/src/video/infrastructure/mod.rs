pub mod ffmpeg_frame_grabber;
pub mod ffmpeg_image_decoder;
mod ffmpeg_pixels;
pub mod image_file_encoder;
