/// Side length of the square Gaussian kernel used for redaction.
pub const BLUR_KERNEL_SIZE: usize = 27;

/// Dimensions of the all-black image returned when a load falls back.
pub const PLACEHOLDER_WIDTH: u32 = 10;
pub const PLACEHOLDER_HEIGHT: u32 = 10;
pub const PLACEHOLDER_CHANNELS: u8 = 3;

/// Default side-channel file listing paths that failed to decode.
pub const FAILURE_LOG_FILE: &str = "bad.list";

/// Suffix appended to every redacted output path.
pub const OUTPUT_SUFFIX: &str = "jpg";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
