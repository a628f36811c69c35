pub mod blurring;
pub mod bridge;
pub mod loading;
pub mod redaction;
pub mod shared;
pub mod video;
