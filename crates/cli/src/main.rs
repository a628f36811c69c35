use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use redact_bridge_core::blurring::infrastructure::cpu_rectangular_blurrer::CpuRectangularBlurrer;
use redact_bridge_core::bridge::format_bridge::{normalize_color_order, planar_to_interleaved};
use redact_bridge_core::loading::failure_log::FileFailureLog;
use redact_bridge_core::loading::loader::Loader;
use redact_bridge_core::redaction::redactor::Redactor;
use redact_bridge_core::shared::constants::{BLUR_KERNEL_SIZE, FAILURE_LOG_FILE, IMAGE_EXTENSIONS};
use redact_bridge_core::shared::detection::Detection;
use redact_bridge_core::video::domain::image_encoder::ImageEncoder;
use redact_bridge_core::video::domain::video_source::{CaptureHints, CaptureSource};
use redact_bridge_core::video::infrastructure::ffmpeg_frame_grabber::open_video_source;
use redact_bridge_core::video::infrastructure::ffmpeg_image_decoder::FfmpegImageDecoder;
use redact_bridge_core::video::infrastructure::image_file_encoder::ImageFileEncoder;

/// Detection-driven image redaction and frame capture.
#[derive(Parser)]
#[command(name = "redact-bridge")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Blur detected regions of an image and save it as JPEG.
    Redact(RedactArgs),
    /// Save frames from a video file or capture device.
    Grab(GrabArgs),
}

#[derive(clap::Args)]
struct RedactArgs {
    /// Input image file.
    input: PathBuf,

    /// JSON array of detections: [{"bbox": {"x", "y", "w", "h"}, "prob": [...]}].
    detections: PathBuf,

    /// Output path; ".jpg" is appended.
    output: PathBuf,

    /// Class probability a detection must exceed to be blurred (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    threshold: f32,

    /// Channels to load: 0 (as stored), 1 (grayscale) or 3 (color).
    #[arg(long, default_value = "3")]
    channels: u8,

    /// Number of leading classes to consider (defaults to all).
    #[arg(long)]
    classes: Option<usize>,

    /// File that collects paths which failed to load.
    #[arg(long, default_value = FAILURE_LOG_FILE)]
    failure_log: PathBuf,

    /// Gaussian blur kernel size (must be odd).
    #[arg(long, default_value_t = BLUR_KERNEL_SIZE)]
    kernel_size: usize,
}

#[derive(clap::Args)]
struct GrabArgs {
    /// Video file, or a device index such as 0.
    source: String,

    /// Directory the frames are written to.
    output_dir: PathBuf,

    /// Stop after this many frames (default: until the stream ends).
    #[arg(long)]
    frames: Option<usize>,

    /// Requested capture width (devices only).
    #[arg(long, default_value = "0")]
    width: u32,

    /// Requested capture height (devices only).
    #[arg(long, default_value = "0")]
    height: u32,

    /// Requested capture frame rate (devices only).
    #[arg(long, default_value = "0")]
    fps: u32,

    /// Image format of the saved frames.
    #[arg(long, default_value = "png")]
    format: String,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Redact(args) => {
            validate_redact(&args)?;
            run_redact(&args)
        }
        Command::Grab(args) => {
            validate_grab(&args)?;
            run_grab(&args)
        }
    }
}

fn run_redact(args: &RedactArgs) -> Result<(), Box<dyn std::error::Error>> {
    let detections = read_detections(&args.detections)?;
    let class_count = args
        .classes
        .unwrap_or_else(|| detections.iter().map(|d| d.prob.len()).max().unwrap_or(0));

    let loader = Loader::new(
        Box::new(FfmpegImageDecoder::new()),
        Box::new(FileFailureLog::new(&args.failure_log)),
    );
    let image = loader.load_image(&args.input, args.channels)?;

    let redactor = Redactor::new(
        Box::new(CpuRectangularBlurrer::new(args.kernel_size)),
        Box::new(ImageFileEncoder::new()),
    );
    let report = redactor.redact_and_save(
        &image,
        &detections,
        class_count,
        args.threshold,
        &args.output,
    )?;

    log::info!(
        "Blurred {} regions, output written to {}",
        report.rects.len(),
        report.output_path.display()
    );
    Ok(())
}

fn run_grab(args: &GrabArgs) -> Result<(), Box<dyn std::error::Error>> {
    let source = CaptureSource::parse(&args.source);
    let hints = CaptureHints::new(args.width, args.height, args.fps);
    let mut video = open_video_source(&source, hints)?;

    std::fs::create_dir_all(&args.output_dir)?;
    let encoder = ImageFileEncoder::new();
    let limit = args.frames.unwrap_or(usize::MAX);

    let mut saved = 0;
    while saved < limit {
        let mut frame = video.next_frame();
        if frame.is_sentinel() {
            break;
        }
        normalize_color_order(&mut frame);
        let path = args
            .output_dir
            .join(format!("frame_{saved:05}.{}", args.format));
        encoder.encode(&path, &planar_to_interleaved(&frame))?;
        saved += 1;
        eprint!("\rSaved frame {saved}");
    }
    video.close();
    eprintln!();

    log::info!("Saved {saved} frames to {}", args.output_dir.display());
    Ok(())
}

fn read_detections(path: &Path) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
    let file = File::open(path)
        .map_err(|e| format!("Cannot open detections {}: {e}", path.display()))?;
    let detections = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| format!("Invalid detections in {}: {e}", path.display()))?;
    Ok(detections)
}

fn validate_redact(args: &RedactArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.detections.exists() {
        return Err(format!("Detections file not found: {}", args.detections.display()).into());
    }
    if !(0.0..=1.0).contains(&args.threshold) {
        return Err(format!(
            "Threshold must be between 0.0 and 1.0, got {}",
            args.threshold
        )
        .into());
    }
    if args.kernel_size == 0 || args.kernel_size % 2 == 0 {
        return Err(format!(
            "Kernel size must be a positive odd integer, got {}",
            args.kernel_size
        )
        .into());
    }
    Ok(())
}

fn validate_grab(args: &GrabArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !IMAGE_EXTENSIONS.contains(&args.format.to_lowercase().as_str()) {
        return Err(format!(
            "Frame format must be one of: {}, got '{}'",
            IMAGE_EXTENSIONS.join(", "),
            args.format
        )
        .into());
    }
    if args.frames == Some(0) {
        return Err("--frames must be at least 1".into());
    }
    Ok(())
}
