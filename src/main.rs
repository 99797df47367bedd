//! Video Magnification CLI
//!
//! Runs the magnification pipeline against the mock camera and prints
//! breath values as they are emitted. A real camera backend would
//! implement the `Camera` trait and slot into the same wiring.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use video_magnify::{
    capture::{Camera, FileConfig, MockCamera, SharedFrameBuffer},
    magnify::{MagnifyMode, MagnifySettings},
    processing::{FileSink, NoopSink, ProcessingControl, ProcessingThread, Publisher},
    CaptureConfig, Rect,
};

#[derive(Parser)]
#[command(name = "video-magnify")]
#[command(about = "Real-time Eulerian video magnification")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Magnification mode
    #[arg(short, long, value_enum, default_value = "laplace")]
    mode: Mode,

    /// Amplification magnitude
    #[arg(short, long, default_value = "10.0")]
    amplification: f32,

    /// Lower temporal cutoff in Hz
    #[arg(long, default_value = "0.5")]
    co_low: f32,

    /// Upper temporal cutoff in Hz
    #[arg(long, default_value = "1.0")]
    co_high: f32,

    /// Pyramid depth
    #[arg(short, long, default_value = "4")]
    levels: u32,

    /// Process single-channel frames
    #[arg(long)]
    grayscale: bool,

    /// Write the smoothed breath value to this file
    #[arg(long, value_name = "FILE")]
    breath_sink: Option<PathBuf>,

    /// Run continuously until interrupted
    #[arg(long)]
    continuous: bool,

    /// Number of frames to process (ignored if --continuous)
    #[arg(short = 'n', long, default_value = "100")]
    frames: u32,
}

#[derive(Copy, Clone, ValueEnum)]
enum Mode {
    Off,
    Color,
    Laplace,
    Riesz,
}

impl From<Mode> for MagnifyMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Off => MagnifyMode::Off,
            Mode::Color => MagnifyMode::Color,
            Mode::Laplace => MagnifyMode::Laplace,
            Mode::Riesz => MagnifyMode::Riesz,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run with the mock camera and report breath values
    Mock {
        /// Number of frames to process
        #[arg(short = 'n', long, default_value = "120")]
        frames: u32,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Mock { frames }) => run_pipeline(&cli, frames, false),
        None => {
            let frames = if cli.continuous { u32::MAX } else { cli.frames };
            run_pipeline(&cli, frames, cli.continuous);
        }
    }
}

fn build_settings(cli: &Cli, file: Option<&FileConfig>) -> MagnifySettings {
    let mut settings = file
        .map(|f| f.magnify.clone())
        .unwrap_or_default();
    settings.mode = cli.mode.into();
    settings.amplification = cli.amplification;
    settings.co_low = cli.co_low;
    settings.co_high = cli.co_high;
    settings.levels = cli.levels;
    settings.grayscale = cli.grayscale;
    settings
}

fn run_pipeline(cli: &Cli, frame_count: u32, continuous: bool) {
    info!("Video magnification v{}", video_magnify::VERSION);

    let file_config = cli.config.as_ref().map(|path| {
        FileConfig::from_file(path).unwrap_or_else(|e| {
            eprintln!("Failed to load config file: {e}");
            std::process::exit(1);
        })
    });

    let capture_config = file_config
        .as_ref()
        .map(|c| c.capture.clone())
        .unwrap_or_else(|| CaptureConfig {
            width: 128,
            height: 128,
            grayscale: cli.grayscale,
            ..Default::default()
        });

    let mut settings = build_settings(cli, file_config.as_ref());
    settings.framerate = capture_config.fps as f32;

    let roi = Rect::new(0, 0, capture_config.width, capture_config.height);
    let control = match ProcessingControl::new(settings, roi) {
        Ok(control) => control,
        Err(e) => {
            eprintln!("Invalid settings: {e}");
            std::process::exit(1);
        }
    };

    let mut camera = MockCamera::new();
    if let Err(e) = camera.open(&capture_config) {
        eprintln!("Failed to open camera: {e}");
        std::process::exit(1);
    }

    let buffer = Arc::new(SharedFrameBuffer::new(4));
    let publisher = Arc::new(Publisher::new());

    // CLI takes precedence, then the config file's output section.
    let sink_path = cli.breath_sink.clone().or_else(|| {
        file_config
            .as_ref()
            .map(|c| c.output.breath_sink_path.as_str())
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    });
    let sink: Box<dyn video_magnify::processing::BreathSink> = match sink_path {
        Some(path) => Box::new(FileSink::new(path)),
        None => Box::new(NoopSink),
    };

    let mut worker = ProcessingThread::new(
        Arc::clone(&buffer),
        Arc::clone(&publisher),
        Arc::clone(&control),
    )
    .with_breath_sink(sink);
    if let Some(csv_path) = file_config
        .as_ref()
        .map(|c| c.output.csv_path.as_str())
        .filter(|p| !p.is_empty())
    {
        worker = worker.with_csv_path(csv_path);
    }
    let worker = worker.spawn();

    // Ctrl+C requests a stop in continuous mode
    if continuous {
        let control = Arc::clone(&control);
        ctrlc::set_handler(move || control.stop()).ok();
    }

    let frame_period = std::time::Duration::from_millis(1000 / capture_config.fps.max(1) as u64);
    let mut captured = 0u32;
    let mut emitted = 0u64;
    while captured < frame_count && !control.is_stopped() {
        match camera.capture() {
            Ok(frame) => buffer.put(frame),
            Err(e) => {
                warn!("Frame capture failed: {e}");
                continue;
            }
        }
        captured = captured.saturating_add(1);
        std::thread::sleep(frame_period);

        if let Some(frame) = publisher.take_frame() {
            emitted += 1;
            if emitted % 30 == 0 {
                info!(
                    sequence = frame.sequence(),
                    emitted, "Magnified frame received"
                );
            }
        }
        if let Some(breath) = publisher.take_breath() {
            info!(breath, "Breath value");
        }
        if let Some(stats) = publisher.take_stats() {
            info!(fps = stats.average_fps, frames = stats.frames_processed, "Stats");
        }
    }

    control.stop();
    worker.join().expect("processing thread panicked");
    camera.close();
    info!(captured, emitted, "Finished");
}
