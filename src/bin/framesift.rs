use std::{path::PathBuf, sync::Arc};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use framesift::{
    ExtractionConfig, FfmpegLogLevel, FrameVerdict, ProgressCallback, ProgressSnapshot,
    TesseractCli,
    configuration::{
        DEFAULT_CONTRAST_THRESHOLD, DEFAULT_INTERVAL_SECONDS, DEFAULT_SHARPNESS_THRESHOLD,
        DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TEXT_LANGUAGES,
    },
};
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  framesift extract lecture.mp4 -o slides -i 2 --progress\n  framesift extract demo.mov --no-text -t 0.9 --json\n  framesift page-turn slides/frame_0005.png --prev slides/frame_0004.png --next slides/frame_0006.png\n  framesift archive slides --out slides.zip\n  framesift completions zsh > _framesift";

#[derive(Debug, Parser)]
#[command(
    name = "framesift",
    version,
    about = "Extract distinct, legible frames from slide and lecture videos",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Log run details and print one line per sampled frame.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar during extraction.
    #[arg(long, global = true)]
    progress: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract frames from a video.
    #[command(
        about = "Extract distinct frames from a video",
        after_help = "Examples:\n  framesift extract input.mp4 -o frames\n  framesift extract input.mp4 -o frames -i 0.5 -s 100 --text-lang eng"
    )]
    Extract {
        /// Input video path.
        video: PathBuf,
        /// Output directory for kept frames.
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
        /// Seconds between sampled frames.
        #[arg(short, long, default_value_t = DEFAULT_INTERVAL_SECONDS)]
        interval: f64,
        /// SSIM at or above which a frame counts as a duplicate.
        #[arg(short = 't', long = "threshold", default_value_t = DEFAULT_SIMILARITY_THRESHOLD)]
        threshold: f64,
        /// Minimum Laplacian variance.
        #[arg(short, long, default_value_t = DEFAULT_SHARPNESS_THRESHOLD)]
        sharpness: f64,
        /// Minimum luminance standard deviation.
        #[arg(short, long, default_value_t = DEFAULT_CONTRAST_THRESHOLD)]
        contrast: f64,
        /// Keep frames without recognisable text.
        #[arg(long)]
        no_text: bool,
        /// Tesseract language string.
        #[arg(long, default_value = DEFAULT_TEXT_LANGUAGES)]
        text_lang: String,
        /// Path to the tesseract executable.
        #[arg(long)]
        tesseract: Option<PathBuf>,
        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check whether a kept frame is a page-turn artifact.
    #[command(
        about = "Flag page-turn and cross-fade frames",
        after_help = "Examples:\n  framesift page-turn frames/frame_0007.png\n  framesift page-turn frames/frame_0007.png --prev frames/frame_0006.png --next frames/frame_0008.png"
    )]
    PageTurn {
        /// Frame to inspect.
        image: PathBuf,
        /// The kept frame before it.
        #[arg(long)]
        prev: Option<PathBuf>,
        /// The kept frame after it.
        #[arg(long)]
        next: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },

    /// Zip kept frames.
    #[command(
        about = "Package frames into a zip archive",
        after_help = "Examples:\n  framesift archive frames --out frames.zip\n  framesift archive frames --out picked.zip frame_0002.png frame_0005.png"
    )]
    Archive {
        /// Directory holding the frames.
        frames_dir: PathBuf,
        /// Archive path to write.
        #[arg(long)]
        out: PathBuf,
        /// Frame file names to include; all PNGs when omitted.
        names: Vec<String>,
    },

    /// Validate a video and print a report.
    #[command(
        about = "Validate a video file",
        after_help = "Examples:\n  framesift validate input.mp4"
    )]
    Validate {
        /// Input video path.
        video: PathBuf,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let level = if global.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init()?;

    let ffmpeg_level = match &global.log_level {
        Some(name) => name
            .parse::<FfmpegLogLevel>()
            .map_err(|error| format!("unsupported --log-level: {error}"))?,
        None => FfmpegLogLevel::matching(log::max_level()).min(FfmpegLogLevel::Error),
    };
    framesift::set_ffmpeg_log_level(ffmpeg_level);
    Ok(())
}

/// Drives the terminal while an extraction runs.
struct TerminalProgress {
    bar: Option<ProgressBar>,
    verbose: bool,
}

impl TerminalProgress {
    fn new(show_bar: bool, verbose: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = if show_bar {
            let bar = ProgressBar::new(0);
            let style =
                ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
            bar.set_style(style.progress_chars("##-"));
            Some(bar)
        } else {
            None
        };
        Ok(Self { bar, verbose })
    }

    fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message("done");
        }
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        if let Some(bar) = &self.bar {
            if snapshot.total_frames > 0 {
                bar.set_length(snapshot.total_frames.max(snapshot.scanned_frames));
            }
            bar.set_position(snapshot.scanned_frames);
            bar.set_message(format!(
                "{} saved, {} skipped",
                snapshot.saved_count,
                snapshot.skipped_count + snapshot.quality_filtered + snapshot.text_filtered
            ));
        }
    }

    fn on_frame(&self, frame_index: u64, verdict: &FrameVerdict) {
        if !self.verbose {
            return;
        }
        let line = match verdict {
            FrameVerdict::Saved { .. } => format!("frame {frame_index}: {}", verdict.to_string().green()),
            _ => format!("frame {frame_index}: {verdict}"),
        };
        match &self.bar {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global)?;

    match cli.command {
        Commands::Extract {
            video,
            output,
            interval,
            threshold,
            sharpness,
            contrast,
            no_text,
            text_lang,
            tesseract,
            json,
        } => {
            let terminal = Arc::new(TerminalProgress::new(cli.global.progress, cli.global.verbose)?);
            let mut recognizer = TesseractCli::new();
            if let Some(binary) = tesseract {
                recognizer = recognizer.with_binary(binary);
            }

            let config = ExtractionConfig::new()
                .with_interval(interval)
                .with_similarity_threshold(threshold)
                .with_sharpness_threshold(sharpness)
                .with_contrast_threshold(contrast)
                .with_require_text(!no_text)
                .with_text_languages(text_lang)
                .with_recognizer(Arc::new(recognizer))
                .with_progress(terminal.clone());

            let result = framesift::extract_frames(&video, &output, &config)?;
            terminal.finish();

            if json {
                println!("{}", serde_json::to_string_pretty(&result.to_json())?);
            } else {
                println!(
                    "{} kept {} of {} sampled frames ({} scanned) in {}",
                    "success:".green().bold(),
                    result.saved_count,
                    result.sampled_frames,
                    result.total_frames,
                    result.output_dir.display()
                );
                println!("  duplicates:    {}", result.skipped_count);
                println!("  low quality:   {}", result.quality_filtered);
                println!("  without text:  {}", result.text_filtered);
            }
        }

        Commands::PageTurn {
            image,
            prev,
            next,
            json,
        } => {
            let turning =
                framesift::is_page_turn_image(&image, prev.as_deref(), next.as_deref())?;
            if json {
                let payload = json!({
                    "image": image.display().to_string(),
                    "page_turn": turning,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else if turning {
                println!("{} {}", "page turn:".yellow().bold(), image.display());
            } else {
                println!("{} {}", "stable:".green().bold(), image.display());
            }
        }

        Commands::Archive {
            frames_dir,
            out,
            names,
        } => {
            let count = framesift::write_archive(&frames_dir, &names, &out)?;
            println!(
                "{} archived {count} frame(s) to {}",
                "success:".green().bold(),
                out.display()
            );
        }

        Commands::Validate { video } => {
            let report = framesift::validation::validate_video(&video)?;
            print!("{report}");
            if !report.is_valid() {
                return Err(format!("{} failed validation", video.display()).into());
            }
        }

        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framesift", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
