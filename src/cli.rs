// Site Media CLI binary

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use clap::{Args, Parser, Subcommand};
use anyhow::{Context, Result};

use site_media::batch::{self, BatchOptions, RunSummary};
use site_media::thumbnail::{self, ThumbOutcome};
use site_media::discover::has_extension;
use site_media::{tools, Config, Engine, FfmpegEngine};

#[derive(Parser)]
#[command(name = "sitemedia")]
#[command(about = "Prepare website media: video posters, WebP images, web video", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON config file overriding the defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RunArgs {
    /// Source directory (or single file)
    source: PathBuf,
    /// Output directory
    output: PathBuf,
    /// Rebuild even when outputs are up to date
    #[arg(short, long)]
    force: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a poster from the steadiest early frame of each video
    Thumbs(RunArgs),

    /// Convert images to WebP
    Images(RunArgs),

    /// Compress videos to web-friendly MP4
    Videos(RunArgs),

    /// Print probed metadata and the chosen poster timestamp for one video
    Probe {
        /// Video file
        file: PathBuf,
    },

    /// Check that ffmpeg and ffprobe are available
    Check,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Check => cmd_check(),
        Commands::Probe { file } => cmd_probe(&file, &config),
        Commands::Thumbs(args) => cmd_thumbs(args, &config),
        Commands::Images(args) => cmd_images(args, &config),
        Commands::Videos(args) => cmd_videos(args, &config),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn cmd_check() -> Result<ExitCode> {
    let missing = tools::missing_tools();
    println!("ffmpeg:  {}", tools::ffmpeg_path().display());
    println!("ffprobe: {}", tools::ffprobe_path().display());

    if missing.is_empty() {
        println!("All tools available.");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("Missing: {}", missing.join(", "));
        Ok(ExitCode::FAILURE)
    }
}

fn cmd_probe(file: &Path, config: &Config) -> Result<ExitCode> {
    require_tools()?;
    if !file.is_file() {
        anyhow::bail!("Video does not exist: {}", file.display());
    }
    if !has_extension(file, &config.video.source_extensions) {
        anyhow::bail!("Not a supported video file: {}", file.display());
    }

    let engine = FfmpegEngine::new();
    let info = engine.probe(file)?;
    let selection = thumbnail::select_stable_timestamp(&engine, file, &info, &config.analysis)
        .unwrap_or_else(|e| {
            log::warn!("Frame analysis failed: {}", e);
            thumbnail::Selection::fallback(&config.analysis)
        });

    let report = serde_json::json!({
        "file": file.display().to_string(),
        "video": info,
        "poster": {
            "timestampSecs": selection.timestamp_secs,
            "source": selection.source,
            "fileName": thumbnail::extract::variant_file_name(
                &config.poster.prefix, selection.timestamp_secs, &config.poster.extension),
        },
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(ExitCode::SUCCESS)
}

fn cmd_thumbs(args: RunArgs, config: &Config) -> Result<ExitCode> {
    require_tools()?;
    let options = batch_options(args)?;

    // A single file goes straight to the pipeline so its outcome can be shown
    if options.source_root.is_file() {
        let engine = FfmpegEngine::new();
        let poster_dir = batch::poster_dir(&options.source_root, &options.source_root, &options.output_root)?;
        return match thumbnail::process_video(&engine, &options.source_root, &poster_dir, config, options.force) {
            Ok(ThumbOutcome::Generated { artifact, selection }) => {
                println!("Wrote {} ({} bytes, {:?} at {:.1}s)",
                    artifact.path.display(), artifact.size_bytes, selection.source, selection.timestamp_secs);
                Ok(ExitCode::SUCCESS)
            }
            Ok(ThumbOutcome::Skipped) => {
                println!("Up to date: {}", poster_dir.display());
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("Poster generation failed: {}", e);
                Ok(ExitCode::FAILURE)
            }
        };
    }

    let summary = batch::run_thumbnails(&FfmpegEngine::new(), &options, config)?;
    Ok(report(&summary))
}

fn cmd_images(args: RunArgs, config: &Config) -> Result<ExitCode> {
    require_tools()?;
    let options = batch_options(args)?;
    let summary = batch::run_images(&tools::ffmpeg_path(), &options, config)?;
    Ok(report(&summary))
}

fn cmd_videos(args: RunArgs, config: &Config) -> Result<ExitCode> {
    require_tools()?;
    let options = batch_options(args)?;
    let summary = batch::run_videos(&tools::ffmpeg_path(), &options, config)?;
    Ok(report(&summary))
}

// --- Helper Functions ---

fn require_tools() -> Result<()> {
    let missing = tools::missing_tools();
    if !missing.is_empty() {
        anyhow::bail!(
            "Required tools not found: {}. Install ffmpeg or set SITEMEDIA_FFMPEG_PATH / SITEMEDIA_FFPROBE_PATH.",
            missing.join(", ")
        );
    }
    Ok(())
}

fn batch_options(args: RunArgs) -> Result<BatchOptions> {
    let source_root = args.source.canonicalize()
        .map_err(|_| anyhow::anyhow!("Source path does not exist: {}", args.source.display()))?;

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create output directory {}", args.output.display()))?;
    let output_root = args.output.canonicalize().unwrap_or(args.output);

    Ok(BatchOptions { source_root, output_root, force: args.force })
}

fn report(summary: &RunSummary) -> ExitCode {
    println!();
    println!("Total files:  {}", summary.total);
    println!("Generated:    {}", summary.generated);
    println!("Up to date:   {}", summary.skipped);
    println!("Failed:       {}", summary.failed);

    if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
