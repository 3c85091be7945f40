// Batch runner - applies one utility to every matching file under a source
//
// A failing file is logged and counted; it never stops the run and never
// touches the outputs of other files.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use serde::Serialize;

use crate::config::Config;
use crate::convert::{image, video, ConvertOutcome};
use crate::discover::{discover_files, mirrored_path};
use crate::engine::Engine;
use crate::error::{MediaError, Result};
use crate::thumbnail::{process_video, ThumbOutcome};

/// Counts for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub generated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Source and output roots plus run flags.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub source_root: PathBuf,
    pub output_root: PathBuf,
    pub force: bool,
}

/// Per-file result, folded into the summary.
enum FileOutcome {
    Generated(PathBuf),
    Skipped,
}

fn run_each<F>(files: &[PathBuf], mut process: F) -> RunSummary
where
    F: FnMut(&Path) -> Result<FileOutcome>,
{
    let mut summary = RunSummary { total: files.len(), ..RunSummary::default() };

    for (i, file) in files.iter().enumerate() {
        log::debug!("[{}/{}] {}", i + 1, files.len(), file.display());
        match process(file) {
            Ok(FileOutcome::Generated(output)) => {
                log::info!("Wrote {}", output.display());
                summary.generated += 1;
            }
            Ok(FileOutcome::Skipped) => {
                summary.skipped += 1;
            }
            Err(e) => {
                log::error!("Failed {}: {}", file.display(), e);
                summary.failed += 1;
            }
        }
    }

    log::info!(
        "{} files: {} generated, {} up to date, {} failed",
        summary.total, summary.generated, summary.skipped, summary.failed
    );
    summary
}

fn check_source(options: &BatchOptions) -> Result<()> {
    if !options.source_root.exists() {
        return Err(MediaError::FileNotFound(options.source_root.clone()));
    }
    Ok(())
}

/// Directory holding the posters of `source`. Keeps the full file name so
/// `intro.mp4` and `intro.mov` never share one.
pub fn poster_dir(source_root: &Path, source: &Path, output_root: &Path) -> Result<PathBuf> {
    mirrored_path(source_root, source, output_root)
}

/// Posters for every video: `<output>/<rel dir>/<file name>/firstframe--<t>s.webp`.
pub fn run_thumbnails(engine: &dyn Engine, options: &BatchOptions, config: &Config) -> Result<RunSummary> {
    check_source(options)?;
    let files = discover_files(&options.source_root, &config.video.source_extensions, Some(&options.output_root))?;

    Ok(run_each(&files, |file| {
        let dir = poster_dir(&options.source_root, file, &options.output_root)?;
        match process_video(engine, file, &dir, config, options.force)? {
            ThumbOutcome::Generated { artifact, selection } => {
                log::debug!("  {:?} selection at {:.1}s", selection.source, selection.timestamp_secs);
                Ok(FileOutcome::Generated(artifact.path))
            }
            ThumbOutcome::Skipped => Ok(FileOutcome::Skipped),
        }
    }))
}

/// WebP copies of every image, mirrored under the output root.
pub fn run_images(ffmpeg: &Path, options: &BatchOptions, config: &Config) -> Result<RunSummary> {
    check_source(options)?;
    let files = discover_files(&options.source_root, &config.image.source_extensions, Some(&options.output_root))?;
    let output_for = |file: &Path| {
        mirrored_path(&options.source_root, file, &options.output_root)
            .map(|p| p.with_extension(&config.image.extension))
    };
    let shared = shared_outputs(&files, output_for);

    Ok(run_each(&files, |file| {
        let output = output_for(file)?;
        reject_shared(file, &output, &shared)?;
        let outcome = image::convert_image_if_stale(ffmpeg, file, &output, &config.image, options.force)?;
        Ok(into_file_outcome(outcome))
    }))
}

/// Web MP4 copies of every video, mirrored under the output root.
pub fn run_videos(ffmpeg: &Path, options: &BatchOptions, config: &Config) -> Result<RunSummary> {
    check_source(options)?;
    let files = discover_files(&options.source_root, &config.video.source_extensions, Some(&options.output_root))?;
    let output_for = |file: &Path| {
        mirrored_path(&options.source_root, file, &options.output_root)
            .map(|p| p.with_extension(&config.video.extension))
    };
    let shared = shared_outputs(&files, output_for);

    Ok(run_each(&files, |file| {
        let output = output_for(file)?;
        if output == file {
            return Err(MediaError::InvalidPath(format!(
                "output would overwrite source {}", file.display()
            )));
        }
        reject_shared(file, &output, &shared)?;
        let outcome = video::compress_video_if_stale(ffmpeg, file, &output, &config.video, options.force)?;
        Ok(into_file_outcome(outcome))
    }))
}

/// Output paths claimed by more than one source, e.g. `photo.jpg` and
/// `photo.png` both mapping to `photo.webp`.
fn shared_outputs<F>(files: &[PathBuf], output_for: F) -> HashSet<PathBuf>
where
    F: Fn(&Path) -> Result<PathBuf>,
{
    let mut claims: HashMap<PathBuf, usize> = HashMap::new();
    for file in files {
        if let Ok(output) = output_for(file) {
            *claims.entry(output).or_insert(0) += 1;
        }
    }
    claims.into_iter().filter(|(_, n)| *n > 1).map(|(path, _)| path).collect()
}

fn reject_shared(file: &Path, output: &Path, shared: &HashSet<PathBuf>) -> Result<()> {
    if shared.contains(output) {
        return Err(MediaError::InvalidPath(format!(
            "{} maps to {}, which another source also maps to",
            file.display(), output.display()
        )));
    }
    Ok(())
}

fn into_file_outcome(outcome: ConvertOutcome) -> FileOutcome {
    match outcome {
        ConvertOutcome::Generated(artifact) => FileOutcome::Generated(artifact.path),
        ConvertOutcome::Skipped => FileOutcome::Skipped,
    }
}
