// Frame sampler
//
// Pulls a burst of small, low quality frames from the analysis window into a
// private temp directory. The directory lives exactly as long as the Burst.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::AnalysisConfig;
use crate::constants::{BURST_FRAME_EXTENSION, BURST_FRAME_PREFIX};
use crate::engine::{BurstRequest, Engine};
use crate::error::Result;
use crate::thumbnail::{AnalysisWindow, SampleFrame};

/// Sampled frames plus the scratch directory backing them.
/// Dropping the burst deletes every frame file.
#[derive(Debug)]
pub struct Burst {
    frames: Vec<SampleFrame>,
    dir: Option<TempDir>,
}

impl Burst {
    fn empty() -> Self {
        Self { frames: Vec::new(), dir: None }
    }

    pub fn frames(&self) -> &[SampleFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_ref().map(|d| d.path())
    }
}

/// Sample one frame every `sample_interval_secs` across the window.
///
/// An engine that cannot start or exits non-zero yields an empty burst, which
/// callers treat as a fallback signal. Scratch directory errors are returned.
pub fn sample(
    engine: &dyn Engine,
    source: &Path,
    window: &AnalysisWindow,
    config: &AnalysisConfig,
) -> Result<Burst> {
    if window.is_empty() {
        log::debug!(
            "Analysis window {:.2}s..{:.2}s is empty, not sampling",
            window.start_secs, window.end_secs
        );
        return Ok(Burst::empty());
    }

    let dir = tempfile::Builder::new().prefix("sitemedia-burst-").tempdir()?;

    let request = BurstRequest {
        start_secs: window.start_secs,
        duration_secs: window.end_secs - window.start_secs,
        interval_secs: config.sample_interval_secs,
        width: config.burst_width,
        height: config.burst_height,
        jpeg_q: config.burst_jpeg_q,
    };

    if let Err(e) = engine.sample_burst(source, &request, dir.path()) {
        log::warn!("Frame sampling failed for {}: {}", source.display(), e);
        // dir dropped here, removing whatever ffmpeg managed to write
        return Ok(Burst::empty());
    }

    let paths = list_frames(dir.path())?;
    let frames = paths
        .into_iter()
        .enumerate()
        .map(|(index, path)| SampleFrame {
            index,
            timestamp_secs: window.timestamp_at(index, config.sample_interval_secs),
            path,
        })
        .collect::<Vec<_>>();

    log::debug!(
        "Sampled {} frames from {} over {:.2}s..{:.2}s",
        frames.len(), source.display(), window.start_secs, window.end_secs
    );

    Ok(Burst { frames, dir: Some(dir) })
}

/// Burst frame files in extraction order.
fn list_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_frame = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with(BURST_FRAME_PREFIX))
            .unwrap_or(false)
            && path.extension().and_then(|e| e.to_str()) == Some(BURST_FRAME_EXTENSION);
        if is_frame {
            paths.push(path);
        }
    }
    // Zero-padded numbering, so name order is time order
    paths.sort();
    Ok(paths)
}
