// Video poster pipeline
//
// For each video: skip when the poster is fresh, otherwise pick the steadiest
// early frame and write it as `<dir>/firstframe--<t>s.webp`.
// - sampler: low-res frame burst in a scratch dir
// - similarity: 1 - SSIM per adjacent pair
// - selector: calmest pair wins, with fallbacks
// - extract: final full-res poster

pub mod extract;
pub mod sampler;
pub mod selector;
pub mod similarity;

use std::path::{Path, PathBuf};
use serde::Serialize;

use crate::config::{AnalysisConfig, Config};
use crate::engine::Engine;
use crate::error::Result;
use crate::freshness::{is_stale, OutputTarget};

pub use extract::{extract_at, Artifact};
pub use selector::select_stable_timestamp;

/// `[start, end)` of the opening stretch that gets analysed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisWindow {
    pub start_secs: f64,
    pub end_secs: f64,
}

impl AnalysisWindow {
    /// Starts at `window_start_secs`, ends at `min(window_max_secs, ratio * duration)`.
    pub fn for_duration(duration_secs: f64, config: &AnalysisConfig) -> Self {
        Self {
            start_secs: config.window_start_secs,
            end_secs: config.window_max_secs.min(duration_secs * config.window_ratio),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.end_secs <= self.start_secs
    }

    pub fn timestamp_at(&self, index: usize, interval_secs: f64) -> f64 {
        self.start_secs + index as f64 * interval_secs
    }
}

/// One frame of an analysis burst.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleFrame {
    pub index: usize,
    pub timestamp_secs: f64,
    pub path: PathBuf,
}

/// Dissimilarity of an adjacent frame pair: 0 identical, 1 maximally different.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionScore {
    pub timestamp_secs: f64,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    /// Calmest pair of a scored burst.
    Motion,
    /// Fewer than two burst frames.
    DegenerateBurst,
    /// Fixed timestamp after analysis failed.
    Fallback,
}

/// Where the poster is taken from, and why.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub timestamp_secs: f64,
    pub source: SelectionSource,
}

impl Selection {
    pub fn motion(timestamp_secs: f64) -> Self {
        Self { timestamp_secs, source: SelectionSource::Motion }
    }

    pub fn degenerate(timestamp_secs: f64) -> Self {
        Self { timestamp_secs, source: SelectionSource::DegenerateBurst }
    }

    pub fn fallback(config: &AnalysisConfig) -> Self {
        Self { timestamp_secs: config.fallback_timestamp_secs, source: SelectionSource::Fallback }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ThumbOutcome {
    /// A poster at least as new as the video already exists.
    Skipped,
    Generated { artifact: Artifact, selection: Selection },
}

/// Build the poster for `source` inside `output_dir` unless it is fresh.
///
/// Selection problems never fail the call: they fall back to the fixed
/// timestamp. Extraction at an analysed timestamp is retried once at the
/// fallback timestamp; a second failure is returned.
pub fn process_video(
    engine: &dyn Engine,
    source: &Path,
    output_dir: &Path,
    config: &Config,
    force: bool,
) -> Result<ThumbOutcome> {
    let target = OutputTarget::Variants {
        dir: output_dir,
        prefix: &config.poster.prefix,
        extension: &config.poster.extension,
    };
    if !force && !is_stale(source, &target)? {
        log::debug!("Poster for {} is up to date", source.display());
        return Ok(ThumbOutcome::Skipped);
    }

    let info = engine.probe(source)?;

    let selection = select_stable_timestamp(engine, source, &info, &config.analysis)
        .unwrap_or_else(|e| {
            log::warn!(
                "Frame analysis failed for {}: {}; using {:.1}s",
                source.display(), e, config.analysis.fallback_timestamp_secs
            );
            Selection::fallback(&config.analysis)
        });

    std::fs::create_dir_all(output_dir)?;

    let (artifact, selection) =
        match extract_at(engine, source, selection.timestamp_secs, &info, output_dir, &config.poster) {
            Ok(artifact) => (artifact, selection),
            Err(e) if selection.source != SelectionSource::Fallback => {
                log::warn!(
                    "Poster extraction at {:.1}s failed for {}: {}; retrying at {:.1}s",
                    selection.timestamp_secs, source.display(), e, config.analysis.fallback_timestamp_secs
                );
                let fallback = Selection::fallback(&config.analysis);
                let artifact = extract_at(engine, source, fallback.timestamp_secs, &info, output_dir, &config.poster)?;
                (artifact, fallback)
            }
            Err(e) => return Err(e),
        };

    extract::prune_variants(output_dir, &artifact.path, &config.poster)?;

    Ok(ThumbOutcome::Generated { artifact, selection })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::FakeEngine;
    use filetime::{set_file_mtime, FileTime};
    use tempfile::TempDir;

    fn video(dir: &Path) -> PathBuf {
        let path = dir.join("intro.mp4");
        std::fs::write(&path, b"video").unwrap();
        set_file_mtime(&path, FileTime::from_unix_time(1_000_000, 0)).unwrap();
        path
    }

    #[test]
    fn test_window_bounds() {
        let config = AnalysisConfig::default();
        for duration in [0.0, 1.0, 1.67, 2.0, 10.0, 33.0, 34.0, 120.0, 3600.0] {
            let w = AnalysisWindow::for_duration(duration, &config);
            assert_eq!(w.start_secs, 0.5);
            assert_eq!(w.end_secs, (0.3 * duration).min(10.0));
            assert!(w.end_secs <= 10.0);
        }
        assert!(AnalysisWindow::for_duration(1.0, &config).is_empty());
        assert!(!AnalysisWindow::for_duration(1.7, &config).is_empty());
        assert_eq!(AnalysisWindow::for_duration(120.0, &config).end_secs, 10.0);
    }

    #[test]
    fn test_generates_poster_at_calmest_frame() {
        let tmp = TempDir::new().unwrap();
        let source = video(tmp.path());
        let out = tmp.path().join("out/intro");
        let engine = FakeEngine::with_motion(30.0, &[0.8, 0.2, 0.5]);

        let outcome = process_video(&engine, &source, &out, &Config::default(), false).unwrap();

        match outcome {
            ThumbOutcome::Generated { artifact, selection } => {
                assert_eq!(artifact.path, out.join("firstframe--1-5s.webp"));
                assert_eq!(selection, Selection::motion(1.5));
            }
            other => panic!("expected a poster, got {:?}", other),
        }
    }

    #[test]
    fn test_second_run_is_skipped_without_engine_calls() {
        let tmp = TempDir::new().unwrap();
        let source = video(tmp.path());
        let out = tmp.path().join("out/intro");
        let config = Config::default();

        let first = FakeEngine::with_motion(30.0, &[0.8, 0.2, 0.5]);
        let outcome = process_video(&first, &source, &out, &config, false).unwrap();
        let ThumbOutcome::Generated { artifact, .. } = outcome else {
            panic!("first run should generate");
        };

        let second = FakeEngine::with_motion(30.0, &[0.8, 0.2, 0.5]);
        let outcome = process_video(&second, &source, &out, &config, false).unwrap();

        assert_eq!(outcome, ThumbOutcome::Skipped);
        assert_eq!(second.total_calls(), 0);
        assert!(artifact.path.exists());
    }

    #[test]
    fn test_force_regenerates_same_name() {
        let tmp = TempDir::new().unwrap();
        let source = video(tmp.path());
        let out = tmp.path().join("out/intro");
        let config = Config::default();

        let first = FakeEngine::with_motion(30.0, &[0.8, 0.2, 0.5]);
        process_video(&first, &source, &out, &config, false).unwrap();

        let again = FakeEngine::with_motion(30.0, &[0.8, 0.2, 0.5]);
        let outcome = process_video(&again, &source, &out, &config, true).unwrap();

        let ThumbOutcome::Generated { artifact, .. } = outcome else {
            panic!("forced run should generate");
        };
        assert_eq!(artifact.path, out.join("firstframe--1-5s.webp"));
        assert_eq!(crate::freshness::matching_variants(&out, "firstframe", "webp").unwrap().len(), 1);
    }

    #[test]
    fn test_failed_extraction_retries_at_fallback() {
        let tmp = TempDir::new().unwrap();
        let source = video(tmp.path());
        let out = tmp.path().join("out/intro");
        let engine = FakeEngine::with_motion(30.0, &[0.8, 0.2, 0.5]);
        engine.extract_failures_left.set(1);

        let outcome = process_video(&engine, &source, &out, &Config::default(), false).unwrap();

        let ThumbOutcome::Generated { artifact, selection } = outcome else {
            panic!("retry should generate");
        };
        assert_eq!(selection.source, SelectionSource::Fallback);
        assert_eq!(artifact.path, out.join("firstframe--2-0s.webp"));
        let stamps: Vec<f64> = engine.extract_calls.borrow().iter().map(|r| r.timestamp_secs).collect();
        assert_eq!(stamps, vec![1.5, 2.0]);
    }

    #[test]
    fn test_extraction_failing_twice_is_error() {
        let tmp = TempDir::new().unwrap();
        let source = video(tmp.path());
        let out = tmp.path().join("out/intro");
        let engine = FakeEngine::with_motion(30.0, &[0.8, 0.2, 0.5]);
        engine.extract_failures_left.set(2);

        assert!(process_video(&engine, &source, &out, &Config::default(), false).is_err());
        assert_eq!(engine.extract_calls.borrow().len(), 2);
    }

    #[test]
    fn test_stale_poster_replaced() {
        let tmp = TempDir::new().unwrap();
        let source = video(tmp.path());
        let out = tmp.path().join("out/intro");
        std::fs::create_dir_all(&out).unwrap();
        let old = out.join("firstframe--3-0s.webp");
        std::fs::write(&old, b"old").unwrap();
        set_file_mtime(&old, FileTime::from_unix_time(1, 0)).unwrap();

        let engine = FakeEngine::with_motion(30.0, &[0.8, 0.2, 0.5]);
        process_video(&engine, &source, &out, &Config::default(), false).unwrap();

        assert!(!old.exists());
        assert!(out.join("firstframe--1-5s.webp").exists());
    }
}
