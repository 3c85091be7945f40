// Extraction driver
// Writes the final poster frame at the chosen timestamp. The filename carries
// the timestamp, e.g. `firstframe--4-2s.webp` for 4.2s.

use std::path::{Path, PathBuf};

use crate::config::PosterConfig;
use crate::engine::{Engine, ExtractRequest};
use crate::error::{MediaError, Result};
use crate::freshness::matching_variants;
use crate::metadata::VideoInfo;

/// A written output file.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// `4.2` -> `"4-2"`. One decimal place.
pub fn timestamp_label(timestamp_secs: f64) -> String {
    format!("{:.1}", timestamp_secs).replace('.', "-")
}

/// `{prefix}--{label}s.{extension}`
pub fn variant_file_name(prefix: &str, timestamp_secs: f64, extension: &str) -> String {
    format!("{}--{}s.{}", prefix, timestamp_label(timestamp_secs), extension)
}

/// Poster width: the configured width, never upscaling, always even.
fn output_width(info: &VideoInfo, config: &PosterConfig) -> u32 {
    let width = config.target_width.min(info.width);
    (width - width % 2).max(2)
}

/// Extract the poster for `source` at `timestamp_secs` into `output_dir`.
pub fn extract_at(
    engine: &dyn Engine,
    source: &Path,
    timestamp_secs: f64,
    info: &VideoInfo,
    output_dir: &Path,
    config: &PosterConfig,
) -> Result<Artifact> {
    let width = output_width(info, config);
    let request = ExtractRequest {
        timestamp_secs,
        width,
        height: info.scaled_height(width),
        quality: config.quality,
    };

    let output = output_dir.join(variant_file_name(&config.prefix, timestamp_secs, &config.extension));

    engine.extract_frame(source, &request, &output)?;

    // Exit code 0 is not proof: ffmpeg happily writes nothing when seeking past the end
    let size_bytes = match std::fs::metadata(&output) {
        Ok(meta) if meta.len() > 0 => meta.len(),
        _ => return Err(MediaError::MissingOutput(output)),
    };

    Ok(Artifact { path: output, size_bytes })
}

/// Remove older poster variants next to `keep`. Returns how many were removed.
pub fn prune_variants(output_dir: &Path, keep: &Path, config: &PosterConfig) -> Result<usize> {
    let mut removed = 0;
    for path in matching_variants(output_dir, &config.prefix, &config.extension)? {
        if path != keep {
            std::fs::remove_file(&path)?;
            log::debug!("  Removed old poster {}", path.display());
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::FakeEngine;
    use tempfile::TempDir;

    #[test]
    fn test_timestamp_label() {
        assert_eq!(timestamp_label(4.2), "4-2");
        assert_eq!(timestamp_label(2.0), "2-0");
        assert_eq!(timestamp_label(1.26), "1-3");
        assert_eq!(timestamp_label(10.0), "10-0");
    }

    #[test]
    fn test_variant_file_name() {
        assert_eq!(variant_file_name("firstframe", 4.2, "webp"), "firstframe--4-2s.webp");
        assert_eq!(variant_file_name("poster", 0.5, "jpg"), "poster--0-5s.jpg");
    }

    #[test]
    fn test_extract_at_writes_named_artifact() {
        let tmp = TempDir::new().unwrap();
        let engine = FakeEngine::new(30.0);
        let info = engine.info.clone();

        let artifact = extract_at(&engine, Path::new("clip.mp4"), 4.2, &info, tmp.path(), &PosterConfig::default()).unwrap();

        assert_eq!(artifact.path, tmp.path().join("firstframe--4-2s.webp"));
        assert!(artifact.size_bytes > 0);

        let calls = engine.extract_calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].timestamp_secs, 4.2);
        assert_eq!((calls[0].width, calls[0].height), (1280, 720));
        assert_eq!(calls[0].quality, 80);
    }

    #[test]
    fn test_extract_at_does_not_upscale() {
        let tmp = TempDir::new().unwrap();
        let mut engine = FakeEngine::new(30.0);
        engine.info.width = 641;
        engine.info.height = 480;
        let info = engine.info.clone();

        extract_at(&engine, Path::new("clip.mp4"), 1.0, &info, tmp.path(), &PosterConfig::default()).unwrap();

        let calls = engine.extract_calls.borrow();
        assert_eq!((calls[0].width, calls[0].height), (640, 480));
    }

    #[test]
    fn test_extract_failure_is_error() {
        let tmp = TempDir::new().unwrap();
        let engine = FakeEngine::new(30.0);
        engine.extract_failures_left.set(1);
        let info = engine.info.clone();

        let result = extract_at(&engine, Path::new("clip.mp4"), 1.0, &info, tmp.path(), &PosterConfig::default());

        assert!(matches!(result, Err(MediaError::ToolFailed { .. })));
        assert!(!tmp.path().join("firstframe--1-0s.webp").exists());
    }

    #[test]
    fn test_prune_keeps_current_variant() {
        let tmp = TempDir::new().unwrap();
        for name in ["firstframe--1-0s.webp", "firstframe--3-5s.webp", "notes.txt"] {
            std::fs::write(tmp.path().join(name), b"x").unwrap();
        }
        let keep = tmp.path().join("firstframe--3-5s.webp");

        let removed = prune_variants(tmp.path(), &keep, &PosterConfig::default()).unwrap();

        assert_eq!(removed, 1);
        assert!(keep.exists());
        assert!(tmp.path().join("notes.txt").exists());
        assert!(!tmp.path().join("firstframe--1-0s.webp").exists());
    }

    #[test]
    fn test_prune_leaves_lookalike_names() {
        let tmp = TempDir::new().unwrap();
        for name in ["firstframe--2-0s.webp", "firstframes.webp", "firstframe_old.webp"] {
            std::fs::write(tmp.path().join(name), b"x").unwrap();
        }
        let keep = tmp.path().join("firstframe--2-0s.webp");

        let removed = prune_variants(tmp.path(), &keep, &PosterConfig::default()).unwrap();

        assert_eq!(removed, 0);
        assert!(tmp.path().join("firstframes.webp").exists());
        assert!(tmp.path().join("firstframe_old.webp").exists());
    }
}
