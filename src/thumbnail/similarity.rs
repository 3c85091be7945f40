// Similarity scorer
// Motion between two frames as 1 - SSIM. Never fails: an unmeasurable pair
// gets the neutral score.

use std::path::Path;
use regex::Regex;

use crate::constants::NEUTRAL_MOTION_SCORE;
use crate::engine::Engine;
use crate::thumbnail::MotionScore;

/// Score the pair `(frame_a, frame_b)`, stamped with `timestamp_secs`.
pub fn score(engine: &dyn Engine, frame_a: &Path, frame_b: &Path, timestamp_secs: f64) -> MotionScore {
    let score = match engine.compute_similarity(frame_a, frame_b) {
        Ok(text) => match parse_ssim(&text) {
            Some(similarity) => (1.0 - similarity).clamp(0.0, 1.0),
            None => {
                log::debug!("  No SSIM value in engine output at {:.1}s, using neutral score", timestamp_secs);
                NEUTRAL_MOTION_SCORE
            }
        },
        Err(e) => {
            log::debug!("  SSIM failed at {:.1}s: {}", timestamp_secs, e);
            NEUTRAL_MOTION_SCORE
        }
    };

    MotionScore { timestamp_secs, score }
}

/// Pull the overall SSIM (`All:0.987654`) out of ffmpeg's ssim filter output.
pub fn parse_ssim(text: &str) -> Option<f64> {
    let re = Regex::new(r"All:\s*(-?\d+(?:\.\d+)?)").ok()?;
    re.captures_iter(text)
        .last()
        .and_then(|cap| cap.get(1)?.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{FakeEngine, SimilarityReply};
    use tempfile::TempDir;

    fn frames() -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("frame_0001.jpg");
        let b = dir.path().join("frame_0002.jpg");
        std::fs::write(&a, b"a").unwrap();
        std::fs::write(&b, b"b").unwrap();
        (dir, a, b)
    }

    fn engine_replying(reply: SimilarityReply) -> FakeEngine {
        let engine = FakeEngine::new(30.0);
        engine.similarity.borrow_mut().push_back(reply);
        engine
    }

    #[test]
    fn test_parse_ssim() {
        let line = "[Parsed_ssim_0 @ 0x7f] SSIM Y:0.951 (13.1) U:0.97 (15.2) V:0.97 (15.4) All:0.958120 (13.776)";
        assert_eq!(parse_ssim(line), Some(0.958120));
        assert_eq!(parse_ssim("All:1 (inf)"), Some(1.0));
        assert_eq!(parse_ssim("frame=    1 fps=0.0 q=-0.0 Lsize=N/A"), None);
        assert_eq!(parse_ssim(""), None);
    }

    #[test]
    fn test_score_is_one_minus_similarity() {
        let (_dir, a, b) = frames();
        let engine = engine_replying(SimilarityReply::Ssim(0.75));

        let motion = score(&engine, &a, &b, 1.5);
        assert_eq!(motion.timestamp_secs, 1.5);
        assert!((motion.score - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_unparseable_output_is_neutral() {
        let (_dir, a, b) = frames();
        let engine = engine_replying(SimilarityReply::Text("Conversion failed!".to_string()));

        assert_eq!(score(&engine, &a, &b, 1.0).score, 0.5);
    }

    #[test]
    fn test_engine_failure_is_neutral() {
        let (_dir, a, b) = frames();
        let engine = engine_replying(SimilarityReply::Fail);

        assert_eq!(score(&engine, &a, &b, 1.0).score, 0.5);
    }

    #[test]
    fn test_score_clamped() {
        let (_dir, a, b) = frames();
        let engine = engine_replying(SimilarityReply::Text("All:-0.2 (0.1)".to_string()));

        assert_eq!(score(&engine, &a, &b, 1.0).score, 1.0);
    }
}
