// Stability selector
//
// Picks the poster timestamp with the least motion in the opening seconds:
// sample a 2fps burst, score each adjacent pair, keep the calmest pair.

use std::path::Path;

use crate::config::AnalysisConfig;
use crate::constants::MIN_BURST_FRAMES;
use crate::engine::Engine;
use crate::error::Result;
use crate::metadata::VideoInfo;
use crate::thumbnail::{sampler, similarity, AnalysisWindow, MotionScore, Selection};

/// Choose the steadiest timestamp near the start of `source`.
///
/// Errors (scratch directory, reading the burst) are left to the caller,
/// which substitutes the fixed fallback timestamp.
pub fn select_stable_timestamp(
    engine: &dyn Engine,
    source: &Path,
    info: &VideoInfo,
    config: &AnalysisConfig,
) -> Result<Selection> {
    let window = AnalysisWindow::for_duration(info.duration_secs, config);
    let burst = sampler::sample(engine, source, &window, config)?;

    if burst.len() < MIN_BURST_FRAMES {
        let timestamp = window.start_secs + config.sample_interval_secs;
        log::debug!(
            "  Only {} burst frames for {}, using {:.1}s",
            burst.len(), source.display(), timestamp
        );
        return Ok(Selection::degenerate(timestamp));
    }

    // Each pair is stamped with its later frame
    let scores: Vec<MotionScore> = burst
        .frames()
        .windows(2)
        .map(|pair| similarity::score(engine, &pair[0].path, &pair[1].path, pair[1].timestamp_secs))
        .collect();

    for s in &scores {
        log::trace!("  motion {:.4} at {:.1}s", s.score, s.timestamp_secs);
    }

    let selection = match pick_minimum(&scores) {
        Some(best) => {
            log::debug!(
                "  Steadiest frame of {} at {:.1}s (motion {:.4})",
                source.display(), best.timestamp_secs, best.score
            );
            Selection::motion(best.timestamp_secs)
        }
        None => Selection::degenerate(window.start_secs + config.sample_interval_secs),
    };

    // burst drops here and takes its frames with it
    Ok(selection)
}

/// Lowest score, first occurrence on ties.
pub fn pick_minimum(scores: &[MotionScore]) -> Option<&MotionScore> {
    scores.iter().fold(None, |best: Option<&MotionScore>, s| match best {
        Some(b) if s.score >= b.score => Some(b),
        _ => Some(s),
    })
}
