// Metadata extraction module

pub mod ffprobe;

use serde::{Deserialize, Serialize};

/// Probed properties of a source video. Immutable for one processing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
    pub fps: Option<f64>,
}

impl VideoInfo {
    /// Output height for `target_width`, keeping the source aspect ratio.
    /// Rounded to an even number since yuv420 encoders reject odd sizes.
    pub fn scaled_height(&self, target_width: u32) -> u32 {
        let exact = target_width as f64 * self.height as f64 / self.width as f64;
        let even = ((exact / 2.0).round() * 2.0) as u32;
        even.max(2)
    }
}
