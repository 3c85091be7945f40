// FFprobe wrapper for video metadata

use std::path::Path;
use std::process::Command;
use serde::Deserialize;

use crate::error::{MediaError, Result};
use crate::metadata::VideoInfo;

#[derive(Debug, Deserialize)]
struct FFprobeOutput {
    streams: Option<Vec<FFprobeStream>>,
    format: Option<FFprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FFprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FFprobeFormat {
    duration: Option<String>,
    size: Option<String>,
}

/// Run ffprobe on a file and extract video metadata
pub fn probe(ffprobe: &Path, path: &Path) -> Result<VideoInfo> {
    let output = Command::new(ffprobe)
        .args([
            "-v", "quiet",
            "-print_format", "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .map_err(|e| MediaError::ToolSpawn { tool: "ffprobe".to_string(), source: e })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MediaError::FFprobe(format!("ffprobe failed on {}: {}", path.display(), stderr)));
    }

    parse_probe_output(&output.stdout)
}

/// Parse ffprobe's `-print_format json` output.
pub fn parse_probe_output(json: &[u8]) -> Result<VideoInfo> {
    let probe_output: FFprobeOutput = serde_json::from_slice(json)
        .map_err(|e| MediaError::FFprobe(format!("Failed to parse ffprobe output: {}", e)))?;

    let video = probe_output
        .streams
        .as_deref()
        .unwrap_or_default()
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| MediaError::FFprobe("no video stream".to_string()))?;

    let (width, height) = match (video.width, video.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(MediaError::FFprobe("video stream has no dimensions".to_string())),
    };

    let format = probe_output.format.as_ref();

    let duration_secs = format
        .and_then(|f| parse_seconds(f.duration.as_deref()))
        .or_else(|| parse_seconds(video.duration.as_deref()))
        .unwrap_or_else(|| {
            log::warn!("ffprobe reported no duration, treating as 0s");
            0.0
        });

    let size_bytes = format
        .and_then(|f| f.size.as_deref())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    Ok(VideoInfo {
        duration_secs,
        width,
        height,
        size_bytes,
        fps: parse_frame_rate(video.r_frame_rate.as_deref()),
    })
}

/// Parse frame rate string like "30000/1001" to f64
pub fn parse_frame_rate(rate_str: Option<&str>) -> Option<f64> {
    let rate_str = rate_str?.trim();
    if let Some((num, den)) = rate_str.split_once('/') {
        let num: f64 = num.trim().parse().ok()?;
        let den: f64 = den.trim().parse().ok()?;
        if den > 0.0 && num > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    rate_str.parse::<f64>().ok().filter(|r| *r > 0.0)
}

/// Parse a seconds string, rejecting negatives and NaN
fn parse_seconds(duration_str: Option<&str>) -> Option<f64> {
    let seconds: f64 = duration_str?.trim().parse().ok()?;
    (seconds.is_finite() && seconds >= 0.0).then_some(seconds)
}
