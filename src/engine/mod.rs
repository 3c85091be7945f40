// Transcoding engine capability
//
// Everything the poster pipeline needs from ffmpeg, behind one trait so the
// selector and gate can run against an in-memory engine in tests.

pub mod ffmpeg;

#[cfg(test)]
pub(crate) mod testing;

use std::path::Path;

use crate::error::Result;
use crate::metadata::VideoInfo;

pub use ffmpeg::FfmpegEngine;

/// A low-resolution frame burst over `[start_secs, start_secs + duration_secs)`.
#[derive(Debug, Clone, PartialEq)]
pub struct BurstRequest {
    pub start_secs: f64,
    pub duration_secs: f64,
    pub interval_secs: f64,
    pub width: u32,
    pub height: u32,
    pub jpeg_q: u32,
}

/// A single full-resolution frame grab.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractRequest {
    pub timestamp_secs: f64,
    pub width: u32,
    pub height: u32,
    pub quality: u32,
}

pub trait Engine {
    /// Probe duration, dimensions and size of a video.
    fn probe(&self, source: &Path) -> Result<VideoInfo>;

    /// Write the burst into `out_dir` as numbered files
    /// (`frame_0001.jpg`, `frame_0002.jpg`, ...) in time order.
    fn sample_burst(&self, source: &Path, request: &BurstRequest, out_dir: &Path) -> Result<()>;

    /// Compare two images and return the engine's diagnostic SSIM text.
    fn compute_similarity(&self, frame_a: &Path, frame_b: &Path) -> Result<String>;

    /// Grab one frame into `output`. Must not leave a partial file at
    /// `output` when it fails.
    fn extract_frame(&self, source: &Path, request: &ExtractRequest, output: &Path) -> Result<()>;
}
