// ffmpeg/ffprobe subprocess engine

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::constants::{BURST_FRAME_EXTENSION, BURST_FRAME_PREFIX};
use crate::engine::{BurstRequest, Engine, ExtractRequest};
use crate::error::{MediaError, Result};
use crate::metadata::{ffprobe, VideoInfo};

/// Stderr kept in error messages; ffmpeg can be very chatty.
const STDERR_TAIL_BYTES: usize = 2000;

/// Engine backed by the ffmpeg and ffprobe binaries.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegEngine {
    /// Use the binaries found by `tools`.
    pub fn new() -> Self {
        Self::with_paths(crate::tools::ffmpeg_path(), crate::tools::ffprobe_path())
    }

    pub fn with_paths(ffmpeg: PathBuf, ffprobe: PathBuf) -> Self {
        Self { ffmpeg, ffprobe }
    }
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for FfmpegEngine {
    fn probe(&self, source: &Path) -> Result<VideoInfo> {
        ffprobe::probe(&self.ffprobe, source)
    }

    fn sample_burst(&self, source: &Path, request: &BurstRequest, out_dir: &Path) -> Result<()> {
        let pattern = out_dir.join(format!("{}%04d.{}", BURST_FRAME_PREFIX, BURST_FRAME_EXTENSION));
        run_ffmpeg(&self.ffmpeg, &burst_args(source, request, &pattern))?;
        Ok(())
    }

    fn compute_similarity(&self, frame_a: &Path, frame_b: &Path) -> Result<String> {
        // The ssim filter reports on stderr
        let output = run_ffmpeg(&self.ffmpeg, &similarity_args(frame_a, frame_b))?;
        Ok(String::from_utf8_lossy(&output.stderr).into_owned())
    }

    fn extract_frame(&self, source: &Path, request: &ExtractRequest, output: &Path) -> Result<()> {
        let args = extract_args(source, request, output);
        write_atomically(output, |tmp_path| {
            let mut args = args;
            args.push(tmp_path.into());
            run_ffmpeg(&self.ffmpeg, &args).map(|_| ())
        })
    }
}

/// Burst sampling: one small JPEG per interval across `[start, start + duration)`,
/// written to the numbered `pattern`.
pub fn burst_args(source: &Path, request: &BurstRequest, pattern: &Path) -> Vec<OsString> {
    let filter = format!(
        "fps={},scale={}:{}",
        1.0 / request.interval_secs,
        request.width,
        request.height
    );

    vec![
        "-hide_banner".into(),
        "-loglevel".into(), "error".into(),
        "-y".into(),
        "-ss".into(), format_duration(request.start_secs).into(),   // Seek before input (faster)
        "-t".into(), format!("{:.3}", request.duration_secs).into(),
        "-i".into(), source.into(),
        "-vf".into(), filter.into(),
        "-q:v".into(), request.jpeg_q.to_string().into(),
        pattern.into(),
    ]
}

/// SSIM between two frames; the result goes to stderr, so no loglevel filter.
pub fn similarity_args(frame_a: &Path, frame_b: &Path) -> Vec<OsString> {
    vec![
        "-hide_banner".into(),
        "-i".into(), frame_a.into(),
        "-i".into(), frame_b.into(),
        "-lavfi".into(), "ssim".into(),
        "-f".into(), "null".into(),
        "-".into(),
    ]
}

/// Single frame extraction, minus the output path. `output` only picks the encoder.
pub fn extract_args(source: &Path, request: &ExtractRequest, output: &Path) -> Vec<OsString> {
    let scale_filter = format!("scale={}:{}", request.width, request.height);

    let mut args: Vec<OsString> = vec![
        "-hide_banner".into(),
        "-loglevel".into(), "error".into(),
        "-y".into(),
        "-ss".into(), format_duration(request.timestamp_secs).into(),
        "-i".into(), source.into(),
        "-frames:v".into(), "1".into(),
        "-vf".into(), scale_filter.into(),
        "-map_metadata".into(), "-1".into(),
    ];
    args.extend(quality_args(output, request.quality));
    args
}

/// Run ffmpeg and fail on spawn error or non-zero exit.
pub fn run_ffmpeg(ffmpeg: &Path, args: &[OsString]) -> Result<Output> {
    log::debug!("{} {}", ffmpeg.display(), args.iter().map(|a| a.to_string_lossy()).collect::<Vec<_>>().join(" "));

    let output = Command::new(ffmpeg)
        .args(args)
        .output()
        .map_err(|e| MediaError::ToolSpawn { tool: "ffmpeg".to_string(), source: e })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let start = stderr.len().saturating_sub(STDERR_TAIL_BYTES);
        let start = (start..stderr.len()).find(|i| stderr.is_char_boundary(*i)).unwrap_or(start);
        return Err(MediaError::ToolFailed {
            tool: "ffmpeg".to_string(),
            status: output.status.to_string(),
            stderr: stderr[start..].trim().to_string(),
        });
    }

    Ok(output)
}

/// Encoder quality flags for the output format, quality on a 0-100 scale.
pub fn quality_args(output: &Path, quality: u32) -> Vec<OsString> {
    let ext = output
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let quality = quality.min(100);
    match ext.as_str() {
        "webp" => vec!["-c:v".into(), "libwebp".into(), "-quality".into(), quality.to_string().into()],
        _ => {
            // FFmpeg quality scale is 1-31 where 1 is best
            let q_value = ((100 - quality) as f32 / 100.0 * 30.0 + 1.0) as u32;
            vec!["-q:v".into(), q_value.to_string().into()]
        }
    }
}

/// Hidden sibling used while the encoder runs. Keeps the real extension so
/// ffmpeg picks the right muxer, and starts with a dot so output listings skip it.
pub fn partial_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!(".partial-{}", name))
}

/// Run `write` against a temporary path and rename it over `output` on success.
/// The temporary file is removed on failure.
pub fn write_atomically<F>(output: &Path, write: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    let tmp_path = partial_path(output);

    if let Err(e) = write(&tmp_path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }

    let size = match std::fs::metadata(&tmp_path) {
        Ok(meta) => meta.len(),
        Err(_) => return Err(MediaError::MissingOutput(output.to_path_buf())),
    };
    if size == 0 {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(MediaError::MissingOutput(output.to_path_buf()));
    }

    std::fs::rename(&tmp_path, output)?;
    Ok(())
}

/// Format seconds as HH:MM:SS.mmm for ffmpeg.
pub fn format_duration(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let hours = (seconds / 3600.0) as u32;
    let minutes = ((seconds % 3600.0) / 60.0) as u32;
    let secs = seconds % 60.0;
    format!("{:02}:{:02}:{:06.3}", hours, minutes, secs)
}
