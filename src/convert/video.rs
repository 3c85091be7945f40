// Web video compression
//
// H.264 MP4 with the moov atom up front so browsers can start playback
// before the download finishes.

use std::ffi::OsString;
use std::path::Path;

use crate::config::VideoConfig;
use crate::convert::{convert_if_stale, ConvertOutcome};
use crate::engine::ffmpeg::{run_ffmpeg, write_atomically};
use crate::error::Result;

/// ffmpeg arguments, minus the output path, for one compression.
pub fn video_args(source: &Path, config: &VideoConfig) -> Vec<OsString> {
    // Cap the height, keep aspect, keep the width even
    let scale_filter = format!("scale=-2:'min({},ih)'", config.max_height);

    vec![
        "-hide_banner".into(),
        "-loglevel".into(), "error".into(),
        "-y".into(),                          // Overwrite output
        "-i".into(), source.into(),
        "-vf".into(), scale_filter.into(),
        "-c:v".into(), "libx264".into(),
        "-preset".into(), config.preset.clone().into(),
        "-crf".into(), config.crf.to_string().into(),
        "-pix_fmt".into(), "yuv420p".into(),
        "-c:a".into(), "aac".into(),
        "-b:a".into(), config.audio_bitrate.clone().into(),
        "-map_metadata".into(), "-1".into(),
        "-movflags".into(), "+faststart".into(),
    ]
}

/// Compress `source` into `output`.
pub fn compress_video(ffmpeg: &Path, source: &Path, output: &Path, config: &VideoConfig) -> Result<()> {
    let args = video_args(source, config);
    write_atomically(output, |tmp_path| {
        let mut args = args;
        args.push(tmp_path.into());
        run_ffmpeg(ffmpeg, &args).map(|_| ())
    })
}

/// Compress unless the output is already up to date.
pub fn compress_video_if_stale(
    ffmpeg: &Path,
    source: &Path,
    output: &Path,
    config: &VideoConfig,
    force: bool,
) -> Result<ConvertOutcome> {
    convert_if_stale(source, output, force, || compress_video(ffmpeg, source, output, config))
}
