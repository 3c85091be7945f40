// Image to WebP conversion

use std::ffi::OsString;
use std::path::Path;

use crate::config::ImageConfig;
use crate::convert::{convert_if_stale, ConvertOutcome};
use crate::engine::ffmpeg::{quality_args, run_ffmpeg, write_atomically};
use crate::error::Result;

/// ffmpeg arguments, minus the output path, for one image conversion.
pub fn image_args(source: &Path, output: &Path, config: &ImageConfig) -> Vec<OsString> {
    // Never upscale; -2 keeps the height even
    let scale_filter = format!("scale='min({},iw)':-2", config.max_width);

    let mut args: Vec<OsString> = vec![
        "-hide_banner".into(),
        "-loglevel".into(), "error".into(),
        "-y".into(),
        "-i".into(), source.into(),
        "-frames:v".into(), "1".into(),
        "-vf".into(), scale_filter.into(),
        "-map_metadata".into(), "-1".into(),
    ];
    args.extend(quality_args(output, config.quality));
    args
}

/// Convert `source` into `output` (WebP by default).
pub fn convert_image(ffmpeg: &Path, source: &Path, output: &Path, config: &ImageConfig) -> Result<()> {
    let args = image_args(source, output, config);
    write_atomically(output, |tmp_path| {
        let mut args = args;
        args.push(tmp_path.into());
        run_ffmpeg(ffmpeg, &args).map(|_| ())
    })
}

/// Convert unless the WebP is already up to date.
pub fn convert_image_if_stale(
    ffmpeg: &Path,
    source: &Path,
    output: &Path,
    config: &ImageConfig,
    force: bool,
) -> Result<ConvertOutcome> {
    convert_if_stale(source, output, force, || convert_image(ffmpeg, source, output, config))
}
