// Asset conversions
//
// Single-output conversions gated by the freshness check:
// - image: JPG/PNG/... to WebP
// - video: any container to web-friendly H.264 MP4

pub mod image;
pub mod video;

use std::path::Path;

use crate::error::Result;
use crate::freshness::{is_stale, OutputTarget};
use crate::thumbnail::Artifact;

#[derive(Debug, Clone, PartialEq)]
pub enum ConvertOutcome {
    Skipped,
    Generated(Artifact),
}

/// Run `convert` unless `output` is already at least as new as `source`.
pub(crate) fn convert_if_stale<F>(source: &Path, output: &Path, force: bool, convert: F) -> Result<ConvertOutcome>
where
    F: FnOnce() -> Result<()>,
{
    if !force && !is_stale(source, &OutputTarget::File(output))? {
        log::debug!("{} is up to date", output.display());
        return Ok(ConvertOutcome::Skipped);
    }

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    convert()?;

    let size_bytes = std::fs::metadata(output)?.len();
    Ok(ConvertOutcome::Generated(Artifact { path: output.to_path_buf(), size_bytes }))
}
