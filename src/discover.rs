// File discovery for the batch runners

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{MediaError, Result};

/// All files under `source_path` with one of `extensions` (case-insensitive),
/// sorted by path. Hidden entries and anything under `exclude` are skipped.
pub fn discover_files(source_path: &Path, extensions: &[String], exclude: Option<&Path>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if source_path.is_file() {
        if has_extension(source_path, extensions) {
            files.push(source_path.to_path_buf());
        }
        return Ok(files);
    }

    if !source_path.is_dir() {
        return Err(MediaError::FileNotFound(source_path.to_path_buf()));
    }

    let walker = WalkDir::new(source_path)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            let hidden = e.depth() > 0 && e.file_name().to_string_lossy().starts_with('.');
            let excluded = exclude.map(|x| e.path().starts_with(x)).unwrap_or(false);
            !hidden && !excluded
        });

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if entry.file_type().is_file() && has_extension(path, extensions) {
            files.push(path.to_path_buf());
        }
    }

    // Sort by path for consistent ordering
    files.sort();

    Ok(files)
}

/// Check a file's extension against a list
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(e) => e.to_lowercase(),
        None => return false,
    };

    extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
}

/// Mirror `source` (inside `source_root`) under `output_root`.
/// `output_root/a/b/clip.mp4` for `source_root/a/b/clip.mp4`.
pub fn mirrored_path(source_root: &Path, source: &Path, output_root: &Path) -> Result<PathBuf> {
    let relative = if source == source_root {
        // A single-file run: the file itself is the root
        source
            .file_name()
            .map(PathBuf::from)
            .ok_or_else(|| MediaError::InvalidPath(source.display().to_string()))?
    } else {
        source
            .strip_prefix(source_root)
            .map(Path::to_path_buf)
            .map_err(|_| MediaError::InvalidPath(format!(
                "{} is not inside {}", source.display(), source_root.display()
            )))?
    };

    Ok(output_root.join(relative))
}
