// Incremental processing gate
//
// Decides from modification times whether a derived output must be rebuilt.
// Pure predicate: never writes, and metadata errors are returned, not hidden.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;

/// Where the derived output of a source lives.
#[derive(Debug, Clone, Copy)]
pub enum OutputTarget<'a> {
    /// One output file per source.
    File(&'a Path),
    /// A directory of variants named `{prefix}--...{.extension}`, e.g. posters
    /// whose filenames embed the chosen timestamp.
    Variants {
        dir: &'a Path,
        prefix: &'a str,
        extension: &'a str,
    },
}

/// True when `target` is missing or older than `source`.
pub fn is_stale(source: &Path, target: &OutputTarget) -> io::Result<bool> {
    let outputs = match *target {
        OutputTarget::File(path) => {
            if !exists(path)? {
                return Ok(true);
            }
            vec![path.to_path_buf()]
        }
        OutputTarget::Variants { dir, prefix, extension } => {
            if !exists(dir)? {
                return Ok(true);
            }
            matching_variants(dir, prefix, extension)?
        }
    };

    if outputs.is_empty() {
        return Ok(true);
    }

    let source_time = modified(source)?;
    for output in &outputs {
        if modified(output)? >= source_time {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Files in `dir` named `{prefix}--...` with extension `extension`, sorted by name.
pub fn matching_variants(dir: &Path, prefix: &str, extension: &str) -> io::Result<Vec<PathBuf>> {
    let stem = format!("{}--", prefix);
    let mut matches = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        let name_matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with(&stem))
            .unwrap_or(false);
        let ext_matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(extension))
            .unwrap_or(false);

        if name_matches && ext_matches && entry.file_type()?.is_file() {
            matches.push(path);
        }
    }

    matches.sort();
    Ok(matches)
}

fn exists(path: &Path) -> io::Result<bool> {
    match fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

fn modified(path: &Path) -> io::Result<FileTime> {
    let meta = fs::metadata(path)?;
    Ok(FileTime::from_last_modification_time(&meta))
}
