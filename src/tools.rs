// External tool resolver for ffmpeg/ffprobe
//
// Resolution order:
// 1) Environment variable override (SITEMEDIA_FFMPEG_PATH, SITEMEDIA_FFPROBE_PATH)
// 2) Next to the executable, or in its bin/ subdirectory
// 3) PATH fallback

use std::env;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::constants::{FFMPEG_PATH_ENV, FFPROBE_PATH_ENV};

/// Get the directory containing the current executable
fn exe_dir() -> Option<PathBuf> {
    env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()))
}

/// Resolve a tool path.
fn resolve_tool(env_key: &str, default_name: &str) -> PathBuf {
    if let Ok(v) = env::var(env_key) {
        let p = PathBuf::from(&v);
        if p.exists() {
            return p;
        }
        log::warn!("{} points at missing file {}, ignoring", env_key, v);
    }

    let mut filename = default_name.to_string();
    if cfg!(windows) && !filename.to_lowercase().ends_with(".exe") {
        filename.push_str(".exe");
    }

    if let Some(dir) = exe_dir() {
        let candidate = dir.join(&filename);
        if candidate.exists() {
            return candidate;
        }

        let bin_candidate = dir.join("bin").join(&filename);
        if bin_candidate.exists() {
            return bin_candidate;
        }
    }

    PathBuf::from(default_name)
}

/// Get path to ffprobe binary
pub fn ffprobe_path() -> PathBuf {
    resolve_tool(FFPROBE_PATH_ENV, "ffprobe")
}

/// Get path to ffmpeg binary
pub fn ffmpeg_path() -> PathBuf {
    resolve_tool(FFMPEG_PATH_ENV, "ffmpeg")
}

/// Check if a tool is available at the resolved path
pub fn is_tool_available(tool: &str) -> bool {
    let path = match tool {
        "ffprobe" => ffprobe_path(),
        "ffmpeg" => ffmpeg_path(),
        _ => return false,
    };

    // Run it even when the file exists: a broken binary is not available
    Command::new(&path)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Names of required tools that cannot be run.
pub fn missing_tools() -> Vec<&'static str> {
    ["ffmpeg", "ffprobe"]
        .into_iter()
        .filter(|t| !is_tool_available(t))
        .collect()
}
