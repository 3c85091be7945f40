// Site Media Constants
// Defaults for Config. Change the Config, not these, for per-run overrides.

// Stable frame analysis window
pub const ANALYSIS_WINDOW_START_SECS: f64 = 0.5;    // Skip leading black frames
pub const ANALYSIS_WINDOW_MAX_SECS: f64 = 10.0;
pub const ANALYSIS_WINDOW_RATIO: f64 = 0.3;         // Fraction of duration to scan
pub const SAMPLE_INTERVAL_SECS: f64 = 0.5;          // 2 samples per second
pub const MIN_BURST_FRAMES: usize = 2;

// Burst frames are disposable, keep them small and cheap
pub const BURST_WIDTH: u32 = 320;
pub const BURST_HEIGHT: u32 = 240;
pub const BURST_JPEG_Q: u32 = 31;                   // ffmpeg -q:v, 31 is lowest quality
pub const BURST_FRAME_PREFIX: &str = "frame_";
pub const BURST_FRAME_EXTENSION: &str = "jpg";

// Similarity
pub const NEUTRAL_MOTION_SCORE: f64 = 0.5;

// Fallbacks
pub const FALLBACK_TIMESTAMP_SECS: f64 = 2.0;

// Poster output
pub const POSTER_PREFIX: &str = "firstframe";
pub const POSTER_EXTENSION: &str = "webp";
pub const POSTER_TARGET_WIDTH: u32 = 1280;
pub const POSTER_QUALITY: u32 = 80;

// Image conversion
pub const IMAGE_OUTPUT_EXTENSION: &str = "webp";
pub const IMAGE_MAX_WIDTH: u32 = 1920;
pub const IMAGE_QUALITY: u32 = 82;

// Video compression
pub const VIDEO_OUTPUT_EXTENSION: &str = "mp4";
pub const VIDEO_MAX_HEIGHT: u32 = 720;
pub const VIDEO_CRF: u32 = 26;
pub const VIDEO_PRESET: &str = "slow";
pub const VIDEO_AUDIO_BITRATE: &str = "96k";

// Tool path overrides
pub const FFMPEG_PATH_ENV: &str = "SITEMEDIA_FFMPEG_PATH";
pub const FFPROBE_PATH_ENV: &str = "SITEMEDIA_FFPROBE_PATH";

// Video extensions (sources for posters and compression)
pub const VIDEO_EXTENSIONS: [&str; 8] = [
    "mp4", "mov", "m4v", "mkv", "webm", "avi", "mpg", "mpeg"
];

// Image extensions (sources for WebP conversion)
pub const IMAGE_EXTENSIONS: [&str; 6] = [
    "jpg", "jpeg", "png", "gif", "bmp", "tiff"
];
