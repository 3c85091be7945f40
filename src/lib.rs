// Site Media - build-time media preparation for the website
//
// Posters picked from the steadiest early frame of each video, WebP images,
// and web-ready MP4s, all skipped when already up to date.

pub mod constants;
pub mod config;
pub mod error;
pub mod tools;
pub mod engine;
pub mod metadata;
pub mod freshness;
pub mod discover;
pub mod thumbnail;
pub mod convert;
pub mod batch;

pub use config::Config;
pub use engine::{Engine, FfmpegEngine};
pub use error::{MediaError, Result};
