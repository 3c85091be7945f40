// In-memory engine for tests

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::constants::{BURST_FRAME_EXTENSION, BURST_FRAME_PREFIX};
use crate::engine::{BurstRequest, Engine, ExtractRequest};
use crate::error::{MediaError, Result};
use crate::metadata::VideoInfo;

/// How the fake answers a similarity request.
#[derive(Debug, Clone)]
pub enum SimilarityReply {
    /// Diagnostic line carrying this SSIM value.
    Ssim(f64),
    /// Raw text, e.g. something unparseable.
    Text(String),
    /// Engine exits non-zero.
    Fail,
}

/// Scriptable engine recording every call.
pub struct FakeEngine {
    pub info: VideoInfo,
    /// Frames written per burst; `None` makes the burst fail like a crashed ffmpeg.
    pub burst_frames: Option<usize>,
    pub similarity: RefCell<VecDeque<SimilarityReply>>,
    /// Extraction fails for sources whose path contains this text.
    pub fail_extract_for: Option<String>,
    /// Extraction fails this many times, then succeeds.
    pub extract_failures_left: Cell<u32>,
    pub probe_calls: Cell<u32>,
    pub burst_calls: Cell<u32>,
    pub similarity_calls: Cell<u32>,
    pub extract_calls: RefCell<Vec<ExtractRequest>>,
    pub burst_dirs: RefCell<Vec<PathBuf>>,
}

impl FakeEngine {
    pub fn new(duration_secs: f64) -> Self {
        Self {
            info: VideoInfo {
                duration_secs,
                width: 1920,
                height: 1080,
                size_bytes: 1_000_000,
                fps: Some(30.0),
            },
            burst_frames: Some(0),
            similarity: RefCell::new(VecDeque::new()),
            fail_extract_for: None,
            extract_failures_left: Cell::new(0),
            probe_calls: Cell::new(0),
            burst_calls: Cell::new(0),
            similarity_calls: Cell::new(0),
            extract_calls: RefCell::new(Vec::new()),
            burst_dirs: RefCell::new(Vec::new()),
        }
    }

    /// Burst of `n` frames whose adjacent pairs score `motion_scores` in order.
    pub fn with_motion(duration_secs: f64, motion_scores: &[f64]) -> Self {
        let engine = Self::new(duration_secs).with_frames(motion_scores.len() + 1);
        engine.similarity.borrow_mut().extend(
            motion_scores.iter().map(|m| SimilarityReply::Ssim(1.0 - m)),
        );
        engine
    }

    pub fn with_frames(mut self, n: usize) -> Self {
        self.burst_frames = Some(n);
        self
    }

    pub fn total_calls(&self) -> u32 {
        self.probe_calls.get()
            + self.burst_calls.get()
            + self.similarity_calls.get()
            + self.extract_calls.borrow().len() as u32
    }
}

pub fn ssim_text(value: f64) -> String {
    format!(
        "[Parsed_ssim_0 @ 0x5581] SSIM Y:{v:.6} (13.2) U:{v:.6} (14.0) V:{v:.6} (14.1) All:{v:.6} (13.6)\n",
        v = value
    )
}

fn failed(what: &str) -> MediaError {
    MediaError::ToolFailed {
        tool: "ffmpeg".to_string(),
        status: "exit status: 1".to_string(),
        stderr: format!("{} failed", what),
    }
}

impl Engine for FakeEngine {
    fn probe(&self, _source: &Path) -> Result<VideoInfo> {
        self.probe_calls.set(self.probe_calls.get() + 1);
        Ok(self.info.clone())
    }

    fn sample_burst(&self, _source: &Path, _request: &BurstRequest, out_dir: &Path) -> Result<()> {
        self.burst_calls.set(self.burst_calls.get() + 1);
        self.burst_dirs.borrow_mut().push(out_dir.to_path_buf());

        let n = self.burst_frames.ok_or_else(|| failed("burst"))?;
        for i in 1..=n {
            let name = format!("{}{:04}.{}", BURST_FRAME_PREFIX, i, BURST_FRAME_EXTENSION);
            std::fs::write(out_dir.join(name), format!("frame {}", i))?;
        }
        Ok(())
    }

    fn compute_similarity(&self, frame_a: &Path, frame_b: &Path) -> Result<String> {
        self.similarity_calls.set(self.similarity_calls.get() + 1);
        assert!(frame_a.exists() && frame_b.exists(), "burst frames must exist while scoring");

        match self.similarity.borrow_mut().pop_front() {
            Some(SimilarityReply::Ssim(v)) => Ok(ssim_text(v)),
            Some(SimilarityReply::Text(text)) => Ok(text),
            Some(SimilarityReply::Fail) => Err(failed("ssim")),
            None => Ok(ssim_text(1.0)),
        }
    }

    fn extract_frame(&self, source: &Path, request: &ExtractRequest, output: &Path) -> Result<()> {
        self.extract_calls.borrow_mut().push(request.clone());

        let forced = self
            .fail_extract_for
            .as_deref()
            .map(|s| source.to_string_lossy().contains(s))
            .unwrap_or(false);
        if forced {
            return Err(failed("extract"));
        }
        if self.extract_failures_left.get() > 0 {
            self.extract_failures_left.set(self.extract_failures_left.get() - 1);
            return Err(failed("extract"));
        }

        std::fs::write(output, b"RIFF....WEBPVP8 ")?;
        Ok(())
    }
}
