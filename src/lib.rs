//! Cutframe Video Editor Library
//!
//! Trims a video from its start, applies a color preset, scales to a fixed
//! resolution and burns in a centered caption, using FFmpeg through
//! `ffmpeg-next`. Plain trims are stream-copied without re-encoding.

pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod filters;
pub mod preview;
pub mod probe;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use domain::model::{EditRequest, EncoderSettings, FilterPreset, Resolution, TextOverlay, TimeSpec};
pub use engine::{EngineMode, ProcessReport};
pub use error::{CutframeError, CutframeResult};
pub use probe::{MediaInfo, MediaProber};

/// Initialize Cutframe library
pub fn init() -> CutframeResult<()> {
    engine::init_ffmpeg()
}
