//! Trim/filter/encode engines

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::model::EditRequest;
use crate::error::{CutframeError, CutframeResult};

pub mod copy;
pub mod progress;
pub mod reencode;
pub(crate) mod timeline;

pub use copy::StreamCopyEngine;
pub use progress::{CancelToken, ChannelProgress, LogProgress, NoProgress, ProgressEvent, ProgressSink};
pub use reencode::ReencodeEngine;

/// How a job is carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineMode {
    /// Stream copy for plain trims, re-encode otherwise
    #[default]
    Auto,
    /// Packet copy, no decoding; only valid for plain trims
    Copy,
    /// Decode, filter and encode
    Reencode,
}

impl FromStr for EngineMode {
    type Err = CutframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(EngineMode::Auto),
            "copy" => Ok(EngineMode::Copy),
            "reencode" | "re-encode" => Ok(EngineMode::Reencode),
            other => Err(CutframeError::invalid(format!(
                "unknown mode '{}' (expected auto, copy or reencode)",
                other
            ))),
        }
    }
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineMode::Auto => "auto",
            EngineMode::Copy => "copy",
            EngineMode::Reencode => "reencode",
        };
        f.write_str(name)
    }
}

impl EngineMode {
    /// Resolve `Auto` and reject a copy of a job that needs filtering
    pub fn resolve(self, request: &EditRequest) -> CutframeResult<EngineMode> {
        match self {
            EngineMode::Auto if request.is_plain_trim() => Ok(EngineMode::Copy),
            EngineMode::Auto => Ok(EngineMode::Reencode),
            EngineMode::Copy if !request.is_plain_trim() => Err(CutframeError::invalid(
                "copy mode cannot apply filters, scaling or captions; use --mode reencode",
            )),
            mode => Ok(mode),
        }
    }
}

/// Summary of a finished job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessReport {
    pub output: String,
    pub mode: EngineMode,
    /// Video frames (re-encode) or video packets (copy) written
    pub frames_encoded: u64,
    pub bytes_written: u64,
    /// Presentation time of the last written video frame
    pub output_seconds: f64,
    pub elapsed_seconds: f64,
    pub finished_at: DateTime<Utc>,
}

/// Initialize FFmpeg once per process
pub fn init_ffmpeg() -> CutframeResult<()> {
    ffmpeg_next::init().map_err(|e| CutframeError::FFmpegInitError {
        message: e.to_string(),
    })
}

/// Run a job with the engine `mode` resolves to
pub fn process(
    request: &EditRequest,
    mode: EngineMode,
    progress: &dyn ProgressSink,
) -> CutframeResult<ProcessReport> {
    request.validate()?;
    let resolved = mode.resolve(request)?;
    info!("Engine mode: {} (requested {})", resolved, mode);

    let result = match resolved {
        EngineMode::Copy => StreamCopyEngine::new().process(request, progress),
        _ => ReencodeEngine::new().process(request, progress),
    };

    match &result {
        Ok(report) => progress.emit(ProgressEvent::Finished(report.clone())),
        Err(e) => progress.emit(ProgressEvent::Failed(e.to_string())),
    }
    result
}
