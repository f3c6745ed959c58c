//! Error handling module for Cutframe

use thiserror::Error;

/// Main error type for Cutframe operations
#[derive(Error, Debug)]
pub enum CutframeError {
    /// Input file not found or inaccessible
    #[error("Input file not found: {path}")]
    InputFileNotFound { path: String },

    /// Invalid time format
    #[error("Invalid time format: {time}. Expected seconds, MM:SS.ms or HH:MM:SS.ms")]
    InvalidTimeFormat { time: String },

    /// A request field failed validation
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// FFmpeg initialization error
    #[error("Failed to initialize FFmpeg: {message}")]
    FFmpegInitError { message: String },

    /// Media probe error
    #[error("Failed to probe media file: {message}")]
    ProbeError { message: String },

    /// Decode, filter or encode failure
    #[error("Processing failed: {message}")]
    ProcessingError { message: String },

    /// Output already present and overwriting was not requested
    #[error("Output file already exists: {path} (pass --overwrite to replace it)")]
    OutputExists { path: String },

    /// Job stopped on request
    #[error("Processing cancelled")]
    Cancelled,

    /// Configuration file or environment error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Preview window error
    #[error("Preview window error: {message}")]
    WindowError { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// FFmpeg error
    #[error("FFmpeg error: {0}")]
    FFmpegError(#[from] ffmpeg_next::Error),
}

impl CutframeError {
    pub(crate) fn processing(message: impl Into<String>) -> Self {
        Self::ProcessingError {
            message: message.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

/// Result type alias for Cutframe operations
pub type CutframeResult<T> = std::result::Result<T, CutframeError>;
