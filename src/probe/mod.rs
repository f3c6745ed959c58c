//! Media file inspection module

use serde::{Deserialize, Serialize};

pub mod inspector;

pub use inspector::MediaProber;

/// Media file information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// File path
    pub path: String,
    /// Container format name
    pub container: String,
    /// Duration in seconds
    pub duration: f64,
    /// Overall bit rate, when the container reports one
    pub bit_rate: Option<u64>,
    /// File size in bytes
    pub file_size: u64,
    /// Video streams information
    pub video_streams: Vec<VideoStreamInfo>,
    /// Audio streams information
    pub audio_streams: Vec<AudioStreamInfo>,
}

/// Video stream information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoStreamInfo {
    pub index: usize,
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    pub time_base: (i32, i32),
}

/// Audio stream information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioStreamInfo {
    pub index: usize,
    pub codec: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub time_base: (i32, i32),
}

impl MediaInfo {
    pub fn primary_video(&self) -> Option<&VideoStreamInfo> {
        self.video_streams.first()
    }

    /// Trim durations past the end of the file just copy the whole file
    pub fn clamp_trim(&self, trim: f64) -> f64 {
        if self.duration > 0.0 {
            trim.min(self.duration)
        } else {
            trim
        }
    }

    /// Human-readable multi-line summary
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("File:      {}", self.path),
            format!("Container: {}", self.container),
            format!("Duration:  {:.3}s", self.duration),
            format!("Size:      {:.2} MB", self.file_size as f64 / 1024.0 / 1024.0),
        ];
        if let Some(bit_rate) = self.bit_rate {
            lines.push(format!("Bit rate:  {} kb/s", bit_rate / 1000));
        }
        for video in &self.video_streams {
            lines.push(format!(
                "Video #{}: {} {}x{} @ {:.3} fps",
                video.index, video.codec, video.width, video.height, video.frame_rate
            ));
        }
        for audio in &self.audio_streams {
            lines.push(format!(
                "Audio #{}: {} {} Hz, {} channels",
                audio.index, audio.codec, audio.sample_rate, audio.channels
            ));
        }
        lines.join("\n")
    }
}
