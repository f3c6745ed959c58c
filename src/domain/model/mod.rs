// Domain models - Edit request types and the fixed preset tables

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CutframeError, CutframeResult};

#[cfg(test)]
mod tests;

/// Time specification in seconds with fractional precision
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct TimeSpec {
    pub seconds: f64,
}

impl TimeSpec {
    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    pub fn as_seconds(&self) -> f64 {
        self.seconds
    }

    /// Parse time string: seconds (`12.5`), `MM:SS.ms` or `HH:MM:SS.ms`
    pub fn parse(time_str: &str) -> CutframeResult<Self> {
        let trimmed = time_str.trim();
        let bad = || CutframeError::InvalidTimeFormat {
            time: trimmed.to_string(),
        };

        if let Ok(seconds) = trimmed.parse::<f64>() {
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(bad());
            }
            return Ok(Self::from_seconds(seconds));
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        match parts.as_slice() {
            [minutes, seconds] => {
                let minutes = minutes.parse::<u32>().map_err(|_| bad())?;
                let seconds = seconds.parse::<f64>().map_err(|_| bad())?;
                if !(0.0..60.0).contains(&seconds) {
                    return Err(bad());
                }
                Ok(Self::from_seconds(minutes as f64 * 60.0 + seconds))
            }
            [hours, minutes, seconds] => {
                let hours = hours.parse::<u32>().map_err(|_| bad())?;
                let minutes = minutes.parse::<u32>().map_err(|_| bad())?;
                let seconds = seconds.parse::<f64>().map_err(|_| bad())?;
                if minutes >= 60 || !(0.0..60.0).contains(&seconds) {
                    return Err(bad());
                }
                Ok(Self::from_seconds(
                    hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds,
                ))
            }
            _ => Err(bad()),
        }
    }

    /// Format as H:MM:SS.mmm, or M:SS.mmm below one hour
    pub fn format_hms(&self) -> String {
        let total_ms = (self.seconds * 1000.0).round() as u64;
        let hours = total_ms / 3_600_000;
        let minutes = (total_ms / 60_000) % 60;
        let seconds = (total_ms / 1000) % 60;
        let millis = total_ms % 1000;

        if hours > 0 {
            format!("{}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
        } else {
            format!("{}:{:02}.{:03}", minutes, seconds, millis)
        }
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hms())
    }
}

/// Color filter applied before scaling and the text overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterPreset {
    #[default]
    None,
    Brighten,
    Sepia,
}

impl FilterPreset {
    pub const ALL: [FilterPreset; 3] = [FilterPreset::None, FilterPreset::Brighten, FilterPreset::Sepia];

    /// Filter graph fragment for this preset
    pub fn filter_description(&self) -> &'static str {
        match self {
            FilterPreset::None => "null",
            FilterPreset::Brighten => "eq=brightness=0.1",
            FilterPreset::Sepia => {
                "colorchannelmixer=.393:.769:.189:0:.349:.686:.168:0:.272:.534:.131"
            }
        }
    }

    /// Map the numbered menu choice (1, 2, anything else) to a preset
    pub fn from_choice(choice: u32) -> Self {
        match choice {
            1 => FilterPreset::None,
            2 => FilterPreset::Brighten,
            _ => FilterPreset::Sepia,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FilterPreset::None => "None",
            FilterPreset::Brighten => "Brighten",
            FilterPreset::Sepia => "Sepia",
        }
    }
}

impl fmt::Display for FilterPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FilterPreset {
    type Err = CutframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "null" | "1" => Ok(FilterPreset::None),
            "brighten" | "bright" | "2" => Ok(FilterPreset::Brighten),
            "sepia" | "3" => Ok(FilterPreset::Sepia),
            other => Err(CutframeError::invalid(format!(
                "unknown filter preset '{}' (expected none, brighten or sepia)",
                other
            ))),
        }
    }
}

/// Output frame size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Resolution {
    #[default]
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    /// Keep the decoded frame size
    #[serde(rename = "source")]
    Source,
}

impl Resolution {
    pub const ALL: [Resolution; 3] = [Resolution::P1080, Resolution::P720, Resolution::Source];

    /// Fixed target dimensions, `None` for the source size
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            Resolution::P1080 => Some((1920, 1080)),
            Resolution::P720 => Some((1280, 720)),
            Resolution::Source => None,
        }
    }

    /// Map the numbered menu choice: 1 is 1080p, anything else 720p
    pub fn from_choice(choice: u32) -> Self {
        if choice == 1 {
            Resolution::P1080
        } else {
            Resolution::P720
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Resolution::P1080 => "1080p",
            Resolution::P720 => "720p",
            Resolution::Source => "source",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Resolution {
    type Err = CutframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1080p" | "1080" | "1920x1080" => Ok(Resolution::P1080),
            "720p" | "720" | "1280x720" => Ok(Resolution::P720),
            "source" | "same" | "original" => Ok(Resolution::Source),
            other => Err(CutframeError::invalid(format!(
                "unknown resolution '{}' (expected 1080p, 720p or source)",
                other
            ))),
        }
    }
}

/// Centered caption burned into every frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    pub text: String,
    pub font_size: u32,
    pub font_color: String,
    pub font_file: Option<String>,
}

impl TextOverlay {
    pub const DEFAULT_FONT_SIZE: u32 = 24;
    pub const DEFAULT_FONT_COLOR: &'static str = "white";

    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: Self::DEFAULT_FONT_SIZE,
            font_color: Self::DEFAULT_FONT_COLOR.to_string(),
            font_file: None,
        }
    }

    pub fn with_font_size(mut self, size: u32) -> Self {
        self.font_size = size;
        self
    }

    pub fn with_font_color(mut self, color: impl Into<String>) -> Self {
        self.font_color = color.into();
        self
    }

    pub fn with_font_file(mut self, path: Option<String>) -> Self {
        self.font_file = path;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Video encoder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    /// Encoder name, looked up by name first and falling back to H.264 by id
    pub codec: String,
    /// Constant rate factor (0-51)
    pub crf: u8,
    /// x264-style speed preset
    pub preset: String,
    /// Used when the input stream reports no frame rate
    pub fallback_frame_rate: u32,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            codec: "libx264".to_string(),
            crf: 23,
            preset: "medium".to_string(),
            fallback_frame_rate: 25,
        }
    }
}

/// Everything one trim/filter/encode job needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditRequest {
    pub input: String,
    pub output: String,
    pub trim: TimeSpec,
    pub overlay: Option<TextOverlay>,
    pub preset: FilterPreset,
    pub resolution: Resolution,
    pub encoder: EncoderSettings,
    pub keep_audio: bool,
}

impl EditRequest {
    pub fn new(
        input: impl Into<String>,
        output: impl Into<String>,
        trim: TimeSpec,
    ) -> CutframeResult<Self> {
        let request = Self {
            input: input.into(),
            output: output.into(),
            trim,
            overlay: None,
            preset: FilterPreset::None,
            resolution: Resolution::Source,
            encoder: EncoderSettings::default(),
            keep_audio: true,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn with_overlay(mut self, overlay: TextOverlay) -> Self {
        self.overlay = if overlay.is_empty() { None } else { Some(overlay) };
        self
    }

    pub fn with_preset(mut self, preset: FilterPreset) -> Self {
        self.preset = preset;
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_encoder(mut self, encoder: EncoderSettings) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_audio(mut self, keep_audio: bool) -> Self {
        self.keep_audio = keep_audio;
        self
    }

    /// Check field invariants
    pub fn validate(&self) -> CutframeResult<()> {
        if self.input.trim().is_empty() {
            return Err(CutframeError::invalid("input path is empty"));
        }
        if self.output.trim().is_empty() {
            return Err(CutframeError::invalid("output path is empty"));
        }
        if self.input == self.output {
            return Err(CutframeError::invalid(
                "output path must differ from the input path",
            ));
        }
        if !self.trim.seconds.is_finite() || self.trim.seconds <= 0.0 {
            return Err(CutframeError::invalid(format!(
                "trim duration must be positive, got {}",
                self.trim.seconds
            )));
        }
        if self.encoder.crf > 51 {
            return Err(CutframeError::invalid(format!(
                "CRF value {} is invalid (must be 0-51)",
                self.encoder.crf
            )));
        }
        if self.encoder.fallback_frame_rate == 0 {
            return Err(CutframeError::invalid("fallback frame rate must be non-zero"));
        }
        Ok(())
    }

    /// A plain trim needs no decoding: no preset, no scaling, no caption
    pub fn is_plain_trim(&self) -> bool {
        self.preset == FilterPreset::None
            && self.resolution == Resolution::Source
            && self.overlay.as_ref().map_or(true, TextOverlay::is_empty)
    }
}
