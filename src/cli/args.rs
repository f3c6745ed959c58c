//! Command-line argument definitions

use clap::Args;

use crate::domain::model::{FilterPreset, Resolution};
use crate::engine::EngineMode;

/// Arguments for the process command
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: String,

    /// Output video file path
    #[arg(short, long)]
    pub output: String,

    /// Duration to keep from the start (seconds, MM:SS.ms or HH:MM:SS.ms)
    #[arg(short, long)]
    pub trim: Option<String>,

    /// Caption drawn centered on every frame; empty for none
    #[arg(long)]
    pub text: Option<String>,

    /// Color filter: none, brighten or sepia
    #[arg(short, long)]
    pub filter: Option<FilterPreset>,

    /// Output size: 1080p, 720p or source
    #[arg(short, long)]
    pub resolution: Option<Resolution>,

    /// Processing strategy: auto, copy or reencode
    #[arg(long, default_value = "auto")]
    pub mode: EngineMode,

    /// Constant Rate Factor (0-51)
    #[arg(long)]
    pub crf: Option<u8>,

    /// Encoding preset
    #[arg(long)]
    pub preset: Option<String>,

    /// Video encoder name
    #[arg(long)]
    pub codec: Option<String>,

    /// Font file for the caption
    #[arg(long)]
    pub font_file: Option<String>,

    /// Caption font size
    #[arg(long)]
    pub font_size: Option<u32>,

    /// Caption color (name or #RRGGBB)
    #[arg(long)]
    pub font_color: Option<String>,

    /// Remove audio streams
    #[arg(long)]
    pub no_audio: bool,

    /// Replace the output file if it exists
    #[arg(long)]
    pub overwrite: bool,
}

/// Arguments for the probe command
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the gui command
#[derive(Args, Debug)]
pub struct GuiArgs {
    /// Initial input file
    #[arg(short, long)]
    pub input: Option<String>,

    /// Initial output file
    #[arg(short, long)]
    pub output: Option<String>,
}
