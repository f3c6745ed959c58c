//! CLI module for Cutframe
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::utils::logging::{LogFormat, LogLevel};

pub mod args;
pub mod commands;

/// Cutframe video editor
///
/// Trims a video from its start, applies a color preset, scales it and burns
/// in a centered caption. Run `gui` for the interactive editor.
#[derive(Parser, Debug)]
#[command(name = "cutframe")]
#[command(about = "Cutframe - trim, filter, caption and re-encode a video")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level
    #[arg(long, value_enum, default_value = "info", global = true)]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormat,

    /// Configuration file (defaults to ./cutframe.toml when present)
    #[arg(long, env = "CUTFRAME_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Trim, filter, caption and encode a video file
    Process(args::ProcessArgs),
    /// Show stream information for a media file
    Probe(args::ProbeArgs),
    /// Open the editor window
    Gui(args::GuiArgs),
}
