//! Command implementations

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::args::{GuiArgs, ProbeArgs, ProcessArgs};
use crate::config::AppConfig;
use crate::domain::model::{EditRequest, TextOverlay, TimeSpec};
use crate::engine::{self, LogProgress, ProcessReport};
use crate::error::{CutframeError, CutframeResult};
use crate::probe::{MediaInfo, MediaProber};
use crate::ui::{self, EditForm};
use crate::utils::format_file_size;

/// Execute the process command
pub fn process(args: ProcessArgs, config: &AppConfig) -> Result<ProcessReport> {
    info!("Starting process operation");
    info!("Input: {}", args.input);
    info!("Output: {}", args.output);

    let request = build_request(&args, config)?;
    check_overwrite(&request.output, args.overwrite)?;

    // Warn early when the trim runs past the end of the input
    if let Ok(media_info) = MediaProber::new().probe(&request.input) {
        let available = media_info.clamp_trim(request.trim.as_seconds());
        if available < request.trim.as_seconds() {
            warn!(
                "Trim of {} exceeds input duration {:.3}s; output will be shorter",
                request.trim, media_info.duration
            );
        }
    }

    let progress = LogProgress::default();
    let report = engine::process(&request, args.mode, &progress)
        .context("Failed to process video")?;

    display_report(&report);
    info!("Process operation completed successfully");
    Ok(report)
}

/// Merge flags over the loaded configuration; flags win
pub fn build_request(args: &ProcessArgs, config: &AppConfig) -> CutframeResult<EditRequest> {
    let trim = TimeSpec::parse(args.trim.as_deref().unwrap_or(&config.defaults.trim))?;

    let mut encoder = config.encoder.clone();
    if let Some(codec) = &args.codec {
        encoder.codec = codec.clone();
    }
    if let Some(crf) = args.crf {
        encoder.crf = crf;
    }
    if let Some(preset) = &args.preset {
        encoder.preset = preset.clone();
    }

    let text = args.text.clone().unwrap_or_else(|| config.defaults.text.clone());
    let overlay = TextOverlay::new(text)
        .with_font_size(args.font_size.unwrap_or(config.overlay.font_size))
        .with_font_color(
            args.font_color
                .clone()
                .unwrap_or_else(|| config.overlay.font_color.clone()),
        )
        .with_font_file(args.font_file.clone().or_else(|| config.overlay.font_file.clone()));

    let request = EditRequest::new(args.input.clone(), args.output.clone(), trim)?
        .with_overlay(overlay)
        .with_preset(args.filter.unwrap_or(config.defaults.filter))
        .with_resolution(args.resolution.unwrap_or(config.defaults.resolution))
        .with_encoder(encoder)
        .with_audio(!args.no_audio);
    request.validate()?;
    Ok(request)
}

/// Refuse to clobber an existing output unless asked to
pub fn check_overwrite(output: &str, overwrite: bool) -> CutframeResult<()> {
    if Path::new(output).exists() {
        if !overwrite {
            return Err(CutframeError::OutputExists {
                path: output.to_string(),
            });
        }
        warn!("Overwriting existing output file: {}", output);
    }
    Ok(())
}

/// Execute the probe command
pub fn probe(args: ProbeArgs) -> Result<()> {
    info!("Starting probe operation");
    info!("Input: {}", args.input);

    let media_info = MediaProber::new()
        .probe(&args.input)
        .context("Failed to probe input file")?;

    if args.json {
        let json = serde_json::to_string_pretty(&media_info)
            .context("Failed to serialize media info to JSON")?;
        println!("{}", json);
    } else {
        display_media_info(&media_info);
    }

    info!("Probe operation completed successfully");
    Ok(())
}

/// Execute the gui command
pub fn gui(args: GuiArgs, config: AppConfig) -> Result<()> {
    let mut form = EditForm::from_defaults(&config.defaults);
    if let Some(input) = args.input {
        form.input = input;
    }
    if let Some(output) = args.output {
        form.output = output;
    }
    ui::run_editor(config, form).context("Editor window failed")?;
    Ok(())
}

fn display_report(report: &ProcessReport) {
    println!("Done! Saved {}", report.output);
    println!("  Mode:     {}", report.mode);
    println!("  Frames:   {}", report.frames_encoded);
    println!("  Duration: {:.3}s", report.output_seconds);
    println!("  Size:     {}", format_file_size(report.bytes_written));
    println!("  Took:     {:.2}s", report.elapsed_seconds);
}

/// Display media information in human-readable format
fn display_media_info(media_info: &MediaInfo) {
    println!("Media Information");
    println!("=================");
    println!("{}", media_info.summary());
}
