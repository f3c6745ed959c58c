//! End-to-end engine tests against generated media
//!
//! Sample files are made with the `ffmpeg` command-line tool; tests return
//! early when it is not installed.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use cutframe::engine::{self, CancelToken, ChannelProgress, NoProgress, ProgressEvent};
use cutframe::preview::FrameDecoder;
use cutframe::*;

// Test utilities

/// Write a 4 second 320x240 clip with a sine tone, using built-in encoders only
fn create_test_video(path: &Path) -> bool {
    generate(path, "320x240", &["-c:v", "mpeg4"])
}

fn generate(path: &Path, size: &str, video_args: &[&str]) -> bool {
    let source = format!("testsrc=duration=4:size={}:rate=25", size);
    let status = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-y"])
        .args(["-f", "lavfi", "-i", &source])
        .args(["-f", "lavfi", "-i", "sine=frequency=1000:duration=4"])
        .args(video_args)
        .args(["-c:a", "aac", "-shortest"])
        .arg(path)
        .status();
    match status {
        Ok(status) if status.success() => true,
        _ => {
            eprintln!("ffmpeg not available, skipping");
            false
        }
    }
}

fn sample() -> Option<(TempDir, String)> {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.mp4");
    if !create_test_video(&input) {
        return None;
    }
    Some((dir, input.to_string_lossy().to_string()))
}

/// Same clip in Matroska with timestamps starting at 1.4s
fn late_start_sample() -> Option<(TempDir, String)> {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("late.mkv");
    if !generate(&input, "320x240", &["-c:v", "mpeg4", "-output_ts_offset", "1.4"]) {
        return None;
    }
    Some((dir, input.to_string_lossy().to_string()))
}

fn caption_font() -> Option<String> {
    const FONTS: &[&str] = &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];
    engine::init_ffmpeg().ok()?;
    ffmpeg_next::filter::find("drawtext")?;
    FONTS
        .iter()
        .find(|font| Path::new(font).exists())
        .map(|font| font.to_string())
}

fn output_in(dir: &TempDir, name: &str) -> String {
    dir.path().join(name).to_string_lossy().to_string()
}

fn mpeg4() -> EncoderSettings {
    EncoderSettings {
        codec: "mpeg4".to_string(),
        ..EncoderSettings::default()
    }
}

#[test]
fn test_probe_generated_file() {
    let Some((_dir, input)) = sample() else { return };

    let info = MediaProber::new().probe(&input).unwrap();
    let video = info.primary_video().unwrap();
    assert_eq!((video.width, video.height), (320, 240));
    assert!((video.frame_rate - 25.0).abs() < 0.01);
    assert_eq!(info.audio_streams.len(), 1);
    assert!((info.duration - 4.0).abs() < 0.2);
}

#[test]
fn test_reencode_trims_filters_and_scales() {
    let Some((dir, input)) = sample() else { return };
    let output = output_in(&dir, "nested/sepia.mp4");

    let request = EditRequest::new(input, output.clone(), TimeSpec::from_seconds(2.0))
        .unwrap()
        .with_preset(FilterPreset::Sepia)
        .with_resolution(Resolution::P720)
        .with_encoder(mpeg4());

    let report = engine::process(&request, EngineMode::Auto, &NoProgress).unwrap();
    assert_eq!(report.mode, EngineMode::Reencode);
    assert!(report.frames_encoded >= 45 && report.frames_encoded <= 52);
    assert!(report.bytes_written > 0);

    let info = MediaProber::new().probe(&output).unwrap();
    let video = info.primary_video().unwrap();
    assert_eq!((video.width, video.height), (1280, 720));
    assert_eq!(info.audio_streams.len(), 1);
    assert!(info.duration > 1.5 && info.duration < 2.5);
}

#[test]
fn test_reencode_burns_in_caption() {
    let Some(font) = caption_font() else {
        eprintln!("drawtext or a font file not available, skipping");
        return;
    };
    let Some((dir, input)) = sample() else { return };
    let output = output_in(&dir, "caption.mp4");

    let overlay = TextOverlay::new("it's 100%: done")
        .with_font_size(32)
        .with_font_color("yellow")
        .with_font_file(Some(font));
    let request = EditRequest::new(input, output.clone(), TimeSpec::from_seconds(1.0))
        .unwrap()
        .with_overlay(overlay)
        .with_encoder(mpeg4());

    let report = engine::process(&request, EngineMode::Auto, &NoProgress).unwrap();
    assert_eq!(report.mode, EngineMode::Reencode);
    assert!(report.frames_encoded >= 20);

    let info = MediaProber::new().probe(&output).unwrap();
    assert_eq!(info.primary_video().unwrap().width, 320);
}

#[test]
fn test_odd_source_size_is_rounded_to_even() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("odd.mkv");
    if !generate(&input, "321x241", &["-c:v", "ffv1"]) {
        return;
    }
    let output = output_in(&dir, "odd.mp4");

    let request = EditRequest::new(input.to_string_lossy(), output.clone(), TimeSpec::from_seconds(1.0))
        .unwrap()
        .with_preset(FilterPreset::Brighten)
        .with_encoder(mpeg4());
    engine::process(&request, EngineMode::Reencode, &NoProgress).unwrap();

    let info = MediaProber::new().probe(&output).unwrap();
    let video = info.primary_video().unwrap();
    assert_eq!((video.width, video.height), (320, 240));
}

#[test]
fn test_copy_counts_from_container_start() {
    let Some((dir, input)) = late_start_sample() else { return };
    let output = output_in(&dir, "late-copy.mkv");

    let request = EditRequest::new(input, output.clone(), TimeSpec::from_seconds(1.0)).unwrap();
    let report = engine::process(&request, EngineMode::Auto, &NoProgress).unwrap();
    assert_eq!(report.mode, EngineMode::Copy);
    assert!(report.frames_encoded >= 24 && report.frames_encoded <= 27);

    let info = MediaProber::new().probe(&output).unwrap();
    assert_eq!(info.audio_streams.len(), 1);
    assert!(info.duration > 0.5 && info.duration < 2.0);
}

#[test]
fn test_reencode_counts_from_container_start() {
    let Some((dir, input)) = late_start_sample() else { return };
    let output = output_in(&dir, "late-sepia.mp4");

    let request = EditRequest::new(input, output.clone(), TimeSpec::from_seconds(1.0))
        .unwrap()
        .with_preset(FilterPreset::Sepia)
        .with_encoder(mpeg4());
    let report = engine::process(&request, EngineMode::Reencode, &NoProgress).unwrap();
    assert!(report.frames_encoded >= 24 && report.frames_encoded <= 27);

    let info = MediaProber::new().probe(&output).unwrap();
    assert_eq!(info.audio_streams.len(), 1);
    assert!(info.duration > 0.5 && info.duration < 1.6);
}

#[test]
fn test_reencode_without_audio() {
    let Some((dir, input)) = sample() else { return };
    let output = output_in(&dir, "silent.mp4");

    let request = EditRequest::new(input, output.clone(), TimeSpec::from_seconds(1.0))
        .unwrap()
        .with_preset(FilterPreset::Brighten)
        .with_encoder(mpeg4())
        .with_audio(false);

    engine::process(&request, EngineMode::Reencode, &NoProgress).unwrap();
    let info = MediaProber::new().probe(&output).unwrap();
    assert!(info.audio_streams.is_empty());
    assert_eq!(info.video_streams.len(), 1);
}

#[test]
fn test_copy_mode_keeps_streams() {
    let Some((dir, input)) = sample() else { return };
    let output = output_in(&dir, "copy.mp4");

    let request = EditRequest::new(input, output.clone(), TimeSpec::from_seconds(1.5)).unwrap();
    let report = engine::process(&request, EngineMode::Auto, &NoProgress).unwrap();
    assert_eq!(report.mode, EngineMode::Copy);

    let info = MediaProber::new().probe(&output).unwrap();
    assert_eq!(info.primary_video().unwrap().codec, "mpeg4");
    assert_eq!(info.audio_streams.len(), 1);
    assert!(info.duration < 3.0);
}

#[test]
fn test_trim_longer_than_input_keeps_everything() {
    let Some((dir, input)) = sample() else { return };
    let output = output_in(&dir, "all.mp4");

    let request = EditRequest::new(input, output.clone(), TimeSpec::from_seconds(60.0))
        .unwrap()
        .with_resolution(Resolution::P720)
        .with_encoder(mpeg4());
    let report = engine::process(&request, EngineMode::Reencode, &NoProgress).unwrap();
    assert!(report.frames_encoded >= 95);
}

#[test]
fn test_channel_progress_reports_lifecycle() {
    let Some((dir, input)) = sample() else { return };
    let output = output_in(&dir, "events.mp4");

    let request = EditRequest::new(input, output, TimeSpec::from_seconds(1.0))
        .unwrap()
        .with_preset(FilterPreset::Sepia)
        .with_encoder(mpeg4());
    let (sink, events) = ChannelProgress::channel(CancelToken::new());
    engine::process(&request, EngineMode::Reencode, &sink).unwrap();
    drop(sink);

    let events: Vec<ProgressEvent> = events.iter().collect();
    assert!(matches!(events.first(), Some(ProgressEvent::Started { .. })));
    assert!(matches!(events.last(), Some(ProgressEvent::Finished(_))));
}

#[test]
fn test_cancelled_job_stops() {
    let Some((dir, input)) = sample() else { return };
    let output = output_in(&dir, "cancelled.mp4");

    let request = EditRequest::new(input, output.clone(), TimeSpec::from_seconds(3.0))
        .unwrap()
        .with_preset(FilterPreset::Brighten)
        .with_encoder(mpeg4());
    let cancel = CancelToken::new();
    cancel.cancel();
    let (sink, events) = ChannelProgress::channel(cancel);

    let result = engine::process(&request, EngineMode::Reencode, &sink);
    assert!(matches!(result, Err(CutframeError::Cancelled)));
    drop(sink);
    assert!(matches!(events.iter().last(), Some(ProgressEvent::Failed(_))));
    assert!(!Path::new(&output).exists());
}

#[test]
fn test_preview_decodes_and_seeks() {
    let Some((_dir, input)) = sample() else { return };

    let mut decoder = FrameDecoder::open(&input, 160, 160).unwrap();
    assert_eq!(decoder.frame_size(), (160, 120));
    assert!((decoder.frame_rate() - 25.0).abs() < 0.01);

    let frame = decoder.next_frame().unwrap().unwrap();
    assert_eq!(frame.rgba.len(), 160 * 120 * 4);

    decoder.seek(2.0).unwrap();
    let frame = decoder.next_frame().unwrap().unwrap();
    assert!(frame.seconds >= 2.0 - 1e-6);

    decoder.resize(80, 80).unwrap();
    assert_eq!(decoder.frame_size(), (80, 60));
    let frame = decoder.next_frame().unwrap().unwrap();
    assert_eq!((frame.width, frame.height), (80, 60));
    assert_eq!(frame.rgba.len(), 80 * 60 * 4);

    let mut remaining = 0;
    while decoder.next_frame().unwrap().is_some() {
        remaining += 1;
    }
    assert!(remaining > 0);
    assert!(decoder.is_finished());
}
