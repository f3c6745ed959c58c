// Unit tests for domain models

use super::*;

#[test]
fn test_time_spec_parse_seconds() {
    assert_eq!(TimeSpec::parse("10").unwrap().as_seconds(), 10.0);
    assert_eq!(TimeSpec::parse(" 10.5 ").unwrap().as_seconds(), 10.5);
}

#[test]
fn test_time_spec_parse_colon_forms() {
    assert_eq!(TimeSpec::parse("01:30").unwrap().as_seconds(), 90.0);
    assert_eq!(TimeSpec::parse("1:30.5").unwrap().as_seconds(), 90.5);
    assert_eq!(TimeSpec::parse("1:02:03").unwrap().as_seconds(), 3723.0);
}

#[test]
fn test_time_spec_rejects_bad_input() {
    assert!(TimeSpec::parse("-1").is_err());
    assert!(TimeSpec::parse("abc").is_err());
    assert!(TimeSpec::parse("1:75").is_err());
    assert!(TimeSpec::parse("1:60:00").is_err());
    assert!(TimeSpec::parse("1:2:3:4").is_err());
    assert!(TimeSpec::parse("inf").is_err());
}

#[test]
fn test_time_spec_format() {
    assert_eq!(TimeSpec::from_seconds(90.5).format_hms(), "1:30.500");
    assert_eq!(TimeSpec::from_seconds(3723.25).to_string(), "1:02:03.250");
}

#[test]
fn test_filter_preset_descriptions() {
    assert_eq!(FilterPreset::None.filter_description(), "null");
    assert_eq!(FilterPreset::Brighten.filter_description(), "eq=brightness=0.1");
    assert!(FilterPreset::Sepia
        .filter_description()
        .starts_with("colorchannelmixer=.393:.769:.189"));
}

#[test]
fn test_filter_preset_from_choice_and_name() {
    assert_eq!(FilterPreset::from_choice(1), FilterPreset::None);
    assert_eq!(FilterPreset::from_choice(2), FilterPreset::Brighten);
    assert_eq!(FilterPreset::from_choice(7), FilterPreset::Sepia);
    assert_eq!("SEPIA".parse::<FilterPreset>().unwrap(), FilterPreset::Sepia);
    assert_eq!("bright".parse::<FilterPreset>().unwrap(), FilterPreset::Brighten);
    assert!("vintage".parse::<FilterPreset>().is_err());
}

#[test]
fn test_resolution_dimensions() {
    assert_eq!(Resolution::P1080.dimensions(), Some((1920, 1080)));
    assert_eq!(Resolution::P720.dimensions(), Some((1280, 720)));
    assert_eq!(Resolution::Source.dimensions(), None);
    assert_eq!(Resolution::from_choice(1), Resolution::P1080);
    assert_eq!(Resolution::from_choice(2), Resolution::P720);
    assert_eq!("720p".parse::<Resolution>().unwrap(), Resolution::P720);
    assert!("4k".parse::<Resolution>().is_err());
}

#[test]
fn test_edit_request_validation() {
    let trim = TimeSpec::from_seconds(10.0);
    assert!(EditRequest::new("input.mp4", "output.mp4", trim).is_ok());
    assert!(EditRequest::new("same.mp4", "same.mp4", trim).is_err());
    assert!(EditRequest::new("", "output.mp4", trim).is_err());
    assert!(EditRequest::new("input.mp4", "output.mp4", TimeSpec::from_seconds(0.0)).is_err());

    let request = EditRequest::new("input.mp4", "output.mp4", trim)
        .unwrap()
        .with_encoder(EncoderSettings {
            crf: 60,
            ..EncoderSettings::default()
        });
    assert!(request.validate().is_err());
}

#[test]
fn test_plain_trim_detection() {
    let trim = TimeSpec::from_seconds(5.0);
    let request = EditRequest::new("a.mp4", "b.mp4", trim).unwrap();
    assert!(request.is_plain_trim());

    assert!(!request.clone().with_preset(FilterPreset::Sepia).is_plain_trim());
    assert!(!request.clone().with_resolution(Resolution::P720).is_plain_trim());
    assert!(!request
        .clone()
        .with_overlay(TextOverlay::new("Hello World"))
        .is_plain_trim());

    // an empty caption is dropped, so the job stays a plain trim
    let with_empty = request.with_overlay(TextOverlay::new(""));
    assert!(with_empty.overlay.is_none());
    assert!(with_empty.is_plain_trim());
}

#[test]
fn test_text_overlay_defaults() {
    let overlay = TextOverlay::new("Hi");
    assert_eq!(overlay.font_size, 24);
    assert_eq!(overlay.font_color, "white");
    assert!(overlay.font_file.is_none());
}
