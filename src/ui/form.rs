//! Editor form state: field values, keyboard focus and job status

use crate::config::{AppConfig, FormDefaults};
use crate::domain::model::{EditRequest, FilterPreset, Resolution, TextOverlay, TimeSpec};
use crate::engine::{ProcessReport, ProgressEvent};
use crate::error::{CutframeError, CutframeResult};

/// Form fields in focus order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Input,
    Output,
    Text,
    Trim,
    Filter,
    Resolution,
}

impl FormField {
    pub const ORDER: [FormField; 6] = [
        FormField::Input,
        FormField::Output,
        FormField::Text,
        FormField::Trim,
        FormField::Filter,
        FormField::Resolution,
    ];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        Self::ORDER[(self.position() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::Input => "Input File",
            FormField::Output => "Output File",
            FormField::Text => "Text",
            FormField::Trim => "Trim (s)",
            FormField::Filter => "Filter",
            FormField::Resolution => "Resolution",
        }
    }
}

/// Job status shown under the form
#[derive(Debug, Clone)]
pub enum FormStatus {
    Idle,
    Processing { frames: u64, seconds: f64 },
    Done(ProcessReport),
    Failed(String),
}

/// Values edited in the window
#[derive(Debug, Clone)]
pub struct EditForm {
    pub input: String,
    pub output: String,
    pub text: String,
    pub trim: String,
    pub filter: FilterPreset,
    pub resolution: Resolution,
    focus: FormField,
    status: FormStatus,
}

impl Default for EditForm {
    fn default() -> Self {
        Self::from_defaults(&FormDefaults::default())
    }
}

impl EditForm {
    pub fn from_defaults(defaults: &FormDefaults) -> Self {
        Self {
            input: defaults.input.clone(),
            output: defaults.output.clone(),
            text: defaults.text.clone(),
            trim: defaults.trim.clone(),
            filter: defaults.filter,
            resolution: defaults.resolution,
            focus: FormField::Input,
            status: FormStatus::Idle,
        }
    }

    pub fn focus(&self) -> FormField {
        self.focus
    }

    pub fn set_focus(&mut self, field: FormField) {
        self.focus = field;
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    pub fn status(&self) -> &FormStatus {
        &self.status
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.status, FormStatus::Processing { .. })
    }

    /// Build a validated request from the current field values
    pub fn to_request(&self, config: &AppConfig) -> CutframeResult<EditRequest> {
        let trim = TimeSpec::parse(&self.trim)?;
        let overlay = TextOverlay::new(self.text.clone())
            .with_font_size(config.overlay.font_size)
            .with_font_color(config.overlay.font_color.clone())
            .with_font_file(config.overlay.font_file.clone());

        let request = EditRequest::new(self.input.trim(), self.output.trim(), trim)?
            .with_overlay(overlay)
            .with_preset(self.filter)
            .with_resolution(self.resolution)
            .with_encoder(config.encoder.clone());
        request.validate()?;
        Ok(request)
    }

    /// Move to `Processing` and hand back the request to run.
    ///
    /// Refused while a job is running; a validation failure moves to `Failed`.
    pub fn begin(&mut self, config: &AppConfig) -> CutframeResult<EditRequest> {
        if self.is_processing() {
            return Err(CutframeError::invalid("a job is already running"));
        }
        match self.to_request(config) {
            Ok(request) => {
                self.status = FormStatus::Processing {
                    frames: 0,
                    seconds: 0.0,
                };
                Ok(request)
            }
            Err(e) => {
                self.status = FormStatus::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Fold a worker event into the status
    pub fn apply(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { .. } => {}
            ProgressEvent::Frame { frames, seconds } => {
                if self.is_processing() {
                    self.status = FormStatus::Processing { frames, seconds };
                }
            }
            ProgressEvent::Finished(report) => self.status = FormStatus::Done(report),
            ProgressEvent::Failed(message) => self.status = FormStatus::Failed(message),
        }
    }

    /// Worker went away without reporting
    pub fn abandon(&mut self, reason: &str) {
        if self.is_processing() {
            self.status = FormStatus::Failed(reason.to_string());
        }
    }

    pub fn status_line(&self) -> String {
        match &self.status {
            FormStatus::Idle => "Press Enter to process".to_string(),
            FormStatus::Processing { frames, seconds } => {
                format!("Processing... {} frames, {:.2}s", frames, seconds)
            }
            FormStatus::Done(report) => format!(
                "Done! Saved {} ({} frames, {:.2}s)",
                report.output, report.frames_encoded, report.output_seconds
            ),
            FormStatus::Failed(message) => format!("Error: {}", message),
        }
    }

    /// One line per field, as rendered in the window header
    pub fn display_lines(&self) -> Vec<String> {
        FormField::ORDER
            .iter()
            .map(|field| format!("{}: {}", field.label(), self.value_of(*field)))
            .collect()
    }

    fn value_of(&self, field: FormField) -> String {
        match field {
            FormField::Input => self.input.clone(),
            FormField::Output => self.output.clone(),
            FormField::Text => self.text.clone(),
            FormField::Trim => self.trim.clone(),
            FormField::Filter => self.filter.label().to_string(),
            FormField::Resolution => self.resolution.label().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineMode;
    use chrono::Utc;

    fn report() -> ProcessReport {
        ProcessReport {
            output: "output.mp4".to_string(),
            mode: EngineMode::Reencode,
            frames_encoded: 250,
            bytes_written: 1024,
            output_seconds: 9.96,
            elapsed_seconds: 1.5,
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn test_defaults_match_editor_start_state() {
        let form = EditForm::default();
        assert_eq!(form.input, "input.mp4");
        assert_eq!(form.output, "output.mp4");
        assert_eq!(form.text, "Hello World");
        assert_eq!(form.trim, "10.0");
        assert_eq!(form.filter, FilterPreset::None);
        assert_eq!(form.resolution, Resolution::P1080);
        assert_eq!(form.focus(), FormField::Input);
    }

    #[test]
    fn test_focus_wraps_both_ways() {
        let mut form = EditForm::default();
        form.focus_prev();
        assert_eq!(form.focus(), FormField::Resolution);
        form.focus_next();
        assert_eq!(form.focus(), FormField::Input);
        for _ in 0..3 {
            form.focus_next();
        }
        assert_eq!(form.focus(), FormField::Trim);
    }

    #[test]
    fn test_to_request_carries_fields() {
        let mut form = EditForm::default();
        form.filter = FilterPreset::Sepia;
        form.resolution = Resolution::P720;
        let request = form.to_request(&AppConfig::default()).unwrap();

        assert_eq!(request.input, "input.mp4");
        assert_eq!(request.trim.as_seconds(), 10.0);
        assert_eq!(request.preset, FilterPreset::Sepia);
        assert_eq!(request.resolution, Resolution::P720);
        assert_eq!(request.overlay.unwrap().text, "Hello World");
    }

    #[test]
    fn test_bad_trim_fails_submission() {
        let mut form = EditForm::default();
        form.trim = "ten".to_string();
        assert!(form.begin(&AppConfig::default()).is_err());
        assert!(matches!(form.status(), FormStatus::Failed(_)));
        assert!(form.status_line().starts_with("Error:"));
    }

    #[test]
    fn test_status_transitions() {
        let config = AppConfig::default();
        let mut form = EditForm::default();
        assert!(form.begin(&config).is_ok());
        assert!(form.is_processing());

        // no second job while one runs
        assert!(form.begin(&config).is_err());
        assert!(form.is_processing());

        form.apply(ProgressEvent::Frame {
            frames: 10,
            seconds: 0.4,
        });
        assert!(matches!(form.status(), FormStatus::Processing { frames: 10, .. }));

        form.apply(ProgressEvent::Finished(report()));
        assert!(form.status_line().starts_with("Done!"));

        // a finished form can run again
        assert!(form.begin(&config).is_ok());
        form.apply(ProgressEvent::Failed("boom".to_string()));
        assert_eq!(form.status_line(), "Error: boom");
    }

    #[test]
    fn test_abandon_only_affects_running_job() {
        let mut form = EditForm::default();
        form.abandon("worker stopped");
        assert!(matches!(form.status(), FormStatus::Idle));

        form.begin(&AppConfig::default()).unwrap();
        form.abandon("worker stopped");
        assert_eq!(form.status_line(), "Error: worker stopped");
    }

    #[test]
    fn test_display_lines() {
        let lines = EditForm::default().display_lines();
        assert_eq!(lines[0], "Input File: input.mp4");
        assert_eq!(lines[1], "Output File: output.mp4");
        assert_eq!(lines[5], "Resolution: 1080p");
    }
}
