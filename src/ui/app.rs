//! Editor window: the form, a looping preview of the input and a worker
//! thread running the job

use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use eframe::egui;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::domain::model::{FilterPreset, Resolution};
use crate::engine::{self, CancelToken, ChannelProgress, EngineMode, ProgressEvent};
use crate::error::{CutframeError, CutframeResult};
use crate::preview::{FrameClock, FrameDecoder};
use crate::ui::form::{EditForm, FormField, FormStatus};

const PREVIEW_CONTROLS_HEIGHT: f32 = 28.0;

pub const WINDOW_TITLE: &str = "Video Editor";
pub const WINDOW_SIZE: [f32; 2] = [600.0, 400.0];

/// Open the editor window and block until it is closed
pub fn run_editor(config: AppConfig, form: EditForm) -> CutframeResult<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(WINDOW_SIZE),
        ..Default::default()
    };
    let app = EditorApp::new(config, form);

    info!("Opening editor window");
    eframe::run_native(WINDOW_TITLE, options, Box::new(|_cc| Ok(Box::new(app))))
        .map_err(|e| CutframeError::WindowError {
            message: e.to_string(),
        })
}

struct RunningJob {
    events: Receiver<ProgressEvent>,
    cancel: CancelToken,
    handle: Option<JoinHandle<()>>,
}

struct Preview {
    path: String,
    decoder: FrameDecoder,
    clock: FrameClock,
    texture: Option<egui::TextureHandle>,
    position: f64,
}

pub struct EditorApp {
    config: AppConfig,
    form: EditForm,
    mode: EngineMode,
    job: Option<RunningJob>,
    preview: Option<Preview>,
    preview_error: Option<String>,
    focus_pending: bool,
}

impl EditorApp {
    pub fn new(config: AppConfig, form: EditForm) -> Self {
        let mut app = Self {
            config,
            form,
            mode: EngineMode::Auto,
            job: None,
            preview: None,
            preview_error: None,
            focus_pending: true,
        };
        app.load_preview();
        app
    }

    fn load_preview(&mut self) {
        let path = self.form.input.trim().to_string();
        let bounds = (self.config.preview.max_width, self.config.preview.max_height);
        match FrameDecoder::open(&path, bounds.0, bounds.1) {
            Ok(decoder) => {
                let clock = FrameClock::new(decoder.frame_rate());
                self.preview = Some(Preview {
                    path,
                    decoder,
                    clock,
                    texture: None,
                    position: 0.0,
                });
                self.preview_error = None;
            }
            Err(e) => {
                debug!("Preview unavailable for {}: {}", path, e);
                self.preview = None;
                self.preview_error = Some(e.to_string());
            }
        }
    }

    fn submit(&mut self) {
        let request = match self.form.begin(&self.config) {
            Ok(request) => request,
            Err(e) => {
                warn!("Not starting job: {}", e);
                return;
            }
        };

        let cancel = CancelToken::new();
        let (sink, events) = ChannelProgress::channel(cancel.clone());
        let mode = self.mode;
        info!("Starting job: {} -> {}", request.input, request.output);
        let handle = std::thread::spawn(move || {
            // outcome is reported through the channel
            let _ = engine::process(&request, mode, &sink);
        });

        self.job = Some(RunningJob {
            events,
            cancel,
            handle: Some(handle),
        });
    }

    fn poll_job(&mut self) {
        let Some(job) = self.job.as_mut() else {
            return;
        };
        loop {
            match job.events.try_recv() {
                Ok(event) => self.form.apply(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.form.abandon("processing stopped unexpectedly");
                    break;
                }
            }
        }
        if self.form.is_processing() {
            return;
        }
        if let Some(handle) = job.handle.take() {
            if handle.join().is_err() {
                error!("Worker thread panicked");
            }
        }
        self.job = None;
    }

    /// Advance the preview when its clock says a frame is due; loops at end
    fn poll_preview(&mut self, ctx: &egui::Context) -> Option<Duration> {
        let preview = self.preview.as_mut()?;
        let now = Instant::now();
        if preview.clock.due(now) {
            let mut next = preview.decoder.next_frame();
            if matches!(next, Ok(None)) {
                next = preview.decoder.seek(0.0).and_then(|_| preview.decoder.next_frame());
            }
            match next {
                Ok(Some(frame)) => {
                    let image = egui::ColorImage::from_rgba_unmultiplied(
                        [frame.width as usize, frame.height as usize],
                        &frame.rgba,
                    );
                    preview.position = frame.seconds;
                    match preview.texture.as_mut() {
                        Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                        None => {
                            preview.texture =
                                Some(ctx.load_texture("preview", image, egui::TextureOptions::LINEAR))
                        }
                    }
                }
                Ok(None) => preview.clock.pause(),
                Err(e) => {
                    warn!("Preview stopped: {}", e);
                    self.preview_error = Some(e.to_string());
                    self.preview = None;
                    return None;
                }
            }
        }
        if preview.clock.is_paused() {
            None
        } else {
            Some(preview.clock.until_due(now))
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) -> bool {
        let (enter, next, prev) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Enter),
                i.key_pressed(egui::Key::PageDown),
                i.key_pressed(egui::Key::PageUp),
            )
        });
        if next {
            self.form.focus_next();
            self.focus_pending = true;
        }
        if prev {
            self.form.focus_prev();
            self.focus_pending = true;
        }
        enter
    }

    fn track_focus(&mut self, field: FormField, response: &egui::Response) {
        if self.focus_pending && self.form.focus() == field {
            response.request_focus();
            self.focus_pending = false;
        } else if response.gained_focus() {
            self.form.set_focus(field);
        }
    }

    fn form_ui(&mut self, ui: &mut egui::Ui) -> bool {
        let editable = !self.form.is_processing();
        let mut process = false;

        ui.add_enabled_ui(editable, |ui| {
            egui::Grid::new("edit_form")
                .num_columns(2)
                .spacing([8.0, 6.0])
                .show(ui, |ui| {
                    ui.label(FormField::Input.label());
                    let input = ui.text_edit_singleline(&mut self.form.input);
                    self.track_focus(FormField::Input, &input);
                    ui.end_row();

                    ui.label(FormField::Output.label());
                    let output = ui.text_edit_singleline(&mut self.form.output);
                    self.track_focus(FormField::Output, &output);
                    ui.end_row();

                    ui.label(FormField::Text.label());
                    let text = ui.text_edit_singleline(&mut self.form.text);
                    self.track_focus(FormField::Text, &text);
                    ui.end_row();

                    ui.label(FormField::Trim.label());
                    let trim = ui.text_edit_singleline(&mut self.form.trim);
                    self.track_focus(FormField::Trim, &trim);
                    ui.end_row();

                    ui.label(FormField::Filter.label());
                    let filter = egui::ComboBox::from_id_salt("filter")
                        .selected_text(self.form.filter.label())
                        .show_ui(ui, |ui| {
                            for preset in FilterPreset::ALL {
                                ui.selectable_value(&mut self.form.filter, preset, preset.label());
                            }
                        })
                        .response;
                    self.track_focus(FormField::Filter, &filter);
                    ui.end_row();

                    ui.label(FormField::Resolution.label());
                    let resolution = egui::ComboBox::from_id_salt("resolution")
                        .selected_text(self.form.resolution.label())
                        .show_ui(ui, |ui| {
                            for resolution in Resolution::ALL {
                                ui.selectable_value(
                                    &mut self.form.resolution,
                                    resolution,
                                    resolution.label(),
                                );
                            }
                        })
                        .response;
                    self.track_focus(FormField::Resolution, &resolution);
                    ui.end_row();

                    ui.label("Engine");
                    egui::ComboBox::from_id_salt("engine")
                        .selected_text(self.mode.to_string())
                        .show_ui(ui, |ui| {
                            for mode in [EngineMode::Auto, EngineMode::Copy, EngineMode::Reencode] {
                                ui.selectable_value(&mut self.mode, mode, mode.to_string());
                            }
                        });
                    ui.end_row();
                });

            ui.add_space(6.0);
            ui.horizontal(|ui| {
                process = ui.button("Process").clicked();
                if ui.button("Reload preview").clicked() {
                    self.load_preview();
                }
            });
        });

        if !editable {
            if let Some(job) = &self.job {
                if ui.button("Cancel").clicked() {
                    info!("Cancelling job");
                    job.cancel.cancel();
                }
            }
        }
        process
    }

    fn preview_ui(&mut self, ui: &mut egui::Ui) {
        match &mut self.preview {
            Some(preview) => {
                // panel minus the controls row, in 16px steps, capped by config
                let available = ui.available_size() - egui::vec2(0.0, PREVIEW_CONTROLS_HEIGHT);
                let snap = |v: f32, max: u32| ((v.max(0.0) as u32) & !15).clamp(16, max.max(16));
                let bounds = (
                    snap(available.x, self.config.preview.max_width),
                    snap(available.y, self.config.preview.max_height),
                );
                if let Err(e) = preview.decoder.resize(bounds.0, bounds.1) {
                    warn!("Preview resize to {}x{} failed: {}", bounds.0, bounds.1, e);
                }
                if let Some(texture) = &preview.texture {
                    ui.add(egui::Image::new(egui::load::SizedTexture::from_handle(texture)));
                }
                ui.horizontal(|ui| {
                    let label = if preview.clock.is_paused() { "Play" } else { "Pause" };
                    if ui.button(label).clicked() {
                        preview.clock.toggle();
                    }
                    ui.label(format!(
                        "{:.2}s / {:.2}s  {}",
                        preview.position,
                        preview.decoder.duration(),
                        preview.path
                    ));
                });
            }
            None => {
                let message = self.preview_error.as_deref().unwrap_or("No preview loaded");
                ui.weak(format!("Preview: {}", message));
            }
        }
    }
}

impl eframe::App for EditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_job();
        let repaint_in = self.poll_preview(ctx);
        let enter = self.handle_keys(ctx);

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            let line = self.form.status_line();
            match self.form.status() {
                FormStatus::Failed(_) => ui.colored_label(egui::Color32::LIGHT_RED, line),
                _ => ui.label(line),
            };
        });

        let mut clicked = false;
        egui::SidePanel::left("form").show(ctx, |ui| {
            clicked = self.form_ui(ui);
        });
        egui::CentralPanel::default().show(ctx, |ui| self.preview_ui(ui));

        if (enter || clicked) && !self.form.is_processing() {
            self.submit();
        }

        if self.job.is_some() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
        if let Some(delay) = repaint_in {
            ctx.request_repaint_after(delay);
        }
    }
}

impl Drop for EditorApp {
    fn drop(&mut self) {
        if let Some(job) = self.job.as_mut() {
            job.cancel.cancel();
            if let Some(handle) = job.handle.take() {
                let _ = handle.join();
            }
        }
    }
}
