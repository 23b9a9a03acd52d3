use std::path::PathBuf;

use client_core::{
    controller::{ConvertLabel, StatusMessage},
    filename::{fallback_file_name, sanitize_for_disk},
    update, Command, WorkflowModel, WorkflowState,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::{
    RequestTag, SelectedFile, TargetFormat, UnitPreference, KNOWN_TARGET_FORMATS,
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::controller::orchestration::{apply_effects, dispatch_backend_command};
use crate::ui::canvas::PreviewPane;
use crate::ui::i18n::{tr, Language};

const SUCCESS_GREEN: egui::Color32 = egui::Color32::from_rgb(46, 160, 67);
const ERROR_RED: egui::Color32 = egui::Color32::from_rgb(218, 54, 51);
const CAVEAT_AMBER: egui::Color32 = egui::Color32::from_rgb(191, 135, 0);

pub struct EmbconvApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    model: WorkflowModel,
    pane: PreviewPane,
    language: Language,
    backend_status: String,
    notice: Option<String>,
    saved_to: Option<PathBuf>,
    latest_load: RequestTag,
}

impl EmbconvApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        model: WorkflowModel,
        surface_size: egui::Vec2,
        language: Language,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            model,
            pane: PreviewPane::new(surface_size),
            language,
            backend_status: String::new(),
            notice: None,
            saved_to: None,
            latest_load: RequestTag::default(),
        }
    }

    fn t(&self, key: &'static str) -> &'static str {
        tr(self.language, key)
    }

    /// Runs one controller transition and carries out its effects.
    fn send(&mut self, command: Command) {
        tracing::debug!(command = command.name(), "ui dispatch");
        let (model, effects) = update(std::mem::take(&mut self.model), command);
        self.model = model;
        apply_effects(effects, &mut self.pane, &self.cmd_tx, &mut self.notice);
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.backend_status = message;
                }
                UiEvent::DesignLoaded { tag, file } => {
                    if tag != self.latest_load {
                        tracing::debug!(
                            load_tag = tag.0,
                            latest_tag = self.latest_load.0,
                            "dropping superseded design load"
                        );
                        continue;
                    }
                    self.notice = None;
                    self.saved_to = None;
                    self.send(Command::SelectFile(file));
                }
                UiEvent::Workflow(command) => self.send(command),
                UiEvent::ArtifactSaved(path) => {
                    self.saved_to = Some(path);
                }
                UiEvent::Error(err) => {
                    tracing::warn!(
                        category = ?err.category(),
                        context = ?err.context(),
                        "{}",
                        err.message()
                    );
                    self.notice = Some(err.display_text());
                }
            }
        }
    }

    fn accept_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(first) = dropped.into_iter().next() else {
            return;
        };
        if let Some(path) = first.path {
            self.load_design(path);
        } else if let Some(bytes) = first.bytes {
            self.latest_load = self.latest_load.next();
            self.notice = None;
            self.saved_to = None;
            self.send(Command::SelectFile(SelectedFile::new(first.name, bytes)));
        }
    }

    /// Starts reading `path`; any earlier load still in flight is superseded.
    fn load_design(&mut self, path: PathBuf) {
        self.latest_load = self.latest_load.next();
        dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::LoadDesign {
                tag: self.latest_load,
                path,
            },
            &mut self.notice,
        );
    }

    fn pick_design(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Embroidery designs", KNOWN_TARGET_FORMATS)
            .add_filter("All files", &["*"])
            .pick_file()
        {
            self.load_design(path);
        }
    }

    fn save_artifact(&mut self) {
        let Some(artifact) = self.model.artifact().cloned() else {
            return;
        };
        let Some(name) = suggested_save_name(&self.model) else {
            return;
        };

        let mut dialog = rfd::FileDialog::new().set_file_name(&name);
        if let Some(dir) = dirs::download_dir() {
            dialog = dialog.set_directory(dir);
        }
        if let Some(path) = dialog.save_file() {
            dispatch_backend_command(
                &self.cmd_tx,
                BackendCommand::SaveArtifact { artifact, path },
                &mut self.notice,
            );
        }
    }

    fn show_drop_zone(&mut self, ui: &mut egui::Ui, hovering: bool) {
        let text = format!(
            "{}\n{}",
            self.t("dropzone-title"),
            self.t("dropzone-subtitle")
        );
        let mut button = egui::Button::new(egui::RichText::new(text).size(16.0))
            .min_size(egui::vec2(ui.available_width(), 96.0));
        if hovering {
            button = button.fill(ui.visuals().selection.bg_fill);
        }
        if ui.add(button).clicked() {
            self.pick_design();
        }
    }

    fn show_file_row(&mut self, ui: &mut egui::Ui) {
        let Some(file) = self.model.file() else {
            return;
        };
        let label = format!("{} ({})", file.name(), human_size(file.len()));
        let mut remove = false;
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(label).strong());
            remove = ui.small_button("✕").on_hover_text("Remove").clicked();
        });
        if remove {
            self.remove_file();
        }
    }

    fn remove_file(&mut self) {
        self.latest_load = self.latest_load.next();
        self.saved_to = None;
        self.send(Command::RemoveFile);
    }

    fn show_convert_controls(&mut self, ui: &mut egui::Ui) {
        let current = self.model.target_format().as_str().to_string();
        let mut selected = current.clone();
        ui.horizontal(|ui| {
            ui.label(self.t("convert-label"));
            egui::ComboBox::from_id_salt("target-format")
                .selected_text(selected.to_uppercase())
                .show_ui(ui, |ui| {
                    for format in KNOWN_TARGET_FORMATS {
                        ui.selectable_value(&mut selected, format.to_string(), format.to_uppercase());
                    }
                });
        });
        if selected != current {
            self.send(Command::FormatChanged(TargetFormat::new(selected)));
        }

        if self.model.show_format_caveat() {
            ui.colored_label(CAVEAT_AMBER, self.t("color-warning"));
        }

        let label = self.t(convert_button_key(self.model.convert_label()));
        let mut convert = false;
        ui.horizontal(|ui| {
            convert = ui
                .add_enabled(self.model.can_convert(), egui::Button::new(label))
                .clicked();
            if self.model.state() == WorkflowState::ConvertPending {
                ui.spinner();
            }
        });
        if convert {
            self.saved_to = None;
            let format = self.model.target_format().clone();
            self.send(Command::RequestConvert(format));
        }

        match self.model.status() {
            Some(StatusMessage::Success) => {
                ui.colored_label(SUCCESS_GREEN, self.t("status-success"));
            }
            Some(StatusMessage::Error(message)) => {
                ui.colored_label(ERROR_RED, message.as_str());
            }
            None => {}
        }

        if self.model.can_download() && ui.button(self.t("download-btn")).clicked() {
            self.save_artifact();
        }
        if let Some(path) = &self.saved_to {
            ui.label(format!("{} {}", self.t("saved-to"), path.display()));
        }
    }

    fn show_preview(&mut self, ui: &mut egui::Ui) {
        if !self.model.preview_visible() || !self.pane.is_visible() {
            return;
        }
        ui.separator();
        ui.label(egui::RichText::new(self.t("preview-label")).strong());

        if self.model.state() == WorkflowState::PreviewPending {
            ui.spinner();
            return;
        }

        let Some(preview) = self.model.preview().cloned() else {
            return;
        };
        match preview.image.as_ref().filter(|_| !preview.is_vector()) {
            Some(image) => self.pane.paint_raster(ui, self.model.generation(), image),
            None => self.pane.paint_pattern(ui),
        }

        if let Some(stats) = self.pane.stats().cloned() {
            egui::Grid::new("design-stats")
                .num_columns(2)
                .spacing([24.0, 4.0])
                .show(ui, |ui| {
                    ui.label(self.t("stat-stitches"));
                    ui.label(stats.stitches.as_str());
                    ui.end_row();
                    ui.label(self.t("stat-colors"));
                    ui.label(stats.colors.as_str());
                    ui.end_row();
                    if let Some(changes) = &stats.changes {
                        ui.label(self.t("stat-changes"));
                        ui.label(changes.as_str());
                        ui.end_row();
                    }
                    ui.label(self.t("stat-width"));
                    ui.label(stats.width.as_str());
                    ui.end_row();
                    ui.label(self.t("stat-height"));
                    ui.label(stats.height.as_str());
                    ui.end_row();
                });
        }

        let mut imperial = self.model.unit() == UnitPreference::Imperial;
        if ui.checkbox(&mut imperial, self.t("unit-imperial")).changed() {
            self.send(Command::ToggleUnit);
        }
    }
}

impl eframe::App for EmbconvApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.accept_dropped_files(ctx);
        let hovering = ctx.input(|i| !i.raw.hovered_files.is_empty());

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.small(self.backend_status.as_str());
                if let Some(notice) = &self.notice {
                    ui.separator();
                    ui.colored_label(ERROR_RED, notice.as_str());
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Embroidery Converter");
                ui.label(self.t("header-subtitle"));
                ui.add_space(12.0);

                if self.model.file().is_none() {
                    self.show_drop_zone(ui, hovering);
                } else {
                    self.show_file_row(ui);
                    ui.add_space(8.0);
                    self.show_convert_controls(ui);
                    self.show_preview(ui);
                }
            });
        });

        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}

fn convert_button_key(label: ConvertLabel) -> &'static str {
    match label {
        ConvertLabel::Convert => "convert-btn",
        ConvertLabel::Converting => "converting-btn",
        ConvertLabel::Retry => "retry-btn",
    }
}

/// File name offered in the save dialog: the service's name when it is safe
/// to write, else `<base>.<format>`.
fn suggested_save_name(model: &WorkflowModel) -> Option<String> {
    let artifact = model.artifact()?;
    if let Some(name) = sanitize_for_disk(&artifact.file_name) {
        return Some(name.to_string());
    }
    model
        .file()
        .map(|file| fallback_file_name(file, model.target_format()))
}

fn human_size(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f < KIB {
        format!("{bytes} B")
    } else if bytes_f < KIB * KIB {
        format!("{:.1} KB", bytes_f / KIB)
    } else {
        format!("{:.1} MB", bytes_f / (KIB * KIB))
    }
}
