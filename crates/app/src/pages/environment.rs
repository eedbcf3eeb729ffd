//! Python / FFmpeg detection page.
//!
//! The page never runs work itself. Button presses become
//! [`EnvironmentRequest`]s that the app state turns into worker threads, and
//! worker messages come back through `handle_probe_event` /
//! `handle_install_event`.

use crate::modals::{ButtonSpec, ButtonStyle, DialogEvent, DialogHost, DialogId, DialogSpec};
use crate::theme::Palette;
use eframe::egui;
use egui::{Color32, RichText};
use services::installer::PYTHON_DOWNLOAD_PAGE;
use services::probe::normalize_path;
use shared::environment::{DetectionResult, ProbeEvent, ProbeSelection, Tool};
use shared::install::{InstallEvent, InstallOutcome};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};

const AUTO_DOWNLOAD: &str = "Auto download";
const MANUAL_DOWNLOAD: &str = "Manual download";
const START_DOWNLOAD: &str = "Start download";

/// Work the page wants started or stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentRequest {
    Probe(ProbeSelection),
    Validate(Tool, PathBuf),
    Install(Tool),
    CancelInstall,
}

#[derive(Debug, Clone, Default)]
struct ToolRow {
    path: String,
    status: String,
    found: Option<bool>,
}

impl ToolRow {
    fn apply(&mut self, result: &DetectionResult) {
        if result.found {
            self.path = result.path.clone();
        }
        self.status = result.status_line();
        self.found = Some(result.found);
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveInstall {
    tool: Tool,
    dialog: DialogId,
    cancelled: bool,
}

#[derive(Debug, Default)]
pub struct EnvironmentPage {
    rows: HashMap<Tool, ToolRow>,
    probing: bool,
    offers: HashMap<DialogId, Tool>,
    install: Option<ActiveInstall>,
}

impl EnvironmentPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_probing(&self) -> bool {
        self.probing
    }

    pub fn is_installing(&self) -> bool {
        self.install.is_some()
    }

    pub fn path(&self, tool: Tool) -> &str {
        self.rows.get(&tool).map(|r| r.path.as_str()).unwrap_or_default()
    }

    pub fn status(&self, tool: Tool) -> &str {
        self.rows.get(&tool).map(|r| r.status.as_str()).unwrap_or_default()
    }

    /// Mark a probe as running. Returns false while another one is.
    pub fn begin_probe(&mut self, selection: ProbeSelection) -> bool {
        if self.probing {
            return false;
        }
        self.probing = true;
        for tool in selection.tools() {
            self.rows.entry(tool).or_default().status = "Detecting...".to_string();
        }
        true
    }

    pub fn handle_probe_event(&mut self, event: ProbeEvent, dialogs: &mut DialogHost) {
        match event {
            ProbeEvent::Detected(result) => {
                self.rows.entry(result.tool).or_default().apply(&result);
                if !result.found {
                    self.offer_download(result.tool, dialogs);
                }
            }
            ProbeEvent::Validated { tool, result } => {
                let result = result.unwrap_or_else(|failure| {
                    DetectionResult::not_found(tool, failure.to_string())
                });
                self.rows.entry(tool).or_default().apply(&result);
            }
            ProbeEvent::Finished => self.probing = false,
        }
    }

    fn offer_download(&mut self, tool: Tool, dialogs: &mut DialogHost) {
        if self.install.is_some_and(|i| i.tool == tool) {
            return;
        }
        if self.offers.values().any(|t| *t == tool) {
            return;
        }
        let id = dialogs.show(download_offer(tool));
        self.offers.insert(id, tool);
    }

    /// Route a dialog event. Returns the work it asks for, if any.
    pub fn handle_dialog_event(
        &mut self,
        id: DialogId,
        event: &DialogEvent,
    ) -> Option<EnvironmentRequest> {
        if let Some(tool) = self.offers.remove(&id) {
            return match event {
                DialogEvent::ButtonClicked(label)
                    if label == AUTO_DOWNLOAD || label == START_DOWNLOAD =>
                {
                    Some(EnvironmentRequest::Install(tool))
                }
                _ => None,
            };
        }

        let install = self.install.as_mut()?;
        if install.dialog != id || install.cancelled {
            return None;
        }
        // The progress dialog's only button is Cancel
        install.cancelled = true;
        info!("Install of {} cancelled by user", install.tool);
        Some(EnvironmentRequest::CancelInstall)
    }

    /// Open the progress dialog for a new job. Returns false if one is running.
    pub fn begin_install(&mut self, tool: Tool, dialogs: &mut DialogHost) -> bool {
        if let Some(active) = &self.install {
            warn!(
                "Ignoring install of {}: {} is still installing",
                tool, active.tool
            );
            return false;
        }
        let dialog = dialogs.show(DialogSpec::progress(
            format!("Installing {}", tool.display_name()),
            "Preparing...",
        ));
        self.install = Some(ActiveInstall {
            tool,
            dialog,
            cancelled: false,
        });
        true
    }

    pub fn handle_install_event(
        &mut self,
        event: InstallEvent,
        dialogs: &mut DialogHost,
        now: f64,
    ) -> Option<EnvironmentRequest> {
        let active = self.install?;
        match event {
            InstallEvent::Status(text) => {
                if let Some(dialog) = dialogs.get_mut(active.dialog) {
                    dialog.set_status_text(text);
                }
                None
            }
            InstallEvent::Progress(pct) => {
                if let Some(dialog) = dialogs.get_mut(active.dialog) {
                    dialog.set_progress(i32::from(pct));
                }
                None
            }
            InstallEvent::Finished(outcome) => {
                self.install = None;
                dialogs.dismiss(active.dialog, now);
                if active.cancelled {
                    return None;
                }
                match &outcome {
                    InstallOutcome::Success(message) => {
                        dialogs.show(DialogSpec::success("Download complete", message.clone()));
                    }
                    InstallOutcome::Failure(message) => {
                        dialogs.show(DialogSpec::error("Download failed", message.clone()));
                    }
                }
                if outcome.is_success() && active.tool == Tool::MediaTool {
                    Some(EnvironmentRequest::Probe(ProbeSelection::only(Tool::MediaTool)))
                } else {
                    None
                }
            }
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, palette: &Palette) -> Vec<EnvironmentRequest> {
        let mut requests = Vec::new();

        ui.label(
            RichText::new("Environment")
                .size(22.0)
                .strong()
                .color(palette.text),
        );
        ui.label(
            RichText::new("Zhenxun Bot needs Python to run and FFmpeg to process audio and video.")
                .color(palette.text_muted),
        );
        ui.add_space(12.0);

        for &tool in Tool::all() {
            self.show_tool_group(ui, tool, palette, &mut requests);
            ui.add_space(10.0);
        }

        requests
    }

    fn show_tool_group(
        &mut self,
        ui: &mut egui::Ui,
        tool: Tool,
        palette: &Palette,
        requests: &mut Vec<EnvironmentRequest>,
    ) {
        let probing = self.probing;
        let row = self.rows.entry(tool).or_default();

        egui::Frame::none()
            .fill(palette.card_bg)
            .stroke(egui::Stroke::new(1.0, palette.border))
            .rounding(egui::Rounding::same(8.0))
            .inner_margin(egui::Margin::same(16.0))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(
                    RichText::new(format!("{} environment", tool.display_name()))
                        .strong()
                        .size(15.0),
                );
                ui.add_space(6.0);

                ui.horizontal(|ui| {
                    let mut shown = row.path.clone();
                    ui.add(
                        egui::TextEdit::singleline(&mut shown)
                            .interactive(false)
                            .hint_text(format!("{} executable path", tool.display_name()))
                            .desired_width(360.0),
                    );
                    if ui
                        .add_enabled(!probing, egui::Button::new("Auto-detect"))
                        .clicked()
                    {
                        requests.push(EnvironmentRequest::Probe(ProbeSelection::only(tool)));
                    }
                    if ui.add_enabled(!probing, egui::Button::new("Browse")).clicked() {
                        if let Some(picked) = rfd::FileDialog::new()
                            .set_title(format!("Select the {} executable", tool.display_name()))
                            .pick_file()
                        {
                            row.path = normalize_path(&picked);
                            requests.push(EnvironmentRequest::Validate(tool, picked));
                        }
                    }
                });

                let color = match row.found {
                    Some(true) => Color32::from_rgb(40, 167, 69),
                    Some(false) => Color32::from_rgb(220, 53, 69),
                    None => palette.text_muted,
                };
                let status = if row.status.is_empty() {
                    "Not checked yet"
                } else {
                    row.status.as_str()
                };
                ui.label(RichText::new(status).size(12.0).color(color));
            });
    }
}

fn download_offer(tool: Tool) -> DialogSpec {
    match tool {
        Tool::Interpreter => DialogSpec::multi_button(
            "Python not installed",
            "Python was not found. Download and install it now?",
            vec![
                ButtonSpec {
                    label: AUTO_DOWNLOAD.into(),
                    style: ButtonStyle::Primary,
                    callback: None,
                },
                ButtonSpec {
                    label: MANUAL_DOWNLOAD.into(),
                    style: ButtonStyle::Info,
                    callback: Some(Box::new(|| {
                        if let Err(e) = open::that(PYTHON_DOWNLOAD_PAGE) {
                            warn!("Failed to open {}: {}", PYTHON_DOWNLOAD_PAGE, e);
                        }
                    })),
                },
                ButtonSpec {
                    label: "Cancel".into(),
                    style: ButtonStyle::Default,
                    callback: None,
                },
            ],
        ),
        Tool::MediaTool => DialogSpec::multi_button(
            "FFmpeg not found",
            "FFmpeg is not installed on this system.\n\n\
             Zhenxun Bot uses it to process audio and video files.\n\n\
             Download and install FFmpeg automatically?",
            vec![
                ButtonSpec {
                    label: START_DOWNLOAD.into(),
                    style: ButtonStyle::Primary,
                    callback: None,
                },
                ButtonSpec {
                    label: "Cancel".into(),
                    style: ButtonStyle::Default,
                    callback: None,
                },
            ],
        ),
    }
}
