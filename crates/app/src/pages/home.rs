//! Bot configuration page.

use super::form::{FieldKind, FieldSpec, FormGroup, FormState, FormTab};
use crate::modals::{ButtonSpec, ButtonStyle, DialogEvent, DialogHost, DialogId, DialogSpec};
use crate::theme::Palette;
use eframe::egui;
use egui::{Align, Layout, RichText};
use tracing::info;

const BASIC: &[FormGroup] = &[
    FormGroup {
        title: "Bot identity",
        fields: &[
            FieldSpec::new(
                "bot_name",
                "Bot name",
                FieldKind::Line {
                    default: "QIAO Bot",
                    placeholder: "Display name",
                },
            )
            .required(),
            FieldSpec::new(
                "bot_qq",
                "Bot QQ",
                FieldKind::Line {
                    default: "114514",
                    placeholder: "Account number",
                },
            )
            .required(),
        ],
    },
    FormGroup {
        title: "Services",
        fields: &[FieldSpec::new(
            "music_sign_url",
            "Music sign URL",
            FieldKind::Line {
                default: "",
                placeholder: "https://",
            },
        )],
    },
];

const CONNECTION: &[FormGroup] = &[
    FormGroup {
        title: "WebSocket",
        fields: &[
            FieldSpec::new(
                "ws_host",
                "Host",
                FieldKind::Line {
                    default: "localhost",
                    placeholder: "",
                },
            ),
            FieldSpec::new(
                "ws_port",
                "Port",
                FieldKind::Spin {
                    default: 3001,
                    min: 1,
                    max: 65535,
                },
            ),
        ],
    },
    FormGroup {
        title: "HTTP",
        fields: &[
            FieldSpec::new("enable_http", "Enable HTTP", FieldKind::Check { default: true }),
            FieldSpec::new(
                "http_host",
                "Host",
                FieldKind::Line {
                    default: "localhost",
                    placeholder: "",
                },
            ),
            FieldSpec::new(
                "http_port",
                "Port",
                FieldKind::Spin {
                    default: 3000,
                    min: 1,
                    max: 65535,
                },
            ),
        ],
    },
];

const ADVANCED: &[FormGroup] = &[
    FormGroup {
        title: "Logging",
        fields: &[
            FieldSpec::new(
                "log_level",
                "Log level",
                FieldKind::Combo {
                    options: &["DEBUG", "INFO", "WARNING", "ERROR"],
                    default: 1,
                },
            ),
            FieldSpec::new("file_log", "Write log file", FieldKind::Check { default: true }),
        ],
    },
    FormGroup {
        title: "Database",
        fields: &[
            FieldSpec::new(
                "db_type",
                "Type",
                FieldKind::Combo {
                    options: &["SQLite", "PostgreSQL", "MySQL"],
                    default: 1,
                },
            ),
            FieldSpec::new(
                "db_host",
                "Host",
                FieldKind::Line {
                    default: "localhost",
                    placeholder: "",
                },
            ),
            FieldSpec::new(
                "db_port",
                "Port",
                FieldKind::Spin {
                    default: 5432,
                    min: 1,
                    max: 65535,
                },
            ),
        ],
    },
    FormGroup {
        title: "Other",
        fields: &[FieldSpec::new(
            "notes",
            "Notes",
            FieldKind::Text {
                placeholder: "Anything worth remembering about this bot",
            },
        )],
    },
];

pub const HOME_TABS: &[FormTab] = &[
    FormTab {
        title: "Basic",
        groups: BASIC,
    },
    FormTab {
        title: "Connection",
        groups: CONNECTION,
    },
    FormTab {
        title: "Advanced",
        groups: ADVANCED,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeAction {
    Delete,
    TestDialog,
    Add,
}

#[derive(Debug)]
pub struct HomePage {
    pub form: FormState,
    delete_prompt: Option<DialogId>,
}

impl Default for HomePage {
    fn default() -> Self {
        Self::new()
    }
}

impl HomePage {
    pub fn new() -> Self {
        Self {
            form: FormState::new(HOME_TABS),
            delete_prompt: None,
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, dialogs: &mut DialogHost, palette: &Palette) {
        let mut action = None;

        ui.horizontal(|ui| {
            ui.label(
                RichText::new("Bot Configuration")
                    .size(22.0)
                    .strong()
                    .color(palette.text),
            );
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                let add = egui::Button::new(RichText::new("+ Add").color(egui::Color32::WHITE))
                    .fill(palette.accent);
                if ui.add(add).clicked() {
                    action = Some(HomeAction::Add);
                }
                if ui.button("Test dialog").clicked() {
                    action = Some(HomeAction::TestDialog);
                }
                if ui.button("🗑").on_hover_text("Delete").clicked() {
                    action = Some(HomeAction::Delete);
                }
            });
        });
        ui.add_space(12.0);

        self.form.show(ui, palette);

        if let Some(action) = action {
            self.perform(action, dialogs);
        }
    }

    pub fn perform(&mut self, action: HomeAction, dialogs: &mut DialogHost) {
        match action {
            HomeAction::Delete => {
                self.delete_prompt = Some(dialogs.show(DialogSpec::confirm(
                    "Delete configuration",
                    "Reset every field on this page to its default value?",
                )));
            }
            HomeAction::TestDialog => {
                dialogs.show(demo_dialog());
            }
            HomeAction::Add => {
                let missing = self.form.missing_required();
                if missing.is_empty() {
                    let name = self.form.text("bot_name").unwrap_or_default();
                    info!("Bot configuration added: {}", name);
                    dialogs.show(DialogSpec::success(
                        "Bot added",
                        format!("\"{}\" has been added.", name),
                    ));
                } else {
                    dialogs.show(DialogSpec::error(
                        "Missing fields",
                        format!("Please fill in: {}", missing.join(", ")),
                    ));
                }
            }
        }
    }

    /// Returns true if the event belonged to this page.
    pub fn handle_dialog_event(&mut self, id: DialogId, event: &DialogEvent) -> bool {
        if self.delete_prompt != Some(id) {
            return false;
        }
        self.delete_prompt = None;
        if matches!(event, DialogEvent::ButtonClicked(label) if label == "Confirm") {
            info!("Bot configuration reset");
            self.form.reset();
        }
        true
    }
}

/// Shows every button style in one dialog
pub fn demo_dialog() -> DialogSpec {
    DialogSpec::multi_button(
        "Multi-button dialog",
        "This dialog has several buttons. Pick one to see how each style looks.",
        vec![
            ButtonSpec {
                label: "Cancel".into(),
                style: ButtonStyle::Default,
                callback: None,
            },
            ButtonSpec {
                label: "Learn more".into(),
                style: ButtonStyle::Info,
                callback: Some(Box::new(|| info!("Demo dialog: learn more"))),
            },
            ButtonSpec {
                label: "Try it now".into(),
                style: ButtonStyle::Primary,
                callback: Some(Box::new(|| info!("Demo dialog: try it now"))),
            },
        ],
    )
}
