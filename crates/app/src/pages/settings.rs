//! Application settings page. Theme and language are persisted.

use super::form::{FieldKind, FieldSpec, FieldValue, FormGroup, FormState, FormTab};
use crate::theme::{Palette, ThemeMode};
use eframe::egui;
use egui::RichText;
use shared::config::{AppConfig, ConfigStore};
use tracing::info;

/// Config values for the language combo, in option order
pub const LANGUAGES: [&str; 3] = ["zh_CN", "en_US", "ja_JP"];
/// Config values for the theme combo, in option order
pub const THEMES: [ThemeMode; 3] = [ThemeMode::Light, ThemeMode::Dark, ThemeMode::Auto];

const BASIC: &[FormGroup] = &[
    FormGroup {
        title: "General",
        fields: &[
            FieldSpec::new(
                "app_name",
                "Application name",
                FieldKind::Line {
                    default: "Zhenxun Bot GUI",
                    placeholder: "",
                },
            ),
            FieldSpec::new(
                "language",
                "Language",
                FieldKind::Combo {
                    options: &["简体中文", "English", "日本語"],
                    default: 0,
                },
            ),
            FieldSpec::new(
                "timezone",
                "Time zone",
                FieldKind::Combo {
                    options: &["Asia/Shanghai", "UTC", "America/New_York", "Europe/London"],
                    default: 0,
                },
            ),
        ],
    },
    FormGroup {
        title: "Updates",
        fields: &[
            FieldSpec::new(
                "auto_update",
                "Check for updates automatically",
                FieldKind::Check { default: true },
            ),
            FieldSpec::new(
                "update_server",
                "Update server",
                FieldKind::Line {
                    default: "",
                    placeholder: "https://",
                },
            ),
        ],
    },
];

const INTERFACE: &[FormGroup] = &[
    FormGroup {
        title: "Appearance",
        fields: &[
            FieldSpec::new(
                "theme",
                "Theme",
                FieldKind::Combo {
                    options: &["Light", "Dark", "Follow system"],
                    default: 0,
                },
            ),
            FieldSpec::new(
                "primary_color",
                "Primary colour",
                FieldKind::Line {
                    default: "#007acc",
                    placeholder: "#rrggbb",
                },
            ),
            FieldSpec::new(
                "corner_radius",
                "Corner radius",
                FieldKind::Spin {
                    default: 8,
                    min: 0,
                    max: 20,
                },
            ),
        ],
    },
    FormGroup {
        title: "Fonts",
        fields: &[
            FieldSpec::new(
                "font_size",
                "Font size",
                FieldKind::Spin {
                    default: 14,
                    min: 8,
                    max: 32,
                },
            ),
            FieldSpec::new(
                "font_family",
                "Font family",
                FieldKind::Combo {
                    options: &["System default", "Microsoft YaHei", "Noto Sans CJK", "Monospace"],
                    default: 0,
                },
            ),
            FieldSpec::new(
                "font_smoothing",
                "Font smoothing",
                FieldKind::Check { default: true },
            ),
        ],
    },
];

const ADVANCED: &[FormGroup] = &[
    FormGroup {
        title: "Performance",
        fields: &[
            FieldSpec::new(
                "hardware_acceleration",
                "Hardware acceleration",
                FieldKind::Check { default: true },
            ),
            FieldSpec::new(
                "max_memory",
                "Memory limit (MB)",
                FieldKind::Spin {
                    default: 1024,
                    min: 256,
                    max: 8192,
                },
            ),
            FieldSpec::new(
                "cache_size",
                "Cache size (MB)",
                FieldKind::Spin {
                    default: 256,
                    min: 0,
                    max: 4096,
                },
            ),
        ],
    },
    FormGroup {
        title: "Debugging",
        fields: &[
            FieldSpec::new("debug_mode", "Debug mode", FieldKind::Check { default: false }),
            FieldSpec::new(
                "log_path",
                "Log path",
                FieldKind::Line {
                    default: "./logs/app.log",
                    placeholder: "",
                },
            ),
            FieldSpec::new(
                "notes",
                "Notes",
                FieldKind::Text {
                    placeholder: "",
                },
            ),
        ],
    },
];

pub const SETTINGS_TABS: &[FormTab] = &[
    FormTab {
        title: "Basic",
        groups: BASIC,
    },
    FormTab {
        title: "Interface",
        groups: INTERFACE,
    },
    FormTab {
        title: "Advanced",
        groups: ADVANCED,
    },
];

#[derive(Debug)]
pub struct SettingsPage {
    pub form: FormState,
}

impl SettingsPage {
    pub fn new(config: &AppConfig) -> Self {
        let mut form = FormState::new(SETTINGS_TABS);
        let theme = ThemeMode::from_config(&config.theme);
        if let Some(i) = THEMES.iter().position(|t| *t == theme) {
            form.set("theme", FieldValue::Choice(i));
        }
        if let Some(i) = LANGUAGES.iter().position(|l| *l == config.language) {
            form.set("language", FieldValue::Choice(i));
        }
        Self { form }
    }

    pub fn theme(&self) -> ThemeMode {
        self.form
            .choice("theme")
            .and_then(|i| THEMES.get(i).copied())
            .unwrap_or_default()
    }

    pub fn language(&self) -> &'static str {
        self.form
            .choice("language")
            .and_then(|i| LANGUAGES.get(i).copied())
            .unwrap_or(LANGUAGES[0])
    }

    pub fn show(&mut self, ui: &mut egui::Ui, config: &mut ConfigStore, palette: &Palette) {
        ui.label(RichText::new("Settings").size(22.0).strong().color(palette.text));
        ui.add_space(12.0);

        let changed = self.form.show(ui, palette);
        self.persist(&changed, config);
    }

    /// Write bound fields back to the config store.
    pub fn persist(&self, changed: &[&str], config: &mut ConfigStore) {
        for key in changed {
            match *key {
                "theme" => {
                    let theme = self.theme();
                    info!("Theme set to {}", theme.config_value());
                    config.set_theme(theme.config_value());
                }
                "language" => {
                    let language = self.language();
                    info!("Language set to {}", language);
                    config.set_language(language);
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_loads_bound_fields_from_config() {
        let config = AppConfig {
            theme: "dark".into(),
            language: "ja_JP".into(),
            ..AppConfig::default()
        };
        let page = SettingsPage::new(&config);
        assert_eq!(page.theme(), ThemeMode::Dark);
        assert_eq!(page.language(), "ja_JP");
    }

    #[test]
    fn test_unknown_language_falls_back() {
        let config = AppConfig {
            language: "xx".into(),
            ..AppConfig::default()
        };
        assert_eq!(SettingsPage::new(&config).language(), "zh_CN");
    }

    #[test]
    fn test_persist_theme_and_language() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let mut store = ConfigStore::open(&path);
        let mut page = SettingsPage::new(store.get());

        page.form.set("theme", FieldValue::Choice(2));
        page.form.set("language", FieldValue::Choice(1));
        page.form.set("font_size", FieldValue::Int(18));
        page.persist(&["theme", "language", "font_size"], &mut store);

        let reloaded = ConfigStore::open(&path);
        assert_eq!(reloaded.get().theme, "auto");
        assert_eq!(reloaded.get().language, "en_US");
    }
}
