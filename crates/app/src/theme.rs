//! Colors, visuals and fonts.

use crate::modals::ButtonStyle;
use eframe::egui;
use egui::Color32;
use std::fs;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
    /// Follow the OS
    Auto,
}

impl ThemeMode {
    pub fn from_config(value: &str) -> Self {
        match value {
            "dark" => ThemeMode::Dark,
            "auto" => ThemeMode::Auto,
            _ => ThemeMode::Light,
        }
    }

    pub fn config_value(self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
            ThemeMode::Auto => "auto",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub dark: bool,
    pub accent: Color32,
    pub window_bg: Color32,
    pub sidebar_bg: Color32,
    pub title_bar_bg: Color32,
    pub card_bg: Color32,
    pub border: Color32,
    pub nav_hover: Color32,
    pub text: Color32,
    pub text_muted: Color32,
    pub dot_inactive: Color32,
}

impl Palette {
    pub fn new(dark: bool) -> Self {
        if dark {
            Self {
                dark,
                accent: Color32::from_rgb(0, 122, 204),
                window_bg: Color32::from_rgb(30, 30, 34),
                sidebar_bg: Color32::from_rgb(24, 24, 28),
                title_bar_bg: Color32::from_rgb(24, 24, 28),
                card_bg: Color32::from_rgb(40, 40, 46),
                border: Color32::from_rgb(60, 60, 68),
                nav_hover: Color32::from_rgb(50, 50, 58),
                text: Color32::from_rgb(230, 230, 235),
                text_muted: Color32::from_rgb(150, 150, 160),
                dot_inactive: Color32::from_rgb(70, 70, 80),
            }
        } else {
            Self {
                dark,
                accent: Color32::from_rgb(0, 122, 204),
                window_bg: Color32::from_rgb(248, 249, 250),
                sidebar_bg: Color32::WHITE,
                title_bar_bg: Color32::WHITE,
                card_bg: Color32::WHITE,
                border: Color32::from_rgb(225, 229, 233),
                nav_hover: Color32::from_rgb(233, 236, 239),
                text: Color32::from_rgb(33, 37, 41),
                text_muted: Color32::from_rgb(108, 117, 125),
                dot_inactive: Color32::from_rgb(225, 229, 233),
            }
        }
    }

    /// (fill, text) for a dialog button
    pub fn button_colors(&self, style: ButtonStyle) -> (Color32, Color32) {
        match style {
            ButtonStyle::Default => {
                if self.dark {
                    (Color32::from_rgb(64, 64, 72), self.text)
                } else {
                    (Color32::from_rgb(233, 236, 239), self.text)
                }
            }
            ButtonStyle::Primary => (Color32::from_rgb(0, 122, 204), Color32::WHITE),
            ButtonStyle::Success => (Color32::from_rgb(40, 167, 69), Color32::WHITE),
            ButtonStyle::Warning => (Color32::from_rgb(255, 193, 7), Color32::from_rgb(33, 37, 41)),
            ButtonStyle::Danger => (Color32::from_rgb(220, 53, 69), Color32::WHITE),
            ButtonStyle::Info => (Color32::from_rgb(23, 162, 184), Color32::WHITE),
        }
    }
}

/// Resolve the mode against the OS preference and apply egui visuals.
pub fn apply_theme(ctx: &egui::Context, mode: ThemeMode, system_dark: Option<bool>) -> Palette {
    let dark = match mode {
        ThemeMode::Light => false,
        ThemeMode::Dark => true,
        ThemeMode::Auto => system_dark.unwrap_or(false),
    };
    let palette = Palette::new(dark);

    let mut visuals = if dark {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    };
    visuals.window_rounding = egui::Rounding::same(12.0);
    visuals.panel_fill = palette.window_bg;
    visuals.selection.bg_fill = palette.accent;
    visuals.widgets.noninteractive.bg_stroke.color = palette.border;
    ctx.set_visuals(visuals);

    palette
}

/// System fonts that cover CJK text such as bot names
const CJK_FONT_CANDIDATES: &[&str] = &[
    r"C:\Windows\Fonts\msyh.ttc",
    r"C:\Windows\Fonts\simhei.ttf",
    "/System/Library/Fonts/PingFang.ttc",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
];

/// Add a CJK fallback font when one is installed. Missing fonts only mean
/// CJK glyphs render as boxes.
pub fn install_fonts(ctx: &egui::Context) {
    let Some((path, bytes)) = CJK_FONT_CANDIDATES
        .iter()
        .find_map(|p| fs::read(p).ok().map(|b| (*p, b)))
    else {
        debug!("No CJK font found, using default fonts");
        return;
    };

    let mut fonts = egui::FontDefinitions::default();
    fonts
        .font_data
        .insert("cjk".to_owned(), egui::FontData::from_owned(bytes));
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        fonts.families.entry(family).or_default().push("cjk".to_owned());
    }
    ctx.set_fonts(fonts);
    info!("Loaded CJK fallback font from {}", path);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_mode_round_trip() {
        for mode in [ThemeMode::Light, ThemeMode::Dark, ThemeMode::Auto] {
            assert_eq!(ThemeMode::from_config(mode.config_value()), mode);
        }
        assert_eq!(ThemeMode::from_config("purple"), ThemeMode::Light);
    }

    #[test]
    fn test_primary_button_is_accent() {
        let palette = Palette::new(false);
        assert_eq!(palette.button_colors(ButtonStyle::Primary).0, palette.accent);
    }
}
