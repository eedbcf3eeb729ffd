//! Custom title bar for the frameless main window.

use crate::theme::Palette;
use eframe::egui;
use egui::{Align, Layout, RichText, Sense, Vec2, ViewportCommand};

pub const TITLE_BAR_HEIGHT: f32 = 50.0;
const CONTROL_SIZE: Vec2 = Vec2::new(46.0, 32.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleBarAction {
    StartDrag,
    Minimize,
    ToggleMaximize,
    Close,
}

impl TitleBarAction {
    pub fn command(self, maximized: bool) -> ViewportCommand {
        match self {
            TitleBarAction::StartDrag => ViewportCommand::StartDrag,
            TitleBarAction::Minimize => ViewportCommand::Minimized(true),
            TitleBarAction::ToggleMaximize => ViewportCommand::Maximized(!maximized),
            TitleBarAction::Close => ViewportCommand::Close,
        }
    }
}

/// Draw the bar and return what the user asked for, if anything.
pub fn show(
    ui: &mut egui::Ui,
    title: &str,
    maximized: bool,
    palette: &Palette,
) -> Option<TitleBarAction> {
    let mut action = None;
    let bar_rect = ui.max_rect();

    // Background drag handle; widgets added later take their own clicks
    let drag = ui.interact(bar_rect, ui.id().with("title_drag"), Sense::click_and_drag());
    if drag.double_clicked() {
        action = Some(TitleBarAction::ToggleMaximize);
    } else if drag.drag_started() {
        action = Some(TitleBarAction::StartDrag);
    }

    ui.horizontal_centered(|ui| {
        ui.add_space(16.0);
        ui.label(RichText::new("🤖").size(20.0));
        ui.label(RichText::new(title).size(14.0).strong().color(palette.text));

        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            ui.spacing_mut().item_spacing.x = 0.0;

            let close = ui.add(
                egui::Button::new(RichText::new("✕").size(14.0))
                    .frame(false)
                    .min_size(CONTROL_SIZE),
            );
            if close.clicked() {
                action = Some(TitleBarAction::Close);
            }

            let max_glyph = if maximized { "🗗" } else { "🗖" };
            if ui
                .add(
                    egui::Button::new(RichText::new(max_glyph).size(14.0))
                        .frame(false)
                        .min_size(CONTROL_SIZE),
                )
                .clicked()
            {
                action = Some(TitleBarAction::ToggleMaximize);
            }

            if ui
                .add(
                    egui::Button::new(RichText::new("🗕").size(14.0))
                        .frame(false)
                        .min_size(CONTROL_SIZE),
                )
                .clicked()
            {
                action = Some(TitleBarAction::Minimize);
            }
        });
    });

    action
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maximize_toggles() {
        assert!(matches!(
            TitleBarAction::ToggleMaximize.command(false),
            ViewportCommand::Maximized(true)
        ));
        assert!(matches!(
            TitleBarAction::ToggleMaximize.command(true),
            ViewportCommand::Maximized(false)
        ));
        assert!(matches!(
            TitleBarAction::Close.command(false),
            ViewportCommand::Close
        ));
    }
}
