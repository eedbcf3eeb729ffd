//! Left navigation rail with one button per page.

use crate::theme::Palette;
use eframe::egui;
use egui::{Color32, RichText, Sense, Vec2};

pub const SIDEBAR_WIDTH: f32 = 84.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavEntry {
    pub glyph: &'static str,
    pub label: &'static str,
    pub index: usize,
}

pub const NAV_ENTRIES: [NavEntry; 3] = [
    NavEntry {
        glyph: "🏠",
        label: "Home",
        index: 0,
    },
    NavEntry {
        glyph: "⚙",
        label: "Settings",
        index: 1,
    },
    NavEntry {
        glyph: "🧪",
        label: "Environment",
        index: 2,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavRequest {
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct NavigationSidebar {
    entries: Vec<NavEntry>,
    active: usize,
}

impl Default for NavigationSidebar {
    fn default() -> Self {
        Self::new(NAV_ENTRIES.to_vec())
    }
}

impl NavigationSidebar {
    pub fn new(entries: Vec<NavEntry>) -> Self {
        let active = entries.first().map(|e| e.index).unwrap_or(0);
        Self { entries, active }
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.active == index
    }

    /// Handle a click. Clicking the active entry or an unknown index does nothing.
    pub fn on_click(&mut self, index: usize) -> Option<NavRequest> {
        if index == self.active || !self.entries.iter().any(|e| e.index == index) {
            return None;
        }
        self.active = index;
        Some(NavRequest { index })
    }

    /// Move the highlight without producing a request.
    pub fn set_active(&mut self, index: usize) {
        if self.entries.iter().any(|e| e.index == index) {
            self.active = index;
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, palette: &Palette) -> Option<NavRequest> {
        let mut request = None;
        ui.add_space(12.0);

        for entry in self.entries.clone() {
            let id = ui.id().with(("nav", entry.index));
            let (rect, response) =
                ui.allocate_exact_size(Vec2::new(SIDEBAR_WIDTH - 12.0, 64.0), Sense::click());

            let active_t = ui.ctx().animate_bool(id.with("active"), self.is_active(entry.index));
            let hover_t = ui.ctx().animate_bool(id.with("hover"), response.hovered());

            let base = lerp_color(Color32::TRANSPARENT, palette.nav_hover, hover_t);
            let fill = lerp_color(base, palette.accent, active_t);
            ui.painter().rect_filled(rect, egui::Rounding::same(10.0), fill);

            let text_color = lerp_color(palette.text_muted, Color32::WHITE, active_t);
            ui.painter().text(
                rect.center() - Vec2::new(0.0, 10.0),
                egui::Align2::CENTER_CENTER,
                entry.glyph,
                egui::FontId::proportional(20.0),
                text_color,
            );
            ui.painter().text(
                rect.center() + Vec2::new(0.0, 14.0),
                egui::Align2::CENTER_CENTER,
                entry.label,
                egui::FontId::proportional(11.0),
                text_color,
            );

            if response.clicked() {
                request = self.on_click(entry.index).or(request);
            }
            response.on_hover_text(RichText::new(entry.label));
            ui.add_space(6.0);
        }

        request
    }
}

fn lerp_color(a: Color32, b: Color32, t: f32) -> Color32 {
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Color32::from_rgba_premultiplied(
        mix(a.r(), b.r()),
        mix(a.g(), b.g()),
        mix(a.b(), b.b()),
        mix(a.a(), b.a()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_entry_active_by_default() {
        let sidebar = NavigationSidebar::default();
        assert_eq!(sidebar.active(), 0);
    }

    #[test]
    fn test_click_switches_single_active() {
        let mut sidebar = NavigationSidebar::default();
        assert_eq!(sidebar.on_click(2), Some(NavRequest { index: 2 }));
        assert!(sidebar.is_active(2));
        assert!(!sidebar.is_active(0));
        assert!(!sidebar.is_active(1));
    }

    #[test]
    fn test_click_on_active_does_nothing() {
        let mut sidebar = NavigationSidebar::default();
        assert_eq!(sidebar.on_click(0), None);
        assert_eq!(sidebar.on_click(7), None);
        assert_eq!(sidebar.active(), 0);
    }

    #[test]
    fn test_set_active_is_silent() {
        let mut sidebar = NavigationSidebar::default();
        sidebar.set_active(1);
        assert!(sidebar.is_active(1));
        // Clicking what is now active is ignored
        assert_eq!(sidebar.on_click(1), None);
    }
}
