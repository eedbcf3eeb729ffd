//! The themed dialog used everywhere in the app.
//!
//! A dialog is described by a [`DialogSpec`] and driven by [`GlobalDialog`],
//! which owns the fade-in / fade-out lifecycle and turns clicks into
//! [`DialogEvent`]s.

use crate::anim::{Easing, Tween};
use crate::theme::Palette;
use eframe::egui;
use egui::{Align, Align2, Area, Context, Id, Key, Layout, RichText, Sense, Vec2};
use std::fmt;

pub const DIALOG_SIZE: Vec2 = Vec2::new(440.0, 320.0);
const BUTTON_SIZE: Vec2 = Vec2::new(88.0, 40.0);
const OPEN_MS: u64 = 250;
const CLOSE_MS: u64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DialogId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonStyle {
    #[default]
    Default,
    Primary,
    Success,
    Warning,
    Danger,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogIcon {
    Info,
    Question,
    Warning,
    Error,
    Success,
    Progress,
}

impl DialogIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            DialogIcon::Info => "ℹ",
            DialogIcon::Question => "❓",
            DialogIcon::Warning => "⚠",
            DialogIcon::Error => "❌",
            DialogIcon::Success => "✅",
            DialogIcon::Progress => "⏳",
        }
    }
}

pub type ButtonCallback = Box<dyn FnOnce() + Send>;

pub struct ButtonSpec {
    pub label: String,
    pub style: ButtonStyle,
    pub callback: Option<ButtonCallback>,
}

impl fmt::Debug for ButtonSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ButtonSpec")
            .field("label", &self.label)
            .field("style", &self.style)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressSpec {
    pub percent: u8,
    pub status: String,
}

#[derive(Debug)]
pub struct DialogSpec {
    pub title: String,
    pub body: String,
    pub icon: DialogIcon,
    pub buttons: Vec<ButtonSpec>,
    pub progress: Option<ProgressSpec>,
}

impl DialogSpec {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            icon: DialogIcon::Info,
            buttons: Vec::new(),
            progress: None,
        }
    }

    pub fn icon(mut self, icon: DialogIcon) -> Self {
        self.icon = icon;
        self
    }

    pub fn button(mut self, label: impl Into<String>, style: ButtonStyle) -> Self {
        self.buttons.push(ButtonSpec {
            label: label.into(),
            style,
            callback: None,
        });
        self
    }

    pub fn button_with(
        mut self,
        label: impl Into<String>,
        style: ButtonStyle,
        callback: impl FnOnce() + Send + 'static,
    ) -> Self {
        self.buttons.push(ButtonSpec {
            label: label.into(),
            style,
            callback: Some(Box::new(callback)),
        });
        self
    }

    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(title, body).button("OK", ButtonStyle::Primary)
    }

    pub fn confirm(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(title, body)
            .icon(DialogIcon::Question)
            .button("Cancel", ButtonStyle::Default)
            .button("Confirm", ButtonStyle::Primary)
    }

    pub fn warning(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(title, body)
            .icon(DialogIcon::Warning)
            .button("Cancel", ButtonStyle::Default)
            .button("OK", ButtonStyle::Warning)
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(title, body)
            .icon(DialogIcon::Error)
            .button("OK", ButtonStyle::Danger)
    }

    pub fn success(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(title, body)
            .icon(DialogIcon::Success)
            .button("OK", ButtonStyle::Success)
    }

    pub fn multi_button(
        title: impl Into<String>,
        body: impl Into<String>,
        buttons: Vec<ButtonSpec>,
    ) -> Self {
        let mut spec = Self::new(title, body).icon(DialogIcon::Question);
        spec.buttons = buttons;
        spec
    }

    pub fn progress(title: impl Into<String>, status: impl Into<String>) -> Self {
        let mut spec = Self::new(title, "")
            .icon(DialogIcon::Progress)
            .button("Cancel", ButtonStyle::Default);
        spec.progress = Some(ProgressSpec {
            percent: 0,
            status: status.into(),
        });
        spec
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogEvent {
    ButtonClicked(String),
    /// Closed with the × button or Escape
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DialogPhase {
    /// Queued behind another dialog
    Waiting,
    Opening(Tween),
    Open,
    Closing(Tween),
    Closed,
}

#[derive(Debug)]
pub struct GlobalDialog {
    id: DialogId,
    spec: DialogSpec,
    phase: DialogPhase,
    offset: Vec2,
    events: Vec<DialogEvent>,
}

impl GlobalDialog {
    pub fn new(id: DialogId, spec: DialogSpec) -> Self {
        Self {
            id,
            spec,
            phase: DialogPhase::Waiting,
            offset: Vec2::ZERO,
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> DialogId {
        self.id
    }

    pub fn spec(&self) -> &DialogSpec {
        &self.spec
    }

    pub fn phase(&self) -> DialogPhase {
        self.phase
    }

    /// Start the fade-in. Only acts on a waiting dialog.
    pub fn activate(&mut self, now: f64) {
        if self.phase == DialogPhase::Waiting {
            self.phase = DialogPhase::Opening(Tween::new(0.0, 1.0, OPEN_MS, Easing::OutBack, now));
        }
    }

    pub fn accepts_input(&self) -> bool {
        matches!(self.phase, DialogPhase::Opening(_) | DialogPhase::Open)
    }

    pub fn is_closed(&self) -> bool {
        self.phase == DialogPhase::Closed
    }

    pub fn tick(&mut self, now: f64) {
        match self.phase {
            DialogPhase::Opening(t) if t.is_finished(now) => self.phase = DialogPhase::Open,
            DialogPhase::Closing(t) if t.is_finished(now) => self.phase = DialogPhase::Closed,
            _ => {}
        }
    }

    fn begin_closing(&mut self, now: f64) {
        let from = self.opacity(now);
        self.phase = DialogPhase::Closing(Tween::new(from, 0.0, CLOSE_MS, Easing::InCubic, now));
    }

    /// Press the button at `index`. Ignored once the dialog is closing.
    pub fn click(&mut self, index: usize, now: f64) -> bool {
        if !self.accepts_input() {
            return false;
        }
        let Some(button) = self.spec.buttons.get_mut(index) else {
            return false;
        };
        self.events
            .push(DialogEvent::ButtonClicked(button.label.clone()));
        if let Some(callback) = button.callback.take() {
            callback();
        }
        self.begin_closing(now);
        true
    }

    pub fn click_label(&mut self, label: &str, now: f64) -> bool {
        match self.spec.buttons.iter().position(|b| b.label == label) {
            Some(index) => self.click(index, now),
            None => false,
        }
    }

    /// The × path. Works whether or not the dialog has a cancel button.
    pub fn cancel(&mut self, now: f64) -> bool {
        if !self.accepts_input() {
            return false;
        }
        self.events.push(DialogEvent::Cancelled);
        self.begin_closing(now);
        true
    }

    /// Close without reporting anything, e.g. when its work finished.
    pub fn dismiss(&mut self, now: f64) {
        match self.phase {
            DialogPhase::Waiting => self.phase = DialogPhase::Closed,
            DialogPhase::Opening(_) | DialogPhase::Open => self.begin_closing(now),
            DialogPhase::Closing(_) | DialogPhase::Closed => {}
        }
    }

    pub fn opacity(&self, now: f64) -> f32 {
        match self.phase {
            DialogPhase::Waiting | DialogPhase::Closed => 0.0,
            DialogPhase::Opening(t) => t.value(now).clamp(0.0, 1.0),
            DialogPhase::Open => 1.0,
            DialogPhase::Closing(t) => t.value(now).clamp(0.0, 1.0),
        }
    }

    /// Vertical settle offset for the OutBack entrance
    fn entrance_offset(&self, now: f64) -> f32 {
        match self.phase {
            DialogPhase::Opening(t) => (1.0 - t.value(now)) * 24.0,
            _ => 0.0,
        }
    }

    pub fn drag_by(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn set_progress(&mut self, percent: i32) {
        if let Some(p) = self.spec.progress.as_mut() {
            p.percent = percent.clamp(0, 100) as u8;
        }
    }

    pub fn set_status_text(&mut self, status: impl Into<String>) {
        if let Some(p) = self.spec.progress.as_mut() {
            p.status = status.into();
        }
    }

    pub fn progress(&self) -> Option<&ProgressSpec> {
        self.spec.progress.as_ref()
    }

    pub fn take_events(&mut self) -> Vec<DialogEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn show(&mut self, ctx: &Context, palette: &Palette, now: f64) {
        self.tick(now);
        if matches!(self.phase, DialogPhase::Waiting | DialogPhase::Closed) {
            return;
        }

        let opacity = self.opacity(now);
        let egui_id = Id::new(("global_dialog", self.id.0));

        // Dim the window and swallow clicks behind the dialog
        Area::new(egui_id.with("overlay"))
            .order(egui::Order::Foreground)
            .anchor(Align2::LEFT_TOP, Vec2::ZERO)
            .show(ctx, |ui| {
                let screen_rect = ctx.screen_rect();
                ui.allocate_response(screen_rect.size(), Sense::click());
                ui.painter().rect_filled(
                    screen_rect,
                    0.0,
                    egui::Color32::from_black_alpha((120.0 * opacity) as u8),
                );
            });

        let center = ctx.screen_rect().center();
        let pos = center - DIALOG_SIZE / 2.0
            + self.offset
            + Vec2::new(0.0, self.entrance_offset(now));

        let mut clicked: Option<usize> = None;
        let mut cancelled = false;

        let area = Area::new(egui_id.with("dialog"))
            .order(egui::Order::Tooltip)
            .fixed_pos(pos)
            .movable(false)
            .show(ctx, |ui| {
                ui.set_opacity(opacity);
                egui::Frame::window(ui.style())
                    .fill(palette.card_bg)
                    .stroke(egui::Stroke::new(1.0, palette.border))
                    .rounding(egui::Rounding::same(12.0))
                    .inner_margin(egui::Margin::same(20.0))
                    .show(ui, |ui| {
                        ui.set_min_size(DIALOG_SIZE - Vec2::splat(40.0));
                        ui.set_max_width(DIALOG_SIZE.x - 40.0);

                        ui.horizontal(|ui| {
                            ui.label(RichText::new(self.spec.icon.glyph()).size(24.0));
                            ui.label(
                                RichText::new(&self.spec.title)
                                    .size(17.0)
                                    .strong()
                                    .color(palette.text),
                            );
                            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                                if ui
                                    .add(egui::Button::new(RichText::new("×").size(18.0)).frame(false))
                                    .clicked()
                                {
                                    cancelled = true;
                                }
                            });
                        });
                        ui.add_space(12.0);

                        if !self.spec.body.is_empty() {
                            ui.add(
                                egui::Label::new(
                                    RichText::new(&self.spec.body).color(palette.text_muted),
                                )
                                .wrap(true),
                            );
                        }

                        if let Some(progress) = &self.spec.progress {
                            ui.add_space(8.0);
                            ui.add(
                                egui::ProgressBar::new(progress.percent as f32 / 100.0)
                                    .show_percentage(),
                            );
                            ui.add_space(6.0);
                            ui.label(RichText::new(&progress.status).color(palette.text_muted));
                        }

                        ui.with_layout(Layout::bottom_up(Align::Max), |ui| {
                            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                                // right_to_left lays out in reverse
                                for (index, button) in self.spec.buttons.iter().enumerate().rev() {
                                    let (fill, text) = palette.button_colors(button.style);
                                    let width = if self.spec.progress.is_some() {
                                        ui.available_width()
                                    } else {
                                        BUTTON_SIZE.x
                                    };
                                    let response = ui.add(
                                        egui::Button::new(
                                            RichText::new(&button.label).color(text),
                                        )
                                        .fill(fill)
                                        .rounding(egui::Rounding::same(8.0))
                                        .min_size(Vec2::new(width, BUTTON_SIZE.y)),
                                    );
                                    if response.clicked() {
                                        clicked = Some(index);
                                    }
                                }
                            });
                        });
                    })
                    .response
            });

        let drag = area.inner.interact(Sense::drag());
        if drag.dragged() {
            self.drag_by(drag.drag_delta());
        }

        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            cancelled = true;
        }

        if let Some(index) = clicked {
            self.click(index, now);
        } else if cancelled {
            self.cancel(now);
        }

        if !matches!(self.phase, DialogPhase::Open) {
            ctx.request_repaint();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn opened(spec: DialogSpec) -> GlobalDialog {
        let mut dialog = GlobalDialog::new(DialogId(1), spec);
        dialog.activate(0.0);
        dialog
    }

    #[test]
    fn test_factory_buttons() {
        let labels = |spec: &DialogSpec| -> Vec<(String, ButtonStyle)> {
            spec.buttons
                .iter()
                .map(|b| (b.label.clone(), b.style))
                .collect()
        };
        assert_eq!(
            labels(&DialogSpec::info("t", "b")),
            vec![("OK".into(), ButtonStyle::Primary)]
        );
        assert_eq!(
            labels(&DialogSpec::confirm("t", "b")),
            vec![
                ("Cancel".into(), ButtonStyle::Default),
                ("Confirm".into(), ButtonStyle::Primary)
            ]
        );
        assert_eq!(
            labels(&DialogSpec::warning("t", "b")),
            vec![
                ("Cancel".into(), ButtonStyle::Default),
                ("OK".into(), ButtonStyle::Warning)
            ]
        );
        assert_eq!(
            labels(&DialogSpec::error("t", "b")),
            vec![("OK".into(), ButtonStyle::Danger)]
        );
        assert_eq!(
            labels(&DialogSpec::success("t", "b")),
            vec![("OK".into(), ButtonStyle::Success)]
        );
    }

    #[test]
    fn test_click_emits_once_and_runs_callback_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let spec = DialogSpec::multi_button(
            "Download",
            "FFmpeg is missing",
            vec![],
        )
        .button("Cancel", ButtonStyle::Default)
        .button_with("Start download", ButtonStyle::Primary, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let mut dialog = opened(spec);

        assert!(dialog.click(1, 0.1));
        assert!(matches!(dialog.phase(), DialogPhase::Closing(_)));
        // Clicks during fade-out are ignored
        assert!(!dialog.click(1, 0.15));
        assert!(!dialog.click(0, 0.16));

        assert_eq!(
            dialog.take_events(),
            vec![DialogEvent::ButtonClicked("Start download".into())]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        dialog.tick(0.31);
        assert!(dialog.is_closed());
    }

    #[test]
    fn test_close_button_cancels_without_cancel_button() {
        let mut dialog = opened(DialogSpec::success("Done", "Installed"));
        assert!(dialog.cancel(0.3));
        assert_eq!(dialog.take_events(), vec![DialogEvent::Cancelled]);
        assert!(!dialog.cancel(0.35));
    }

    #[test]
    fn test_lifecycle_timing() {
        let mut dialog = GlobalDialog::new(DialogId(2), DialogSpec::info("t", "b"));
        assert_eq!(dialog.opacity(0.0), 0.0);
        assert!(!dialog.accepts_input());

        dialog.activate(1.0);
        dialog.tick(1.2);
        assert!(matches!(dialog.phase(), DialogPhase::Opening(_)));
        dialog.tick(1.25);
        assert_eq!(dialog.phase(), DialogPhase::Open);
        assert_eq!(dialog.opacity(1.3), 1.0);

        dialog.dismiss(2.0);
        assert!(dialog.take_events().is_empty());
        dialog.tick(2.1);
        assert!(!dialog.is_closed());
        dialog.tick(2.2);
        assert!(dialog.is_closed());
    }

    #[test]
    fn test_progress_updates_clamp() {
        let mut dialog = opened(DialogSpec::progress("Installing FFmpeg", "Starting..."));
        dialog.set_progress(42);
        dialog.set_status_text("Downloading ffmpeg...");
        assert_eq!(dialog.progress().unwrap().percent, 42);
        dialog.set_progress(180);
        assert_eq!(dialog.progress().unwrap().percent, 100);
        dialog.set_progress(-5);
        assert_eq!(dialog.progress().unwrap().percent, 0);
        assert_eq!(dialog.progress().unwrap().status, "Downloading ffmpeg...");
    }

    #[test]
    fn test_drag_moves_dialog() {
        let mut dialog = opened(DialogSpec::info("t", "b"));
        dialog.drag_by(Vec2::new(10.0, -4.0));
        dialog.drag_by(Vec2::new(5.0, 4.0));
        assert_eq!(dialog.offset(), Vec2::new(15.0, 0.0));
    }
}
