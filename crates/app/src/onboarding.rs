//! First-run introduction shown before the main window.
//!
//! Three pages with Prev / Next / Skip. Finishing or skipping completes the
//! flow; closing it any other way dismisses it, and the app exits.

use crate::modals::Modal;
use crate::theme::Palette;
use eframe::egui;
use egui::{Align, Align2, Context, Layout, RichText, Vec2};

const DIALOG_SIZE: Vec2 = Vec2::new(700.0, 500.0);

/// Current step in the onboarding flow
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OnboardingStep {
    #[default]
    Welcome,
    Features,
    GettingStarted,
}

impl OnboardingStep {
    pub fn all() -> &'static [OnboardingStep] {
        &[
            OnboardingStep::Welcome,
            OnboardingStep::Features,
            OnboardingStep::GettingStarted,
        ]
    }

    pub fn index(self) -> usize {
        match self {
            OnboardingStep::Welcome => 0,
            OnboardingStep::Features => 1,
            OnboardingStep::GettingStarted => 2,
        }
    }

    fn glyph(self) -> &'static str {
        match self {
            OnboardingStep::Welcome => "👋",
            OnboardingStep::Features => "✨",
            OnboardingStep::GettingStarted => "🚀",
        }
    }

    fn title(self) -> &'static str {
        match self {
            OnboardingStep::Welcome => "Welcome to Zhenxun Bot GUI",
            OnboardingStep::Features => "Main features",
            OnboardingStep::GettingStarted => "Getting started",
        }
    }

    fn body(self) -> &'static str {
        match self {
            OnboardingStep::Welcome => {
                "A graphical control panel for the Zhenxun bot.\n\n\
                 Configure and manage your bot from a clean desktop interface:\n\
                 • Simple, direct layout\n\
                 • Live status at a glance\n\
                 • Convenient configuration management\n\
                 • Plugin management\n\
                 • Statistics and analysis\n\n\
                 Let's set up your bot!"
            }
            OnboardingStep::Features => {
                "🏠 Home\n\
                 • Bot configuration: identity, connections, storage\n\
                 • Quick actions\n\n\
                 ⚙ Settings\n\
                 • Language, theme and update options\n\
                 • Logging and advanced options\n\n\
                 🧪 Environment\n\
                 • Detect Python and FFmpeg\n\
                 • Download and install missing tools\n\n\
                 Use the sidebar on the left to move between pages."
            }
            OnboardingStep::GettingStarted => {
                "Quick start:\n\
                 1. Open \"Home\" and fill in your bot's details\n\
                 2. Adjust the app in \"Settings\"\n\
                 3. Check \"Environment\" so Python and FFmpeg are available\n\n\
                 If something goes wrong:\n\
                 • Run with RUST_LOG=debug for detailed logs\n\
                 • Read the project documentation\n\
                 • Open an issue on the repository\n\n\
                 Enjoy!"
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnboardingOutcome {
    /// Finished or skipped
    Completed,
    /// Closed without finishing
    Dismissed,
}

/// The onboarding flow controller
#[derive(Debug, Default)]
pub struct OnboardingFlow {
    step: OnboardingStep,
    outcome: Option<OnboardingOutcome>,
}

impl OnboardingFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_step(&self) -> OnboardingStep {
        self.step
    }

    pub fn outcome(&self) -> Option<OnboardingOutcome> {
        self.outcome
    }

    pub fn is_last(&self) -> bool {
        self.step.index() + 1 == OnboardingStep::all().len()
    }

    pub fn can_go_back(&self) -> bool {
        self.step.index() > 0
    }

    pub fn next_label(&self) -> &'static str {
        if self.is_last() {
            "Get Started"
        } else {
            "Next"
        }
    }

    /// Move to next step, finishing on the last one
    pub fn next(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        self.step = match self.step {
            OnboardingStep::Welcome => OnboardingStep::Features,
            OnboardingStep::Features => OnboardingStep::GettingStarted,
            OnboardingStep::GettingStarted => {
                self.complete();
                OnboardingStep::GettingStarted
            }
        };
    }

    /// Go back to previous step
    pub fn back(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        self.step = match self.step {
            OnboardingStep::Welcome | OnboardingStep::Features => OnboardingStep::Welcome,
            OnboardingStep::GettingStarted => OnboardingStep::Features,
        };
    }

    pub fn skip(&mut self) {
        self.complete();
    }

    pub fn complete(&mut self) {
        self.outcome.get_or_insert(OnboardingOutcome::Completed);
    }

    pub fn dismiss(&mut self) {
        self.outcome.get_or_insert(OnboardingOutcome::Dismissed);
    }

    pub fn show(&mut self, ctx: &Context, palette: &Palette) {
        let mut still_open = true;

        egui::Window::new("Welcome")
            .id(egui::Id::new("onboarding"))
            .open(&mut still_open)
            .collapsible(false)
            .resizable(false)
            .title_bar(true)
            .fixed_size(DIALOG_SIZE)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(24.0);
                    ui.label(RichText::new(self.step.glyph()).size(48.0));
                    ui.add_space(12.0);
                    ui.label(
                        RichText::new(self.step.title())
                            .size(22.0)
                            .strong()
                            .color(palette.text),
                    );
                    ui.add_space(12.0);
                    ui.label(RichText::new(self.step.body()).color(palette.text_muted));
                });

                ui.with_layout(Layout::bottom_up(Align::Center), |ui| {
                    ui.add_space(8.0);
                    ui.horizontal(|ui| {
                        if ui.button("Skip").clicked() {
                            self.skip();
                        }

                        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                            let next = egui::Button::new(
                                RichText::new(self.next_label()).color(egui::Color32::WHITE),
                            )
                            .fill(palette.accent)
                            .min_size(Vec2::new(100.0, 36.0));
                            if ui.add(next).clicked() {
                                self.next();
                            }
                            if ui
                                .add_enabled(
                                    self.can_go_back(),
                                    egui::Button::new("Previous").min_size(Vec2::new(100.0, 36.0)),
                                )
                                .clicked()
                            {
                                self.back();
                            }
                        });
                    });
                    ui.add_space(12.0);
                    self.show_dots(ui, palette);
                });
            });

        if !still_open {
            self.dismiss();
        }
    }

    fn show_dots(&self, ui: &mut egui::Ui, palette: &Palette) {
        let count = OnboardingStep::all().len();
        let (rect, _) = ui.allocate_exact_size(
            Vec2::new(count as f32 * 20.0, 12.0),
            egui::Sense::hover(),
        );
        for i in 0..count {
            let center = egui::pos2(rect.left() + 10.0 + i as f32 * 20.0, rect.center().y);
            let color = if i == self.step.index() {
                palette.accent
            } else {
                palette.dot_inactive
            };
            ui.painter().circle_filled(center, 5.0, color);
        }
    }
}

impl Modal for OnboardingFlow {
    fn update(&mut self, ctx: &Context) -> bool {
        if self.outcome.is_none() {
            let palette = Palette::new(ctx.style().visuals.dark_mode);
            self.show(ctx, &palette);
        }
        self.outcome.is_some()
    }

    fn is_open(&self) -> bool {
        self.outcome.is_none()
    }

    fn open(&mut self) {
        *self = Self::new();
    }

    fn close(&mut self) {
        self.dismiss();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_navigation() {
        let mut flow = OnboardingFlow::new();
        assert!(!flow.can_go_back());
        assert_eq!(flow.next_label(), "Next");

        flow.next();
        assert_eq!(flow.current_step(), OnboardingStep::Features);
        flow.back();
        assert_eq!(flow.current_step(), OnboardingStep::Welcome);
        flow.back();
        assert_eq!(flow.current_step(), OnboardingStep::Welcome);

        flow.next();
        flow.next();
        assert!(flow.is_last());
        assert_eq!(flow.next_label(), "Get Started");
        assert_eq!(flow.outcome(), None);

        flow.next();
        assert_eq!(flow.outcome(), Some(OnboardingOutcome::Completed));
    }

    #[test]
    fn test_skip_from_first_page_completes() {
        let mut flow = OnboardingFlow::new();
        flow.skip();
        assert_eq!(flow.outcome(), Some(OnboardingOutcome::Completed));
        // A later close does not overturn the result
        flow.dismiss();
        assert_eq!(flow.outcome(), Some(OnboardingOutcome::Completed));
    }

    #[test]
    fn test_dismiss() {
        let mut flow = OnboardingFlow::new();
        flow.next();
        flow.close();
        assert_eq!(flow.outcome(), Some(OnboardingOutcome::Dismissed));
        assert!(!flow.is_open());
    }
}
