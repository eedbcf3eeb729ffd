use eframe::egui;
use egui::{Frame, ViewportCommand};
use parking_lot::Mutex;
use shared::config::{ConfigStore, WindowGeometry};
use shared::APP_NAME;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod anim;
mod modals;
mod onboarding;
mod page_host;
mod pages;
mod shell;
mod sidebar;
mod state;
mod theme;
mod title_bar;

use modals::Modal;
use onboarding::OnboardingOutcome;
use pages::EnvironmentRequest;
use shell::{geometry_to_persist, restore_geometry, PageKind, PAGES};
use state::AppState;
use theme::{Palette, ThemeMode};

const MIN_WINDOW_SIZE: [f32; 2] = [1000.0, 700.0];

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if services::elevation::handle_boot() {
        return Ok(());
    }

    let config = ConfigStore::open_default();
    let geometry = config.window_geometry();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_NAME)
            .with_decorations(false)
            .with_transparent(true)
            .with_inner_size([geometry.size[0] as f32, geometry.size[1] as f32])
            .with_position([geometry.position[0] as f32, geometry.position[1] as f32])
            .with_min_inner_size(MIN_WINDOW_SIZE),
        vsync: true,
        ..Default::default()
    };
    eframe::run_native(
        APP_NAME,
        options,
        Box::new(|cc| {
            theme::install_fonts(&cc.egui_ctx);
            Box::new(ZhenxunApp {
                state: Arc::new(Mutex::new(AppState::new(config))),
                applied_dark: None,
            })
        }),
    )
}

struct ZhenxunApp {
    state: Arc<Mutex<AppState>>,
    /// Last visuals pushed to egui, so they are only set on change
    applied_dark: Option<bool>,
}

impl eframe::App for ZhenxunApp {
    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        [0.0, 0.0, 0.0, 0.0]
    }

    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        let mut s = self.state.lock();
        let now = ctx.input(|i| i.time);

        // Theme
        let mode = ThemeMode::from_config(&s.config.get().theme);
        let system_dark = frame.info().system_theme.map(|t| t == eframe::Theme::Dark);
        let wants_dark = match mode {
            ThemeMode::Light => false,
            ThemeMode::Dark => true,
            ThemeMode::Auto => system_dark.unwrap_or(false),
        };
        if self.applied_dark != Some(wants_dark) {
            s.palette = theme::apply_theme(ctx, mode, system_dark);
            self.applied_dark = Some(wants_dark);
        }
        let palette = s.palette;

        if !s.geometry_restored {
            restore_window(ctx, &mut s);
        }

        // Workers
        s.poll_probe();
        s.poll_install(now);

        // First-run onboarding stands in for the main window until it ends
        if let Some(flow) = s.onboarding.as_mut() {
            egui::CentralPanel::default()
                .frame(Frame::none().fill(palette.window_bg))
                .show(ctx, |_ui| {});
            if !flow.update(ctx) {
                ctx.request_repaint();
                return;
            }
            let outcome = flow.outcome().unwrap_or(OnboardingOutcome::Dismissed);
            if s.finish_onboarding(outcome) {
                ctx.send_viewport_cmd(ViewportCommand::Close);
                return;
            }
        }

        // Chrome
        s.shell.tick(now);
        if let Some(title) = s.shell.take_title_update() {
            ctx.send_viewport_cmd(ViewportCommand::Title(title));
        }

        let maximized = ctx.input(|i| i.viewport().maximized.unwrap_or(false));
        let title = s.shell.title().to_owned();
        let mut bar_action = None;
        egui::TopBottomPanel::top("title_bar")
            .exact_height(title_bar::TITLE_BAR_HEIGHT)
            .frame(Frame::none().fill(palette.title_bar_bg))
            .show(ctx, |ui| {
                bar_action = title_bar::show(ui, &title, maximized, &palette);
            });
        if let Some(action) = bar_action {
            ctx.send_viewport_cmd(action.command(maximized));
        }

        egui::SidePanel::left("sidebar")
            .exact_width(sidebar::SIDEBAR_WIDTH)
            .resizable(false)
            .frame(Frame::none().fill(palette.sidebar_bg))
            .show(ctx, |ui| {
                if let Some(request) = s.shell.sidebar.show(ui, &palette) {
                    s.shell.change_page(request.index, now);
                }
            });

        let mut requests = Vec::new();
        egui::CentralPanel::default()
            .frame(
                Frame::none()
                    .fill(palette.window_bg)
                    .inner_margin(egui::Margin::same(24.0)),
            )
            .show(ctx, |ui| {
                ui.set_opacity(s.shell.page_opacity(now));
                let index = s.shell.current_page_index();
                requests = show_page(&mut s, ui, index, &palette);
            });

        // Outgoing page, fading out on top
        if let Some((page, alpha)) = s.shell.overlay(now) {
            let rect = ctx.available_rect().shrink(24.0);
            egui::Area::new(egui::Id::new("page_snapshot"))
                .fixed_pos(rect.min)
                .interactable(false)
                .order(egui::Order::Middle)
                .show(ctx, |ui| {
                    ui.set_clip_rect(rect);
                    ui.set_max_size(rect.size());
                    ui.set_opacity(alpha);
                    ui.push_id("snapshot", |ui| {
                        // Drawn for looks only; anything it asks for is dropped
                        let _ = show_page(&mut s, ui, page, &palette);
                    });
                });
        }

        for request in requests {
            s.handle_request(request);
        }

        // Dialogs
        s.dialogs.show_active(ctx, &palette);
        s.dispatch_dialog_events();

        if ctx.input(|i| i.viewport().close_requested()) {
            persist_window(ctx, &mut s);
        }

        if s.shell.is_animating() || s.dialogs.has_active() {
            ctx.request_repaint();
        } else if s.has_background_work() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}

fn show_page(
    s: &mut AppState,
    ui: &mut egui::Ui,
    index: usize,
    palette: &Palette,
) -> Vec<EnvironmentRequest> {
    let Some(entry) = PAGES.get(index) else {
        return Vec::new();
    };
    let AppState {
        config,
        dialogs,
        home,
        settings,
        environment,
        ..
    } = s;
    match entry.kind {
        PageKind::Home => {
            home.show(ui, dialogs, palette);
            Vec::new()
        }
        PageKind::Settings => {
            settings.show(ui, config, palette);
            Vec::new()
        }
        PageKind::Environment => environment.show(ui, palette),
    }
}

fn screen_size(ctx: &egui::Context) -> Option<[i32; 2]> {
    ctx.input(|i| i.viewport().monitor_size)
        .map(|size| [size.x.round() as i32, size.y.round() as i32])
}

/// Apply the saved geometry once the monitor size is known.
fn restore_window(ctx: &egui::Context, s: &mut AppState) {
    let Some(screen) = screen_size(ctx) else {
        return;
    };
    s.geometry_restored = true;

    let saved = s.config.window_geometry();
    let target = restore_geometry(saved, screen);
    if target != saved {
        info!(
            "Saved window size {:?} fills the screen, resetting to {:?}",
            saved.size, target.size
        );
        ctx.send_viewport_cmd(ViewportCommand::InnerSize(egui::vec2(
            target.size[0] as f32,
            target.size[1] as f32,
        )));
        ctx.send_viewport_cmd(ViewportCommand::OuterPosition(egui::pos2(
            target.position[0] as f32,
            target.position[1] as f32,
        )));
    }
}

fn persist_window(ctx: &egui::Context, s: &mut AppState) {
    let (inner, outer, maximized) = ctx.input(|i| {
        let vp = i.viewport();
        (vp.inner_rect, vp.outer_rect, vp.maximized.unwrap_or(false))
    });
    let (Some(inner), Some(outer)) = (inner, outer) else {
        warn!("Window geometry unavailable, not saving it");
        return;
    };
    let current = WindowGeometry {
        size: [inner.width().round() as i32, inner.height().round() as i32],
        position: [outer.min.x.round() as i32, outer.min.y.round() as i32],
    };
    match geometry_to_persist(current, maximized, screen_size(ctx)) {
        Some(geometry) => s.config.save_window_geometry(geometry),
        None => info!("Window is maximized or fills the screen, keeping saved geometry"),
    }
}
