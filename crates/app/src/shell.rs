//! Main window chrome: page table, page switching and window geometry.

use crate::anim::{Easing, Tween};
use crate::page_host::{AnimatedPageHost, SwitchOutcome, TransitionKind};
use crate::sidebar::NavigationSidebar;
use shared::config::{WindowGeometry, DEFAULT_WINDOW_SIZE};
use shared::APP_NAME;
use tracing::{debug, info, warn};

const OVERLAY_FADE_MS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Home,
    Settings,
    Environment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageEntry {
    pub index: usize,
    pub kind: PageKind,
    pub display_name: &'static str,
}

pub const PAGES: [PageEntry; 3] = [
    PageEntry {
        index: 0,
        kind: PageKind::Home,
        display_name: "Home",
    },
    PageEntry {
        index: 1,
        kind: PageKind::Settings,
        display_name: "Settings",
    },
    PageEntry {
        index: 2,
        kind: PageKind::Environment,
        display_name: "Environment",
    },
];

pub fn window_title(page: &PageEntry) -> String {
    format!("{} - {}", APP_NAME, page.display_name)
}

/// The outgoing page, drawn over the new one while it fades away
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotOverlay {
    pub page: usize,
    tween: Tween,
}

#[derive(Debug)]
pub struct MainShell {
    host: AnimatedPageHost,
    pub sidebar: NavigationSidebar,
    /// Page the chrome (title, sidebar, overlay) last synced to
    shown: usize,
    overlay: Option<SnapshotOverlay>,
    title: String,
    title_dirty: bool,
}

impl Default for MainShell {
    fn default() -> Self {
        Self::new()
    }
}

impl MainShell {
    pub fn new() -> Self {
        Self {
            host: AnimatedPageHost::new(PAGES.len()),
            sidebar: NavigationSidebar::default(),
            shown: 0,
            overlay: None,
            title: window_title(&PAGES[0]),
            title_dirty: true,
        }
    }

    pub fn current_page_index(&self) -> usize {
        self.host.current_index()
    }

    pub fn current_page(&self) -> &'static PageEntry {
        &PAGES[self.current_page_index()]
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Switch pages. Returns false for the settled current page or an
    /// unknown index. During a transition the latest request wins.
    pub fn change_page(&mut self, index: usize, now: f64) -> bool {
        if index >= PAGES.len() {
            warn!("Ignoring switch to unknown page {}", index);
            return false;
        }
        if !self.host.is_transitioning() && index == self.current_page_index() {
            debug!("Already on page {}", index);
            return false;
        }

        match self.host.switch(index, TransitionKind::Fade, now) {
            SwitchOutcome::Started => {
                self.sync_to_host(now);
                true
            }
            SwitchOutcome::Queued => {
                self.sidebar.set_active(index);
                true
            }
            SwitchOutcome::Unchanged | SwitchOutcome::Rejected => false,
        }
    }

    fn sync_to_host(&mut self, now: f64) {
        let current = self.host.current_index();
        if current == self.shown {
            return;
        }
        self.overlay = Some(SnapshotOverlay {
            page: self.shown,
            tween: Tween::new(1.0, 0.0, OVERLAY_FADE_MS, Easing::OutCubic, now),
        });
        self.shown = current;
        self.sidebar.set_active(current);
        self.title = window_title(&PAGES[current]);
        self.title_dirty = true;
        info!("Switched to {}", PAGES[current].display_name);
    }

    /// Advance animations. Call once per frame.
    pub fn tick(&mut self, now: f64) {
        if self.host.tick(now).is_some() {
            // A queued switch may have started
            self.sync_to_host(now);
        }
        if let Some(overlay) = &self.overlay {
            if overlay.tween.is_finished(now) {
                self.overlay = None;
            }
        }
    }

    pub fn is_animating(&self) -> bool {
        self.host.is_transitioning() || self.overlay.is_some()
    }

    pub fn page_opacity(&self, now: f64) -> f32 {
        self.host.opacity(now)
    }

    /// Outgoing page and its opacity, while the crossfade runs
    pub fn overlay(&self, now: f64) -> Option<(usize, f32)> {
        self.overlay
            .as_ref()
            .map(|o| (o.page, o.tween.value(now).clamp(0.0, 1.0)))
    }

    /// The new window title, once per change
    pub fn take_title_update(&mut self) -> Option<String> {
        if self.title_dirty {
            self.title_dirty = false;
            Some(self.title.clone())
        } else {
            None
        }
    }
}

pub fn is_fullscreen_sized(size: [i32; 2], screen: [i32; 2]) -> bool {
    size[0] >= screen[0] && size[1] >= screen[1]
}

/// Where to put the window at startup.
///
/// A saved size that fills the screen is replaced by the default size,
/// centred.
pub fn restore_geometry(saved: WindowGeometry, screen: [i32; 2]) -> WindowGeometry {
    if is_fullscreen_sized(saved.size, screen) {
        let [w, h] = DEFAULT_WINDOW_SIZE;
        WindowGeometry {
            size: DEFAULT_WINDOW_SIZE,
            position: [(screen[0] - w) / 2, (screen[1] - h) / 2],
        }
    } else {
        saved
    }
}

/// What to save when the window closes, if anything.
pub fn geometry_to_persist(
    current: WindowGeometry,
    maximized: bool,
    screen: Option<[i32; 2]>,
) -> Option<WindowGeometry> {
    if maximized {
        return None;
    }
    if let Some(screen) = screen {
        if is_fullscreen_sized(current.size, screen) {
            return None;
        }
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_table_is_contiguous() {
        for (i, page) in PAGES.iter().enumerate() {
            assert_eq!(page.index, i);
        }
        assert_eq!(window_title(&PAGES[2]), "Zhenxun Bot GUI - Environment");
    }

    #[test]
    fn test_change_page_updates_chrome() {
        let mut shell = MainShell::new();
        assert_eq!(shell.take_title_update().as_deref(), Some("Zhenxun Bot GUI - Home"));

        assert!(shell.change_page(2, 0.0));
        assert_eq!(shell.current_page_index(), 2);
        assert!(shell.sidebar.is_active(2));
        assert_eq!(
            shell.take_title_update().as_deref(),
            Some("Zhenxun Bot GUI - Environment")
        );
        assert_eq!(shell.take_title_update(), None);

        let (page, alpha) = shell.overlay(0.0).unwrap();
        assert_eq!(page, 0);
        assert_eq!(alpha, 1.0);

        shell.tick(0.31);
        assert!(shell.overlay(0.31).is_none());
        assert!(!shell.is_animating());
    }

    #[test]
    fn test_change_page_ignores_current_and_out_of_range() {
        let mut shell = MainShell::new();
        shell.take_title_update();
        assert!(!shell.change_page(0, 0.0));
        assert!(!shell.change_page(3, 0.0));
        assert!(shell.overlay(0.0).is_none());
        assert_eq!(shell.take_title_update(), None);
    }

    #[test]
    fn test_rapid_switches_settle_on_last() {
        let mut shell = MainShell::new();
        assert!(shell.change_page(1, 0.0));
        assert!(shell.change_page(2, 0.1));
        assert_eq!(shell.current_page_index(), 1);

        shell.tick(0.35);
        assert_eq!(shell.current_page_index(), 2);
        assert_eq!(shell.title(), "Zhenxun Bot GUI - Environment");
        assert_eq!(shell.overlay(0.35).map(|(p, _)| p), Some(1));

        shell.tick(0.7);
        assert!(!shell.is_animating());
    }

    #[test]
    fn test_reclicking_target_cancels_queued_page() {
        let mut shell = MainShell::new();
        assert!(shell.change_page(1, 0.0));
        assert!(shell.change_page(2, 0.05));
        assert!(shell.change_page(1, 0.1));
        assert_eq!(shell.sidebar.active(), 1);

        shell.tick(0.35);
        shell.tick(0.8);
        assert_eq!(shell.current_page_index(), 1);
        assert_eq!(shell.sidebar.active(), 1);
        assert_eq!(shell.title(), "Zhenxun Bot GUI - Settings");
        assert!(!shell.is_animating());
    }

    #[test]
    fn test_restore_resets_fullscreen_size() {
        let saved = WindowGeometry {
            size: [1920, 1080],
            position: [0, 0],
        };
        assert_eq!(
            restore_geometry(saved, [1920, 1080]),
            WindowGeometry {
                size: [1200, 800],
                position: [360, 140],
            }
        );

        let normal = WindowGeometry {
            size: [1280, 720],
            position: [50, 60],
        };
        assert_eq!(restore_geometry(normal, [1920, 1080]), normal);
    }

    #[test]
    fn test_persist_skips_maximized_and_fullscreen() {
        let geometry = WindowGeometry {
            size: [1280, 720],
            position: [50, 60],
        };
        assert_eq!(
            geometry_to_persist(geometry, false, Some([1920, 1080])),
            Some(geometry)
        );
        assert_eq!(geometry_to_persist(geometry, true, Some([1920, 1080])), None);

        let full = WindowGeometry {
            size: [2560, 1440],
            position: [0, 0],
        };
        assert_eq!(geometry_to_persist(full, false, Some([2560, 1440])), None);
    }
}
