//! Shows queued dialogs one at a time.

use super::dialog::{DialogEvent, DialogId, DialogSpec, GlobalDialog};
use crate::theme::Palette;
use eframe::egui;
use std::collections::VecDeque;

#[derive(Debug, Default)]
pub struct DialogHost {
    next_id: u64,
    dialogs: VecDeque<GlobalDialog>,
    events: Vec<(DialogId, DialogEvent)>,
}

impl DialogHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a dialog. It opens once every dialog ahead of it has closed.
    pub fn show(&mut self, spec: DialogSpec) -> DialogId {
        self.next_id += 1;
        let id = DialogId(self.next_id);
        self.dialogs.push_back(GlobalDialog::new(id, spec));
        id
    }

    pub fn get_mut(&mut self, id: DialogId) -> Option<&mut GlobalDialog> {
        self.dialogs.iter_mut().find(|d| d.id() == id)
    }

    pub fn is_showing(&self, id: DialogId) -> bool {
        self.dialogs.iter().any(|d| d.id() == id && !d.is_closed())
    }

    pub fn has_active(&self) -> bool {
        !self.dialogs.is_empty()
    }

    pub fn dismiss(&mut self, id: DialogId, now: f64) {
        if let Some(dialog) = self.get_mut(id) {
            dialog.dismiss(now);
        }
    }

    /// Advance without rendering; used by `show_active` and tests.
    pub fn step(&mut self, now: f64) {
        // Dialogs dismissed while still queued are dropped as well
        loop {
            for dialog in self.dialogs.iter_mut() {
                let events = dialog.take_events();
                let id = dialog.id();
                self.events.extend(events.into_iter().map(|e| (id, e)));
            }
            let Some(front) = self.dialogs.front_mut() else {
                break;
            };
            front.activate(now);
            front.tick(now);
            if front.is_closed() {
                self.dialogs.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn show_active(&mut self, ctx: &egui::Context, palette: &Palette) {
        let now = ctx.input(|i| i.time);
        self.step(now);
        if let Some(front) = self.dialogs.front_mut() {
            front.show(ctx, palette, now);
        }
        self.step(now);
    }

    pub fn active_mut(&mut self) -> Option<&mut GlobalDialog> {
        self.dialogs.front_mut()
    }

    pub fn drain_events(&mut self) -> Vec<(DialogId, DialogEvent)> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_dialog_at_a_time() {
        let mut host = DialogHost::new();
        let first = host.show(DialogSpec::info("First", ""));
        let second = host.show(DialogSpec::info("Second", ""));

        host.step(0.0);
        assert_eq!(host.active_mut().map(|d| d.id()), Some(first));
        assert!(host.get_mut(second).unwrap().opacity(0.1) == 0.0);

        assert!(host.get_mut(first).unwrap().click(0, 0.3));
        host.step(0.4);
        host.step(0.6);
        assert_eq!(host.active_mut().map(|d| d.id()), Some(second));
        assert_eq!(
            host.drain_events(),
            vec![(first, DialogEvent::ButtonClicked("OK".into()))]
        );
        assert!(host.drain_events().is_empty());
    }

    #[test]
    fn test_dismissed_waiting_dialog_is_skipped() {
        let mut host = DialogHost::new();
        let first = host.show(DialogSpec::info("First", ""));
        let second = host.show(DialogSpec::info("Second", ""));
        host.step(0.0);
        host.dismiss(second, 0.1);
        host.dismiss(first, 0.1);

        host.step(0.5);
        assert!(!host.has_active());
        assert!(host.drain_events().is_empty());
    }
}
