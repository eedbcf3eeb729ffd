//! Page container that animates between pages.
//!
//! Only one transition runs at a time. A request that arrives mid-transition
//! lands in a single pending slot (latest wins) and starts when the running
//! one completes.

use crate::anim::{Easing, Tween};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionKind {
    #[default]
    Fade,
    /// Rendered as a fade
    Slide,
    Scale,
}

impl TransitionKind {
    fn duration_ms(self) -> u64 {
        match self {
            TransitionKind::Fade | TransitionKind::Slide => 300,
            TransitionKind::Scale => 350,
        }
    }

    fn easing(self) -> Easing {
        match self {
            TransitionKind::Fade | TransitionKind::Slide => Easing::OutCubic,
            TransitionKind::Scale => Easing::OutBack,
        }
    }

    pub fn effect_scope(self) -> EffectScope {
        match self {
            TransitionKind::Fade | TransitionKind::Slide => EffectScope::Container,
            TransitionKind::Scale => EffectScope::TargetOnly,
        }
    }
}

/// What the opacity effect is applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectScope {
    Container,
    TargetOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Already showing that page
    Unchanged,
    /// Index outside the page table
    Rejected,
    Started,
    /// Will run after the current transition
    Queued,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionCompleted {
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Running {
    target: usize,
    kind: TransitionKind,
    tween: Tween,
}

#[derive(Debug, Clone)]
pub struct AnimatedPageHost {
    page_count: usize,
    current: usize,
    running: Option<Running>,
    pending: Option<(usize, TransitionKind)>,
}

impl AnimatedPageHost {
    pub fn new(page_count: usize) -> Self {
        Self {
            page_count,
            current: 0,
            running: None,
            pending: None,
        }
    }

    /// The page that is (or is becoming) visible
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn is_transitioning(&self) -> bool {
        self.running.is_some()
    }

    pub fn pending(&self) -> Option<usize> {
        self.pending.map(|(index, _)| index)
    }

    pub fn switch(&mut self, target: usize, kind: TransitionKind, now: f64) -> SwitchOutcome {
        if target >= self.page_count {
            return SwitchOutcome::Rejected;
        }

        if self.running.is_some() {
            debug!("Transition running, queueing page {}", target);
            self.pending = Some((target, kind));
            return SwitchOutcome::Queued;
        }

        if target == self.current {
            return SwitchOutcome::Unchanged;
        }

        self.start(target, kind, now);
        SwitchOutcome::Started
    }

    fn start(&mut self, target: usize, kind: TransitionKind, now: f64) {
        self.current = target;
        self.running = Some(Running {
            target,
            kind,
            tween: Tween::new(0.0, 1.0, kind.duration_ms(), kind.easing(), now),
        });
    }

    /// Advance the clock. Returns the completion exactly once per transition.
    pub fn tick(&mut self, now: f64) -> Option<TransitionCompleted> {
        let running = self.running?;
        if !running.tween.is_finished(now) {
            return None;
        }

        self.running = None;
        // The finished page stays current and fully opaque.
        self.current = running.target;
        let completed = TransitionCompleted {
            index: running.target,
        };

        if let Some((next, kind)) = self.pending.take() {
            if next != self.current {
                self.start(next, kind, now);
            }
        }
        Some(completed)
    }

    /// Opacity for the current page
    pub fn opacity(&self, now: f64) -> f32 {
        match &self.running {
            Some(r) => r.tween.value(now).clamp(0.0, 1.0),
            None => 1.0,
        }
    }

    /// Scale factor for `Scale` transitions, 1.0 otherwise
    pub fn scale(&self, now: f64) -> f32 {
        match &self.running {
            Some(r) if r.kind == TransitionKind::Scale => 0.9 + 0.1 * r.tween.value(now),
            _ => 1.0,
        }
    }

    pub fn effect_scope(&self) -> Option<EffectScope> {
        self.running.map(|r| r.kind.effect_scope())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_to_current_is_noop() {
        let mut host = AnimatedPageHost::new(3);
        assert_eq!(host.switch(0, TransitionKind::Fade, 0.0), SwitchOutcome::Unchanged);
        assert!(!host.is_transitioning());
        assert_eq!(host.tick(1.0), None);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut host = AnimatedPageHost::new(3);
        assert_eq!(host.switch(3, TransitionKind::Fade, 0.0), SwitchOutcome::Rejected);
        assert_eq!(host.current_index(), 0);
    }

    #[test]
    fn test_completion_fires_once() {
        let mut host = AnimatedPageHost::new(3);
        assert_eq!(host.switch(2, TransitionKind::Fade, 0.0), SwitchOutcome::Started);
        assert!(host.is_transitioning());
        assert_eq!(host.current_index(), 2);
        assert!(host.opacity(0.0) < 0.01);

        assert_eq!(host.tick(0.1), None);
        assert_eq!(host.tick(0.31), Some(TransitionCompleted { index: 2 }));
        assert_eq!(host.tick(0.5), None);
        assert!(!host.is_transitioning());
        assert_eq!(host.opacity(0.5), 1.0);
    }

    #[test]
    fn test_latest_pending_wins() {
        let mut host = AnimatedPageHost::new(3);
        host.switch(1, TransitionKind::Fade, 0.0);
        assert_eq!(host.switch(2, TransitionKind::Fade, 0.1), SwitchOutcome::Queued);
        assert_eq!(host.switch(0, TransitionKind::Scale, 0.2), SwitchOutcome::Queued);
        assert_eq!(host.pending(), Some(0));

        assert_eq!(host.tick(0.4), Some(TransitionCompleted { index: 1 }));
        assert!(host.is_transitioning());
        assert_eq!(host.current_index(), 0);
        assert_eq!(host.effect_scope(), Some(EffectScope::TargetOnly));

        // Scale runs for 350ms
        assert_eq!(host.tick(0.7), None);
        assert_eq!(host.tick(0.76), Some(TransitionCompleted { index: 0 }));
    }

    #[test]
    fn test_pending_equal_to_current_dropped() {
        let mut host = AnimatedPageHost::new(3);
        host.switch(1, TransitionKind::Fade, 0.0);
        host.switch(1, TransitionKind::Fade, 0.1);

        assert!(host.tick(0.3).is_some());
        assert!(!host.is_transitioning());
        assert_eq!(host.pending(), None);
    }
}
