//! Time-based tweens driven by egui's frame clock.
//!
//! Everything takes `now` in seconds (`ctx.input(|i| i.time)`) so the state
//! machines built on top can be stepped in tests without a window.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    OutCubic,
    InCubic,
    /// Overshoots slightly before settling
    OutBack,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::OutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::InCubic => t * t * t,
            Easing::OutBack => {
                const C1: f32 = 1.70158;
                const C3: f32 = C1 + 1.0;
                1.0 + C3 * (t - 1.0).powi(3) + C1 * (t - 1.0).powi(2)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub duration: f64,
    pub easing: Easing,
    pub started_at: f64,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration_ms: u64, easing: Easing, now: f64) -> Self {
        Self {
            from,
            to,
            duration: duration_ms as f64 / 1000.0,
            easing,
            started_at: now,
        }
    }

    /// Linear progress in 0..=1
    pub fn progress(&self, now: f64) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (((now - self.started_at) / self.duration) as f32).clamp(0.0, 1.0)
    }

    pub fn value(&self, now: f64) -> f32 {
        let eased = self.easing.apply(self.progress(now));
        self.from + (self.to - self.from) * eased
    }

    pub fn is_finished(&self, now: f64) -> bool {
        self.progress(now) >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_endpoints() {
        for easing in [Easing::Linear, Easing::OutCubic, Easing::InCubic, Easing::OutBack] {
            assert!((easing.apply(0.0)).abs() < 1e-5, "{:?}", easing);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-5, "{:?}", easing);
        }
    }

    #[test]
    fn test_out_back_overshoots() {
        assert!(Easing::OutBack.apply(0.7) > 1.0);
    }

    #[test]
    fn test_tween_timeline() {
        let tween = Tween::new(1.0, 0.0, 300, Easing::OutCubic, 10.0);
        assert_eq!(tween.value(10.0), 1.0);
        assert!(tween.value(10.15) < 0.5);
        assert!(!tween.is_finished(10.29));
        assert!(tween.is_finished(10.3));
        assert_eq!(tween.value(11.0), 0.0);
    }
}
