//! Opacity fade state machine.
//!
//! Drives the mini-bar's hover fade as an explicit state machine advanced
//! by scheduler ticks. Retargeting mid-transition restarts from the
//! current interpolated opacity, not the previous target, so a quick
//! hover-out/hover-in never snaps visually. Only one animation exists per
//! window: starting a new fade replaces the old state outright.

use std::time::Duration;

/// Number of discrete linear steps per fade.
pub const FADE_STEPS: u32 = 8;

/// Interval between steps; a full fade takes `FADE_STEPS * STEP_INTERVAL`.
pub const STEP_INTERVAL: Duration = Duration::from_millis(20);

/// Mini-bar opacity while hovered.
pub const HOVER_OPACITY: f32 = 1.0;

/// Mini-bar opacity at rest.
pub const REST_OPACITY: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fade {
    Idle {
        opacity: f32,
    },
    Animating {
        from: f32,
        to: f32,
        steps_done: u32,
    },
}

impl Fade {
    pub fn new(opacity: f32) -> Self {
        Fade::Idle { opacity }
    }

    /// The opacity to render right now.
    pub fn current_opacity(&self) -> f32 {
        match *self {
            Fade::Idle { opacity } => opacity,
            Fade::Animating {
                from,
                to,
                steps_done,
            } => from + (to - from) * steps_done as f32 / FADE_STEPS as f32,
        }
    }

    /// Begin a fade toward `target` from wherever the opacity currently
    /// is, cancelling any in-flight animation. Starting a fade to the
    /// current value settles immediately.
    pub fn start(&mut self, target: f32) {
        let from = self.current_opacity();
        *self = if (from - target).abs() < f32::EPSILON {
            Fade::Idle { opacity: target }
        } else {
            Fade::Animating {
                from,
                to: target,
                steps_done: 0,
            }
        };
    }

    /// Advance one step. The final step lands exactly on the target.
    pub fn tick(&mut self) {
        if let Fade::Animating {
            from,
            to,
            steps_done,
        } = *self
        {
            let steps_done = steps_done + 1;
            *self = if steps_done >= FADE_STEPS {
                Fade::Idle { opacity: to }
            } else {
                Fade::Animating {
                    from,
                    to,
                    steps_done,
                }
            };
        }
    }

    pub fn is_animating(&self) -> bool {
        matches!(self, Fade::Animating { .. })
    }

    /// Where the fade will settle: the target while animating, the
    /// current opacity otherwise.
    pub fn destination(&self) -> f32 {
        match *self {
            Fade::Idle { opacity } => opacity,
            Fade::Animating { to, .. } => to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_fade_reaches_target_exactly() {
        let mut fade = Fade::new(REST_OPACITY);
        fade.start(HOVER_OPACITY);
        for _ in 0..FADE_STEPS {
            fade.tick();
        }
        assert_eq!(fade, Fade::Idle { opacity: 1.0 });
    }

    #[test]
    fn retarget_mid_transition_starts_from_current_opacity() {
        let mut fade = Fade::new(0.3);
        fade.start(1.0);
        // Advance partway, then reverse direction
        for _ in 0..3 {
            fade.tick();
        }
        let mid = fade.current_opacity();
        fade.start(0.3);
        match fade {
            Fade::Animating { from, to, .. } => {
                assert_eq!(from, mid);
                assert_eq!(to, 0.3);
            }
            Fade::Idle { .. } => panic!("expected a restarted animation"),
        }
    }

    #[test]
    fn retarget_reaches_exact_target_without_overshoot() {
        let mut fade = Fade::new(0.6);
        fade.start(1.0);
        let mut previous = fade.current_opacity();
        while fade.is_animating() {
            fade.tick();
            let current = fade.current_opacity();
            assert!(current >= previous, "opacity went backwards");
            assert!(current <= 1.0, "opacity overshot the target");
            previous = current;
        }
        assert_eq!(fade.current_opacity(), 1.0);
    }

    #[test]
    fn monotone_descent_on_fade_out() {
        let mut fade = Fade::new(1.0);
        fade.start(0.3);
        let mut previous = fade.current_opacity();
        while fade.is_animating() {
            fade.tick();
            assert!(fade.current_opacity() <= previous);
            previous = fade.current_opacity();
        }
        assert_eq!(fade.current_opacity(), 0.3);
    }

    #[test]
    fn start_to_current_value_is_a_no_op() {
        let mut fade = Fade::new(1.0);
        fade.start(1.0);
        assert!(!fade.is_animating());
    }

    #[test]
    fn tick_in_idle_does_nothing() {
        let mut fade = Fade::new(0.5);
        fade.tick();
        assert_eq!(fade, Fade::Idle { opacity: 0.5 });
    }
}
