//! Window lifecycle management.
//!
//! Tracks which surface (main panel or mini-bar) is active, converts
//! close requests into hides until an explicit quit, and owns the tooltip
//! and mini-bar fade state. The rules live here as a plain state machine;
//! the app layer translates the resulting state into viewport commands.

use eframe::egui;

use super::animation::{Fade, REST_OPACITY};
use super::geometry::TooltipPayload;

/// Which surface the persisted mode flag selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceMode {
    /// Full control panel
    Normal,
    /// Compact always-on-top strip
    MiniBar,
}

/// Result of a window close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Intercept the close and hide the surface instead
    Hide,
    /// Quit was requested earlier; let the close proceed
    Quit,
}

pub struct WindowManager {
    mode: SurfaceMode,
    /// Whether the active surface is currently shown
    active_visible: bool,
    mini_bar_created: bool,
    tooltip_created: bool,
    tooltip: Option<TooltipPayload>,
    quitting: bool,
    /// Hover fade for the mini-bar surface
    pub mini_bar_fade: Fade,
}

impl WindowManager {
    pub fn new(mode: SurfaceMode, start_minimized: bool) -> Self {
        Self {
            mode,
            active_visible: !start_minimized,
            mini_bar_created: mode == SurfaceMode::MiniBar,
            tooltip_created: false,
            tooltip: None,
            quitting: false,
            mini_bar_fade: Fade::new(REST_OPACITY),
        }
    }

    pub fn mode(&self) -> SurfaceMode {
        self.mode
    }

    /// Exactly one of these two is true while the active surface is shown;
    /// they are never true together.
    pub fn main_window_visible(&self) -> bool {
        self.mode == SurfaceMode::Normal && self.active_visible
    }

    pub fn mini_bar_visible(&self) -> bool {
        self.mode == SurfaceMode::MiniBar && self.active_visible
    }

    pub fn mini_bar_created(&self) -> bool {
        self.mini_bar_created
    }

    /// Swap to the mini-bar: the outgoing main window hides, the mini-bar
    /// shows (created on first use). The caller rebuilds the tray menu
    /// afterwards.
    pub fn switch_to_mini_bar_mode(&mut self) {
        self.mode = SurfaceMode::MiniBar;
        self.mini_bar_created = true;
        self.active_visible = true;
        self.mini_bar_fade = Fade::new(REST_OPACITY);
    }

    /// Swap back to the main panel. The tooltip dies with the mini-bar.
    pub fn switch_to_normal_mode(&mut self) {
        self.mode = SurfaceMode::Normal;
        self.active_visible = true;
        self.mini_bar_created = false;
        self.tooltip_created = false;
        self.tooltip = None;
    }

    /// Toggle the active surface, returning whether it is now visible.
    pub fn toggle_active_visible(&mut self) -> bool {
        self.active_visible = !self.active_visible;
        if !self.active_visible {
            self.hide_tooltip();
        }
        self.active_visible
    }

    pub fn show_active(&mut self) {
        self.active_visible = true;
    }

    pub fn hide_active(&mut self) {
        self.active_visible = false;
        self.hide_tooltip();
    }

    /// A surface's own close button was pressed. Until quit is requested
    /// this converts to a hide; afterwards the close proceeds.
    pub fn handle_close_request(&mut self) -> CloseOutcome {
        if self.quitting {
            CloseOutcome::Quit
        } else {
            self.hide_active();
            CloseOutcome::Hide
        }
    }

    /// One-way latch; once set, close interception is bypassed for good.
    pub fn request_quit(&mut self) {
        self.quitting = true;
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting
    }

    /// Show the tooltip with new content. The tooltip window is created
    /// lazily on first use and reused afterwards.
    pub fn show_tooltip(&mut self, payload: TooltipPayload) {
        self.tooltip_created = true;
        self.tooltip = Some(payload);
    }

    /// Hide without destroying; the window is reused on the next hover.
    pub fn hide_tooltip(&mut self) {
        self.tooltip = None;
    }

    pub fn tooltip(&self) -> Option<&TooltipPayload> {
        self.tooltip.as_ref()
    }

    pub fn tooltip_created(&self) -> bool {
        self.tooltip_created
    }
}

/// Detects when a user-initiated window move has settled, so geometry is
/// persisted (and edge-snapped) once per move instead of on every frame
/// of the drag.
#[derive(Debug, Default)]
pub struct MoveTracker {
    last: Option<(f32, f32)>,
    pending: Option<(f32, f32)>,
}

impl MoveTracker {
    /// Feed the current top-left position. Returns `Some(pos)` on the
    /// first frame the position holds still after having moved.
    pub fn observe(&mut self, pos: (f32, f32)) -> Option<(f32, f32)> {
        let settled = match self.last {
            Some(last) if last == pos => self.pending.take().map(|_| pos),
            Some(_) => {
                self.pending = Some(pos);
                None
            }
            None => None,
        };
        self.last = Some(pos);
        settled
    }

    /// Forget the baseline, e.g. after the window was repositioned
    /// programmatically.
    pub fn reset(&mut self) {
        self.last = None;
        self.pending = None;
    }
}

/// Viewport commands that resize a non-resizable frameless window. The
/// resizable toggle around the size change is required: without it the
/// size request is silently dropped on some platforms.
pub fn resize_frameless(size: egui::Vec2) -> [egui::ViewportCommand; 3] {
    [
        egui::ViewportCommand::Resizable(true),
        egui::ViewportCommand::InnerSize(size),
        egui::ViewportCommand::Resizable(false),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::geometry::Bounds;

    fn exactly_one_visible(wm: &WindowManager) -> bool {
        wm.main_window_visible() != wm.mini_bar_visible()
    }

    #[test]
    fn mode_switches_keep_exactly_one_surface_visible() {
        let mut wm = WindowManager::new(SurfaceMode::Normal, false);
        assert!(wm.main_window_visible());
        assert!(exactly_one_visible(&wm));

        wm.switch_to_mini_bar_mode();
        assert!(wm.mini_bar_visible());
        assert!(!wm.main_window_visible());
        assert!(exactly_one_visible(&wm));

        wm.switch_to_normal_mode();
        assert!(wm.main_window_visible());
        assert!(!wm.mini_bar_visible());
        assert!(exactly_one_visible(&wm));
    }

    #[test]
    fn start_minimized_hides_the_active_surface() {
        let wm = WindowManager::new(SurfaceMode::Normal, true);
        assert!(!wm.main_window_visible());
        assert!(!wm.mini_bar_visible());
    }

    #[test]
    fn toggle_round_trips_visibility() {
        let mut wm = WindowManager::new(SurfaceMode::Normal, false);
        assert!(!wm.toggle_active_visible());
        assert!(!wm.main_window_visible());
        assert!(wm.toggle_active_visible());
        assert!(wm.main_window_visible());
    }

    #[test]
    fn close_hides_until_quit_latch_is_set() {
        let mut wm = WindowManager::new(SurfaceMode::Normal, false);
        assert_eq!(wm.handle_close_request(), CloseOutcome::Hide);
        assert!(!wm.main_window_visible());

        wm.show_active();
        wm.request_quit();
        assert_eq!(wm.handle_close_request(), CloseOutcome::Quit);
        // The latch is one-way
        assert_eq!(wm.handle_close_request(), CloseOutcome::Quit);
    }

    #[test]
    fn tooltip_is_lazy_reused_and_dies_with_mini_bar() {
        let mut wm = WindowManager::new(SurfaceMode::MiniBar, false);
        assert!(!wm.tooltip_created());

        let payload = TooltipPayload {
            text: "Speakers (Realtek Audio)".to_string(),
            element_rect: Bounds::new(4.0, 4.0, 60.0, 32.0),
        };
        wm.show_tooltip(payload.clone());
        assert!(wm.tooltip_created());
        assert_eq!(wm.tooltip(), Some(&payload));

        // Hidden between showings, but the window survives
        wm.hide_tooltip();
        assert!(wm.tooltip_created());
        assert_eq!(wm.tooltip(), None);

        // Destroyed only when the mini-bar closes
        wm.switch_to_normal_mode();
        assert!(!wm.tooltip_created());
    }

    #[test]
    fn hiding_the_mini_bar_hides_the_tooltip() {
        let mut wm = WindowManager::new(SurfaceMode::MiniBar, false);
        wm.show_tooltip(TooltipPayload {
            text: "x".to_string(),
            element_rect: Bounds::new(0.0, 0.0, 1.0, 1.0),
        });
        wm.toggle_active_visible();
        assert_eq!(wm.tooltip(), None);
        assert!(wm.tooltip_created());
    }

    #[test]
    fn move_tracker_fires_once_after_motion_stops() {
        let mut tracker = MoveTracker::default();
        assert_eq!(tracker.observe((10.0, 10.0)), None);
        assert_eq!(tracker.observe((10.0, 10.0)), None);

        // Drag across several frames
        assert_eq!(tracker.observe((20.0, 10.0)), None);
        assert_eq!(tracker.observe((30.0, 10.0)), None);

        // First still frame reports the settled position, once
        assert_eq!(tracker.observe((30.0, 10.0)), Some((30.0, 10.0)));
        assert_eq!(tracker.observe((30.0, 10.0)), None);
    }

    #[test]
    fn move_tracker_reset_clears_the_baseline() {
        let mut tracker = MoveTracker::default();
        tracker.observe((10.0, 10.0));
        tracker.observe((20.0, 10.0));
        tracker.reset();
        assert_eq!(tracker.observe((20.0, 10.0)), None);
        assert_eq!(tracker.observe((20.0, 10.0)), None);
    }

    #[test]
    fn resize_workaround_preserves_toggle_order() {
        let size = egui::vec2(280.0, 332.0);
        let commands = resize_frameless(size);
        assert_eq!(commands[0], egui::ViewportCommand::Resizable(true));
        assert_eq!(commands[1], egui::ViewportCommand::InnerSize(size));
        assert_eq!(commands[2], egui::ViewportCommand::Resizable(false));
    }
}
