//! Window placement math.
//!
//! Pure helpers for edge snapping, work-area clamping, and tooltip
//! placement. All coordinates are screen points with the origin at the
//! top-left of the work area's display.

/// Distance at which a window edge snaps to the work-area edge.
pub const SNAP_THRESHOLD: f32 = 20.0;

/// Vertical gap between the tooltip and the mini-bar's top edge.
pub const TOOLTIP_GAP: f32 = 8.0;

/// A window bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// The usable area of a display (excludes the taskbar).
pub type WorkArea = Bounds;

/// Snap `window` to the edges of `work_area`. Each axis snaps
/// independently to its nearer edge when the distance is below
/// `threshold`, so a window near a corner snaps on both axes. Returns the
/// (possibly unchanged) top-left position.
pub fn snap_to_edges(window: Bounds, work_area: WorkArea, threshold: f32) -> (f32, f32) {
    let x = snap_axis(
        window.x,
        window.x - work_area.x,
        work_area.right() - window.right(),
        work_area.x,
        work_area.right() - window.width,
        threshold,
    );
    let y = snap_axis(
        window.y,
        window.y - work_area.y,
        work_area.bottom() - window.bottom(),
        work_area.y,
        work_area.bottom() - window.height,
        threshold,
    );
    (x, y)
}

fn snap_axis(
    current: f32,
    near_distance: f32,
    far_distance: f32,
    near_edge: f32,
    far_edge: f32,
    threshold: f32,
) -> f32 {
    let near = near_distance.abs();
    let far = far_distance.abs();
    if near <= far && near < threshold {
        near_edge
    } else if far < near && far < threshold {
        far_edge
    } else {
        current
    }
}

/// Clamp a window's top-left so at least its full bounds stay inside the
/// work area, for restoring persisted positions on changed displays.
pub fn clamp_to_work_area(window: Bounds, work_area: WorkArea) -> (f32, f32) {
    let max_x = (work_area.right() - window.width).max(work_area.x);
    let max_y = (work_area.bottom() - window.height).max(work_area.y);
    (
        window.x.clamp(work_area.x, max_x),
        window.y.clamp(work_area.y, max_y),
    )
}

/// A tooltip request payload: the text plus the hovered element's rect in
/// mini-bar-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipPayload {
    pub text: String,
    pub element_rect: Bounds,
}

/// Place a tooltip horizontally centered on the hovered element and a
/// fixed gap above the mini-bar's top edge. The element rect is relative
/// to the mini-bar, which contributes its own screen position because the
/// tooltip is a separate top-level surface.
pub fn tooltip_position(
    mini_bar_pos: (f32, f32),
    element_rect: Bounds,
    tooltip_size: (f32, f32),
) -> (f32, f32) {
    let element_center = mini_bar_pos.0 + element_rect.x + element_rect.width / 2.0;
    let x = element_center - tooltip_size.0 / 2.0;
    let y = mini_bar_pos.1 - tooltip_size.1 - TOOLTIP_GAP;
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORK: WorkArea = Bounds {
        x: 0.0,
        y: 0.0,
        width: 1920.0,
        height: 1040.0,
    };

    #[test]
    fn snaps_near_edge_and_leaves_far_axis() {
        let window = Bounds::new(5.0, 300.0, 200.0, 42.0);
        let (x, y) = snap_to_edges(window, WORK, SNAP_THRESHOLD);
        assert_eq!(x, 0.0);
        assert_eq!(y, 300.0);
    }

    #[test]
    fn snaps_to_right_edge() {
        let window = Bounds::new(1910.0 - 200.0, 500.0, 200.0, 42.0);
        let (x, y) = snap_to_edges(window, WORK, SNAP_THRESHOLD);
        assert_eq!(x, 1920.0 - 200.0);
        assert_eq!(y, 500.0);
    }

    #[test]
    fn corner_snap_applies_both_axes() {
        let window = Bounds::new(12.0, 1030.0 - 42.0, 200.0, 42.0);
        let (x, y) = snap_to_edges(window, WORK, SNAP_THRESHOLD);
        assert_eq!(x, 0.0);
        assert_eq!(y, 1040.0 - 42.0);
    }

    #[test]
    fn distance_at_threshold_does_not_snap() {
        let window = Bounds::new(20.0, 500.0, 200.0, 42.0);
        let (x, _) = snap_to_edges(window, WORK, SNAP_THRESHOLD);
        assert_eq!(x, 20.0);
    }

    #[test]
    fn center_position_is_untouched() {
        let window = Bounds::new(800.0, 400.0, 200.0, 42.0);
        assert_eq!(snap_to_edges(window, WORK, SNAP_THRESHOLD), (800.0, 400.0));
    }

    #[test]
    fn work_area_offset_is_respected() {
        let work = Bounds::new(1920.0, 0.0, 1920.0, 1040.0);
        let window = Bounds::new(1925.0, 300.0, 200.0, 42.0);
        let (x, y) = snap_to_edges(window, work, SNAP_THRESHOLD);
        assert_eq!(x, 1920.0);
        assert_eq!(y, 300.0);
    }

    #[test]
    fn clamp_pulls_offscreen_window_back() {
        let window = Bounds::new(2000.0, -50.0, 280.0, 400.0);
        let (x, y) = clamp_to_work_area(window, WORK);
        assert_eq!(x, 1920.0 - 280.0);
        assert_eq!(y, 0.0);
    }

    #[test]
    fn tooltip_centers_on_element_above_bar() {
        let pos = tooltip_position(
            (100.0, 500.0),
            Bounds::new(40.0, 4.0, 60.0, 32.0),
            (120.0, 24.0),
        );
        // Element center = 100 + 40 + 30 = 170; tooltip left = 170 - 60
        assert_eq!(pos.0, 110.0);
        assert_eq!(pos.1, 500.0 - 24.0 - TOOLTIP_GAP);
    }
}
