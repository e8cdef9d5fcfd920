//! Mini-bar window.
//!
//! A compact always-on-top strip with one button per visible device.
//! Hovering a button raises a tooltip request carrying the full device
//! name and the button's rect in mini-bar coordinates; the app positions
//! the tooltip window from it. The whole strip fades between rest and
//! hover opacity, driven by the window manager's fade state machine.

use eframe::egui;

use crate::audio::PlaybackDevice;
use crate::settings::Layout;

use super::geometry::{Bounds, TooltipPayload};
use super::theme::Theme;

/// Strip thickness in the minor axis.
pub const BAR_THICKNESS: f32 = 42.0;

/// Actions that can be triggered from the mini-bar UI.
#[derive(Debug, Clone, PartialEq)]
pub enum MiniBarAction {
    /// Make a device the playback default
    SelectDevice(String),
    /// Swap back to the main panel surface
    SwitchToNormal,
    /// Hide the window (close button)
    HideWindow,
    /// Show the tooltip for a hovered device button
    ShowTooltip(TooltipPayload),
    /// No device button is hovered anymore
    HideTooltip,
}

/// Data the mini-bar renders from.
pub struct MiniBarModel {
    pub devices: Vec<PlaybackDevice>,
    pub layout: Layout,
    /// Current fade opacity, applied to the strip content
    pub opacity: f32,
}

/// Mini-bar view state.
pub struct MiniBarView {
    actions: Vec<MiniBarAction>,
    tooltip_shown_for: Option<String>,
}

impl MiniBarView {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            tooltip_shown_for: None,
        }
    }

    /// Render the strip. Returns whether the pointer is over the window,
    /// which drives the hover fade.
    pub fn show(&mut self, ctx: &egui::Context, model: &MiniBarModel) -> bool {
        let dark = ctx.style().visuals.dark_mode;
        let theme = Theme::from_dark_mode(dark);

        let mut hovered = false;
        let mut hovered_device: Option<(String, TooltipPayload)> = None;

        egui::CentralPanel::default()
            .frame(
                egui::Frame::none()
                    .fill(theme.background)
                    .rounding(6.0)
                    .inner_margin(4.0),
            )
            .show(ctx, |ui| {
                ui.set_opacity(model.opacity);

                let render = |ui: &mut egui::Ui,
                              view: &mut Self,
                              hovered_device: &mut Option<(String, TooltipPayload)>| {
                    view.drag_grip(ui, ctx, &theme);
                    for device in &model.devices {
                        view.device_button(ui, device, &theme, hovered_device);
                    }
                    view.controls(ui, &theme);
                };

                match model.layout {
                    Layout::Horizontal => {
                        ui.horizontal(|ui| render(ui, self, &mut hovered_device));
                    }
                    Layout::Vertical => {
                        ui.vertical(|ui| render(ui, self, &mut hovered_device));
                    }
                }

                // Checked after layout so the whole strip counts as hover
                hovered = ui.ui_contains_pointer();
            });

        // Tooltip requests are edge-triggered: one Show per newly hovered
        // button, one Hide when the hover ends
        match hovered_device {
            Some((id, payload)) => {
                if self.tooltip_shown_for.as_deref() != Some(id.as_str()) {
                    self.tooltip_shown_for = Some(id);
                    self.actions.push(MiniBarAction::ShowTooltip(payload));
                }
            }
            None => {
                if self.tooltip_shown_for.take().is_some() {
                    self.actions.push(MiniBarAction::HideTooltip);
                }
            }
        }

        hovered
    }

    fn drag_grip(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, theme: &Theme) {
        let (rect, response) =
            ui.allocate_exact_size(egui::vec2(14.0, 28.0), egui::Sense::click_and_drag());
        ui.painter().text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            "⋮",
            egui::FontId::proportional(16.0),
            theme.text_secondary,
        );
        if response.drag_started() {
            ctx.send_viewport_cmd(egui::ViewportCommand::StartDrag);
        }
    }

    fn device_button(
        &mut self,
        ui: &mut egui::Ui,
        device: &PlaybackDevice,
        theme: &Theme,
        hovered_device: &mut Option<(String, TooltipPayload)>,
    ) {
        let name = device.parsed_name();
        let text = if device.is_default {
            egui::RichText::new(name.kind).color(theme.accent).strong()
        } else {
            egui::RichText::new(name.kind).color(theme.text_primary)
        };

        let response = ui.add(egui::Button::new(text).fill(theme.surface).rounding(4.0));

        if response.clicked() && !device.is_default {
            self.actions
                .push(MiniBarAction::SelectDevice(device.id.clone()));
        }

        if response.hovered() {
            let rect = response.rect;
            *hovered_device = Some((
                device.id.clone(),
                TooltipPayload {
                    text: device.name.clone(),
                    element_rect: Bounds::new(
                        rect.min.x,
                        rect.min.y,
                        rect.width(),
                        rect.height(),
                    ),
                },
            ));
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui, theme: &Theme) {
        ui.add_space(2.0);
        if ui
            .small_button(egui::RichText::new("⊞").color(theme.text_secondary))
            .on_hover_text("Open panel")
            .clicked()
        {
            self.actions.push(MiniBarAction::SwitchToNormal);
        }
        if ui
            .small_button(egui::RichText::new("✕").color(theme.text_secondary))
            .on_hover_text("Hide")
            .clicked()
        {
            self.actions.push(MiniBarAction::HideWindow);
        }
    }

    /// Take all pending actions.
    pub fn take_actions(&mut self) -> Vec<MiniBarAction> {
        std::mem::take(&mut self.actions)
    }
}

impl Default for MiniBarView {
    fn default() -> Self {
        Self::new()
    }
}

/// Size of the strip for a device count, used when creating the viewport.
pub fn bar_size(device_count: usize, layout: Layout) -> egui::Vec2 {
    let buttons = device_count.max(1) as f32;
    let major = 14.0 + buttons * 78.0 + 52.0;
    match layout {
        Layout::Horizontal => egui::vec2(major, BAR_THICKNESS),
        Layout::Vertical => egui::vec2(96.0, major),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_size_grows_with_device_count() {
        let two = bar_size(2, Layout::Horizontal);
        let four = bar_size(4, Layout::Horizontal);
        assert!(four.x > two.x);
        assert_eq!(two.y, BAR_THICKNESS);
    }

    #[test]
    fn vertical_layout_grows_downward() {
        let size = bar_size(3, Layout::Vertical);
        assert!(size.y > size.x);
    }
}
