//! Main control panel window.
//!
//! Renders the device selector and settings editor. The view pushes typed
//! actions instead of mutating state; the app drains them after each frame
//! and applies the corresponding store/settings changes.

use std::collections::HashSet;

use eframe::egui;

use crate::audio::PlaybackDevice;
use crate::platform::HotkeySpec;
use crate::settings::{Layout, Settings};

use super::theme::Theme;

/// Fixed panel width; height follows the content.
pub const PANEL_WIDTH: f32 = 280.0;

/// Actions that can be triggered from the panel UI.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelAction {
    /// Make a device the playback default
    SelectDevice(String),
    /// Re-fetch the device list
    Refresh,
    /// Toggle a device in the enabled set
    SetDeviceEnabled(String, bool),
    /// Clear the enabled set (all devices enabled)
    EnableAllDevices,
    /// Drop known-device ids that are no longer connected
    ForgetDisconnected,
    SetAlwaysOnTop(bool),
    SetStartMinimized(bool),
    SetAutoLaunch(bool),
    SetHotkey(String),
    SetLayout(Layout),
    /// Swap to the mini-bar surface
    SwitchToMiniBar,
    /// Hide the window (close button)
    HideWindow,
    /// The content reported its natural size; the window should resize
    ReportNaturalSize(egui::Vec2),
}

/// Data the panel renders from, projected by the app each frame.
pub struct PanelModel {
    pub visible_devices: Vec<PlaybackDevice>,
    pub all_devices: Vec<PlaybackDevice>,
    /// `None` = every device enabled
    pub enabled_ids: Option<HashSet<String>>,
    pub error: Option<String>,
    pub fetching: bool,
    pub settings: Settings,
}

/// Main panel view state.
pub struct PanelView {
    actions: Vec<PanelAction>,
    hotkey_draft: String,
    last_reported_height: f32,
}

impl PanelView {
    pub fn new(current_hotkey: &str) -> Self {
        Self {
            actions: Vec::new(),
            hotkey_draft: current_hotkey.to_string(),
            last_reported_height: 0.0,
        }
    }

    /// Render the panel into the current viewport.
    pub fn show(&mut self, ctx: &egui::Context, model: &PanelModel) {
        let dark = ctx.style().visuals.dark_mode;
        let theme = Theme::from_dark_mode(dark);
        ctx.set_visuals(theme.visuals(dark));

        egui::CentralPanel::default()
            .frame(
                egui::Frame::none()
                    .fill(theme.background)
                    .rounding(8.0)
                    .inner_margin(12.0),
            )
            .show(ctx, |ui| {
                self.title_bar(ui, ctx, &theme);
                ui.separator();
                self.device_list(ui, model, &theme);
                ui.add_space(8.0);
                self.settings_section(ui, model);
                self.device_management_section(ui, model);

                self.report_natural_size(ui, ctx);
            });
    }

    fn title_bar(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, theme: &Theme) {
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new("Audio Switcher")
                    .strong()
                    .color(theme.text_primary),
            );

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("✕").on_hover_text("Hide window").clicked() {
                    self.actions.push(PanelAction::HideWindow);
                }
                if ui.button("▂").on_hover_text("Mini bar").clicked() {
                    self.actions.push(PanelAction::SwitchToMiniBar);
                }
                if ui.button("⟳").on_hover_text("Refresh devices").clicked() {
                    self.actions.push(PanelAction::Refresh);
                }

                // The rest of the strip drags the frameless window
                let space = ui.available_size_before_wrap();
                let (_, response) =
                    ui.allocate_exact_size(space, egui::Sense::click_and_drag());
                if response.drag_started() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::StartDrag);
                }
            });
        });
    }

    fn device_list(&mut self, ui: &mut egui::Ui, model: &PanelModel, theme: &Theme) {
        if model.visible_devices.is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(12.0);
                if let Some(ref error) = model.error {
                    ui.colored_label(theme.error, "No playback devices");
                    ui.small(error);
                } else if model.fetching {
                    ui.label("Loading devices…");
                } else {
                    ui.label("No playback devices found");
                }
                ui.add_space(12.0);
            });
            return;
        }

        if let Some(ref error) = model.error {
            ui.colored_label(theme.error, error);
            ui.add_space(4.0);
        }

        for device in &model.visible_devices {
            self.device_row(ui, device, theme);
            ui.add_space(4.0);
        }
    }

    fn device_row(&mut self, ui: &mut egui::Ui, device: &PlaybackDevice, theme: &Theme) {
        let name = device.parsed_name();

        egui::Frame::none()
            .fill(theme.surface)
            .rounding(4.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                let response = ui
                    .horizontal(|ui| {
                        if device.is_default {
                            ui.colored_label(theme.accent, "●");
                        } else {
                            ui.label("○");
                        }
                        ui.vertical(|ui| {
                            ui.label(
                                egui::RichText::new(&name.kind).color(theme.text_primary),
                            );
                            if !name.hardware.is_empty() {
                                ui.small(
                                    egui::RichText::new(&name.hardware)
                                        .color(theme.text_secondary),
                                );
                            }
                        });
                    })
                    .response;

                let clicked = response.interact(egui::Sense::click()).clicked();
                if clicked && !device.is_default {
                    self.actions.push(PanelAction::SelectDevice(device.id.clone()));
                }
            });
    }

    fn settings_section(&mut self, ui: &mut egui::Ui, model: &PanelModel) {
        egui::CollapsingHeader::new("Settings").show(ui, |ui| {
            let settings = &model.settings;

            let mut always_on_top = settings.always_on_top;
            if ui.checkbox(&mut always_on_top, "Always on top").changed() {
                self.actions.push(PanelAction::SetAlwaysOnTop(always_on_top));
            }

            let mut start_minimized = settings.start_minimized;
            if ui.checkbox(&mut start_minimized, "Start minimized").changed() {
                self.actions
                    .push(PanelAction::SetStartMinimized(start_minimized));
            }

            let mut auto_launch = settings.auto_launch;
            if ui.checkbox(&mut auto_launch, "Start with Windows").changed() {
                self.actions.push(PanelAction::SetAutoLaunch(auto_launch));
            }

            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.label("Hotkey:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.hotkey_draft)
                        .desired_width(80.0)
                        .hint_text("Alt+A"),
                );
                let valid = HotkeySpec::parse(&self.hotkey_draft).is_ok();
                let apply = ui.add_enabled(valid, egui::Button::new("Apply"));
                if apply.clicked() && self.hotkey_draft != settings.hotkey {
                    self.actions
                        .push(PanelAction::SetHotkey(self.hotkey_draft.clone()));
                }
                if !valid {
                    ui.small("?").on_hover_text("Use e.g. Alt+A or Ctrl+Shift+F9");
                }
            });

            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.label("Mini bar layout:");
                let mut layout = settings.layout;
                egui::ComboBox::from_id_salt("layout")
                    .selected_text(match layout {
                        Layout::Horizontal => "Horizontal",
                        Layout::Vertical => "Vertical",
                    })
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut layout, Layout::Horizontal, "Horizontal");
                        ui.selectable_value(&mut layout, Layout::Vertical, "Vertical");
                    });
                if layout != settings.layout {
                    self.actions.push(PanelAction::SetLayout(layout));
                }
            });
        });
    }

    fn device_management_section(&mut self, ui: &mut egui::Ui, model: &PanelModel) {
        egui::CollapsingHeader::new("Devices").show(ui, |ui| {
            for device in &model.all_devices {
                let mut enabled = model
                    .enabled_ids
                    .as_ref()
                    .map_or(true, |ids| ids.contains(&device.id));
                if ui.checkbox(&mut enabled, &device.name).changed() {
                    self.actions
                        .push(PanelAction::SetDeviceEnabled(device.id.clone(), enabled));
                }
            }

            ui.add_space(4.0);
            ui.horizontal(|ui| {
                if ui.button("Enable all").clicked() {
                    self.actions.push(PanelAction::EnableAllDevices);
                }
                if ui
                    .button("Forget disconnected")
                    .on_hover_text("Stop tracking devices that are no longer connected")
                    .clicked()
                {
                    self.actions.push(PanelAction::ForgetDisconnected);
                }
            });
        });
    }

    /// Report the content's natural height so the app can resize the
    /// non-resizable window around it.
    fn report_natural_size(&mut self, ui: &egui::Ui, ctx: &egui::Context) {
        let content_height = ui.min_rect().height() + 24.0;
        let current_height = ctx.input(|i| {
            i.viewport()
                .inner_rect
                .map_or(content_height, |r| r.height())
        });
        if (content_height - self.last_reported_height).abs() > 1.0
            && (content_height - current_height).abs() > 1.0
        {
            self.last_reported_height = content_height;
            self.actions.push(PanelAction::ReportNaturalSize(egui::vec2(
                PANEL_WIDTH,
                content_height,
            )));
        }
    }

    /// Take all pending actions.
    pub fn take_actions(&mut self) -> Vec<PanelAction> {
        std::mem::take(&mut self.actions)
    }

    /// Reset the hotkey editor to the persisted value.
    pub fn sync_hotkey_draft(&mut self, hotkey: &str) {
        self.hotkey_draft = hotkey.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_actions_drains_the_queue() {
        let mut view = PanelView::new("Alt+A");
        view.actions.push(PanelAction::Refresh);
        view.actions.push(PanelAction::HideWindow);

        let actions = view.take_actions();
        assert_eq!(actions, vec![PanelAction::Refresh, PanelAction::HideWindow]);
        assert!(view.take_actions().is_empty());
    }

    #[test]
    fn hotkey_draft_follows_persisted_value() {
        let mut view = PanelView::new("Alt+A");
        view.sync_hotkey_draft("Ctrl+F9");
        assert_eq!(view.hotkey_draft, "Ctrl+F9");
    }
}
