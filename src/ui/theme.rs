//! Windows 11 styling and theme colors.

use eframe::egui;

/// Theme colors for the panel surfaces.
pub struct Theme {
    /// Background color
    pub background: egui::Color32,

    /// Surface color (cards, rows)
    pub surface: egui::Color32,

    /// Primary accent color
    pub accent: egui::Color32,

    /// Text primary color
    pub text_primary: egui::Color32,

    /// Text secondary color
    pub text_secondary: egui::Color32,

    /// Error color
    pub error: egui::Color32,
}

impl Theme {
    /// Windows 11 dark mode palette.
    pub fn dark() -> Self {
        Self {
            background: egui::Color32::from_rgb(32, 32, 32),
            surface: egui::Color32::from_rgb(45, 45, 45),
            accent: egui::Color32::from_rgb(0, 120, 212),
            text_primary: egui::Color32::from_rgb(255, 255, 255),
            text_secondary: egui::Color32::from_rgb(180, 180, 180),
            error: egui::Color32::from_rgb(239, 68, 68),
        }
    }

    /// Windows 11 light mode palette.
    pub fn light() -> Self {
        Self {
            background: egui::Color32::from_rgb(243, 243, 243),
            surface: egui::Color32::from_rgb(255, 255, 255),
            accent: egui::Color32::from_rgb(0, 120, 212),
            text_primary: egui::Color32::from_rgb(0, 0, 0),
            text_secondary: egui::Color32::from_rgb(96, 96, 96),
            error: egui::Color32::from_rgb(220, 38, 38),
        }
    }

    /// Pick the palette matching the detected system theme.
    pub fn from_dark_mode(dark: bool) -> Self {
        if dark {
            Self::dark()
        } else {
            Self::light()
        }
    }

    /// Apply the palette to the egui visuals.
    pub fn visuals(&self, dark: bool) -> egui::Visuals {
        let mut visuals = if dark {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        visuals.panel_fill = self.background;
        visuals.window_fill = self.background;
        visuals.widgets.noninteractive.bg_fill = self.surface;
        visuals.selection.bg_fill = self.accent;
        visuals.hyperlink_color = self.accent;
        visuals
    }
}
