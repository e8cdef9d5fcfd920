//! Audio Switcher - Library
//!
//! A system tray utility for switching the active audio playback device
//! on Windows.
//!
//! ## Features
//!
//! - Switch the default playback device from the tray menu, the control
//!   panel, a compact mini-bar, or a global hotkey
//! - Curate which devices appear in selectors; newly attached hardware is
//!   detected against the set of devices ever seen
//! - Edge-snapping frameless windows with persisted positions
//! - Start with Windows option

pub mod app;
pub mod audio;
pub mod platform;
pub mod settings;
pub mod ui;

pub use app::SwitcherApp;
pub use audio::{AdapterError, DeviceName, DeviceStore, PlaybackDevice};
pub use settings::{Settings, SettingsStore};
pub use ui::{SurfaceMode, TrayManager, WindowManager};
