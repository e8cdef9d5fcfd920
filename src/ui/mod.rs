//! UI module for the tray icon and window surfaces.
//!
//! This module provides the tray manager, the main panel and mini-bar
//! views, and the pure window-placement and fade logic behind them.

pub mod animation;
pub mod geometry;
pub mod menu;
pub mod minibar;
pub mod panel;
pub mod theme;
pub mod tray;
pub mod windows;

pub use menu::{MenuEntryId, MenuModel};
pub use tray::{TrayError, TrayEvent, TrayManager};
pub use windows::{CloseOutcome, SurfaceMode, WindowManager};
