//! Platform-specific module for Windows utilities.
//!
//! This module contains startup registration, global hotkey binding, and
//! tray icon generation. Non-Windows builds get inert fallbacks so the
//! reconciliation core stays testable everywhere.

pub mod autostart;
pub mod hotkey;
pub mod icons;

pub use hotkey::{HotkeyError, HotkeyManager, HotkeyPressed, HotkeySpec};
