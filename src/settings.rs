//! Persisted user settings.
//!
//! A flat key/value store backed by a JSON file under the user config
//! directory. Every setter writes through immediately; keys are independent
//! of each other. Missing keys default, a corrupt file falls back to
//! defaults with a warning rather than failing startup.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

const APP_DIR: &str = "audio-switcher";
const FILENAME: &str = "settings.json";

/// Mini-bar device button layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Layout {
    #[default]
    Horizontal,
    Vertical,
}

/// A persisted window top-left position, in screen points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowPos {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to write settings: {0}")]
    Write(#[source] std::io::Error),

    #[error("Settings file is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// The full settings document. Field defaults mirror the shipped behavior:
/// pinned on top, visible at startup, Alt+A toggle, no autostart, every
/// device enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub always_on_top: bool,
    pub start_minimized: bool,
    pub hotkey: String,
    pub auto_launch: bool,
    pub layout: Layout,
    pub mini_bar_mode: bool,
    pub main_window_position: Option<WindowPos>,
    pub mini_bar_position: Option<WindowPos>,
    /// `None` = all devices enabled
    pub enabled_devices: Option<Vec<String>>,
    pub known_devices: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            always_on_top: true,
            start_minimized: false,
            hotkey: "Alt+A".to_string(),
            auto_launch: false,
            layout: Layout::default(),
            mini_bar_mode: false,
            main_window_position: None,
            mini_bar_position: None,
            enabled_devices: None,
            known_devices: Vec::new(),
        }
    }
}

/// Typed get/set facade over the settings file.
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    /// Load from the default per-user config path.
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load from an explicit path, falling back to defaults when the file
    /// is absent or unreadable.
    pub fn load_from(path: PathBuf) -> Self {
        let settings = match Self::read(&path) {
            Ok(settings) => settings,
            Err(SettingsError::Read(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No settings file, using defaults");
                Settings::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Falling back to default settings");
                Settings::default()
            }
        };
        Self { path, settings }
    }

    fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push(FILENAME);
        path
    }

    fn read(path: &std::path::Path) -> Result<Settings, SettingsError> {
        let raw = fs::read_to_string(path).map_err(SettingsError::Read)?;
        serde_json::from_str(&raw).map_err(SettingsError::Malformed)
    }

    /// Write the current document. Failures are logged and swallowed; the
    /// in-memory value stays authoritative for this session.
    fn save(&self) {
        if let Err(e) = self.try_save() {
            warn!(path = %self.path.display(), error = %e, "Failed to persist settings");
        }
    }

    fn try_save(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(SettingsError::Write)?;
        }
        let raw = serde_json::to_string_pretty(&self.settings)
            .map_err(SettingsError::Malformed)?;
        fs::write(&self.path, raw).map_err(SettingsError::Write)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn always_on_top(&self) -> bool {
        self.settings.always_on_top
    }

    pub fn set_always_on_top(&mut self, value: bool) {
        self.settings.always_on_top = value;
        self.save();
    }

    pub fn start_minimized(&self) -> bool {
        self.settings.start_minimized
    }

    pub fn set_start_minimized(&mut self, value: bool) {
        self.settings.start_minimized = value;
        self.save();
    }

    pub fn hotkey(&self) -> &str {
        &self.settings.hotkey
    }

    /// Persist a new hotkey string. Re-registration of the global shortcut
    /// is the caller's side of the contract and happens in the same tick.
    pub fn set_hotkey(&mut self, value: String) {
        self.settings.hotkey = value;
        self.save();
    }

    pub fn auto_launch(&self) -> bool {
        self.settings.auto_launch
    }

    pub fn set_auto_launch(&mut self, value: bool) {
        self.settings.auto_launch = value;
        self.save();
    }

    pub fn layout(&self) -> Layout {
        self.settings.layout
    }

    pub fn set_layout(&mut self, value: Layout) {
        self.settings.layout = value;
        self.save();
    }

    pub fn mini_bar_mode(&self) -> bool {
        self.settings.mini_bar_mode
    }

    pub fn set_mini_bar_mode(&mut self, value: bool) {
        self.settings.mini_bar_mode = value;
        self.save();
    }

    pub fn main_window_position(&self) -> Option<WindowPos> {
        self.settings.main_window_position
    }

    pub fn set_main_window_position(&mut self, pos: WindowPos) {
        self.settings.main_window_position = Some(pos);
        self.save();
    }

    pub fn mini_bar_position(&self) -> Option<WindowPos> {
        self.settings.mini_bar_position
    }

    pub fn set_mini_bar_position(&mut self, pos: WindowPos) {
        self.settings.mini_bar_position = Some(pos);
        self.save();
    }

    pub fn enabled_devices(&self) -> Option<HashSet<String>> {
        self.settings
            .enabled_devices
            .as_ref()
            .map(|ids| ids.iter().cloned().collect())
    }

    pub fn set_enabled_devices(&mut self, ids: Option<HashSet<String>>) {
        self.settings.enabled_devices = ids.map(|set| {
            let mut sorted: Vec<String> = set.into_iter().collect();
            sorted.sort();
            sorted
        });
        self.save();
    }

    pub fn known_devices(&self) -> HashSet<String> {
        self.settings.known_devices.iter().cloned().collect()
    }

    pub fn set_known_devices(&mut self, ids: HashSet<String>) {
        let mut sorted: Vec<String> = ids.into_iter().collect();
        sorted.sort();
        self.settings.known_devices = sorted;
        self.save();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shipped_behavior() {
        let settings = Settings::default();
        assert!(settings.always_on_top);
        assert!(!settings.start_minimized);
        assert_eq!(settings.hotkey, "Alt+A");
        assert!(!settings.auto_launch);
        assert_eq!(settings.layout, Layout::Horizontal);
        assert!(!settings.mini_bar_mode);
        assert_eq!(settings.enabled_devices, None);
        assert!(settings.known_devices.is_empty());
    }

    #[test]
    fn missing_keys_default_on_parse() {
        let settings: Settings = serde_json::from_str(r#"{"hotkey":"Ctrl+F9"}"#).unwrap();
        assert_eq!(settings.hotkey, "Ctrl+F9");
        assert!(settings.always_on_top);
        assert_eq!(settings.enabled_devices, None);
    }

    #[test]
    fn document_round_trips() {
        let mut settings = Settings::default();
        settings.mini_bar_mode = true;
        settings.layout = Layout::Vertical;
        settings.main_window_position = Some(WindowPos { x: 12.0, y: 34.0 });
        settings.enabled_devices = Some(vec!["a".into(), "b".into()]);
        settings.known_devices = vec!["a".into(), "b".into(), "c".into()];

        let raw = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&raw).unwrap();
        assert!(back.mini_bar_mode);
        assert_eq!(back.layout, Layout::Vertical);
        assert_eq!(back.main_window_position, Some(WindowPos { x: 12.0, y: 34.0 }));
        assert_eq!(back.enabled_devices, Some(vec!["a".into(), "b".into()]));
        assert_eq!(back.known_devices.len(), 3);
    }

    #[test]
    fn load_from_missing_file_uses_defaults() {
        let mut path = std::env::temp_dir();
        path.push("audio-switcher-test-does-not-exist");
        path.push(FILENAME);
        let store = SettingsStore::load_from(path);
        assert_eq!(store.hotkey(), "Alt+A");
    }

    #[test]
    fn enabled_devices_persist_sorted() {
        let mut path = std::env::temp_dir();
        path.push(format!("audio-switcher-test-{}", std::process::id()));
        path.push(FILENAME);

        let mut store = SettingsStore::load_from(path.clone());
        store.set_enabled_devices(Some(HashSet::from(["b".to_string(), "a".to_string()])));

        let reloaded = SettingsStore::load_from(path.clone());
        assert_eq!(
            reloaded.settings().enabled_devices,
            Some(vec!["a".to_string(), "b".to_string()])
        );

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
