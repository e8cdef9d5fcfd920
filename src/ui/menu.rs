//! Tray context menu model.
//!
//! The menu is regenerated from scratch on every device or settings
//! change; this module builds the entry list as plain data so the rebuild
//! is deterministic and the platform tray code only translates entries
//! 1:1 into toolkit menu items.

use crate::audio::PlaybackDevice;

/// Stable identifier for an actionable menu entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntryId {
    /// Select a device as the playback default
    Device(String),
    /// Show or hide the active surface
    ToggleVisible,
    AlwaysOnTop,
    AutoLaunch,
    StartMinimized,
    MiniBarMode,
    Quit,
}

impl MenuEntryId {
    /// Encode into the toolkit's string menu-id space.
    pub fn encode(&self) -> String {
        match self {
            MenuEntryId::Device(id) => format!("device:{id}"),
            MenuEntryId::ToggleVisible => "show-hide".to_string(),
            MenuEntryId::AlwaysOnTop => "always-on-top".to_string(),
            MenuEntryId::AutoLaunch => "auto-launch".to_string(),
            MenuEntryId::StartMinimized => "start-minimized".to_string(),
            MenuEntryId::MiniBarMode => "mini-bar-mode".to_string(),
            MenuEntryId::Quit => "quit".to_string(),
        }
    }

    pub fn decode(raw: &str) -> Option<Self> {
        if let Some(device_id) = raw.strip_prefix("device:") {
            return Some(MenuEntryId::Device(device_id.to_string()));
        }
        match raw {
            "show-hide" => Some(MenuEntryId::ToggleVisible),
            "always-on-top" => Some(MenuEntryId::AlwaysOnTop),
            "auto-launch" => Some(MenuEntryId::AutoLaunch),
            "start-minimized" => Some(MenuEntryId::StartMinimized),
            "mini-bar-mode" => Some(MenuEntryId::MiniBarMode),
            "quit" => Some(MenuEntryId::Quit),
            _ => None,
        }
    }
}

/// One rendered menu entry.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuEntry {
    Item {
        id: MenuEntryId,
        label: String,
    },
    Check {
        id: MenuEntryId,
        label: String,
        checked: bool,
    },
    Separator,
}

/// Everything the menu renders from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuModel {
    /// Visible devices in fetch order
    pub devices: Vec<PlaybackDevice>,
    pub always_on_top: bool,
    pub auto_launch: bool,
    pub start_minimized: bool,
    pub mini_bar_mode: bool,
}

/// Build the full entry list. Pure: identical models produce identical
/// entry lists, which makes the rebuild idempotent.
pub fn build_entries(model: &MenuModel) -> Vec<MenuEntry> {
    let mut entries = vec![
        MenuEntry::Item {
            id: MenuEntryId::ToggleVisible,
            label: "Show/Hide".to_string(),
        },
        MenuEntry::Separator,
    ];

    for device in &model.devices {
        entries.push(MenuEntry::Check {
            id: MenuEntryId::Device(device.id.clone()),
            label: device.name.clone(),
            checked: device.is_default,
        });
    }
    if !model.devices.is_empty() {
        entries.push(MenuEntry::Separator);
    }

    entries.push(MenuEntry::Check {
        id: MenuEntryId::AlwaysOnTop,
        label: "Always on Top".to_string(),
        checked: model.always_on_top,
    });
    entries.push(MenuEntry::Check {
        id: MenuEntryId::AutoLaunch,
        label: "Start with Windows".to_string(),
        checked: model.auto_launch,
    });
    entries.push(MenuEntry::Check {
        id: MenuEntryId::StartMinimized,
        label: "Start Minimized".to_string(),
        checked: model.start_minimized,
    });
    entries.push(MenuEntry::Check {
        id: MenuEntryId::MiniBarMode,
        label: "Mini Bar".to_string(),
        checked: model.mini_bar_mode,
    });
    entries.push(MenuEntry::Separator);
    entries.push(MenuEntry::Item {
        id: MenuEntryId::Quit,
        label: "Quit".to_string(),
    });

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> MenuModel {
        MenuModel {
            devices: vec![
                PlaybackDevice {
                    id: "a".into(),
                    name: "Speakers (Realtek Audio)".into(),
                    is_default: true,
                },
                PlaybackDevice {
                    id: "b".into(),
                    name: "Headphones".into(),
                    is_default: false,
                },
            ],
            always_on_top: true,
            auto_launch: false,
            start_minimized: false,
            mini_bar_mode: false,
        }
    }

    #[test]
    fn one_check_entry_per_visible_device() {
        let entries = build_entries(&model());
        let device_entries: Vec<_> = entries
            .iter()
            .filter_map(|e| match e {
                MenuEntry::Check {
                    id: MenuEntryId::Device(id),
                    checked,
                    ..
                } => Some((id.as_str(), *checked)),
                _ => None,
            })
            .collect();
        assert_eq!(device_entries, vec![("a", true), ("b", false)]);
    }

    #[test]
    fn rebuild_with_unchanged_state_is_identical() {
        assert_eq!(build_entries(&model()), build_entries(&model()));
    }

    #[test]
    fn no_device_entry_checked_when_default_filtered_out() {
        let mut m = model();
        m.devices.remove(0);
        let entries = build_entries(&m);
        let any_checked = entries.iter().any(|e| {
            matches!(
                e,
                MenuEntry::Check {
                    id: MenuEntryId::Device(_),
                    checked: true,
                    ..
                }
            )
        });
        assert!(!any_checked);
    }

    #[test]
    fn empty_device_list_still_has_controls() {
        let entries = build_entries(&MenuModel::default());
        assert!(entries
            .iter()
            .any(|e| matches!(e, MenuEntry::Item { id: MenuEntryId::Quit, .. })));
        assert!(entries
            .iter()
            .any(|e| matches!(e, MenuEntry::Check { id: MenuEntryId::MiniBarMode, .. })));
    }

    #[test]
    fn entry_ids_round_trip_through_encoding() {
        let ids = [
            MenuEntryId::Device("{0.0.0}.{abc}".into()),
            MenuEntryId::ToggleVisible,
            MenuEntryId::AlwaysOnTop,
            MenuEntryId::AutoLaunch,
            MenuEntryId::StartMinimized,
            MenuEntryId::MiniBarMode,
            MenuEntryId::Quit,
        ];
        for id in ids {
            assert_eq!(MenuEntryId::decode(&id.encode()), Some(id));
        }
        assert_eq!(MenuEntryId::decode("bogus"), None);
    }
}
