//! System tray icon management.
//!
//! Owns the tray icon, its tooltip, and the context menu. Toolkit events
//! are drained every frame and forwarded as [`TrayEvent`]s on an mpsc
//! channel so the app handles them alongside adapter and hotkey events.
//! On non-Windows builds the manager is inert but keeps the same surface.

use std::sync::mpsc::{channel, Receiver, Sender};

use thiserror::Error;

use super::menu::{MenuEntryId, MenuModel};

/// Events from the system tray.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrayEvent {
    /// Left-click on the tray icon
    IconClicked,

    /// Context menu entry selected
    Menu(MenuEntryId),
}

/// Tray service error types.
#[derive(Debug, Error)]
pub enum TrayError {
    #[error("Failed to create tray icon: {0}")]
    CreateFailed(String),

    #[error("Failed to load icon resource")]
    IconLoadFailed,

    #[error("Tray icon not initialized")]
    NotInitialized,

    #[error("Failed to create menu: {0}")]
    MenuFailed(String),
}

/// System tray manager.
pub struct TrayManager {
    event_sender: Sender<TrayEvent>,
    event_receiver: Receiver<TrayEvent>,
    inner: imp::Inner,
}

impl TrayManager {
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self {
            event_sender: sender,
            event_receiver: receiver,
            inner: imp::Inner::default(),
        }
    }

    /// Create and show the tray icon with an initial menu.
    pub fn create(
        &mut self,
        tooltip: &str,
        light_icon: bool,
        model: &MenuModel,
    ) -> Result<(), TrayError> {
        self.inner.create(tooltip, light_icon, model)
    }

    /// Drain toolkit events into the tray channel. Call once per frame.
    pub fn process_events(&self) {
        self.inner.process_events(&self.event_sender);
    }

    /// The event receiver the app drains.
    pub fn events(&self) -> &Receiver<TrayEvent> {
        &self.event_receiver
    }

    /// Regenerate the context menu from the model. Rebuilding with an
    /// unchanged model yields a visually identical menu.
    pub fn rebuild_menu(&mut self, model: &MenuModel) -> Result<(), TrayError> {
        self.inner.rebuild_menu(model)
    }

    /// Update the tooltip text.
    pub fn set_tooltip(&mut self, text: &str) -> Result<(), TrayError> {
        self.inner.set_tooltip(text)
    }

    /// Swap between the light and dark glyph when the system theme flips.
    pub fn set_icon_theme(&mut self, light_icon: bool) -> Result<(), TrayError> {
        self.inner.set_icon_theme(light_icon)
    }
}

impl Default for TrayManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(windows)]
mod imp {
    use super::{TrayError, TrayEvent};
    use crate::platform::icons::{speaker_icon_rgba, ICON_SIZE};
    use crate::ui::menu::{build_entries, MenuEntry, MenuEntryId, MenuModel};
    use std::sync::mpsc::Sender;
    use tray_icon::{
        menu::{CheckMenuItem, Menu, MenuEvent, MenuItem, PredefinedMenuItem},
        Icon, TrayIcon, TrayIconBuilder, TrayIconEvent,
    };

    #[derive(Default)]
    pub struct Inner {
        tray_icon: Option<TrayIcon>,
    }

    impl Inner {
        pub fn create(
            &mut self,
            tooltip: &str,
            light_icon: bool,
            model: &MenuModel,
        ) -> Result<(), TrayError> {
            let icon = create_icon(light_icon)?;
            let menu = build_menu(model)?;

            let tray_icon = TrayIconBuilder::new()
                .with_icon(icon)
                .with_tooltip(tooltip)
                .with_menu(Box::new(menu))
                .build()
                .map_err(|e| TrayError::CreateFailed(e.to_string()))?;

            self.tray_icon = Some(tray_icon);
            Ok(())
        }

        pub fn process_events(&self, sender: &Sender<TrayEvent>) {
            // Drain both global channels fully to avoid backlog
            while let Ok(event) = TrayIconEvent::receiver().try_recv() {
                if let TrayIconEvent::Click {
                    button: tray_icon::MouseButton::Left,
                    button_state: tray_icon::MouseButtonState::Up,
                    ..
                } = event
                {
                    let _ = sender.send(TrayEvent::IconClicked);
                }
            }

            while let Ok(event) = MenuEvent::receiver().try_recv() {
                if let Some(id) = MenuEntryId::decode(event.id.0.as_str()) {
                    let _ = sender.send(TrayEvent::Menu(id));
                }
            }
        }

        pub fn rebuild_menu(&mut self, model: &MenuModel) -> Result<(), TrayError> {
            let tray = self.tray_icon.as_mut().ok_or(TrayError::NotInitialized)?;
            let menu = build_menu(model)?;
            tray.set_menu(Some(Box::new(menu)));
            Ok(())
        }

        pub fn set_tooltip(&mut self, text: &str) -> Result<(), TrayError> {
            let tray = self.tray_icon.as_mut().ok_or(TrayError::NotInitialized)?;
            tray.set_tooltip(Some(text))
                .map_err(|e| TrayError::CreateFailed(e.to_string()))?;
            Ok(())
        }

        pub fn set_icon_theme(&mut self, light_icon: bool) -> Result<(), TrayError> {
            let icon = create_icon(light_icon)?;
            let tray = self.tray_icon.as_mut().ok_or(TrayError::NotInitialized)?;
            tray.set_icon(Some(icon))
                .map_err(|e| TrayError::CreateFailed(e.to_string()))?;
            Ok(())
        }
    }

    fn create_icon(light: bool) -> Result<Icon, TrayError> {
        Icon::from_rgba(speaker_icon_rgba(light), ICON_SIZE, ICON_SIZE)
            .map_err(|_| TrayError::IconLoadFailed)
    }

    fn build_menu(model: &MenuModel) -> Result<Menu, TrayError> {
        let menu = Menu::new();
        let fail = |e: tray_icon::menu::Error| TrayError::MenuFailed(e.to_string());

        for entry in build_entries(model) {
            match entry {
                MenuEntry::Item { id, label } => {
                    let item = MenuItem::with_id(id.encode(), label, true, None);
                    menu.append(&item).map_err(fail)?;
                }
                MenuEntry::Check { id, label, checked } => {
                    let item = CheckMenuItem::with_id(id.encode(), label, true, checked, None);
                    menu.append(&item).map_err(fail)?;
                }
                MenuEntry::Separator => {
                    menu.append(&PredefinedMenuItem::separator()).map_err(fail)?;
                }
            }
        }

        Ok(menu)
    }
}

#[cfg(not(windows))]
mod imp {
    use super::{TrayError, TrayEvent};
    use crate::ui::menu::MenuModel;
    use std::sync::mpsc::Sender;
    use tracing::warn;

    #[derive(Default)]
    pub struct Inner;

    impl Inner {
        pub fn create(
            &mut self,
            _tooltip: &str,
            _light_icon: bool,
            _model: &MenuModel,
        ) -> Result<(), TrayError> {
            warn!("Tray icon skipped: not running on Windows");
            Ok(())
        }

        pub fn process_events(&self, _sender: &Sender<TrayEvent>) {}

        pub fn rebuild_menu(&mut self, _model: &MenuModel) -> Result<(), TrayError> {
            Ok(())
        }

        pub fn set_tooltip(&mut self, _text: &str) -> Result<(), TrayError> {
            Ok(())
        }

        pub fn set_icon_theme(&mut self, _light_icon: bool) -> Result<(), TrayError> {
            Ok(())
        }
    }
}
