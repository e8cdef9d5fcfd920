//! Application state and lifecycle management.
//!
//! `SwitcherApp` owns the reconciliation store, the settings gateway, and
//! every UI surface. Each frame it drains the adapter, tray, and hotkey
//! channels, applies the resulting store mutations, and resynchronizes the
//! tray menu and open surfaces in the same tick, before yielding back to
//! the event loop.

use std::sync::mpsc::{channel, Receiver};
use std::time::{Duration, Instant};

use eframe::egui;
use tracing::{info, warn};

use crate::audio::{AdapterError, AdapterEvent, DeviceCommands, DeviceStore, INSTALL_TIMEOUT};
use crate::platform::{autostart, HotkeyManager, HotkeyPressed};
use crate::settings::{SettingsStore, WindowPos};
use crate::ui::animation::{HOVER_OPACITY, REST_OPACITY, STEP_INTERVAL};
use crate::ui::geometry::{self, Bounds, SNAP_THRESHOLD};
use crate::ui::minibar::{bar_size, MiniBarAction, MiniBarModel, MiniBarView};
use crate::ui::panel::{PanelAction, PanelModel, PanelView};
use crate::ui::windows::{resize_frameless, MoveTracker};
use crate::ui::{CloseOutcome, MenuEntryId, MenuModel, SurfaceMode, TrayEvent, TrayManager, WindowManager};

/// Devices are re-fetched this often so hot-plugged hardware shows up
/// without user action.
const REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// Frame cadence while idle; the tray and worker channels are polled from
/// the update loop.
const IDLE_REPAINT: Duration = Duration::from_millis(100);

/// Remediation progress for a missing AudioDeviceCmdlets module.
#[derive(Debug, Clone, Copy, PartialEq)]
enum InstallState {
    Idle,
    Installing { deadline: Instant },
    Finished,
}

pub struct SwitcherApp {
    store: DeviceStore,
    settings: SettingsStore,

    commands: DeviceCommands,
    adapter_events: Receiver<AdapterEvent>,
    hotkey: HotkeyManager,
    hotkey_events: Receiver<HotkeyPressed>,

    tray: TrayManager,
    windows: WindowManager,
    panel: PanelView,
    mini_bar: MiniBarView,

    fetch_in_flight: bool,
    last_fetch: Option<Instant>,
    install: InstallState,
    install_retried: bool,

    main_moves: MoveTracker,
    mini_bar_moves: MoveTracker,
    /// Mini-bar top-left in screen points, captured while it renders;
    /// the tooltip viewport is positioned from it
    mini_bar_screen_pos: (f32, f32),

    last_fade_tick: Instant,
    applied_main_visible: Option<bool>,
    applied_icon_light: Option<bool>,
}

impl SwitcherApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = SettingsStore::load();
        let store = DeviceStore::new(settings.enabled_devices(), settings.known_devices());

        let (adapter_tx, adapter_rx) = channel();
        let commands = DeviceCommands::new(adapter_tx);

        let (hotkey_tx, hotkey_rx) = channel();
        let mut hotkey = HotkeyManager::new(hotkey_tx);
        if let Err(e) = hotkey.register(settings.hotkey()) {
            // Non-fatal: the app runs without a hotkey
            warn!(hotkey = settings.hotkey(), error = %e, "Hotkey not registered");
        }

        let mode = if settings.mini_bar_mode() {
            SurfaceMode::MiniBar
        } else {
            SurfaceMode::Normal
        };
        let windows = WindowManager::new(mode, settings.start_minimized());

        let dark = cc.egui_ctx.style().visuals.dark_mode;
        let mut tray = TrayManager::new();
        let menu_model = MenuModel {
            devices: Vec::new(),
            always_on_top: settings.always_on_top(),
            auto_launch: settings.auto_launch(),
            start_minimized: settings.start_minimized(),
            mini_bar_mode: settings.mini_bar_mode(),
        };
        if let Err(e) = tray.create("Audio Switcher", dark, &menu_model) {
            warn!(error = %e, "Tray icon not created");
        }

        let panel = PanelView::new(settings.hotkey());

        let mut app = Self {
            store,
            settings,
            commands,
            adapter_events: adapter_rx,
            hotkey,
            hotkey_events: hotkey_rx,
            tray,
            windows,
            panel,
            mini_bar: MiniBarView::new(),
            fetch_in_flight: false,
            last_fetch: None,
            install: InstallState::Idle,
            install_retried: false,
            main_moves: MoveTracker::default(),
            mini_bar_moves: MoveTracker::default(),
            mini_bar_screen_pos: (0.0, 0.0),
            last_fade_tick: Instant::now(),
            applied_main_visible: None,
            applied_icon_light: Some(dark),
        };
        app.start_fetch();
        app
    }

    // ---- device flow -----------------------------------------------------

    fn start_fetch(&mut self) {
        if self.fetch_in_flight {
            return;
        }
        self.fetch_in_flight = true;
        self.last_fetch = Some(Instant::now());
        self.commands.spawn_fetch();
    }

    fn handle_adapter_event(&mut self, event: AdapterEvent, ctx: &egui::Context) {
        match event {
            AdapterEvent::FetchCompleted(Ok(devices)) => {
                self.fetch_in_flight = false;
                let new_ids = self.store.detect_new_devices(&devices);
                if !new_ids.is_empty() {
                    info!(count = new_ids.len(), "New playback devices detected");
                    // Auto-enable genuinely new hardware so it is usable
                    // immediately even with a curated enabled set
                    if let Some(mut enabled) = self.settings.enabled_devices() {
                        enabled.extend(new_ids.iter().cloned());
                        self.settings.set_enabled_devices(Some(enabled.clone()));
                        self.store.set_enabled_devices(Some(enabled));
                    }
                    self.store.remember_devices(new_ids);
                    self.settings.set_known_devices(self.store.known_ids().clone());
                }
                self.store.apply_fetch(devices);
                self.sync_surfaces(ctx);
            }
            AdapterEvent::FetchCompleted(Err(error)) => {
                self.fetch_in_flight = false;
                if matches!(error, AdapterError::DependencyMissing)
                    && self.install == InstallState::Idle
                    && !self.install_retried
                {
                    info!("Audio control module missing, attempting installation");
                    self.install = InstallState::Installing {
                        deadline: Instant::now() + INSTALL_TIMEOUT,
                    };
                    self.commands.spawn_install();
                    self.store
                        .record_error("Installing audio control module…".to_string());
                } else {
                    warn!(error = %error, "Device fetch failed");
                    self.store.record_error(error.to_string());
                }
                self.sync_surfaces(ctx);
            }
            AdapterEvent::SwitchCompleted { device_id, result } => match result {
                Ok(()) => {
                    info!(device = %device_id, "Switched playback device");
                    // Local flag flip instead of a refetch round trip
                    self.store.mark_default(&device_id);
                    self.sync_surfaces(ctx);
                }
                Err(error) => {
                    warn!(device = %device_id, error = %error, "Device switch failed");
                    self.store.record_error(error.to_string());
                    self.sync_surfaces(ctx);
                }
            },
            AdapterEvent::InstallCompleted(result) => {
                let InstallState::Installing { deadline } = self.install else {
                    // The 90s bound expired earlier; this result is stale
                    info!("Discarding late install result");
                    return;
                };
                if Instant::now() > deadline {
                    info!("Discarding install result past its deadline");
                    self.install = InstallState::Finished;
                    return;
                }
                self.install = InstallState::Finished;
                self.install_retried = true;
                match result {
                    Ok(()) => {
                        info!("Audio control module installed, retrying fetch");
                        self.start_fetch();
                    }
                    Err(error) => {
                        warn!(error = %error, "Module installation failed");
                        self.store.record_error(error.to_string());
                        self.sync_surfaces(ctx);
                    }
                }
            }
        }
    }

    fn check_install_deadline(&mut self, ctx: &egui::Context) {
        if let InstallState::Installing { deadline } = self.install {
            if Instant::now() > deadline {
                warn!("Timed out installing the audio control module");
                self.install = InstallState::Finished;
                self.install_retried = true;
                self.store
                    .record_error("Timed out installing the audio control module".to_string());
                self.sync_surfaces(ctx);
            }
        }
    }

    // ---- surface synchronization -----------------------------------------

    /// Store mutated: rebuild the tray menu, then wake every open surface.
    /// Both happen in the tick that performed the mutation so no surface
    /// observes an intermediate state.
    fn sync_surfaces(&mut self, ctx: &egui::Context) {
        self.rebuild_menu();
        self.notify_devices_changed(ctx);
    }

    fn rebuild_menu(&mut self) {
        let model = self.menu_model();
        if let Err(e) = self.tray.rebuild_menu(&model) {
            warn!(error = %e, "Tray menu rebuild failed");
        }
        let tooltip = match self.store.default_device() {
            Some(device) => format!("Audio Switcher - {}", device.name),
            None => "Audio Switcher".to_string(),
        };
        if let Err(e) = self.tray.set_tooltip(&tooltip) {
            warn!(error = %e, "Tray tooltip update failed");
        }
    }

    /// Open surfaces re-pull the store on their next paint; surfaces that
    /// are hidden or destroyed are simply not rendered, so nothing ever
    /// calls into a dead window.
    fn notify_devices_changed(&mut self, ctx: &egui::Context) {
        ctx.request_repaint();
    }

    fn menu_model(&self) -> MenuModel {
        MenuModel {
            devices: self.store.visible_devices(),
            always_on_top: self.settings.always_on_top(),
            auto_launch: self.settings.auto_launch(),
            start_minimized: self.settings.start_minimized(),
            mini_bar_mode: self.windows.mode() == SurfaceMode::MiniBar,
        }
    }

    // ---- settings side effects -------------------------------------------

    fn set_always_on_top(&mut self, value: bool, ctx: &egui::Context) {
        self.settings.set_always_on_top(value);
        let level = if value {
            egui::WindowLevel::AlwaysOnTop
        } else {
            egui::WindowLevel::Normal
        };
        ctx.send_viewport_cmd(egui::ViewportCommand::WindowLevel(level));
        self.rebuild_menu();
    }

    fn set_auto_launch(&mut self, value: bool) {
        self.settings.set_auto_launch(value);
        if let Err(e) = autostart::set_enabled(value) {
            warn!(error = %e, "Startup registration failed");
        }
        self.rebuild_menu();
    }

    fn set_start_minimized(&mut self, value: bool) {
        self.settings.set_start_minimized(value);
        self.rebuild_menu();
    }

    fn set_hotkey(&mut self, value: String) {
        // The stored value is not reverted on failure; the app simply
        // runs without an active hotkey
        self.settings.set_hotkey(value.clone());
        self.panel.sync_hotkey_draft(&value);
        if let Err(e) = self.hotkey.register(&value) {
            warn!(hotkey = %value, error = %e, "Hotkey not registered");
        }
    }

    fn set_device_enabled(&mut self, device_id: String, enabled: bool, ctx: &egui::Context) {
        let mut set = match self.settings.enabled_devices() {
            Some(set) => set,
            // Unchecking the first device materializes the implicit
            // all-enabled set
            None => self.store.all_devices().into_iter().map(|d| d.id).collect(),
        };
        if enabled {
            set.insert(device_id);
        } else {
            set.remove(&device_id);
        }
        self.settings.set_enabled_devices(Some(set.clone()));
        self.store.set_enabled_devices(Some(set));
        self.sync_surfaces(ctx);
    }

    fn enable_all_devices(&mut self, ctx: &egui::Context) {
        self.settings.set_enabled_devices(None);
        self.store.set_enabled_devices(None);
        self.sync_surfaces(ctx);
    }

    fn forget_disconnected(&mut self, ctx: &egui::Context) {
        self.store.prune_known_devices();
        self.settings.set_known_devices(self.store.known_ids().clone());
        self.sync_surfaces(ctx);
    }

    // ---- mode and visibility ---------------------------------------------

    fn set_mini_bar_mode(&mut self, enabled: bool, ctx: &egui::Context) {
        if enabled {
            self.windows.switch_to_mini_bar_mode();
        } else {
            self.windows.switch_to_normal_mode();
        }
        self.settings.set_mini_bar_mode(enabled);
        self.mini_bar_moves.reset();
        // Mode switches always force a menu rebuild
        self.sync_surfaces(ctx);
    }

    fn toggle_active_visible(&mut self, ctx: &egui::Context) {
        if self.windows.toggle_active_visible() {
            self.focus_active(ctx);
        }
        ctx.request_repaint();
    }

    fn focus_active(&mut self, ctx: &egui::Context) {
        if self.windows.main_window_visible() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
        }
    }

    fn quit(&mut self, ctx: &egui::Context) {
        info!("Quit requested");
        self.windows.request_quit();
        self.hotkey.unregister_all();
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    // ---- event pumps ------------------------------------------------------

    fn pump_tray_events(&mut self, ctx: &egui::Context) {
        self.tray.process_events();
        let mut events = Vec::new();
        while let Ok(event) = self.tray.events().try_recv() {
            events.push(event);
        }
        for event in events {
            match event {
                TrayEvent::IconClicked => self.toggle_active_visible(ctx),
                TrayEvent::Menu(MenuEntryId::Device(id)) => {
                    self.commands.spawn_switch(id);
                }
                TrayEvent::Menu(MenuEntryId::ToggleVisible) => self.toggle_active_visible(ctx),
                TrayEvent::Menu(MenuEntryId::AlwaysOnTop) => {
                    self.set_always_on_top(!self.settings.always_on_top(), ctx);
                }
                TrayEvent::Menu(MenuEntryId::AutoLaunch) => {
                    self.set_auto_launch(!self.settings.auto_launch());
                }
                TrayEvent::Menu(MenuEntryId::StartMinimized) => {
                    self.set_start_minimized(!self.settings.start_minimized());
                }
                TrayEvent::Menu(MenuEntryId::MiniBarMode) => {
                    self.set_mini_bar_mode(!self.settings.mini_bar_mode(), ctx);
                }
                TrayEvent::Menu(MenuEntryId::Quit) => self.quit(ctx),
            }
        }
    }

    fn pump_hotkey_events(&mut self, ctx: &egui::Context) {
        let mut presses = 0;
        while self.hotkey_events.try_recv().is_ok() {
            presses += 1;
        }
        for _ in 0..presses {
            self.toggle_active_visible(ctx);
        }
    }

    fn pump_adapter_events(&mut self, ctx: &egui::Context) {
        let mut events = Vec::new();
        while let Ok(event) = self.adapter_events.try_recv() {
            events.push(event);
        }
        for event in events {
            self.handle_adapter_event(event, ctx);
        }
    }

    // ---- panel -----------------------------------------------------------

    fn panel_model(&self) -> PanelModel {
        PanelModel {
            visible_devices: self.store.visible_devices(),
            all_devices: self.store.all_devices(),
            enabled_ids: self.store.enabled_ids().cloned(),
            error: self.store.last_error().map(str::to_string),
            fetching: self.fetch_in_flight,
            settings: self.settings.settings().clone(),
        }
    }

    fn apply_panel_actions(&mut self, ctx: &egui::Context) {
        for action in self.panel.take_actions() {
            match action {
                PanelAction::SelectDevice(id) => self.commands.spawn_switch(id),
                PanelAction::Refresh => self.start_fetch(),
                PanelAction::SetDeviceEnabled(id, enabled) => {
                    self.set_device_enabled(id, enabled, ctx)
                }
                PanelAction::EnableAllDevices => self.enable_all_devices(ctx),
                PanelAction::ForgetDisconnected => self.forget_disconnected(ctx),
                PanelAction::SetAlwaysOnTop(value) => self.set_always_on_top(value, ctx),
                PanelAction::SetStartMinimized(value) => self.set_start_minimized(value),
                PanelAction::SetAutoLaunch(value) => self.set_auto_launch(value),
                PanelAction::SetHotkey(value) => self.set_hotkey(value),
                PanelAction::SetLayout(layout) => self.settings.set_layout(layout),
                PanelAction::SwitchToMiniBar => self.set_mini_bar_mode(true, ctx),
                PanelAction::HideWindow => {
                    self.windows.hide_active();
                    ctx.request_repaint();
                }
                PanelAction::ReportNaturalSize(size) => {
                    // Resizable toggle, size change, toggle back: required
                    // for frameless transparent windows
                    for command in resize_frameless(size) {
                        ctx.send_viewport_cmd(command);
                    }
                }
            }
        }
    }

    fn show_main_window(&mut self, ctx: &egui::Context) {
        let desired = self.windows.main_window_visible();
        if self.applied_main_visible != Some(desired) {
            self.applied_main_visible = Some(desired);
            ctx.send_viewport_cmd(egui::ViewportCommand::Visible(desired));
            if desired {
                ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
                self.main_moves.reset();
            }
        }
        if !desired {
            return;
        }

        if ctx.input(|i| i.viewport().close_requested()) {
            if self.windows.handle_close_request() == CloseOutcome::Hide {
                ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
                ctx.request_repaint();
            }
        }

        let model = self.panel_model();
        self.panel.show(ctx, &model);
        self.apply_panel_actions(ctx);

        // Persist the position once a drag settles
        if let Some(rect) = ctx.input(|i| i.viewport().outer_rect) {
            if let Some((x, y)) = self.main_moves.observe((rect.min.x, rect.min.y)) {
                self.settings.set_main_window_position(WindowPos { x, y });
            }
        }
    }

    // ---- mini-bar and tooltip --------------------------------------------

    fn mini_bar_builder(&self) -> egui::ViewportBuilder {
        let size = bar_size(self.store.visible_devices().len(), self.settings.layout());
        let mut builder = egui::ViewportBuilder::default()
            .with_title("Audio Switcher")
            .with_inner_size(size)
            .with_decorations(false)
            .with_transparent(true)
            .with_resizable(false)
            .with_always_on_top()
            .with_taskbar(false);
        if let Some(pos) = self.settings.mini_bar_position() {
            builder = builder.with_position(egui::pos2(pos.x, pos.y));
        }
        builder
    }

    fn show_mini_bar(&mut self, ctx: &egui::Context) {
        if !self.windows.mini_bar_visible() {
            return;
        }

        let builder = self.mini_bar_builder();
        let model = MiniBarModel {
            devices: self.store.visible_devices(),
            layout: self.settings.layout(),
            opacity: self.windows.mini_bar_fade.current_opacity(),
        };

        let viewport_id = egui::ViewportId::from_hash_of("mini-bar");
        let mut hovered = false;
        let mut actions = Vec::new();
        let mut settled_move = None;
        let mut close_requested = false;

        let mini_bar = &mut self.mini_bar;
        let moves = &mut self.mini_bar_moves;
        let mut screen_pos = self.mini_bar_screen_pos;

        ctx.show_viewport_immediate(viewport_id, builder, |ctx, _class| {
            close_requested = ctx.input(|i| i.viewport().close_requested());

            hovered = mini_bar.show(ctx, &model);
            actions = mini_bar.take_actions();

            if let Some(rect) = ctx.input(|i| i.viewport().outer_rect) {
                screen_pos = (rect.min.x, rect.min.y);
                let bounds =
                    Bounds::new(rect.min.x, rect.min.y, rect.width(), rect.height());
                if let Some((x, y)) = moves.observe((rect.min.x, rect.min.y)) {
                    // Snap to the nearest work-area edge before persisting
                    let work_area = ctx.input(|i| {
                        i.viewport()
                            .monitor_size
                            .map(|size| Bounds::new(0.0, 0.0, size.x, size.y))
                    });
                    let snapped = match work_area {
                        Some(area) => geometry::snap_to_edges(bounds, area, SNAP_THRESHOLD),
                        None => (x, y),
                    };
                    if snapped != (x, y) {
                        ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(
                            egui::pos2(snapped.0, snapped.1),
                        ));
                        moves.reset();
                    }
                    settled_move = Some(snapped);
                }
            }
        });

        self.mini_bar_screen_pos = screen_pos;

        if close_requested {
            if self.windows.handle_close_request() == CloseOutcome::Hide {
                // The viewport is simply not shown next frame; nothing to
                // cancel on an immediate viewport
                ctx.request_repaint();
            }
        }

        if let Some((x, y)) = settled_move {
            self.settings.set_mini_bar_position(WindowPos { x, y });
        }

        // Hover drives the fade; retargeting restarts from the current
        // opacity, so rapid hover flapping stays smooth
        let target = if hovered { HOVER_OPACITY } else { REST_OPACITY };
        if self.windows.mini_bar_fade.destination() != target {
            self.windows.mini_bar_fade.start(target);
        }

        for action in actions {
            match action {
                MiniBarAction::SelectDevice(id) => self.commands.spawn_switch(id),
                MiniBarAction::SwitchToNormal => self.set_mini_bar_mode(false, ctx),
                MiniBarAction::HideWindow => {
                    self.windows.hide_active();
                    ctx.request_repaint();
                }
                MiniBarAction::ShowTooltip(payload) => self.windows.show_tooltip(payload),
                MiniBarAction::HideTooltip => self.windows.hide_tooltip(),
            }
        }
    }

    fn show_tooltip_window(&mut self, ctx: &egui::Context) {
        if !self.windows.mini_bar_visible() {
            return;
        }
        let Some(payload) = self.windows.tooltip().cloned() else {
            return;
        };

        let text = payload.text.clone();
        let size = egui::vec2(8.0 * text.chars().count() as f32 + 20.0, 26.0);
        let (x, y) = geometry::tooltip_position(
            self.mini_bar_screen_pos,
            payload.element_rect,
            (size.x, size.y),
        );

        let builder = egui::ViewportBuilder::default()
            .with_title("tooltip")
            .with_inner_size(size)
            .with_position(egui::pos2(x, y))
            .with_decorations(false)
            .with_transparent(true)
            .with_resizable(false)
            .with_always_on_top()
            .with_taskbar(false)
            .with_active(false);

        let viewport_id = egui::ViewportId::from_hash_of("mini-bar-tooltip");
        ctx.show_viewport_immediate(viewport_id, builder, |ctx, _class| {
            egui::CentralPanel::default()
                .frame(
                    egui::Frame::none()
                        .fill(egui::Color32::from_rgb(45, 45, 45))
                        .rounding(4.0)
                        .inner_margin(4.0),
                )
                .show(ctx, |ui| {
                    ui.centered_and_justified(|ui| {
                        ui.label(egui::RichText::new(&text).color(egui::Color32::WHITE).small());
                    });
                });
        });
    }

    // ---- housekeeping ----------------------------------------------------

    fn tick_fade(&mut self, ctx: &egui::Context) {
        if self.windows.mini_bar_fade.is_animating() {
            if self.last_fade_tick.elapsed() >= STEP_INTERVAL {
                self.last_fade_tick = Instant::now();
                self.windows.mini_bar_fade.tick();
            }
            ctx.request_repaint_after(STEP_INTERVAL);
        }
    }

    fn refresh_on_timer(&mut self) {
        let due = self
            .last_fetch
            .map_or(true, |at| at.elapsed() >= REFRESH_INTERVAL);
        if due && !self.fetch_in_flight {
            self.start_fetch();
        }
    }

    fn update_tray_icon_theme(&mut self, ctx: &egui::Context) {
        // Dark taskbar gets the light glyph
        let light = ctx.style().visuals.dark_mode;
        if self.applied_icon_light != Some(light) {
            self.applied_icon_light = Some(light);
            if let Err(e) = self.tray.set_icon_theme(light) {
                warn!(error = %e, "Tray icon theme update failed");
            }
        }
    }
}

impl eframe::App for SwitcherApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.pump_adapter_events(ctx);
        self.pump_tray_events(ctx);
        self.pump_hotkey_events(ctx);
        self.check_install_deadline(ctx);
        self.refresh_on_timer();
        self.update_tray_icon_theme(ctx);
        self.tick_fade(ctx);

        self.show_main_window(ctx);
        self.show_mini_bar(ctx);
        self.show_tooltip_window(ctx);

        ctx.request_repaint_after(IDLE_REPAINT);
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        // Frameless windows with rounded corners need a transparent clear
        egui::Rgba::TRANSPARENT.to_array()
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.hotkey.unregister_all();
    }
}
