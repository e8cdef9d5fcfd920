#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use eframe::egui;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use audio_switcher_rs::settings::SettingsStore;
use audio_switcher_rs::SwitcherApp;

/// Main panel size at startup; height follows the content afterwards.
const INITIAL_SIZE: [f32; 2] = [280.0, 400.0];

fn main() -> eframe::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Failed to install tracing subscriber");
    }

    // Peek at the persisted settings to shape the initial window; the app
    // re-loads them through its own gateway
    let settings = SettingsStore::load();
    let start_hidden = settings.start_minimized() || settings.mini_bar_mode();

    let mut viewport = egui::ViewportBuilder::default()
        .with_title("Audio Switcher")
        .with_inner_size(INITIAL_SIZE)
        .with_decorations(false)
        .with_transparent(true)
        .with_resizable(false)
        .with_taskbar(false)
        .with_visible(!start_hidden);
    if settings.always_on_top() {
        viewport = viewport.with_always_on_top();
    }
    if let Some(pos) = settings.main_window_position() {
        viewport = viewport.with_position(egui::pos2(pos.x, pos.y));
    }

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    info!("Starting audio switcher");
    eframe::run_native(
        "Audio Switcher",
        options,
        Box::new(|cc| Ok(Box::new(SwitcherApp::new(cc)))),
    )
}
