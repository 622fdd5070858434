mod app;
mod color;
mod config;
mod data;
mod export;
mod state;
mod ui;

use app::DashboardApp;
use config::DashboardConfig;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let (config, config_error) = match DashboardConfig::load() {
        Ok(config) => (config, None),
        Err(e) => {
            log::error!("Invalid configuration, using defaults: {e:#}");
            (DashboardConfig::default(), Some(format!("Config error: {e:#}")))
        }
    };
    log::info!(
        "Data sources: {}",
        config
            .sources()
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    // Load once up front; the table then lives in the session cache.
    let mut state = AppState::new(config);
    state.load();
    if state.status_message.is_none() {
        state.status_message = config_error;
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Water Quality – Contaminant Search",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
}
