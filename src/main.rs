use std::path::{Path, PathBuf};

use anyhow::Context;
use eframe::egui;
use mofa_viewer::app::MofaViewerApp;
use mofa_viewer::data::Schema;
use mofa_viewer::state::AppState;

/// Environment variable naming an optional schema TOML file.
const SCHEMA_ENV: &str = "MOFA_VIEWER_SCHEMA";

fn load_schema(path: &Path) -> anyhow::Result<Schema> {
    let schema = Schema::load(path)
        .with_context(|| format!("Failed to read schema from {}", path.display()))?;
    log::info!("Using schema from {}", path.display());
    Ok(schema)
}

/// Start-up state: custom schema if configured, defaults otherwise.
fn initial_state() -> AppState {
    let Some(path) = std::env::var_os(SCHEMA_ENV).map(PathBuf::from) else {
        return AppState::default();
    };
    match load_schema(&path) {
        Ok(schema) => AppState::with_schema(schema),
        Err(e) => {
            log::error!("{e:#}");
            let mut state = AppState::default();
            state.status_message = Some(format!("{e:#} (using MOFA+ defaults)"));
            state
        }
    }
}

fn main() -> eframe::Result {
    env_logger::init();

    let state = initial_state();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "MOFA+ Model Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(MofaViewerApp::new(state)))),
    )
}
