//! Desktop front-end for the download queue

// Window, list and preview panel
mod app;
use app::QueueApp;

// eframe/egui for GUI application framework
use eframe::egui::{self, Visuals};
use tracing::{error, info};

use tube_queue::{
    Controller,
    config::{self, Settings},
    link::CUSTOM_SCHEME,
    logging,
};

/// Program entry point: loads settings, sets up logging and launches the GUI
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings_path = config::settings_path();
    let settings = Settings::load_or_default(&settings_path);
    logging::init(settings.file_logging);

    // A ytdlp://<id> argument comes from the OS protocol handler
    let initial_url = std::env::args()
        .nth(1)
        .filter(|arg| arg.starts_with(CUSTOM_SCHEME));

    let controller = match Controller::from_settings(settings, Some(settings_path)) {
        Ok(controller) => controller,
        Err(err) => {
            error!(error = %err, "failed to start");
            return Err(err.into());
        }
    };
    info!(download_dir = %controller.download_dir().display(), "starting");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1000.0, 550.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Simple YouTube Downloader",
        options,
        Box::new(move |cc| {
            // Use dark theme visuals
            cc.egui_ctx.set_visuals(Visuals::dark());
            Box::new(QueueApp::new(&cc.egui_ctx, controller, initial_url))
        }),
    )?;
    Ok(())
}
