use std::process;

use eframe::egui;

mod app;
mod headless;

use app::{setup_tracing, IcosphereApp};
use headless::maybe_run_headless;

fn main() -> eframe::Result<()> {
    let (console, log_level_state) = setup_tracing();
    tracing::info!("icosphere starting");

    let args: Vec<String> = std::env::args().collect();
    match maybe_run_headless(&args) {
        Ok(true) => return Ok(()),
        Ok(false) => {}
        Err(err) => {
            eprintln!("headless error: {err}");
            process::exit(1);
        }
    }

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("icosphere")
            .with_inner_size([1280.0, 800.0]),
        renderer: eframe::Renderer::Wgpu,
        ..Default::default()
    };
    eframe::run_native(
        "icosphere",
        native_options,
        Box::new(|_cc| {
            let mut app = IcosphereApp::new(console, log_level_state);
            app.try_load_default_settings();
            Ok(Box::new(app))
        }),
    )
}
