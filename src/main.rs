mod app;
mod data;
mod gui;
mod log;

use std::ffi::OsString;
use std::path::PathBuf;

use app::VisorApp;

/// Filter used when `RUST_LOG` is unset: our own crates at `info`, the
/// windowing backend only when it warns.
const DEFAULT_LOG_FILTER: &str = "info,eframe=warn,egui_glow=warn,winit=warn";

/// Sample files named on the command line, loaded at startup. Empty
/// arguments are skipped.
fn startup_files(args: impl IntoIterator<Item = OsString>) -> Vec<PathBuf> {
    args.into_iter()
        .skip(1)
        .filter(|a| !a.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER))
        .format_timestamp_millis()
        .format_target(false)
        .init();

    let files = startup_files(std::env::args_os());
    ::log::info!(
        "visor v{} starting, {} file(s) on the command line",
        env!("CARGO_PKG_VERSION"),
        files.len()
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([820.0, 540.0])
            .with_title("Reflectance Viewer")
            .with_app_id("visor")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "visor",
        options,
        Box::new(move |cc| Ok(Box::new(VisorApp::with_files(cc, files)))),
    )
}
