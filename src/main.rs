// GUI-subsystem binary on Windows: headless runs report through the exit code
// and the session log.
#![windows_subsystem = "windows"]

use clap::Parser;
use eframe::egui;

use reefpaint::app::ReefPaintApp;
use reefpaint::assets::APP_ICON_PNG;
use reefpaint::cli::{self, CliArgs};
use reefpaint::logger;

fn main() -> Result<(), eframe::Error> {
    // -- CLI / headless mode ---------------------------------------------
    if CliArgs::is_cli_mode() {
        let args = CliArgs::parse();
        let code = cli::run(args);
        std::process::exit(if code == std::process::ExitCode::SUCCESS {
            0
        } else {
            1
        });
    }

    // -- GUI mode -----------------------------------------------------

    // Initialize session log (overwrites previous session log)
    logger::init();

    // `--artwork 2` opens the window on that artwork, like the page's `img` parameter
    let args = CliArgs::try_parse().unwrap_or_default();

    let icon = load_app_icon();
    let options = eframe::NativeOptions {
        viewport: {
            let mut vp = egui::ViewportBuilder::default()
                .with_inner_size([1100.0, 760.0])
                .with_title("ReefPaint - Colorir");
            if let Some(icon_data) = icon {
                vp = vp.with_icon(std::sync::Arc::new(icon_data));
            }
            vp
        },
        ..Default::default()
    };

    eframe::run_native(
        "ReefPaint",
        options,
        Box::new(move |cc| Box::new(ReefPaintApp::new(cc, &args))),
    )
}

/// Decode the embedded PNG icon into raw RGBA for the egui viewport.
fn load_app_icon() -> Option<egui::viewport::IconData> {
    let img = image::load_from_memory(APP_ICON_PNG).ok()?.into_rgba8();
    let (w, h) = img.dimensions();
    Some(egui::viewport::IconData {
        rgba: img.into_raw(),
        width: w,
        height: h,
    })
}
