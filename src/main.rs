#![deny(missing_docs)]

//! Entry point for the egui-based hwyla window.
//!
//! `--script` (or `-s`) prints the chosen symbol to stdout and quits instead
//! of copying it to the clipboard.
#![cfg_attr(
    all(not(debug_assertions), target_os = "windows"),
    windows_subsystem = "windows"
)]
use eframe::egui;
use hwyla::config;
use hwyla::egui_app::ui::{HwylaApp, MIN_VIEWPORT_SIZE, OutputMode, render_fatal};
use hwyla::logging::{self, ConsoleTarget};
use hwyla::recognition::{self, SymbolCatalog};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output = if script_mode_requested() {
        OutputMode::Script
    } else {
        OutputMode::Clipboard
    };
    let console = match output {
        OutputMode::Script => ConsoleTarget::Stderr,
        OutputMode::Clipboard => ConsoleTarget::Stdout,
    };
    if let Err(err) = logging::init_with(console) {
        eprintln!("Logging disabled: {err}");
    }

    let launch = build_app(output);
    if let Err(message) = &launch {
        tracing::error!("{message}");
    }

    let viewport = egui::ViewportBuilder::default()
        .with_title("hwyla")
        .with_inner_size(MIN_VIEWPORT_SIZE + egui::vec2(100.0, 48.0))
        .with_min_inner_size(MIN_VIEWPORT_SIZE);
    let native_options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "hwyla",
        native_options,
        Box::new(move |_cc| match launch {
            Ok(app) => Ok(Box::new(app)),
            Err(message) => Ok(Box::new(LaunchError { message })),
        }),
    )?;
    Ok(())
}

fn script_mode_requested() -> bool {
    std::env::args_os()
        .skip(1)
        .any(|arg| arg == "--script" || arg == "-s")
}

/// Load settings, the symbol catalog and the model; any failure is fatal.
fn build_app(output: OutputMode) -> Result<HwylaApp, String> {
    let cfg = config::load_or_default().map_err(|err| format!("Failed to load config: {err}"))?;
    let catalog = SymbolCatalog::embedded()
        .map_err(|err| format!("Failed to load symbols: {err}"))?
        .with_preview_dir(cfg.ui.resolved_preview_dir());
    let worker = recognition::spawn_tflite_worker(&cfg.recognition, &catalog)
        .map_err(|err| err.to_string())?;
    Ok(HwylaApp::new(
        worker,
        cfg.recognition.top_k,
        catalog,
        cfg.ui,
        output,
    ))
}

/// Minimal fallback app to display initialization errors.
struct LaunchError {
    message: String,
}

impl eframe::App for LaunchError {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        render_fatal(ctx, &self.message);
    }
}
