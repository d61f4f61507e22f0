//! egui renderer for the application UI.

mod candidates_panel;
mod canvas;

use std::collections::HashMap;

use eframe::egui::{self, Color32, RichText, TextureHandle};

use crate::config::UiSettings;
use crate::egui_app::controller::RecognitionController;
use crate::recognition::{ClassifierWorker, SymbolCatalog, SymbolId};

pub use canvas::CANVAS_SIZE;

/// Width reserved for the candidate list.
const CANDIDATE_PANEL_WIDTH: f32 = 200.0;
/// Smallest window that fits the canvas and candidate list.
pub const MIN_VIEWPORT_SIZE: egui::Vec2 = egui::vec2(
    CANVAS_SIZE.x + CANDIDATE_PANEL_WIDTH,
    CANVAS_SIZE.y + 40.0,
);

/// How a chosen candidate leaves the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Copy to the clipboard and keep the window open.
    Clipboard,
    /// Print to stdout and close the window.
    Script,
}

/// Renders the drawing canvas and candidate list.
pub struct HwylaApp {
    pub(crate) controller: RecognitionController<ClassifierWorker>,
    pub(crate) previews: HashMap<SymbolId, Option<TextureHandle>>,
    output: OutputMode,
}

impl HwylaApp {
    pub fn new(
        worker: ClassifierWorker,
        top_k: usize,
        catalog: SymbolCatalog,
        settings: UiSettings,
        output: OutputMode,
    ) -> Self {
        Self {
            controller: RecognitionController::new(worker, top_k, catalog, settings),
            previews: HashMap::new(),
            output,
        }
    }

    pub(crate) fn on_candidate_selected(&mut self, ctx: &egui::Context, index: usize) {
        let Some(text) = self.controller.select(index) else {
            return;
        };
        match self.output {
            OutputMode::Clipboard => ctx.copy_text(text),
            OutputMode::Script => {
                println!("{text}");
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new("hwyla").strong());
                ui.separator();
                if ui.button("⟲ Clear").on_hover_text("Start a new symbol").clicked() {
                    self.controller.reset();
                }
            });
        });
    }

    fn render_status(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            let status = &self.controller.ui.status;
            ui.horizontal(|ui| {
                ui.add_space(8.0);
                ui.painter().circle_filled(
                    ui.cursor().min + egui::vec2(6.0, 9.0),
                    6.0,
                    status.badge_color,
                );
                ui.add_space(16.0);
                ui.label(&status.badge_label);
                ui.separator();
                ui.label(&status.text);
            });
        });
    }
}

impl eframe::App for HwylaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.controller.drain_events();
        if let Some(message) = self.controller.ui.fatal_error.clone() {
            render_fatal(ctx, &message);
            return;
        }
        self.render_top_bar(ctx);
        self.render_status(ctx);
        egui::SidePanel::right("candidates")
            .exact_width(CANDIDATE_PANEL_WIDTH)
            .resizable(false)
            .show(ctx, |ui| candidates_panel::render_candidates_panel(self, ui));
        egui::CentralPanel::default().show(ctx, |ui| canvas::render_canvas(self, ui));
    }
}

/// Full-window error shown when recognition cannot continue.
pub fn render_fatal(ctx: &egui::Context, message: &str) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.heading("Recognition unavailable");
            ui.label(RichText::new(message).color(Color32::LIGHT_RED));
        });
    });
}
