use eframe::egui::{self, Color32, RichText, TextureHandle, TextureOptions};
use tracing::warn;

use super::HwylaApp;
use crate::recognition::SymbolId;

const PREVIEW_SIZE: f32 = 32.0;

pub(crate) fn render_candidates_panel(app: &mut HwylaApp, ui: &mut egui::Ui) {
    ui.label(RichText::new("Symbol").color(Color32::WHITE));
    ui.separator();
    let mut clicked = None;
    egui::ScrollArea::vertical()
        .id_salt("candidates_scroll")
        .show(ui, |ui| {
            let rows = app.controller.ui.candidates.clone();
            for (index, row) in rows.iter().enumerate() {
                ui.horizontal(|ui| {
                    let selected = app.controller.ui.selected == Some(index);
                    let label = RichText::new(&row.glyph).size(28.0).color(Color32::WHITE);
                    let response = ui
                        .selectable_label(selected, label)
                        .on_hover_text(&row.command);
                    if response.clicked() {
                        clicked = Some(index);
                    }
                    if row.has_preview
                        && let Some(texture) = preview_texture(app, ui.ctx(), row.symbol_id)
                    {
                        ui.add(
                            egui::Image::new(&texture)
                                .fit_to_exact_size(egui::vec2(PREVIEW_SIZE, PREVIEW_SIZE)),
                        );
                    }
                    ui.label(RichText::new(&row.command).monospace().weak());
                });
            }
        });
    if let Some(index) = clicked {
        app.on_candidate_selected(ui.ctx(), index);
    }
}

/// Decode and upload a preview once; failures are cached as `None`.
fn preview_texture(app: &mut HwylaApp, ctx: &egui::Context, id: SymbolId) -> Option<TextureHandle> {
    if let Some(cached) = app.previews.get(&id) {
        return cached.clone();
    }
    let texture = match app.controller.catalog().load_preview(id) {
        Ok(image) => {
            let size = [image.width() as usize, image.height() as usize];
            let color = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
            Some(ctx.load_texture(format!("preview_{id}"), color, TextureOptions::LINEAR))
        }
        Err(err) => {
            warn!("No preview for symbol {id}: {err}");
            None
        }
    };
    app.previews.insert(id, texture.clone());
    texture
}
