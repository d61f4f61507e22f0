use eframe::egui::{self, Color32, Pos2, Sense, Shape, Stroke as PenStroke};

use super::HwylaApp;
use crate::recognition::Stroke;

/// Preferred drawing area, in points.
pub const CANVAS_SIZE: egui::Vec2 = egui::vec2(512.0, 512.0);

pub(crate) fn render_canvas(app: &mut HwylaApp, ui: &mut egui::Ui) {
    let size = ui.available_size().max(egui::vec2(64.0, 64.0));
    let (response, painter) = ui.allocate_painter(size, Sense::drag());
    let rect = response.rect;

    // Drags only start past egui's threshold; begin at the press point.
    if response.drag_started() {
        let (origin, pressed_at, now) = ui.input(|input| {
            (
                input.pointer.press_origin(),
                input.pointer.press_start_time(),
                input.time,
            )
        });
        let local = origin.or(response.interact_pointer_pos()).unwrap_or(rect.min) - rect.min;
        app.controller.pointer_pressed(
            pressed_at.unwrap_or(now) * 1000.0,
            local.x as f64,
            local.y as f64,
        );
    }
    if (response.drag_started() || response.dragged())
        && let Some(pos) = response.interact_pointer_pos()
    {
        let timestamp_ms = ui.input(|input| input.time) * 1000.0;
        let local = pos - rect.min;
        app.controller
            .pointer_moved(timestamp_ms, local.x as f64, local.y as f64);
    }
    if response.drag_stopped() {
        app.controller.pointer_released();
    }

    painter.rect_filled(rect, 0.0, Color32::WHITE);
    let width = app.controller.settings().line_width;
    let pen = PenStroke::new(width, Color32::BLACK);
    let session = app.controller.session();
    for stroke in session.drawing().strokes() {
        paint_stroke(&painter, rect.min, stroke, pen);
    }
    if let Some(stroke) = session.current_stroke() {
        paint_stroke(&painter, rect.min, stroke, pen);
    }
}

fn paint_stroke(painter: &egui::Painter, origin: Pos2, stroke: &Stroke, pen: PenStroke) {
    let points: Vec<Pos2> = stroke
        .samples()
        .iter()
        .map(|sample| origin + egui::vec2(sample.x as f32, sample.y as f32))
        .collect();
    // Round caps and joins.
    for point in &points {
        painter.circle_filled(*point, pen.width / 2.0, pen.color);
    }
    if points.len() > 1 {
        painter.add(Shape::line(points, pen));
    }
}
