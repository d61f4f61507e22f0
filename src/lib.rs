//! Handwritten symbol recognition: draw a symbol, get ranked glyph candidates.
/// Application directory resolution.
pub mod app_dirs;
/// Settings loaded from `config.toml`.
pub mod config;
/// egui front end.
pub mod egui_app;
/// Global tracing setup.
pub mod logging;
/// Stroke normalization, inference and ranking.
pub mod recognition;
