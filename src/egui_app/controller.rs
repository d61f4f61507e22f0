//! Bridges canvas pointer events to the recognition session and turns session
//! events into UI state. Nothing here depends on egui widgets, so it can be
//! driven directly in tests.

use std::sync::mpsc::{self, Receiver};

use tracing::{debug, warn};

use crate::config::{CopyFormat, UiSettings};
use crate::egui_app::state::{CandidateRow, StatusBarState, UiState};
use crate::recognition::{
    ClassificationResult, Recognizer, RecognitionSession, SessionError, SessionEvent,
    StrokeSample, SymbolCatalog,
};

/// Maintains app state and bridges core logic to the egui UI.
pub struct RecognitionController<R> {
    pub ui: UiState,
    session: RecognitionSession<R>,
    events: Receiver<SessionEvent>,
    catalog: SymbolCatalog,
    settings: UiSettings,
}

impl<R: Recognizer> RecognitionController<R> {
    pub fn new(recognizer: R, top_k: usize, catalog: SymbolCatalog, settings: UiSettings) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut session = RecognitionSession::new(recognizer, top_k);
        session.add_observer(tx);
        Self {
            ui: UiState::default(),
            session,
            events: rx,
            catalog,
            settings,
        }
    }

    pub fn session(&self) -> &RecognitionSession<R> {
        &self.session
    }

    pub fn catalog(&self) -> &SymbolCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &UiSettings {
        &self.settings
    }

    /// Start a stroke whose first sample is the press point.
    pub fn pointer_pressed(&mut self, timestamp_ms: f64, x: f64, y: f64) {
        if let Err(err) = self.session.begin_stroke() {
            debug!("Ignoring pointer press: {err}");
            return;
        }
        self.pointer_moved(timestamp_ms, x, y);
    }

    pub fn pointer_moved(&mut self, timestamp_ms: f64, x: f64, y: f64) {
        match self.session.add_sample(StrokeSample::new(timestamp_ms, x, y)) {
            Ok(()) | Err(SessionError::NotDrawing) => {}
            Err(err) => debug!("Dropped pointer sample: {err}"),
        }
    }

    pub fn pointer_released(&mut self) {
        if let Err(err) = self.session.end_stroke() {
            warn!("Stroke recognition failed: {err}");
        }
        self.drain_events();
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.drain_events();
    }

    /// Apply queued session events to the UI state.
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                SessionEvent::StrokeUpdated(_) => {}
                SessionEvent::RecognitionUpdated(result) => self.show_candidates(&result),
                SessionEvent::Reset => {
                    self.ui.candidates.clear();
                    self.ui.selected = None;
                    self.ui.status = StatusBarState::idle();
                }
                SessionEvent::RecognitionFailed { message, fatal } => {
                    if fatal {
                        self.ui.fatal_error = Some(message);
                    } else {
                        self.ui.status = StatusBarState::warning(format!(
                            "{message}. Try drawing the symbol again."
                        ));
                    }
                }
            }
        }
    }

    /// Text to copy for candidate `index`, honoring the configured format.
    pub fn select(&mut self, index: usize) -> Option<String> {
        let row = self.ui.candidates.get(index)?;
        let text = match self.settings.copy_format {
            CopyFormat::Glyph => row.glyph.clone(),
            CopyFormat::Command => row.command.clone(),
        };
        self.ui.selected = Some(index);
        self.ui.status = StatusBarState::info(format!("Copied {text}"));
        Some(text)
    }

    fn show_candidates(&mut self, result: &ClassificationResult) {
        let mut rows = Vec::with_capacity(result.len());
        for ranked in result.ranked() {
            let Some(entry) = self.catalog.get(ranked.symbol_id) else {
                warn!("Model returned unknown symbol id {}", ranked.symbol_id);
                continue;
            };
            rows.push(CandidateRow {
                symbol_id: entry.id,
                rank: ranked.rank,
                glyph: entry.glyph.clone(),
                command: entry.command.clone(),
                has_preview: entry.preview.is_some(),
            });
        }
        self.ui.status = StatusBarState::info(format!("{} candidates", rows.len()));
        self.ui.candidates = rows;
        self.ui.selected = None;
    }
}
