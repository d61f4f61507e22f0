//! Shared state types for the egui UI.

use egui::Color32;

use crate::recognition::SymbolId;

/// Top-level UI model consumed by the egui renderer.
#[derive(Clone, Debug, Default)]
pub struct UiState {
    pub status: StatusBarState,
    /// Ranked candidates for the current drawing, best first.
    pub candidates: Vec<CandidateRow>,
    /// Index into `candidates` of the last selection.
    pub selected: Option<usize>,
    /// Set when recognition can no longer run; the window shows only this.
    pub fatal_error: Option<String>,
}

/// One entry of the candidate list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateRow {
    pub symbol_id: SymbolId,
    pub rank: usize,
    pub glyph: String,
    pub command: String,
    pub has_preview: bool,
}

/// Status bar text and badge.
#[derive(Clone, Debug)]
pub struct StatusBarState {
    pub text: String,
    pub badge_label: String,
    pub badge_color: Color32,
}

impl StatusBarState {
    pub fn idle() -> Self {
        Self {
            text: "Draw a symbol".into(),
            badge_label: "Idle".into(),
            badge_color: Color32::from_rgb(42, 42, 42),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            badge_label: "Info".into(),
            badge_color: Color32::from_rgb(64, 140, 112),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            badge_label: "Warning".into(),
            badge_color: Color32::from_rgb(198, 143, 82),
        }
    }
}

impl Default for StatusBarState {
    fn default() -> Self {
        Self::idle()
    }
}
