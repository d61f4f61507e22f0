//! Stroke accumulation and recognition triggering.
//!
//! A UI adapter translates its pointer events into [`RecognitionSession`]
//! calls: press → [`begin_stroke`](RecognitionSession::begin_stroke), motion →
//! [`add_sample`](RecognitionSession::add_sample), release →
//! [`end_stroke`](RecognitionSession::end_stroke). Results reach the UI through
//! [`RecognitionObserver`] callbacks, invoked synchronously.

use std::sync::mpsc::Sender;

use tracing::{debug, info, warn};

use super::catalog::SymbolId;
use super::classifier::Recognizer;
use super::error::{RecognitionError, SessionError};
use super::normalize::normalize;
use super::stroke::{Drawing, Stroke, StrokeSample};

/// Candidates returned per recognition when not configured otherwise.
pub const DEFAULT_TOP_K: usize = 10;

/// A candidate and its position in the ranking (0 = best).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedSymbol {
    pub symbol_id: SymbolId,
    pub rank: usize,
}

/// Candidates for the current drawing, best first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationResult {
    ranked: Vec<RankedSymbol>,
}

impl ClassificationResult {
    pub fn from_ranked(ids: impl IntoIterator<Item = SymbolId>) -> Self {
        let ranked = ids
            .into_iter()
            .enumerate()
            .map(|(rank, symbol_id)| RankedSymbol { symbol_id, rank })
            .collect();
        Self { ranked }
    }

    pub fn ranked(&self) -> &[RankedSymbol] {
        &self.ranked
    }

    pub fn symbol_ids(&self) -> Vec<SymbolId> {
        self.ranked.iter().map(|entry| entry.symbol_id).collect()
    }

    pub fn best(&self) -> Option<SymbolId> {
        self.ranked.first().map(|entry| entry.symbol_id)
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

/// Receives session updates. All methods default to doing nothing.
pub trait RecognitionObserver {
    /// The in-progress stroke gained a sample.
    fn on_stroke_updated(&mut self, _stroke: &Stroke) {}
    /// New candidates for the whole drawing.
    fn on_recognition_updated(&mut self, _result: &ClassificationResult) {}
    /// The drawing was cleared; displayed candidates are stale.
    fn on_reset(&mut self) {}
    /// Classification of the drawing failed.
    fn on_recognition_failed(&mut self, _error: &RecognitionError) {}
}

/// Observer notifications as values, for UIs that poll a channel.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StrokeUpdated(Stroke),
    RecognitionUpdated(ClassificationResult),
    Reset,
    RecognitionFailed { message: String, fatal: bool },
}

impl RecognitionObserver for Sender<SessionEvent> {
    fn on_stroke_updated(&mut self, stroke: &Stroke) {
        let _ = self.send(SessionEvent::StrokeUpdated(stroke.clone()));
    }

    fn on_recognition_updated(&mut self, result: &ClassificationResult) {
        let _ = self.send(SessionEvent::RecognitionUpdated(result.clone()));
    }

    fn on_reset(&mut self) {
        let _ = self.send(SessionEvent::Reset);
    }

    fn on_recognition_failed(&mut self, error: &RecognitionError) {
        let _ = self.send(SessionEvent::RecognitionFailed {
            message: error.to_string(),
            fatal: error.is_fatal(),
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No pointer down. Strokes from earlier gestures may be recorded.
    Idle,
    /// Pointer down; samples are accumulating.
    StrokeActive,
}

/// Owns the drawing for one symbol attempt and classifies it stroke by stroke.
pub struct RecognitionSession<R> {
    recognizer: R,
    top_k: usize,
    drawing: Drawing,
    active: Option<Stroke>,
    observers: Vec<Box<dyn RecognitionObserver>>,
}

impl<R: Recognizer> RecognitionSession<R> {
    /// `top_k == 0` falls back to [`DEFAULT_TOP_K`].
    pub fn new(recognizer: R, top_k: usize) -> Self {
        Self {
            recognizer,
            top_k: if top_k == 0 { DEFAULT_TOP_K } else { top_k },
            drawing: Drawing::default(),
            active: None,
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: impl RecognitionObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn state(&self) -> SessionState {
        if self.active.is_some() {
            SessionState::StrokeActive
        } else {
            SessionState::Idle
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Strokes completed since the last reset.
    pub fn drawing(&self) -> &Drawing {
        &self.drawing
    }

    /// The stroke being drawn, if any.
    pub fn current_stroke(&self) -> Option<&Stroke> {
        self.active.as_ref()
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    pub fn begin_stroke(&mut self) -> Result<(), SessionError> {
        if self.active.is_some() {
            return Err(SessionError::AlreadyDrawing);
        }
        self.active = Some(Stroke::new());
        Ok(())
    }

    pub fn add_sample(&mut self, sample: StrokeSample) -> Result<(), SessionError> {
        let stroke = self.active.as_mut().ok_or(SessionError::NotDrawing)?;
        if let Some(previous) = stroke.last()
            && sample.timestamp_ms < previous.timestamp_ms
        {
            return Err(SessionError::NonMonotonicTimestamp {
                previous: previous.timestamp_ms,
                got: sample.timestamp_ms,
            });
        }
        stroke.push(sample);
        for observer in &mut self.observers {
            observer.on_stroke_updated(stroke);
        }
        Ok(())
    }

    /// Commit the active stroke and classify every stroke drawn so far.
    ///
    /// Returns `Ok(None)` without classifying when nothing has been drawn,
    /// including when no stroke was active. A stroke with no samples (a click
    /// without motion) is discarded.
    pub fn end_stroke(&mut self) -> Result<Option<ClassificationResult>, SessionError> {
        let Some(stroke) = self.active.take() else {
            return Ok(None);
        };
        if !stroke.is_empty() {
            self.drawing.push(stroke);
        }
        if self.drawing.is_empty() {
            return Ok(None);
        }
        match self.classify_drawing() {
            Ok(result) => {
                for observer in &mut self.observers {
                    observer.on_recognition_updated(&result);
                }
                Ok(Some(result))
            }
            Err(err) => {
                warn!("Recognition failed: {err}");
                for observer in &mut self.observers {
                    observer.on_recognition_failed(&err);
                }
                Err(err.into())
            }
        }
    }

    /// Forget the drawing and any partial stroke.
    pub fn reset(&mut self) {
        self.drawing.clear();
        self.active = None;
        info!("Recognition session reset");
        for observer in &mut self.observers {
            observer.on_reset();
        }
    }

    fn classify_drawing(&self) -> Result<ClassificationResult, RecognitionError> {
        let samples = self.drawing.flatten();
        let points = normalize(&samples)?;
        debug!(
            strokes = self.drawing.strokes().len(),
            samples = samples.len(),
            "Classifying drawing"
        );
        let ids = self.recognizer.recognize(&points, self.top_k)?;
        Ok(ClassificationResult::from_ranked(ids))
    }
}
