use std::cmp::Ordering;
use std::sync::Mutex;

use ndarray::Array3;
use tracing::debug;

use super::catalog::SymbolId;
use super::engine::InferenceEngine;
use super::error::RecognitionError;
use super::stroke::NormalizedPoint;

/// Features per point: `dt`, `nx`, `ny`.
pub const FEATURES_PER_POINT: usize = 3;

/// Anything that ranks symbols for a normalized drawing.
pub trait Recognizer {
    /// Return up to `k` symbol ids, best first.
    fn recognize(
        &self,
        points: &[NormalizedPoint],
        k: usize,
    ) -> Result<Vec<SymbolId>, RecognitionError>;
}

impl<R: Recognizer + ?Sized> Recognizer for &R {
    fn recognize(
        &self,
        points: &[NormalizedPoint],
        k: usize,
    ) -> Result<Vec<SymbolId>, RecognitionError> {
        (**self).recognize(points, k)
    }
}

impl<R: Recognizer + ?Sized> Recognizer for std::sync::Arc<R> {
    fn recognize(
        &self,
        points: &[NormalizedPoint],
        k: usize,
    ) -> Result<Vec<SymbolId>, RecognitionError> {
        (**self).recognize(points, k)
    }
}

/// Owns the inference engine and the class table it scores against.
pub struct SymbolClassifier<E> {
    engine: Mutex<E>,
    class_table: Vec<SymbolId>,
}

impl<E: InferenceEngine> SymbolClassifier<E> {
    /// Pair an engine with its class table.
    ///
    /// Fails with [`RecognitionError::InvalidModelOutput`] when the engine
    /// already knows its class count and it disagrees with the table.
    pub fn new(engine: E, class_table: Vec<SymbolId>) -> Result<Self, RecognitionError> {
        if class_table.is_empty() {
            return Err(RecognitionError::InvalidModelOutput {
                expected: 0,
                actual: engine.output_len().unwrap_or(0),
            });
        }
        if let Some(actual) = engine.output_len()
            && actual != class_table.len()
        {
            return Err(RecognitionError::InvalidModelOutput {
                expected: class_table.len(),
                actual,
            });
        }
        Ok(Self {
            engine: Mutex::new(engine),
            class_table,
        })
    }

    pub fn class_count(&self) -> usize {
        self.class_table.len()
    }

    /// Rank the `k` most likely symbols for `points`, best first.
    ///
    /// `k` larger than the class table is clamped to it.
    pub fn classify(
        &self,
        points: &[NormalizedPoint],
        k: usize,
    ) -> Result<Vec<SymbolId>, RecognitionError> {
        if points.is_empty() {
            return Err(RecognitionError::InvalidInput(
                "cannot classify an empty drawing".into(),
            ));
        }
        if k == 0 {
            return Err(RecognitionError::InvalidInput("k must be positive".into()));
        }
        let tensor = build_input_tensor(points)?;
        let scores = {
            let mut engine = self
                .engine
                .lock()
                .map_err(|_| RecognitionError::EnginePoisoned)?;
            engine.resize_input(tensor.shape())?;
            engine.invoke(tensor.view())?
        };
        if scores.len() != self.class_table.len() {
            return Err(RecognitionError::InvalidModelOutput {
                expected: self.class_table.len(),
                actual: scores.len(),
            });
        }
        if let Some(index) = scores.iter().position(|score| !score.is_finite()) {
            return Err(RecognitionError::RecognitionFailure(format!(
                "class {index} scored {}",
                scores[index]
            )));
        }
        let ranked = top_k_indices(&scores, k);
        debug!(
            points = points.len(),
            k,
            best_score = ?ranked.first().map(|&index| scores[index]),
            "Classified drawing"
        );
        Ok(ranked
            .into_iter()
            .map(|index| self.class_table[index])
            .collect())
    }
}

impl<E: InferenceEngine> Recognizer for SymbolClassifier<E> {
    fn recognize(
        &self,
        points: &[NormalizedPoint],
        k: usize,
    ) -> Result<Vec<SymbolId>, RecognitionError> {
        self.classify(points, k)
    }
}

/// Lay points out as a `(1, N, 3)` tensor, one `(dt, nx, ny)` row per point.
pub fn build_input_tensor(points: &[NormalizedPoint]) -> Result<Array3<f32>, RecognitionError> {
    let mut data = Vec::with_capacity(points.len() * FEATURES_PER_POINT);
    for point in points {
        data.extend_from_slice(&[point.dt, point.nx, point.ny]);
    }
    Array3::from_shape_vec((1, points.len(), FEATURES_PER_POINT), data)
        .map_err(|err| RecognitionError::RecognitionFailure(format!("bad input shape: {err}")))
}

/// Indices of the `k` largest scores in descending order.
///
/// Equal scores keep ascending index order, so results are reproducible.
pub fn top_k_indices(scores: &[f32], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(Ordering::Equal)
    });
    indices.truncate(k.min(scores.len()));
    indices
}
