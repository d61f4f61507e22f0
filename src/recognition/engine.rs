use ndarray::ArrayView3;

use super::error::RecognitionError;

/// Black-box model mapping a `(1, N, 3)` feature tensor to class scores.
///
/// Implementations are not expected to be reentrant; callers serialize
/// access (see [`SymbolClassifier`](super::SymbolClassifier)).
pub trait InferenceEngine {
    /// Re-bind the sole input to `dims` and re-allocate any buffers that
    /// depend on its shape. Called before every [`invoke`](Self::invoke)
    /// because sequence length changes with each drawing.
    fn resize_input(&mut self, dims: &[usize]) -> Result<(), RecognitionError>;

    /// Run one inference pass and return the sole output's scores.
    fn invoke(&mut self, input: ArrayView3<'_, f32>) -> Result<Vec<f32>, RecognitionError>;

    /// Number of classes the model scores, when it is known before inference.
    fn output_len(&self) -> Option<usize> {
        None
    }
}

impl<E: InferenceEngine + ?Sized> InferenceEngine for Box<E> {
    fn resize_input(&mut self, dims: &[usize]) -> Result<(), RecognitionError> {
        (**self).resize_input(dims)
    }

    fn invoke(&mut self, input: ArrayView3<'_, f32>) -> Result<Vec<f32>, RecognitionError> {
        (**self).invoke(input)
    }

    fn output_len(&self) -> Option<usize> {
        (**self).output_len()
    }
}
