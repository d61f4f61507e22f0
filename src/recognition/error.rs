use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures raised anywhere along the normalize → infer → rank pipeline.
#[derive(Debug, Error)]
pub enum RecognitionError {
    /// The caller handed the pipeline something it can never process.
    #[error("Invalid recognition input: {0}")]
    InvalidInput(String),
    /// The inference artifact or runtime could not be loaded.
    #[error("Failed to load inference model {path}: {reason}")]
    ModelLoad {
        /// Model or runtime library path that failed.
        path: PathBuf,
        /// Loader diagnostic.
        reason: String,
    },
    /// The model's output does not line up with the class table.
    #[error("Model produced {actual} class scores but the class table has {expected} entries")]
    InvalidModelOutput {
        /// Class table length.
        expected: usize,
        /// Score count reported by the engine.
        actual: usize,
    },
    /// A single inference pass failed; the session stays usable.
    #[error("Recognition failed: {0}")]
    RecognitionFailure(String),
    /// Inference did not return within the configured bound.
    #[error("Inference did not finish within {0:?}")]
    InferenceTimeout(Duration),
    /// An earlier inference panicked while holding the engine.
    #[error("Inference engine is unusable after a panic")]
    EnginePoisoned,
    /// The classifier worker thread is gone.
    #[error("Classifier worker stopped")]
    WorkerStopped,
}

impl RecognitionError {
    /// Whether the embedding application must stop offering recognition.
    ///
    /// Only a per-call [`RecognitionError::RecognitionFailure`] is recoverable:
    /// the user may simply redraw.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::RecognitionFailure(_))
    }

    pub(crate) fn model_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ModelLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Misuse of the [`RecognitionSession`](super::RecognitionSession) state machine.
#[derive(Debug, Error)]
pub enum SessionError {
    /// `add_sample` was called with no stroke in progress.
    #[error("No stroke in progress")]
    NotDrawing,
    /// `begin_stroke` was called while a stroke was already active.
    #[error("A stroke is already in progress")]
    AlreadyDrawing,
    /// A sample went back in time within one stroke.
    #[error("Sample timestamp {got}ms precedes previous sample at {previous}ms")]
    NonMonotonicTimestamp {
        /// Timestamp of the last accepted sample.
        previous: f64,
        /// Rejected timestamp.
        got: f64,
    },
    /// Classification of the drawing failed.
    #[error(transparent)]
    Recognition(#[from] RecognitionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_per_call_failures_are_recoverable() {
        assert!(!RecognitionError::RecognitionFailure("engine".into()).is_fatal());
        assert!(RecognitionError::InvalidInput("empty".into()).is_fatal());
        assert!(RecognitionError::model_load("model.tflite", "missing").is_fatal());
        assert!(
            RecognitionError::InvalidModelOutput {
                expected: 3,
                actual: 4
            }
            .is_fatal()
        );
        assert!(RecognitionError::InferenceTimeout(Duration::from_secs(1)).is_fatal());
        assert!(RecognitionError::EnginePoisoned.is_fatal());
    }

    #[test]
    fn model_load_message_names_path() {
        let err = RecognitionError::model_load("/tmp/model.tflite", "file not found");
        assert_eq!(
            err.to_string(),
            "Failed to load inference model /tmp/model.tflite: file not found"
        );
    }
}
