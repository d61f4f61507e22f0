//! Stroke capture → normalization → inference → ranked candidates.

mod catalog;
mod classifier;
mod engine;
mod error;
mod normalize;
mod session;
mod stroke;
mod tflite_runtime;
mod worker;

pub use catalog::{CatalogError, SymbolCatalog, SymbolEntry, SymbolId};
pub use classifier::{
    FEATURES_PER_POINT, Recognizer, SymbolClassifier, build_input_tensor, top_k_indices,
};
pub use engine::InferenceEngine;
pub use error::{RecognitionError, SessionError};
pub use normalize::normalize;
pub use session::{
    ClassificationResult, DEFAULT_TOP_K, RankedSymbol, RecognitionObserver, RecognitionSession,
    SessionEvent, SessionState,
};
pub use stroke::{Drawing, NormalizedPoint, Stroke, StrokeSample};
pub use tflite_runtime::TfliteRuntime;
pub use worker::ClassifierWorker;

use crate::config::RecognitionSettings;

/// Load the configured TFLite model and pair it with `catalog`'s class table.
pub fn load_tflite_classifier(
    settings: &RecognitionSettings,
    catalog: &SymbolCatalog,
) -> Result<SymbolClassifier<TfliteRuntime>, RecognitionError> {
    let model_path = settings.resolved_model_path();
    let library = settings.resolved_runtime_library();
    let runtime = TfliteRuntime::load(&model_path, &library, settings.threads)?;
    SymbolClassifier::new(runtime, catalog.class_table())
}

/// Start a [`ClassifierWorker`] that owns a TFLite classifier for `catalog`.
pub fn spawn_tflite_worker(
    settings: &RecognitionSettings,
    catalog: &SymbolCatalog,
) -> Result<ClassifierWorker, RecognitionError> {
    let settings_for_worker = settings.clone();
    let catalog_for_worker = catalog.clone();
    ClassifierWorker::spawn(
        move || load_tflite_classifier(&settings_for_worker, &catalog_for_worker),
        settings.inference_timeout(),
    )
}
