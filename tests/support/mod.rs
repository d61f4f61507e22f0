#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use hwyla::recognition::{InferenceEngine, RecognitionError};
use ndarray::ArrayView3;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const CONFIG_HOME_ENV: &str = "HWYLA_CONFIG_HOME";

pub struct HwylaEnvGuard {
    previous: Option<String>,
    _lock: MutexGuard<'static, ()>,
}

impl HwylaEnvGuard {
    pub fn set_config_home(path: PathBuf) -> Self {
        let lock = ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|err| err.into_inner());
        let previous = std::env::var(CONFIG_HOME_ENV).ok();
        // SAFETY: tests run under a global lock to prevent concurrent env mutations.
        unsafe {
            std::env::set_var(CONFIG_HOME_ENV, path);
        }
        Self {
            previous,
            _lock: lock,
        }
    }
}

impl Drop for HwylaEnvGuard {
    fn drop(&mut self) {
        // SAFETY: tests run under a global lock to prevent concurrent env mutations.
        unsafe {
            match self.previous.take() {
                Some(value) => std::env::set_var(CONFIG_HOME_ENV, value),
                None => std::env::remove_var(CONFIG_HOME_ENV),
            }
        }
    }
}

/// Engine that returns the same scores for every call and records each input.
#[derive(Clone)]
pub struct ScriptedEngine {
    scores: Vec<f32>,
    pub inputs: Arc<Mutex<Vec<Vec<[f32; 3]>>>>,
}

impl ScriptedEngine {
    pub fn new(scores: Vec<f32>) -> Self {
        Self {
            scores,
            inputs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Scores of length `classes` where `ranking` comes out on top, in order.
    pub fn ranking(classes: usize, ranking: &[usize]) -> Self {
        let mut scores = vec![0.0; classes];
        for (position, &class) in ranking.iter().enumerate() {
            scores[class] = 1.0 - position as f32 * 0.1;
        }
        Self::new(scores)
    }

    pub fn invocations(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }

    pub fn last_input(&self) -> Vec<[f32; 3]> {
        self.inputs.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

impl InferenceEngine for ScriptedEngine {
    fn resize_input(&mut self, dims: &[usize]) -> Result<(), RecognitionError> {
        assert_eq!(dims.len(), 3);
        assert_eq!(dims[0], 1);
        assert_eq!(dims[2], 3);
        Ok(())
    }

    fn invoke(&mut self, input: ArrayView3<'_, f32>) -> Result<Vec<f32>, RecognitionError> {
        let rows: Vec<[f32; 3]> = input
            .outer_iter()
            .next()
            .map(|batch| {
                batch
                    .outer_iter()
                    .map(|row| [row[0], row[1], row[2]])
                    .collect()
            })
            .unwrap_or_default();
        self.inputs.lock().unwrap().push(rows);
        Ok(self.scores.clone())
    }

    fn output_len(&self) -> Option<usize> {
        Some(self.scores.len())
    }
}

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}
