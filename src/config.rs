//! Application settings stored in `.hwyla/config.toml`.
//!
//! Every field has a default, so a missing file or a partial file is valid.
//! `HWYLA_MODEL_PATH` overrides the configured model artifact.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs;
use crate::recognition::DEFAULT_TOP_K;

/// Default filename used to store the app configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Packaged model location, relative to the working directory.
pub const DEFAULT_MODEL_PATH: &str = "model/model.tflite";
/// Packaged symbol previews, relative to the working directory.
pub const DEFAULT_PREVIEW_DIR: &str = "assets/previews";
const PREVIEW_DIR_NAME: &str = "previews";
const DEFAULT_INFERENCE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_LINE_WIDTH: f32 = 10.0;
const MODEL_PATH_ENV: &str = "HWYLA_MODEL_PATH";

/// Errors that may occur while loading app configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The application directory could not be prepared.
    #[error("No usable config directory: {0}")]
    AppDir(#[from] app_dirs::AppDirError),
    /// Failed to read a config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Settings loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub recognition: RecognitionSettings,
    #[serde(default)]
    pub ui: UiSettings,
}

/// Model and inference options, fixed once a session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionSettings {
    /// Candidates shown per recognition.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// `.tflite` artifact; relative paths resolve against the working directory.
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    /// Explicit path to the TensorFlow Lite C library.
    #[serde(default)]
    pub runtime_library: Option<PathBuf>,
    #[serde(default = "default_threads")]
    pub threads: i32,
    /// Upper bound on one inference call before recognition is abandoned.
    #[serde(default = "default_inference_timeout_ms")]
    pub inference_timeout_ms: u64,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            model_path: default_model_path(),
            runtime_library: None,
            threads: default_threads(),
            inference_timeout_ms: default_inference_timeout_ms(),
        }
    }
}

impl RecognitionSettings {
    pub fn inference_timeout(&self) -> Duration {
        Duration::from_millis(self.inference_timeout_ms)
    }

    pub fn resolved_model_path(&self) -> PathBuf {
        self.model_path.clone()
    }

    /// The configured library, else the platform file in `.hwyla/models`,
    /// else the bare file name for the system loader to find.
    pub fn resolved_runtime_library(&self) -> PathBuf {
        if let Some(path) = &self.runtime_library {
            return path.clone();
        }
        let file_name = tflite_library_filename();
        if let Ok(dir) = app_dirs::models_dir() {
            let candidate = dir.join(file_name);
            if candidate.is_file() {
                return candidate;
            }
        }
        PathBuf::from(file_name)
    }

    fn normalized(mut self) -> Self {
        if self.top_k == 0 {
            self.top_k = DEFAULT_TOP_K;
        }
        if self.threads < 1 {
            self.threads = 1;
        }
        if self.inference_timeout_ms == 0 {
            self.inference_timeout_ms = DEFAULT_INFERENCE_TIMEOUT_MS;
        }
        self
    }
}

/// What selecting a candidate copies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyFormat {
    /// The Unicode glyph, e.g. `∫`.
    #[default]
    Glyph,
    /// The LaTeX command, e.g. `\int`.
    Command,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiSettings {
    #[serde(default)]
    pub copy_format: CopyFormat,
    /// Canvas pen width in points.
    #[serde(default = "default_line_width")]
    pub line_width: f32,
    /// Directory holding the catalog's preview images.
    #[serde(default)]
    pub preview_dir: Option<PathBuf>,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            copy_format: CopyFormat::default(),
            line_width: DEFAULT_LINE_WIDTH,
            preview_dir: None,
        }
    }
}

impl UiSettings {
    /// The configured directory, else `.hwyla/previews` when present, else
    /// the packaged [`DEFAULT_PREVIEW_DIR`].
    pub fn resolved_preview_dir(&self) -> PathBuf {
        if let Some(path) = &self.preview_dir {
            return path.clone();
        }
        if let Ok(root) = app_dirs::app_root_dir() {
            let candidate = root.join(PREVIEW_DIR_NAME);
            if candidate.is_dir() {
                return candidate;
            }
        }
        PathBuf::from(DEFAULT_PREVIEW_DIR)
    }
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_model_path() -> PathBuf {
    PathBuf::from(DEFAULT_MODEL_PATH)
}

fn default_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1).max(1) as i32)
        .unwrap_or(1)
}

fn default_inference_timeout_ms() -> u64 {
    DEFAULT_INFERENCE_TIMEOUT_MS
}

fn default_line_width() -> f32 {
    DEFAULT_LINE_WIDTH
}

/// File name of the TensorFlow Lite C library on this platform.
pub fn tflite_library_filename() -> &'static str {
    if cfg!(target_os = "windows") {
        "tensorflowlite_c.dll"
    } else if cfg!(target_os = "macos") {
        "libtensorflowlite_c.dylib"
    } else {
        "libtensorflowlite_c.so"
    }
}

/// Resolve the configuration file path, ensuring the parent directory exists.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_dirs::app_root_dir()?.join(CONFIG_FILE_NAME))
}

/// Load configuration from the app directory, returning defaults if missing.
pub fn load_or_default() -> Result<AppConfig, ConfigError> {
    let mut config = load_from(&config_path()?)?;
    apply_env_overrides(&mut config, std::env::var(MODEL_PATH_ENV).ok());
    Ok(config)
}

/// Load configuration from `path`; a missing file yields defaults.
pub fn load_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: AppConfig = toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(AppConfig {
        recognition: config.recognition.normalized(),
        ui: config.ui,
    })
}

fn apply_env_overrides(config: &mut AppConfig, model_path: Option<String>) {
    if let Some(path) = model_path.filter(|path| !path.trim().is_empty()) {
        config.recognition.model_path = PathBuf::from(path);
    }
}
