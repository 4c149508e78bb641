// error.rs — error types surfaced to callers

use std::path::PathBuf;
use thiserror::Error;

/// Failures that reach the caller. Sensor, permission and XR failures are
/// absorbed and logged instead; they never show up here.
#[derive(Debug, Error)]
pub enum ControlsError {
    #[error("camera controls were already disposed")]
    Disposed,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
