//! Runner errors: engine errors plus the I/O and parsing around them.

use std::path::PathBuf;

use thiserror::Error;

use orb_core::{ConfigError, OrbError};

/// Errors from loading inputs, running days and writing artifacts.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("engine error: {0}")]
    Engine(#[from] OrbError),

    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to parse config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to render config: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bad row {row} in {path}: {reason}")]
    BadRow {
        path: PathBuf,
        row: usize,
        reason: String,
    },

    #[error("no candles to run")]
    NoData,
}

impl RunError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RunError::Io {
            path: path.into(),
            source,
        }
    }
}
