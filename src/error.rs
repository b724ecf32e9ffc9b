//! Ошибки конвейера

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("unsupported file extension: {0:?}")]
    UnsupportedFormat(String),

    #[error("column '{0}' does not exist in the table")]
    MissingTarget(String),

    #[error("target column '{0}' is not numeric after cleaning")]
    NonNumericTarget(String),

    #[error("no numeric feature columns left after preprocessing")]
    NoFeatures,

    #[error("failed to read {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("failed to write {}: {message}", path.display())]
    Write { path: PathBuf, message: String },

    #[error("invalid config: {0}")]
    Config(String),

    #[error("model error: {0}")]
    Model(String),

    #[error(transparent)]
    Linfa(#[from] linfa::error::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    pub fn read(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Read {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Write {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
