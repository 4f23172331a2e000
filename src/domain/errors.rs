// src/domain/errors.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Guard error: {0}")]
    Guard(#[from] GuardError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GuardError {
    #[error("bar index {index} out of range for {len} bars")]
    IndexOutOfRange { index: isize, len: usize },

    #[error("signal at bar {requested} precedes last recorded signal at bar {last}")]
    NonMonotonicSignal { requested: usize, last: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Invalid pip size: {0}")]
    InvalidPipSize(String),

    #[error("Numeric conversion error: {0}")]
    Conversion(String),
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
pub type GuardResult<T> = Result<T, GuardError>;
pub type AnalysisResult<T> = Result<T, AnalysisError>;
