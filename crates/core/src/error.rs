// Central Error Type for devhost

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Process error: {0}")]
    Process(#[from] crate::port::ProcessError),

    #[error("Probe error: {0}")]
    Probe(#[from] crate::port::ProbeError),

    #[error("Resource error: {0}")]
    Resource(#[from] crate::port::ResourceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
