//! Error types for Boxwatch

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoxwatchError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid mode: {0} (expected open, restricted or locked)")]
    InvalidMode(String),

    #[error("Serialization error: {0}")]
    SerializeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BoxwatchError>;
