use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuietcutError {
    #[error("Media decode failed: {0}")]
    MediaDecode(String),

    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error("No input files found: {0}")]
    NoInputFiles(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, QuietcutError>;
