// Takeout ingest error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TakeoutError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Unknown archive format: {0}")]
    UnknownArchiveFormat(String),

    #[error("Unknown extension: {0}")]
    UnknownExtension(String),

    #[error("Walker is closed: {0}")]
    WalkerClosed(String),

    #[error("No current entry: {0}")]
    NoCurrentEntry(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TakeoutError>;
