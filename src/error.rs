/// Error types for the issue board
///
/// Every fallible operation in the crate returns `error::Result<T>`.
/// Photo failures never leave the card (they become the "image unavailable"
/// placeholder), everything else is reported in the status line.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("could not determine the user data directory")]
    NoDataDir,
}

pub type Result<T> = std::result::Result<T, AppError>;
