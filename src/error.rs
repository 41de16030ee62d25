use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("frame count must be positive")]
    ZeroCapacity,

    #[error("unrecognized replacement algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("malformed trace line {line}: {reason}")]
    MalformedTrace { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
