use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Failed to read config from {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config from {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Logging error: {0}")]
    Logging(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
