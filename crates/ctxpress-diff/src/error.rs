use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiffError {
    /// The change source or patch builder could not produce a diff
    #[error("Error calculating diff: {0}")]
    Construction(String),

    #[error("Error calculating diff: {0}")]
    Git(#[from] git2::Error),

    #[error("Invalid path pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DiffError {
    /// Whether the failure came from the VCS side rather than from input
    pub fn is_construction(&self) -> bool {
        matches!(self, DiffError::Construction(_) | DiffError::Git(_))
    }
}

pub type DiffResult<T> = Result<T, DiffError>;
