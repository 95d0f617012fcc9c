use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Unsupported model/encoding: {0}")]
    UnsupportedEncoding(String),
}

pub type AdvisorResult<T> = Result<T, AdvisorError>;
