use thiserror::Error;

#[derive(Error, Debug)]
pub enum CirrusError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Resource error: {0}")]
    Resource(String),

    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CirrusError>;
