use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Store failure: {0}")]
    Store(String),

    #[error("Embedding backend failure: {0}")]
    EmbeddingBackend(String),

    #[error("Dimension mismatch for recipe {id}: query has {expected} dims, stored vector has {got}")]
    DimensionMismatch { id: i64, expected: usize, got: usize },

    #[error("Corrupt vector blob: {0}")]
    CorruptVector(String),
}

impl Error {
    /// Whether the interactive loop may report this error and keep going.
    ///
    /// Store and backend failures abort the current query only. Everything
    /// else points at broken configuration or broken data.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Store(_) | Error::EmbeddingBackend(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
