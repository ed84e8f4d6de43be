use thiserror::Error;

/// Failure taxonomy shared by every retrieval crate.
///
/// Admission outcomes of the validation gate are not errors and never appear
/// here; see `ragkit-validate`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Degenerate vector: {0}")]
    DegenerateVector(String),

    #[error("Duplicate chunk id: {0}")]
    DuplicateChunk(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Artifact length mismatch: {vectors} vectors but {ids} chunk ids")]
    LengthMismatch { vectors: usize, ids: usize },

    #[error("Corrupt artifact: {0}")]
    CorruptArtifact(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self { Error::Serialization(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, Error>;
