use std::path::PathBuf;
use thiserror::Error;

pub type MyDriveResult<T> = Result<T, MyDriveError>;

#[derive(Debug, Error)]
pub enum MyDriveError {
    #[error("source file not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("no metadata record for file {file_id}")]
    MetadataNotFound { file_id: String },

    #[error("chunk {index} missing: {}", path.display())]
    MissingChunk { index: u64, path: PathBuf },

    #[error("chunk {index} corrupted ({}): expected sha256 {expected}, got {actual}", path.display())]
    ChunkCorrupted {
        index: u64,
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("reassembled ciphertext does not match file id: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("malformed metadata {}: {reason}", path.display())]
    MalformedMetadata { path: PathBuf, reason: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Machine-readable discriminant of a [`MyDriveError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SourceNotFound,
    MetadataNotFound,
    MissingChunk,
    ChunkCorrupted,
    IntegrityMismatch,
    DecryptionFailed,
    MalformedMetadata,
    Config,
    Crypto,
    Io,
    Serialization,
    Other,
}

impl MyDriveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MyDriveError::SourceNotFound { .. } => ErrorKind::SourceNotFound,
            MyDriveError::MetadataNotFound { .. } => ErrorKind::MetadataNotFound,
            MyDriveError::MissingChunk { .. } => ErrorKind::MissingChunk,
            MyDriveError::ChunkCorrupted { .. } => ErrorKind::ChunkCorrupted,
            MyDriveError::IntegrityMismatch { .. } => ErrorKind::IntegrityMismatch,
            MyDriveError::DecryptionFailed(_) => ErrorKind::DecryptionFailed,
            MyDriveError::MalformedMetadata { .. } => ErrorKind::MalformedMetadata,
            MyDriveError::Config(_) => ErrorKind::Config,
            MyDriveError::Crypto(_) => ErrorKind::Crypto,
            MyDriveError::Io(_) => ErrorKind::Io,
            MyDriveError::Serialization(_) => ErrorKind::Serialization,
            MyDriveError::Other(_) => ErrorKind::Other,
        }
    }

    /// True for failures that mean stored data no longer matches what was written.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ChunkCorrupted | ErrorKind::IntegrityMismatch | ErrorKind::DecryptionFailed
        )
    }

    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        MyDriveError::MalformedMetadata {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::SourceNotFound => "source-not-found",
            ErrorKind::MetadataNotFound => "metadata-not-found",
            ErrorKind::MissingChunk => "missing-chunk",
            ErrorKind::ChunkCorrupted => "chunk-corrupted",
            ErrorKind::IntegrityMismatch => "integrity-mismatch",
            ErrorKind::DecryptionFailed => "decryption-failed",
            ErrorKind::MalformedMetadata => "malformed-metadata",
            ErrorKind::Config => "config",
            ErrorKind::Crypto => "crypto",
            ErrorKind::Io => "io",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Other => "other",
        };
        f.write_str(s)
    }
}
