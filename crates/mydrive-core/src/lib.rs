pub mod config;
pub mod error;
pub mod fsutil;
pub mod types;
pub mod units;

pub use error::{ErrorKind, MyDriveError, MyDriveResult};
pub use types::{
    ChunkDescriptor, EncryptedChunk, EncryptionInfo, FileInfo, FileMetadata, FileSummary,
    LoadedChunk,
};
pub use units::fmt_bytes;

/// AEAD algorithm label recorded in every metadata document
pub const ENCRYPTION_ALGORITHM: &str = "AES-256-GCM";

/// Per-file key size in bits
pub const KEY_SIZE_BITS: u32 = 256;

/// Per-file nonce size in bits
pub const NONCE_SIZE_BITS: u32 = 96;

/// Number of hex characters kept from a SHA-256 digest for `file_id` / `chunk_id`
pub const SHORT_ID_LEN: usize = 16;

/// Default chunk size: 1 MiB
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;
