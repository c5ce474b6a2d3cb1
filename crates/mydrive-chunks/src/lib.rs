//! mydrive-chunks: fixed-size chunking of ciphertext with per-chunk SHA-256 verification
//!
//! # Overview
//! - `sha256`: hex digests and the 16-char content identifiers derived from them
//! - `store`: split a buffer into chunk files, load them back with hash checks,
//!   reassemble in index order, delete

pub mod sha256;
pub mod store;

// Convenience re-exports for the most common operations
pub use sha256::{content_id, is_content_id, sha256_hex, short_id};
pub use store::{chunk_count, chunk_file_name, ChunkStore};
