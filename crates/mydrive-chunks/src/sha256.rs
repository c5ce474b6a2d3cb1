//! SHA-256 content hashing for chunks and whole ciphertexts
//!
//! The full 64-char hex digest is the integrity anchor stored per chunk.
//! The 16-char prefix is used as a short identifier: `chunk_id` for chunks
//! and `file_id` for a file's complete ciphertext.

use mydrive_core::SHORT_ID_LEN;
use sha2::{Digest, Sha256};

/// Hash a byte slice and return the lowercase hex digest (64 chars).
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// First 16 hex characters of a digest.
pub fn short_id(digest_hex: &str) -> String {
    digest_hex.chars().take(SHORT_ID_LEN).collect()
}

/// Content-derived identifier: `sha256_hex(data)[..16]`
pub fn content_id(data: &[u8]) -> String {
    short_id(&sha256_hex(data))
}

/// True if `s` could be a content identifier (16 lowercase hex chars).
pub fn is_content_id(s: &str) -> bool {
    s.len() == SHORT_ID_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
