//! Whole-file AES-256-GCM encryption/decryption
//!
//! Output format (binary):
//! ```text
//! [N bytes: ciphertext][16 bytes: GCM tag]
//! ```
//!
//! No associated data. The nonce is not embedded; it lives in the metadata
//! record next to the key.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};

use crate::keys::{FileKey, FileNonce};
use crate::TAG_SIZE;

/// Ciphertext length for a plaintext of `plaintext_len` bytes.
pub fn encrypted_len(plaintext_len: usize) -> usize {
    plaintext_len + TAG_SIZE
}

/// Encrypt `plaintext` under `key`/`nonce`.
///
/// Returns `ciphertext || tag`.
pub fn seal(key: &FileKey, nonce: &FileNonce, plaintext: &[u8]) -> anyhow::Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    cipher
        .encrypt(Nonce::from_slice(nonce.as_bytes()), plaintext)
        .map_err(|e| anyhow::anyhow!("encryption failed: {e}"))
}

/// Decrypt and authenticate `ciphertext || tag`.
///
/// Any failure (wrong key, wrong nonce, modified bytes) yields the same error.
pub fn open(key: &FileKey, nonce: &FileNonce, ciphertext: &[u8]) -> anyhow::Result<Vec<u8>> {
    if ciphertext.len() < TAG_SIZE {
        anyhow::bail!(
            "ciphertext too short: {} bytes (minimum {})",
            ciphertext.len(),
            TAG_SIZE
        );
    }

    let cipher = Aes256Gcm::new(key.as_bytes().into());
    cipher
        .decrypt(Nonce::from_slice(nonce.as_bytes()), ciphertext)
        .map_err(|_| {
            anyhow::anyhow!("authentication failed: invalid key, corrupted data, or tampering")
        })
}
