//! mydrive-crypto: single-shot file encryption for MyDrive
//!
//! Each file is sealed once with AES-256-GCM under a key and nonce generated
//! fresh from the OS random source for that file alone:
//!
//! ```text
//! plaintext ──AES-256-GCM(key, nonce, aad = ∅)──▶ ciphertext || 16-byte tag
//! ```
//!
//! Key and nonce are returned to the caller as hex for storage in the file's
//! metadata record. No key wrapping is performed.

pub mod cipher;
pub mod keys;

pub use cipher::{encrypted_len, open, seal};
pub use keys::{FileKey, FileNonce, KeyMaterial};

/// Size of a file key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;
