//! Per-file key material: a 256-bit key and a 96-bit nonce, used exactly once

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use crate::{KEY_SIZE, NONCE_SIZE};

/// A per-file 256-bit encryption key. Zeroized on drop.
#[derive(Clone)]
pub struct FileKey {
    bytes: [u8; KEY_SIZE],
}

impl FileKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse a 64-char hex key.
    pub fn from_hex(s: &str) -> anyhow::Result<Self> {
        Ok(Self::from_bytes(decode_fixed(s, "key")?))
    }
}

impl Drop for FileKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for FileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// A 96-bit AES-GCM nonce
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FileNonce {
    bytes: [u8; NONCE_SIZE],
}

impl FileNonce {
    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse a 24-char hex nonce.
    pub fn from_hex(s: &str) -> anyhow::Result<Self> {
        Ok(Self::from_bytes(decode_fixed(s, "nonce")?))
    }
}

impl std::fmt::Debug for FileNonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FileNonce({})", self.to_hex())
    }
}

/// Key and nonce for one encryption operation.
///
/// Only [`KeyMaterial::generate`] creates fresh material; a (key, nonce) pair
/// must never seal two different plaintexts.
#[derive(Debug, Clone)]
pub struct KeyMaterial {
    pub key: FileKey,
    pub nonce: FileNonce,
}

impl KeyMaterial {
    /// Draw a new key and nonce from the operating system CSPRNG.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut key);
        OsRng.fill_bytes(&mut nonce);
        let material = Self {
            key: FileKey::from_bytes(key),
            nonce: FileNonce::from_bytes(nonce),
        };
        key.zeroize();
        material
    }

    /// Rebuild material from its stored hex form.
    pub fn from_hex(key_hex: &str, nonce_hex: &str) -> anyhow::Result<Self> {
        Ok(Self {
            key: FileKey::from_hex(key_hex)?,
            nonce: FileNonce::from_hex(nonce_hex)?,
        })
    }
}

fn decode_fixed<const N: usize>(s: &str, what: &str) -> anyhow::Result<[u8; N]> {
    let mut bytes =
        hex::decode(s.trim()).map_err(|e| anyhow::anyhow!("invalid {what} hex: {e}"))?;
    if bytes.len() != N {
        let got = bytes.len();
        bytes.zeroize();
        anyhow::bail!("{what} has wrong size: {got} bytes (expected {N})");
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    bytes.zeroize();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_material_is_fresh() {
        let a = KeyMaterial::generate();
        let b = KeyMaterial::generate();
        assert_ne!(a.key.as_bytes(), b.key.as_bytes(), "random keys must differ");
        assert_ne!(a.nonce, b.nonce, "random nonces must differ");
    }

    #[test]
    fn test_hex_lengths() {
        let m = KeyMaterial::generate();
        assert_eq!(m.key.to_hex().len(), 64);
        assert_eq!(m.nonce.to_hex().len(), 24);
    }

    #[test]
    fn test_hex_roundtrip() {
        let m = KeyMaterial::generate();
        let back = KeyMaterial::from_hex(&m.key.to_hex(), &m.nonce.to_hex()).unwrap();
        assert_eq!(back.key.as_bytes(), m.key.as_bytes());
        assert_eq!(back.nonce, m.nonce);
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(FileKey::from_hex(&"ab".repeat(16)).is_err());
        assert!(FileNonce::from_hex(&"ab".repeat(16)).is_err());
    }

    #[test]
    fn test_non_hex_rejected() {
        assert!(FileKey::from_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = FileKey::from_bytes([0x5Au8; KEY_SIZE]);
        let rendered = format!("{key:?}");
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("5a5a"));
    }
}
