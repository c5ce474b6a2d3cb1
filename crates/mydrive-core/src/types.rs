use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One contiguous slice of a file's ciphertext, as produced by a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedChunk {
    /// First 16 hex chars of the SHA-256 digest (display label only)
    pub chunk_id: String,
    /// Raw chunk bytes; never serialized into metadata
    pub data: Vec<u8>,
    pub size: u64,
    /// Zero-based position in the file's chunk sequence
    pub index: u64,
    /// Full hex SHA-256 digest of `data`
    pub hash_sha256: String,
    /// Where the chunk was persisted
    pub file_path: PathBuf,
}

impl EncryptedChunk {
    /// Project to the descriptor stored in the metadata record.
    pub fn descriptor(&self) -> ChunkDescriptor {
        ChunkDescriptor {
            chunk_id: self.chunk_id.clone(),
            hash: self.hash_sha256.clone(),
            size: self.size,
            index: self.index,
            file_path: self.file_path.clone(),
        }
    }
}

/// A chunk entry in the metadata record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkDescriptor {
    pub chunk_id: String,
    pub hash: String,
    pub size: u64,
    pub index: u64,
    pub file_path: PathBuf,
}

/// Chunk bytes read back from disk, already hash-verified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedChunk {
    pub index: u64,
    pub data: Vec<u8>,
}

/// The `encryption` block of a metadata record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionInfo {
    pub algorithm: String,
    /// Hex-encoded 256-bit key
    pub key: String,
    /// Hex-encoded 96-bit nonce
    pub nonce: String,
    pub key_size_bits: u32,
    pub nonce_size_bits: u32,
}

/// The durable description of one encrypted file.
///
/// Serializes to the on-disk JSON document; every field is required on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// SHA-256(ciphertext)[:16]
    pub file_id: String,
    pub original_name: String,
    /// Plaintext length in bytes
    pub original_size: u64,
    /// Ciphertext length in bytes (includes the AEAD tag)
    pub encrypted_size: u64,
    pub encryption: EncryptionInfo,
    pub chunks: Vec<ChunkDescriptor>,
    pub created_at: DateTime<Utc>,
}

impl FileMetadata {
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

/// Listing projection of a metadata record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub file_id: String,
    pub original_name: String,
    pub file_size: u64,
    pub chunk_count: usize,
    pub upload_date: DateTime<Utc>,
}

impl From<&FileMetadata> for FileSummary {
    fn from(meta: &FileMetadata) -> Self {
        Self {
            file_id: meta.file_id.clone(),
            original_name: meta.original_name.clone(),
            file_size: meta.original_size,
            chunk_count: meta.chunk_count(),
            upload_date: meta.created_at,
        }
    }
}

/// Detail view of one record, without key material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub file_id: String,
    pub name: String,
    pub size: u64,
    pub encrypted_size: u64,
    pub algorithm: String,
    pub chunks: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&FileMetadata> for FileInfo {
    fn from(meta: &FileMetadata) -> Self {
        Self {
            file_id: meta.file_id.clone(),
            name: meta.original_name.clone(),
            size: meta.original_size,
            encrypted_size: meta.encrypted_size,
            algorithm: meta.encryption.algorithm.clone(),
            chunks: meta.chunk_count(),
            created_at: meta.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> FileMetadata {
        FileMetadata {
            file_id: "0123456789abcdef".into(),
            original_name: "report.pdf".into(),
            original_size: 10,
            encrypted_size: 26,
            encryption: EncryptionInfo {
                algorithm: crate::ENCRYPTION_ALGORITHM.into(),
                key: "00".repeat(32),
                nonce: "11".repeat(12),
                key_size_bits: crate::KEY_SIZE_BITS,
                nonce_size_bits: crate::NONCE_SIZE_BITS,
            },
            chunks: vec![ChunkDescriptor {
                chunk_id: "aaaaaaaaaaaaaaaa".into(),
                hash: "a".repeat(64),
                size: 26,
                index: 0,
                file_path: PathBuf::from("output/0123456789abcdef_chunk_0000.enc"),
            }],
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn created_at_serializes_with_z_suffix() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["created_at"], "2025-01-01T12:00:00Z");
    }

    #[test]
    fn json_layout_nests_encryption_block() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["encryption"]["algorithm"], "AES-256-GCM");
        assert_eq!(json["encryption"]["key_size_bits"], 256);
        assert_eq!(json["encryption"]["nonce_size_bits"], 96);
        assert_eq!(json["chunks"][0]["index"], 0);
        assert_eq!(
            json["chunks"][0]["file_path"],
            "output/0123456789abcdef_chunk_0000.enc"
        );
        assert!(json.get("data").is_none());
    }

    #[test]
    fn accepts_python_style_timestamps() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json["created_at"] = "2024-03-05T10:11:12.123456Z".into();
        let meta: FileMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(meta.created_at.timestamp_subsec_micros(), 123456);
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json.as_object_mut().unwrap().remove("encrypted_size");
        assert!(serde_json::from_value::<FileMetadata>(json).is_err());
    }

    #[test]
    fn summary_projection() {
        let meta = sample();
        let summary = FileSummary::from(&meta);
        assert_eq!(summary.file_size, 10);
        assert_eq!(summary.chunk_count, 1);
        assert_eq!(summary.upload_date, meta.created_at);

        let info = FileInfo::from(&meta);
        assert_eq!(info.name, "report.pdf");
        assert_eq!(info.encrypted_size, 26);
        assert_eq!(info.algorithm, "AES-256-GCM");
    }
}
