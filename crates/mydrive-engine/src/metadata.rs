//! Metadata store: one JSON record per encrypted file, keyed by `file_id`.
//!
//! Records live at `<metadata_dir>/<file_id>.json` and are written atomically
//! (temp file + rename). There is no update path: a record is created once by
//! `save` and removed by `delete`.
//!
//! Records are validated on load. A document that parses but breaks the
//! record invariants is reported as `MalformedMetadata` rather than patched.

use std::path::{Path, PathBuf};

use chrono::Utc;
use mydrive_chunks::is_content_id;
use mydrive_core::fsutil::write_atomic;
use mydrive_core::{
    EncryptedChunk, EncryptionInfo, FileInfo, FileMetadata, FileSummary, MyDriveError,
    MyDriveResult, ENCRYPTION_ALGORITHM, KEY_SIZE_BITS, NONCE_SIZE_BITS,
};
use mydrive_crypto::KeyMaterial;
use tracing::{debug, info, warn, Span};

use crate::lock::{FileIdLock, LockDir};

#[derive(Debug, Clone)]
pub struct MetadataStore {
    metadata_dir: PathBuf,
    locks: LockDir,
    span: Span,
}

impl MetadataStore {
    /// Open (creating if needed) the metadata directory.
    pub fn open(metadata_dir: impl Into<PathBuf>) -> MyDriveResult<Self> {
        let metadata_dir = metadata_dir.into();
        std::fs::create_dir_all(&metadata_dir)?;
        let locks = LockDir::open(&metadata_dir)?;
        Ok(Self {
            metadata_dir,
            locks,
            span: Span::none(),
        })
    }

    /// Route this store's log events under `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.locks = self.locks.with_span(span.clone());
        self.span = span;
        self
    }

    pub fn metadata_dir(&self) -> &Path {
        &self.metadata_dir
    }

    /// Path of the record for `file_id`; depends on nothing else.
    pub fn record_path(&self, file_id: &str) -> PathBuf {
        self.metadata_dir.join(format!("{file_id}.json"))
    }

    pub fn exists(&self, file_id: &str) -> bool {
        is_content_id(file_id) && self.record_path(file_id).is_file()
    }

    /// Exclusive advisory lock on `file_id`, for writers.
    ///
    /// Strings that cannot be a `file_id` are rejected as `MetadataNotFound`
    /// before any lock file is created.
    pub fn lock_exclusive(&self, file_id: &str) -> MyDriveResult<FileIdLock> {
        check_id(file_id)?;
        Ok(self.locks.exclusive(file_id)?)
    }

    /// Shared advisory lock on `file_id`, for readers.
    ///
    /// Fails with `MetadataNotFound` when neither a lock file nor a record
    /// exists, without creating anything. A record that predates its lock
    /// file gets one.
    pub fn lock_shared(&self, file_id: &str) -> MyDriveResult<FileIdLock> {
        check_id(file_id)?;
        if let Some(lock) = self.locks.shared_existing(file_id)? {
            return Ok(lock);
        }
        if self.record_path(file_id).is_file() {
            return Ok(self.locks.shared(file_id)?);
        }
        Err(MyDriveError::MetadataNotFound {
            file_id: file_id.to_string(),
        })
    }

    /// Exclusive lock for removing `file_id`; `None` when there is nothing
    /// to remove. Creates a lock file only if a record exists.
    pub fn lock_for_delete(&self, file_id: &str) -> MyDriveResult<Option<FileIdLock>> {
        check_id(file_id)?;
        if let Some(lock) = self.locks.exclusive_existing(file_id)? {
            return Ok(Some(lock));
        }
        if self.record_path(file_id).is_file() {
            return Ok(Some(self.locks.exclusive(file_id)?));
        }
        Ok(None)
    }

    /// Build, persist, and return the record for a freshly encrypted file.
    ///
    /// Overwrites an existing record with the same `file_id`.
    pub fn save(
        &self,
        file_id: &str,
        original_name: &str,
        original_size: u64,
        encrypted_size: u64,
        material: &KeyMaterial,
        chunks: &[EncryptedChunk],
    ) -> MyDriveResult<FileMetadata> {
        let metadata = FileMetadata {
            file_id: file_id.to_string(),
            original_name: original_name.to_string(),
            original_size,
            encrypted_size,
            encryption: EncryptionInfo {
                algorithm: ENCRYPTION_ALGORITHM.to_string(),
                key: material.key.to_hex(),
                nonce: material.nonce.to_hex(),
                key_size_bits: KEY_SIZE_BITS,
                nonce_size_bits: NONCE_SIZE_BITS,
            },
            chunks: chunks.iter().map(EncryptedChunk::descriptor).collect(),
            created_at: Utc::now(),
        };

        let path = self.record_path(file_id);
        if path.exists() {
            warn!(parent: &self.span, file_id, "overwriting existing metadata record");
        }

        let json = serde_json::to_vec_pretty(&metadata)?;
        write_atomic(&path, &json)?;

        info!(parent: &self.span, file_id, chunks = metadata.chunks.len(), path = %path.display(), "metadata saved");
        Ok(metadata)
    }

    /// Load and validate the record for `file_id`.
    pub fn load(&self, file_id: &str) -> MyDriveResult<FileMetadata> {
        check_id(file_id)?;

        let path = self.record_path(file_id);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MyDriveError::MetadataNotFound {
                    file_id: file_id.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let metadata: FileMetadata = serde_json::from_str(&content)
            .map_err(|e| MyDriveError::malformed(&path, e.to_string()))?;
        validate(&metadata, file_id).map_err(|reason| MyDriveError::malformed(&path, reason))?;

        debug!(parent: &self.span, file_id, "metadata loaded");
        Ok(metadata)
    }

    /// Summaries of every readable record, in no particular order.
    ///
    /// Records that fail to load are logged and skipped.
    pub fn list(&self) -> MyDriveResult<Vec<FileSummary>> {
        let mut summaries = Vec::new();

        for entry in std::fs::read_dir(&self.metadata_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") || !path.is_file() {
                continue;
            }
            let Some(file_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            match self.load(file_id) {
                Ok(metadata) => summaries.push(FileSummary::from(&metadata)),
                Err(e) => {
                    warn!(parent: &self.span, path = %path.display(), kind = %e.kind(), "skipping unreadable metadata record: {e}");
                }
            }
        }

        debug!(parent: &self.span, count = summaries.len(), "listed metadata records");
        Ok(summaries)
    }

    /// Detail view of one record (no key material).
    pub fn get_info(&self, file_id: &str) -> MyDriveResult<FileInfo> {
        self.load(file_id).map(|m| FileInfo::from(&m))
    }

    /// Remove the record for `file_id`. Returns `false` if there was none.
    pub fn delete(&self, file_id: &str) -> MyDriveResult<bool> {
        if !is_content_id(file_id) {
            return Ok(false);
        }
        let path = self.record_path(file_id);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(parent: &self.span, file_id, "metadata deleted");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(parent: &self.span, file_id, "metadata not found, nothing to delete");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn check_id(file_id: &str) -> MyDriveResult<()> {
    if is_content_id(file_id) {
        Ok(())
    } else {
        Err(MyDriveError::MetadataNotFound {
            file_id: file_id.to_string(),
        })
    }
}

/// Check the record invariants; returns the first violation found.
fn validate(meta: &FileMetadata, file_id: &str) -> Result<(), String> {
    if meta.file_id != file_id {
        return Err(format!(
            "record file_id {} does not match its key {file_id}",
            meta.file_id
        ));
    }

    let enc = &meta.encryption;
    if enc.algorithm != ENCRYPTION_ALGORITHM {
        return Err(format!("unsupported algorithm {:?}", enc.algorithm));
    }
    if enc.key_size_bits != KEY_SIZE_BITS || enc.nonce_size_bits != NONCE_SIZE_BITS {
        return Err(format!(
            "unexpected key/nonce sizes: {}/{} bits",
            enc.key_size_bits, enc.nonce_size_bits
        ));
    }
    if !is_hex(&enc.key, KEY_SIZE_BITS as usize / 4) {
        return Err("key is not 64 hex characters".into());
    }
    if !is_hex(&enc.nonce, NONCE_SIZE_BITS as usize / 4) {
        return Err("nonce is not 24 hex characters".into());
    }

    let mut indices: Vec<u64> = meta.chunks.iter().map(|c| c.index).collect();
    indices.sort_unstable();
    if indices.iter().enumerate().any(|(i, &idx)| idx != i as u64) {
        return Err(format!("chunk indices are not 0..{}", meta.chunks.len()));
    }

    for chunk in &meta.chunks {
        if !is_hex(&chunk.hash, 64) {
            return Err(format!("chunk {} hash is not a SHA-256 hex digest", chunk.index));
        }
    }

    let total: u64 = meta.chunks.iter().map(|c| c.size).sum();
    if total != meta.encrypted_size {
        return Err(format!(
            "chunk sizes sum to {total}, encrypted_size is {}",
            meta.encrypted_size
        ));
    }

    Ok(())
}

fn is_hex(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_hexdigit())
}
