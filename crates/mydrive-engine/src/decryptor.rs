//! Decrypt path: metadata → verified chunks → ciphertext → plaintext file.
//!
//! The reassembled ciphertext must hash back to its `file_id` before any
//! decryption is attempted.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mydrive_chunks::{content_id, ChunkStore};
use mydrive_core::fsutil::write_atomic;
use mydrive_core::{fmt_bytes, FileMetadata, MyDriveError, MyDriveResult};
use mydrive_crypto::{open, KeyMaterial};
use tracing::{debug, info, Span};

use crate::metadata::MetadataStore;

/// Outcome of a verify-only pass over one stored file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub file_id: String,
    pub chunks: usize,
    pub encrypted_size: u64,
}

#[derive(Debug, Clone)]
pub struct Decryptor {
    chunks: Arc<ChunkStore>,
    metadata: Arc<MetadataStore>,
    output_dir: PathBuf,
    span: Span,
}

impl Decryptor {
    pub fn new(
        chunks: Arc<ChunkStore>,
        metadata: Arc<MetadataStore>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            chunks,
            metadata,
            output_dir: output_dir.into(),
            span: Span::none(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Default destination directory for restored files.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Restore `file_id` to `output`, or to `output_dir/<original name>`.
    ///
    /// Returns the path written.
    pub fn decrypt(&self, file_id: &str, output: Option<&Path>) -> MyDriveResult<PathBuf> {
        let _lock = self.metadata.lock_shared(file_id)?;
        let (metadata, ciphertext) = self.verified_ciphertext(file_id)?;

        let material =
            KeyMaterial::from_hex(&metadata.encryption.key, &metadata.encryption.nonce)
                .map_err(|e| MyDriveError::malformed(self.metadata.record_path(file_id), e.to_string()))?;
        let plaintext = open(&material.key, &material.nonce, &ciphertext)
            .map_err(|e| MyDriveError::DecryptionFailed(e.to_string()))?;

        let dest = match output {
            Some(path) => path.to_path_buf(),
            None => self.default_output(&metadata),
        };
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        write_atomic(&dest, &plaintext)?;

        info!(
            parent: &self.span,
            file_id,
            size = %fmt_bytes(plaintext.len() as u64),
            path = %dest.display(),
            "decrypted"
        );
        Ok(dest)
    }

    /// Check every chunk hash and the ciphertext identity without decrypting.
    pub fn verify(&self, file_id: &str) -> MyDriveResult<VerifyReport> {
        let _lock = self.metadata.lock_shared(file_id)?;
        let (metadata, ciphertext) = self.verified_ciphertext(file_id)?;
        info!(parent: &self.span, file_id, chunks = metadata.chunks.len(), "verified");
        Ok(VerifyReport {
            file_id: metadata.file_id,
            chunks: metadata.chunks.len(),
            encrypted_size: ciphertext.len() as u64,
        })
    }

    fn verified_ciphertext(&self, file_id: &str) -> MyDriveResult<(FileMetadata, Vec<u8>)> {
        let metadata = self.metadata.load(file_id)?;
        let loaded = self.chunks.load(&metadata.chunks)?;
        let ciphertext = self.chunks.reassemble(loaded);

        let actual = content_id(&ciphertext);
        if actual != metadata.file_id {
            return Err(MyDriveError::IntegrityMismatch {
                expected: metadata.file_id,
                actual,
            });
        }
        debug!(parent: &self.span, file_id, bytes = ciphertext.len(), "ciphertext identity verified");
        Ok((metadata, ciphertext))
    }

    fn default_output(&self, metadata: &FileMetadata) -> PathBuf {
        let name = Path::new(&metadata.original_name)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| metadata.file_id.clone().into());
        self.output_dir.join(name)
    }
}
