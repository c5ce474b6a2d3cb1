//! Encrypt path: plaintext file → AES-256-GCM ciphertext → chunks → metadata.
//!
//! Chunks are persisted before the metadata record, so an existing record
//! implies its chunks were written. The whole file is held in memory.

use std::path::Path;
use std::sync::Arc;

use mydrive_chunks::{content_id, ChunkStore};
use mydrive_core::{fmt_bytes, EncryptedChunk, FileMetadata, MyDriveError, MyDriveResult};
use mydrive_crypto::{seal, KeyMaterial};
use tracing::{info, warn, Span};

use crate::metadata::MetadataStore;

/// Outcome of encrypting one file
#[derive(Debug, Clone)]
pub struct EncryptResult {
    pub file_id: String,
    pub original_name: String,
    pub chunks: Vec<EncryptedChunk>,
    pub metadata: FileMetadata,
}

#[derive(Debug, Clone)]
pub struct Encryptor {
    chunks: Arc<ChunkStore>,
    metadata: Arc<MetadataStore>,
    span: Span,
}

impl Encryptor {
    pub fn new(chunks: Arc<ChunkStore>, metadata: Arc<MetadataStore>) -> Self {
        Self {
            chunks,
            metadata,
            span: Span::none(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Encrypt the file at `path` under fresh key material and store it.
    pub fn encrypt(&self, path: &Path) -> MyDriveResult<EncryptResult> {
        if !path.is_file() {
            return Err(MyDriveError::SourceNotFound {
                path: path.to_path_buf(),
            });
        }
        let plaintext = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MyDriveError::SourceNotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        let original_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        info!(parent: &self.span, name = %original_name, size = %fmt_bytes(plaintext.len() as u64), "encrypting");

        let material = KeyMaterial::generate();
        let ciphertext = seal(&material.key, &material.nonce, &plaintext)
            .map_err(|e| MyDriveError::Crypto(e.to_string()))?;
        let file_id = content_id(&ciphertext);

        let (chunks, metadata) = self.store(
            &file_id,
            &original_name,
            plaintext.len() as u64,
            &ciphertext,
            &material,
        )?;

        info!(
            parent: &self.span,
            file_id = %file_id,
            chunks = chunks.len(),
            encrypted = %fmt_bytes(ciphertext.len() as u64),
            "encrypted"
        );

        Ok(EncryptResult {
            file_id,
            original_name,
            chunks,
            metadata,
        })
    }

    /// Write chunks, then the record, under the id's exclusive lock. A failed
    /// record write removes the chunks it would have referenced.
    fn store(
        &self,
        file_id: &str,
        original_name: &str,
        plaintext_len: u64,
        ciphertext: &[u8],
        material: &KeyMaterial,
    ) -> MyDriveResult<(Vec<EncryptedChunk>, FileMetadata)> {
        let _lock = self.metadata.lock_exclusive(file_id)?;
        let had_record = self.metadata.exists(file_id);

        let chunks = self.chunks.split(ciphertext, file_id)?;
        match self.metadata.save(
            file_id,
            original_name,
            plaintext_len,
            ciphertext.len() as u64,
            material,
            &chunks,
        ) {
            Ok(metadata) => Ok((chunks, metadata)),
            Err(e) => {
                // Chunks shared with a surviving record must stay.
                if !had_record {
                    let descriptors: Vec<_> = chunks.iter().map(EncryptedChunk::descriptor).collect();
                    if let Err(cleanup) = self.chunks.delete(&descriptors) {
                        warn!(parent: &self.span, file_id, error = %cleanup, "failed to remove chunks after metadata write error");
                    }
                }
                Err(e)
            }
        }
    }
}
