//! Crypto engine facade: the operations a front end drives.
//!
//! Owns one chunk store and one metadata store and hands both to the
//! encrypt and decrypt pipelines. Every call runs to completion on the
//! caller's thread.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mydrive_chunks::{is_content_id, ChunkStore};
use mydrive_core::config::{MyDriveConfig, StorageConfig};
use mydrive_core::{FileInfo, FileSummary, MyDriveError, MyDriveResult};
use tracing::{info, info_span, warn, Span};

use crate::decryptor::{Decryptor, VerifyReport};
use crate::encryptor::{EncryptResult, Encryptor};
use crate::listing::StorageStats;
use crate::metadata::MetadataStore;

/// What a `delete` call actually removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub record_removed: bool,
    pub chunks_removed: usize,
}

#[derive(Debug, Clone)]
pub struct CryptoEngine {
    chunks: Arc<ChunkStore>,
    metadata: Arc<MetadataStore>,
    encryptor: Encryptor,
    decryptor: Decryptor,
    span: Span,
}

impl CryptoEngine {
    /// Open the engine over `storage`, creating its directories.
    pub fn open(storage: &StorageConfig, chunk_size: usize) -> MyDriveResult<Self> {
        Self::open_with_span(storage, chunk_size, info_span!("engine"))
    }

    /// Like [`CryptoEngine::open`], logging every component under `span`.
    pub fn open_with_span(
        storage: &StorageConfig,
        chunk_size: usize,
        span: Span,
    ) -> MyDriveResult<Self> {
        let storage = storage.expanded();
        let chunks = Arc::new(
            ChunkStore::open(&storage.chunks_dir, chunk_size)?.with_span(span.clone()),
        );
        let metadata =
            Arc::new(MetadataStore::open(&storage.metadata_dir)?.with_span(span.clone()));
        let encryptor = Encryptor::new(chunks.clone(), metadata.clone()).with_span(span.clone());
        let decryptor = Decryptor::new(chunks.clone(), metadata.clone(), &storage.output_dir)
            .with_span(span.clone());

        info!(
            parent: &span,
            metadata_dir = %storage.metadata_dir.display(),
            chunks_dir = %storage.chunks_dir.display(),
            chunk_size,
            "engine ready"
        );

        Ok(Self {
            chunks,
            metadata,
            encryptor,
            decryptor,
            span,
        })
    }

    pub fn from_config(config: &MyDriveConfig) -> MyDriveResult<Self> {
        Self::open(&config.storage, config.chunking.chunk_size)
    }

    pub fn chunk_store(&self) -> &ChunkStore {
        &self.chunks
    }

    pub fn metadata_store(&self) -> &MetadataStore {
        &self.metadata
    }

    pub fn encrypt(&self, path: &Path) -> MyDriveResult<EncryptResult> {
        self.encryptor.encrypt(path)
    }

    pub fn decrypt(&self, file_id: &str, output: Option<&Path>) -> MyDriveResult<PathBuf> {
        self.decryptor.decrypt(file_id, output)
    }

    pub fn verify(&self, file_id: &str) -> MyDriveResult<VerifyReport> {
        self.decryptor.verify(file_id)
    }

    pub fn list(&self) -> MyDriveResult<Vec<FileSummary>> {
        self.metadata.list()
    }

    pub fn get_info(&self, file_id: &str) -> MyDriveResult<FileInfo> {
        self.metadata.get_info(file_id)
    }

    pub fn stats(&self) -> MyDriveResult<StorageStats> {
        Ok(StorageStats::from_summaries(&self.list()?))
    }

    /// Remove a stored file. Unknown ids are a no-op.
    ///
    /// With `delete_chunks` the chunk files go first, then the record. A
    /// record that no longer validates is still removed; its chunks are then
    /// found by file name prefix.
    pub fn delete(&self, file_id: &str, delete_chunks: bool) -> MyDriveResult<DeleteOutcome> {
        if !is_content_id(file_id) {
            warn!(parent: &self.span, file_id, "not a file id, nothing to delete");
            return Ok(DeleteOutcome::default());
        }
        let Some(_lock) = self.metadata.lock_for_delete(file_id)? else {
            warn!(parent: &self.span, file_id, "no such file, nothing to delete");
            return Ok(DeleteOutcome::default());
        };

        let chunks_removed = match self.metadata.load(file_id) {
            Ok(metadata) if delete_chunks => self.chunks.delete(&metadata.chunks)?,
            Ok(_) => 0,
            Err(MyDriveError::MetadataNotFound { .. }) => {
                warn!(parent: &self.span, file_id, "no such file, nothing to delete");
                return Ok(DeleteOutcome::default());
            }
            Err(e @ MyDriveError::MalformedMetadata { .. }) => {
                warn!(parent: &self.span, file_id, "deleting malformed record: {e}");
                if delete_chunks {
                    self.chunks.purge(file_id)?
                } else {
                    0
                }
            }
            Err(e) => return Err(e),
        };

        let record_removed = self.metadata.delete(file_id)?;
        info!(parent: &self.span, file_id, chunks_removed, record_removed, "deleted");
        Ok(DeleteOutcome {
            record_removed,
            chunks_removed,
        })
    }
}
