//! On-disk chunk store
//!
//! A buffer is cut into `ceil(len / chunk_size)` pieces of at most `chunk_size`
//! bytes. Piece `i` of file `F` is written to
//! `{chunks_dir}/{F}_chunk_{i:04}.enc` as raw bytes, no header. All files share
//! one flat directory; the `file_id` prefix keeps them apart.
//!
//! Every load recomputes SHA-256 over the bytes read and rejects any chunk
//! whose digest differs from the recorded one.

use std::path::{Path, PathBuf};

use mydrive_core::fsutil::write_atomic;
use mydrive_core::{
    ChunkDescriptor, EncryptedChunk, LoadedChunk, MyDriveError, MyDriveResult,
};
use tracing::{debug, info, warn, Span};

use crate::sha256::{sha256_hex, short_id};

/// Number of chunks a buffer of `len` bytes splits into.
pub fn chunk_count(len: usize, chunk_size: usize) -> usize {
    len.div_ceil(chunk_size)
}

/// Deterministic chunk file name: `{file_id}_chunk_{index:04}.enc`
pub fn chunk_file_name(file_id: &str, index: u64) -> String {
    format!("{file_id}_chunk_{index:04}.enc")
}

/// Fixed-size chunk store rooted at one directory
#[derive(Debug, Clone)]
pub struct ChunkStore {
    chunks_dir: PathBuf,
    chunk_size: usize,
    span: Span,
}

impl ChunkStore {
    /// Open (creating if needed) a chunk store. `chunk_size` must be non-zero.
    pub fn open(chunks_dir: impl Into<PathBuf>, chunk_size: usize) -> MyDriveResult<Self> {
        if chunk_size == 0 {
            return Err(MyDriveError::Config("chunk_size must be > 0".into()));
        }
        let chunks_dir = chunks_dir.into();
        std::fs::create_dir_all(&chunks_dir)?;
        Ok(Self {
            chunks_dir,
            chunk_size,
            span: Span::none(),
        })
    }

    /// Route this store's log events under `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn chunks_dir(&self) -> &Path {
        &self.chunks_dir
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_path(&self, file_id: &str, index: u64) -> PathBuf {
        self.chunks_dir.join(chunk_file_name(file_id, index))
    }

    /// Split `data` into chunks and persist each one.
    ///
    /// Returns chunks in index order `0..N`. Empty input yields no chunks and
    /// writes nothing. If a write fails, the chunks already written by this
    /// call are removed before the error is returned.
    pub fn split(&self, data: &[u8], file_id: &str) -> MyDriveResult<Vec<EncryptedChunk>> {
        let total = chunk_count(data.len(), self.chunk_size);
        info!(parent: &self.span, file_id, chunks = total, bytes = data.len(), "splitting into chunks");

        let mut chunks = Vec::with_capacity(total);
        for (i, piece) in data.chunks(self.chunk_size).enumerate() {
            let index = i as u64;
            let path = self.chunk_path(file_id, index);

            if let Err(e) = write_atomic(&path, piece) {
                warn!(parent: &self.span, file_id, index, error = %e, "chunk write failed, discarding partial set");
                self.discard(&chunks);
                return Err(e.into());
            }

            let hash = sha256_hex(piece);
            let chunk = EncryptedChunk {
                chunk_id: short_id(&hash),
                data: piece.to_vec(),
                size: piece.len() as u64,
                index,
                hash_sha256: hash,
                file_path: path,
            };
            debug!(parent: &self.span, index, chunk_id = %chunk.chunk_id, size = chunk.size, "chunk written");
            chunks.push(chunk);
        }

        Ok(chunks)
    }

    /// Read every described chunk from disk and verify its SHA-256.
    ///
    /// Fails with `MissingChunk` if a file is absent and `ChunkCorrupted` if
    /// its bytes no longer hash to the recorded digest. Output order follows
    /// the input order.
    pub fn load(&self, descriptors: &[ChunkDescriptor]) -> MyDriveResult<Vec<LoadedChunk>> {
        info!(parent: &self.span, chunks = descriptors.len(), "loading chunks");
        descriptors.iter().map(|d| self.load_one(d)).collect()
    }

    fn load_one(&self, desc: &ChunkDescriptor) -> MyDriveResult<LoadedChunk> {
        let data = match std::fs::read(&desc.file_path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MyDriveError::MissingChunk {
                    index: desc.index,
                    path: desc.file_path.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let actual = sha256_hex(&data);
        if actual != desc.hash {
            warn!(parent: &self.span, index = desc.index, path = %desc.file_path.display(), "chunk hash mismatch");
            return Err(MyDriveError::ChunkCorrupted {
                index: desc.index,
                path: desc.file_path.clone(),
                expected: desc.hash.clone(),
                actual,
            });
        }

        debug!(parent: &self.span, index = desc.index, bytes = data.len(), "chunk verified");
        Ok(LoadedChunk {
            index: desc.index,
            data,
        })
    }

    /// Concatenate loaded chunks in ascending index order.
    pub fn reassemble(&self, mut chunks: Vec<LoadedChunk>) -> Vec<u8> {
        chunks.sort_by_key(|c| c.index);
        let total: usize = chunks.iter().map(|c| c.data.len()).sum();
        let mut out = Vec::with_capacity(total);
        for chunk in &chunks {
            out.extend_from_slice(&chunk.data);
        }
        debug!(parent: &self.span, chunks = chunks.len(), bytes = out.len(), "reassembled");
        out
    }

    /// Remove every described chunk file. Absent files are skipped.
    ///
    /// Returns how many files were actually removed.
    pub fn delete(&self, descriptors: &[ChunkDescriptor]) -> MyDriveResult<usize> {
        let mut removed = 0;
        for desc in descriptors {
            match std::fs::remove_file(&desc.file_path) {
                Ok(()) => {
                    removed += 1;
                    debug!(parent: &self.span, path = %desc.file_path.display(), "chunk removed");
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        info!(parent: &self.span, removed, listed = descriptors.len(), "chunks deleted");
        Ok(removed)
    }

    /// Remove every `{file_id}_chunk_*.enc` file in the store directory.
    ///
    /// Used when no trustworthy descriptor list exists for `file_id`.
    pub fn purge(&self, file_id: &str) -> MyDriveResult<usize> {
        let prefix = format!("{file_id}_chunk_");
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.chunks_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !(name.starts_with(&prefix) && name.ends_with(".enc")) {
                continue;
            }
            match std::fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        info!(parent: &self.span, file_id, removed, "purged chunks by prefix");
        Ok(removed)
    }

    fn discard(&self, chunks: &[EncryptedChunk]) {
        for chunk in chunks {
            if let Err(e) = std::fs::remove_file(&chunk.file_path) {
                warn!(parent: &self.span, path = %chunk.file_path.display(), error = %e, "failed to discard chunk");
            }
        }
    }
}
