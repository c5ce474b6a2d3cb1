//! Advisory per-file-id locks.
//!
//! One lock file per `file_id` under `<metadata_dir>/.locks/`. Writers
//! (encrypt, delete) take it exclusively; readers (decrypt, verify) share it.
//! The locks are cooperative and cross-process: they only order callers that
//! go through this crate. Lock files are never removed.
//!
//! Only encrypt needs to create a lock file. The `*_existing` variants open
//! an existing one and report `None` otherwise, so lookups of unknown ids
//! leave the directory untouched.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{warn, Span};

const LOCK_DIR: &str = ".locks";

/// Held lock on one file id; released on drop.
#[derive(Debug)]
pub struct FileIdLock {
    file: File,
    path: PathBuf,
    span: Span,
}

impl FileIdLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileIdLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(parent: &self.span, path = %self.path.display(), "failed to release lock: {e}");
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Shared,
    Exclusive,
}

/// Directory of lock files
#[derive(Debug, Clone)]
pub struct LockDir {
    dir: PathBuf,
    span: Span,
}

impl LockDir {
    pub fn open(metadata_dir: &Path) -> std::io::Result<Self> {
        let dir = metadata_dir.join(LOCK_DIR);
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            span: Span::none(),
        })
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn lock_path(&self, file_id: &str) -> PathBuf {
        self.dir.join(format!("{file_id}.lock"))
    }

    /// Block until `file_id` can be locked exclusively, creating its lock file.
    pub fn exclusive(&self, file_id: &str) -> std::io::Result<FileIdLock> {
        self.acquire(file_id, Mode::Exclusive, true)
    }

    /// Block until `file_id` can be locked for shared reading, creating its lock file.
    pub fn shared(&self, file_id: &str) -> std::io::Result<FileIdLock> {
        self.acquire(file_id, Mode::Shared, true)
    }

    /// Exclusive lock on an existing lock file; `None` if there is none.
    pub fn exclusive_existing(&self, file_id: &str) -> std::io::Result<Option<FileIdLock>> {
        existing(self.acquire(file_id, Mode::Exclusive, false))
    }

    /// Shared lock on an existing lock file; `None` if there is none.
    pub fn shared_existing(&self, file_id: &str) -> std::io::Result<Option<FileIdLock>> {
        existing(self.acquire(file_id, Mode::Shared, false))
    }

    fn acquire(&self, file_id: &str, mode: Mode, create: bool) -> std::io::Result<FileIdLock> {
        let path = self.lock_path(file_id);
        let file = OpenOptions::new()
            .create(create)
            .truncate(false)
            .write(true)
            .open(&path)?;
        match mode {
            Mode::Shared => FileExt::lock_shared(&file)?,
            Mode::Exclusive => FileExt::lock_exclusive(&file)?,
        }
        Ok(FileIdLock {
            file,
            path,
            span: self.span.clone(),
        })
    }
}

fn existing(result: std::io::Result<FileIdLock>) -> std::io::Result<Option<FileIdLock>> {
    match result {
        Ok(lock) => Ok(Some(lock)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
