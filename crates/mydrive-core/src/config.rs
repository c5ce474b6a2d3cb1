use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{MyDriveError, MyDriveResult};

/// Top-level configuration (loaded from mydrive.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MyDriveConfig {
    pub storage: StorageConfig,
    pub chunking: ChunkingConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one JSON metadata record per file_id
    pub metadata_dir: PathBuf,
    /// Directory holding every chunk file (flat namespace)
    pub chunks_dir: PathBuf,
    /// Default destination for decrypted files
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Fixed chunk size in bytes (default: 1 MiB)
    pub chunk_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level / EnvFilter directive (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            metadata_dir: PathBuf::from("./keys"),
            chunks_dir: PathBuf::from("./output"),
            output_dir: PathBuf::from("./output"),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: crate::DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl MyDriveConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(s: &str) -> MyDriveResult<Self> {
        let config: MyDriveConfig =
            toml::from_str(s).map_err(|e| MyDriveError::Config(format!("parsing config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    ///
    /// Nothing is logged here; the caller reports a missing file once its
    /// subscriber is installed.
    pub fn load(path: &Path) -> MyDriveResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> MyDriveResult<()> {
        if self.chunking.chunk_size == 0 {
            return Err(MyDriveError::Config("chunking.chunk_size must be > 0".into()));
        }
        match self.log.format.as_str() {
            "json" | "text" => {}
            other => {
                return Err(MyDriveError::Config(format!(
                    "log.format must be \"json\" or \"text\", got {other:?}"
                )))
            }
        }
        Ok(())
    }
}

impl StorageConfig {
    /// Copy of this config with `~/` expanded in every path.
    pub fn expanded(&self) -> Self {
        Self {
            metadata_dir: expand_tilde(&self.metadata_dir),
            chunks_dir: expand_tilde(&self.chunks_dir),
            output_dir: expand_tilde(&self.output_dir),
        }
    }
}

/// Expand `~` in path to the user's home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    match s.strip_prefix("~/") {
        Some(rest) => {
            let home = std::env::var("HOME").unwrap_or_default();
            PathBuf::from(home).join(rest)
        }
        None => path.to_path_buf(),
    }
}
