//! mydrive-engine: metadata store, encrypt/decrypt pipelines, and the engine facade

pub mod decryptor;
pub mod encryptor;
pub mod engine;
pub mod listing;
pub mod lock;
pub mod metadata;

pub use decryptor::{Decryptor, VerifyReport};
pub use encryptor::{EncryptResult, Encryptor};
pub use engine::{CryptoEngine, DeleteOutcome};
pub use listing::{filter_by_name, sort_summaries, SortKey, StorageStats};
pub use metadata::MetadataStore;
