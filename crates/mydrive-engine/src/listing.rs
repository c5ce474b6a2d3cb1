//! Sorting, searching, and totals over listing summaries.

use std::str::FromStr;

use mydrive_core::{fmt_bytes, FileSummary};
use serde::Serialize;

/// Listing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Newest first
    #[default]
    Date,
    /// Case-insensitive, ascending
    Name,
    /// Largest first
    Size,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "date" => Ok(SortKey::Date),
            "name" => Ok(SortKey::Name),
            "size" => Ok(SortKey::Size),
            other => Err(format!("unknown sort key {other:?} (expected date, name, or size)")),
        }
    }
}

pub fn sort_summaries(summaries: &mut [FileSummary], key: SortKey) {
    match key {
        SortKey::Date => summaries.sort_by(|a, b| b.upload_date.cmp(&a.upload_date)),
        SortKey::Name => summaries.sort_by_cached_key(|s| s.original_name.to_lowercase()),
        SortKey::Size => summaries.sort_by(|a, b| b.file_size.cmp(&a.file_size)),
    }
}

/// Keep summaries whose name contains `term`, ignoring case. An empty term keeps all.
pub fn filter_by_name(summaries: Vec<FileSummary>, term: &str) -> Vec<FileSummary> {
    let needle = term.to_lowercase();
    if needle.is_empty() {
        return summaries;
    }
    summaries
        .into_iter()
        .filter(|s| s.original_name.to_lowercase().contains(&needle))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    pub files: usize,
    pub total_bytes: u64,
    pub total_chunks: usize,
}

impl StorageStats {
    pub fn from_summaries(summaries: &[FileSummary]) -> Self {
        summaries.iter().fold(Self::default(), |acc, s| Self {
            files: acc.files + 1,
            total_bytes: acc.total_bytes + s.file_size,
            total_chunks: acc.total_chunks + s.chunk_count,
        })
    }
}

impl std::fmt::Display for StorageStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} files, {}, {} chunks",
            self.files,
            fmt_bytes(self.total_bytes),
            self.total_chunks
        )
    }
}
