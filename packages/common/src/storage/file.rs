use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::id::BlobId;

/// Finalized descriptor of a stored blob.
///
/// Written once, atomically, when the upload stream closes. A blob
/// without a descriptor is invisible to readers, which is what keeps
/// partially written chunk sets unobservable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlobFile {
    pub id: BlobId,
    /// Display name, not unique.
    pub filename: String,
    /// Total byte length, equal to the sum of all chunk lengths.
    pub length: u64,
    /// Chunk size the store was configured with at upload time.
    pub chunk_size: usize,
    /// Number of chunks: ceil(length / chunk_size).
    pub chunk_count: u64,
    /// SHA-256 of the full byte stream, hex-encoded.
    pub sha256: String,
    pub upload_date: DateTime<Utc>,
    /// Caller-supplied metadata, stored verbatim.
    pub metadata: Value,
}

/// Exact-match filter over descriptor metadata fields.
#[derive(Clone, Debug, Default)]
pub struct MetadataFilter {
    terms: Vec<(String, Value)>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `metadata[key] == value`.
    pub fn eq(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.terms.push((key.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn matches(&self, metadata: &Value) -> bool {
        self.terms
            .iter()
            .all(|(key, value)| metadata.get(key) == Some(value))
    }
}
