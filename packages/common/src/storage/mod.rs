mod error;
mod file;
mod id;

pub mod chunked;

pub use chunked::{BlobDownloadStream, BlobUploadStream, ChunkedBlobStore};
pub use error::StorageError;
pub use file::{BlobFile, MetadataFilter};
pub use id::BlobId;

/// Default chunk size (255 KiB), sized for streaming video without
/// unbounded memory use.
pub const DEFAULT_CHUNK_SIZE: usize = 255 * 1024;
