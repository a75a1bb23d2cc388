use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use futures::Stream;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::fs;

use super::error::StorageError;
use super::file::{BlobFile, MetadataFilter};
use super::id::BlobId;

/// Filesystem-backed chunked blob store.
///
/// Each blob lives as a directory of fixed-size chunk files under
/// `{root}/chunks/{id}/` plus a JSON descriptor at
/// `{root}/files/{id}.json`. The descriptor is written only when the
/// upload stream is closed, via temp-file + atomic rename, so a reader
/// can never observe a blob whose chunk set is incomplete.
///
/// Deletion removes the descriptor first: new download opens fail
/// immediately with `NotFound`, and a download already in flight fails
/// with `MissingChunk` at the first gap rather than returning
/// truncated data.
pub struct ChunkedBlobStore {
    root: PathBuf,
    chunk_size: usize,
}

fn chunk_path(dir: &Path, sequence: u64) -> PathBuf {
    dir.join(format!("{sequence:06}.bin"))
}

impl ChunkedBlobStore {
    /// Open (creating directories as needed) a store rooted at `root`.
    ///
    /// `chunk_size` is fixed for the store's lifetime and must be
    /// non-zero.
    pub async fn open(
        root: impl Into<PathBuf>,
        chunk_size: usize,
    ) -> Result<Self, StorageError> {
        assert!(chunk_size > 0, "chunk_size must be non-zero");
        let root = root.into();
        fs::create_dir_all(root.join("files")).await?;
        fs::create_dir_all(root.join("chunks")).await?;
        fs::create_dir_all(root.join(".tmp")).await?;
        Ok(Self { root, chunk_size })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn descriptor_path(&self, id: BlobId) -> PathBuf {
        self.root.join("files").join(format!("{id}.json"))
    }

    fn chunk_dir(&self, id: BlobId) -> PathBuf {
        self.root.join("chunks").join(id.to_string())
    }

    fn temp_path(&self) -> PathBuf {
        self.root
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    /// Allocate a new blob id and return a handle accepting sequential
    /// writes. Nothing is visible to readers until [`BlobUploadStream::close`].
    ///
    /// When `expected_length` is declared, `close` verifies it and
    /// fails with [`StorageError::IncompleteUpload`] on a shortfall.
    pub async fn open_upload_stream(
        &self,
        filename: &str,
        metadata: Value,
        expected_length: Option<u64>,
    ) -> Result<BlobUploadStream, StorageError> {
        let id = BlobId::generate();
        let chunk_dir = self.chunk_dir(id);
        fs::create_dir_all(&chunk_dir).await?;
        Ok(BlobUploadStream {
            id,
            filename: filename.to_string(),
            metadata,
            expected_length,
            chunk_size: self.chunk_size,
            chunk_dir,
            descriptor_path: self.descriptor_path(id),
            temp_path: self.temp_path(),
            buf: Vec::with_capacity(self.chunk_size),
            next_sequence: 0,
            written: 0,
            hasher: Sha256::new(),
        })
    }

    /// Look up a finalized blob descriptor.
    pub async fn get_file(&self, id: BlobId) -> Result<BlobFile, StorageError> {
        let bytes = match fs::read(self.descriptor_path(id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes)
            .map_err(|e| StorageError::CorruptDescriptor(format!("{id}: {e}")))
    }

    /// Open a download handle yielding chunks in ascending sequence
    /// order. Fails with `NotFound` if no finalized blob exists.
    pub async fn open_download_stream(
        &self,
        id: BlobId,
    ) -> Result<BlobDownloadStream, StorageError> {
        let file = self.get_file(id).await?;
        Ok(BlobDownloadStream {
            chunk_dir: self.chunk_dir(id),
            file,
            next_sequence: 0,
            yielded: 0,
        })
    }

    /// Remove a blob and all its chunks. Returns `false` if no such
    /// blob existed.
    pub async fn delete(&self, id: BlobId) -> Result<bool, StorageError> {
        // Descriptor first, so new opens fail before any chunk is gone.
        match fs::remove_file(self.descriptor_path(id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        }
        match fs::remove_dir_all(self.chunk_dir(id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(true)
    }

    /// List finalized blobs whose metadata matches `filter`, ordered
    /// by upload date.
    pub async fn find(&self, filter: &MetadataFilter) -> Result<Vec<BlobFile>, StorageError> {
        let mut entries = fs::read_dir(self.root.join("files")).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let bytes = match fs::read(entry.path()).await {
                Ok(bytes) => bytes,
                // Raced with a delete.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            let file: BlobFile = match serde_json::from_slice(&bytes) {
                Ok(file) => file,
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e, "skipping undecodable blob descriptor");
                    continue;
                }
            };
            if filter.matches(&file.metadata) {
                files.push(file);
            }
        }
        files.sort_by(|a, b| a.upload_date.cmp(&b.upload_date));
        Ok(files)
    }
}

/// Write handle for one in-progress upload.
///
/// Accepts input in arbitrarily sized pieces; full chunks are flushed
/// to disk as they fill. The blob becomes visible only on `close`.
pub struct BlobUploadStream {
    id: BlobId,
    filename: String,
    metadata: Value,
    expected_length: Option<u64>,
    chunk_size: usize,
    chunk_dir: PathBuf,
    descriptor_path: PathBuf,
    temp_path: PathBuf,
    buf: Vec<u8>,
    next_sequence: u64,
    written: u64,
    hasher: Sha256,
}

impl BlobUploadStream {
    pub fn id(&self) -> BlobId {
        self.id
    }

    /// Number of bytes accepted so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Append bytes. Flushes a chunk file every time the internal
    /// buffer reaches the configured chunk size.
    pub async fn write(&mut self, mut bytes: &[u8]) -> Result<(), StorageError> {
        self.hasher.update(bytes);
        self.written += bytes.len() as u64;
        while !bytes.is_empty() {
            let take = (self.chunk_size - self.buf.len()).min(bytes.len());
            self.buf.extend_from_slice(&bytes[..take]);
            bytes = &bytes[take..];
            if self.buf.len() == self.chunk_size {
                if let Err(e) = self.flush_chunk().await {
                    self.discard().await;
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    async fn flush_chunk(&mut self) -> Result<(), StorageError> {
        let path = chunk_path(&self.chunk_dir, self.next_sequence);
        fs::write(&path, &self.buf).await?;
        self.next_sequence += 1;
        self.buf.clear();
        Ok(())
    }

    /// Flush the final partial chunk, verify the declared length and
    /// publish the descriptor atomically. Returns the finalized
    /// [`BlobFile`]. On any failure the staged chunks are removed.
    pub async fn close(mut self) -> Result<BlobFile, StorageError> {
        if let Some(expected) = self.expected_length
            && expected != self.written
        {
            let err = StorageError::IncompleteUpload {
                expected,
                actual: self.written,
            };
            self.discard().await;
            return Err(err);
        }

        // Zero-length blobs store no chunks at all.
        if !self.buf.is_empty()
            && let Err(e) = self.flush_chunk().await
        {
            self.discard().await;
            return Err(e);
        }

        let file = BlobFile {
            id: self.id,
            filename: self.filename.clone(),
            length: self.written,
            chunk_size: self.chunk_size,
            chunk_count: self.next_sequence,
            sha256: hex::encode(self.hasher.clone().finalize()),
            upload_date: Utc::now(),
            metadata: self.metadata.clone(),
        };

        let result: Result<(), StorageError> = async {
            let json = serde_json::to_vec_pretty(&file).map_err(|e| {
                StorageError::Io(std::io::Error::new(ErrorKind::InvalidData, e))
            })?;
            fs::write(&self.temp_path, json).await?;
            fs::rename(&self.temp_path, &self.descriptor_path).await?;
            Ok(())
        }
        .await;

        if let Err(e) = result {
            self.discard().await;
            return Err(e);
        }

        Ok(file)
    }

    /// Abandon the upload and remove everything staged so far.
    pub async fn abort(self) {
        self.discard().await;
    }

    async fn discard(&self) {
        // Best effort.
        if let Err(e) = fs::remove_file(&self.temp_path).await
            && e.kind() != ErrorKind::NotFound
        {
            tracing::warn!(id = %self.id, error = %e, "failed to remove staged descriptor");
        }
        if let Err(e) = fs::remove_dir_all(&self.chunk_dir).await
            && e.kind() != ErrorKind::NotFound
        {
            tracing::warn!(id = %self.id, error = %e, "failed to remove staged chunks");
        }
    }
}

/// Read handle over a finalized blob.
///
/// Pull-based: `next_chunk` yields chunks in ascending sequence order
/// until `Ok(None)`. Errors are terminal; the handle never papers over
/// a missing chunk or a short byte count.
pub struct BlobDownloadStream {
    file: BlobFile,
    chunk_dir: PathBuf,
    next_sequence: u64,
    yielded: u64,
}

impl BlobDownloadStream {
    /// Descriptor of the blob being read.
    pub fn file(&self) -> &BlobFile {
        &self.file
    }

    /// Pull the next chunk. `Ok(None)` signals a clean, complete end
    /// of stream.
    pub async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, StorageError> {
        if self.next_sequence >= self.file.chunk_count {
            if self.yielded != self.file.length {
                return Err(StorageError::LengthMismatch {
                    id: self.file.id.to_string(),
                    expected: self.file.length,
                    actual: self.yielded,
                });
            }
            return Ok(None);
        }
        let path = chunk_path(&self.chunk_dir, self.next_sequence);
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::MissingChunk {
                    id: self.file.id.to_string(),
                    sequence: self.next_sequence,
                });
            }
            Err(e) => return Err(e.into()),
        };
        self.next_sequence += 1;
        self.yielded += data.len() as u64;
        Ok(Some(data))
    }

    /// Drain the remaining chunks into one buffer.
    pub async fn read_to_end(mut self) -> Result<Vec<u8>, StorageError> {
        let mut out = Vec::with_capacity(self.file.length as usize);
        while let Some(chunk) = self.next_chunk().await? {
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }

    /// Adapt into a `futures::Stream` of byte chunks, e.g. for an HTTP
    /// response body. Errors surface as a terminal stream item.
    pub fn into_stream(
        self,
    ) -> impl Stream<Item = Result<Vec<u8>, StorageError>> + Send + 'static {
        futures::stream::try_unfold(self, |mut stream| async move {
            Ok(stream.next_chunk().await?.map(|chunk| (chunk, stream)))
        })
    }
}
