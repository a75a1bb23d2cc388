use std::fmt;

/// Errors that can occur during blob storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// No blob with the given id exists.
    NotFound(String),
    /// A chunk file vanished mid-download (concurrent delete).
    MissingChunk { id: String, sequence: u64 },
    /// The chunks on disk do not add up to the recorded length.
    LengthMismatch {
        id: String,
        expected: u64,
        actual: u64,
    },
    /// Fewer bytes were written than the upload declared.
    IncompleteUpload { expected: u64, actual: u64 },
    /// A blob descriptor exists but could not be decoded.
    CorruptDescriptor(String),
    /// The provided blob id could not be parsed.
    InvalidId(String),
    /// An I/O error occurred.
    Io(std::io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "blob not found: {id}"),
            Self::MissingChunk { id, sequence } => {
                write!(f, "chunk {sequence} of blob {id} is missing")
            }
            Self::LengthMismatch {
                id,
                expected,
                actual,
            } => write!(
                f,
                "blob {id} delivered {actual} bytes, descriptor records {expected}"
            ),
            Self::IncompleteUpload { expected, actual } => write!(
                f,
                "upload ended after {actual} of {expected} declared bytes"
            ),
            Self::CorruptDescriptor(msg) => write!(f, "corrupt blob descriptor: {msg}"),
            Self::InvalidId(msg) => write!(f, "invalid blob id: {msg}"),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
