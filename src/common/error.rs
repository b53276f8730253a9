//! Error types for HearthDB.

use std::fmt;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in the storage core.
///
/// By having a single error type, error handling stays consistent across
/// the buffer pool, the disk manager and the index. Soft signals that the
/// caller is expected to handle inline (invalid unpin, delete of a pinned
/// page, duplicate entry, index full) are `bool` returns on the operations
/// themselves, not error variants.
#[derive(Debug)]
pub enum Error {
    /// I/O error from disk operations.
    ///
    /// This wraps `std::io::Error` from file read/write operations.
    /// I/O errors are fatal for the operation that hit them; the core
    /// never retries and never swallows them.
    Io(std::io::Error),

    /// Buffer pool has no free frames and cannot evict any pages.
    ///
    /// This happens when every frame is pinned.
    NoFreeFrame,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::NoFreeFrame => write!(f, "No free frame available in buffer pool"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
