use std::fmt;
use std::io;

/// Unified error type for the record trie.
#[derive(Debug)]
pub enum Error {
    /// IO error from disk operations.
    Io(io::Error),
    /// Persisted data is not a valid trie image (bad magic, CRC mismatch, bad bounds).
    Corruption(String),
    /// A key contains the reserved sentinel byte at `position`.
    InvalidKey { position: usize },
    /// The trie builder rejected its input.
    Build(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO error: {e}"),
            Error::Corruption(msg) => write!(f, "Corruption: {msg}"),
            Error::InvalidKey { position } => {
                write!(f, "Invalid key: sentinel byte 0xFF at offset {position}")
            }
            Error::Build(msg) => write!(f, "Build failed: {msg}"),
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

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
