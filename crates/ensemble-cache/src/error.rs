//! Error types for the semantic cache.

use std::fmt;
use std::io;

/// Errors that can occur while writing to the cache.
///
/// Lookups never fail: a cache that cannot answer a question is simply a
/// miss. Only the write path, which may compress the payload, can fail.
#[derive(Debug)]
pub enum CacheError {
    /// Gzip compression of a payload above the configured threshold failed.
    Compression(io::Error),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Compression(e) => write!(f, "failed to compress cache payload: {}", e),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Compression(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_io_detail() {
        let err = CacheError::Compression(io::Error::new(io::ErrorKind::Other, "broken pipe"));
        assert!(err.to_string().contains("broken pipe"));
    }
}
