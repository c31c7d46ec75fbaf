//! Buffer pool errors.

use std::io;

use boreal_common::types::PageId;
use thiserror::Error;

/// Result type for buffer pool operations.
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer pool operations.
#[derive(Debug, Error)]
pub enum BufferError {
    /// Every frame is pinned: no free frame and no evictable candidate.
    #[error("buffer pool exhausted: no free frame and no evictable page")]
    PoolExhausted,

    /// The requested page is not resident in the buffer pool.
    #[error("page {page_id} not found in buffer pool")]
    PageNotFound {
        /// The page that was looked up.
        page_id: PageId,
    },

    /// The page is pinned and the operation requires it unpinned.
    #[error("page {page_id} is pinned ({pin_count} pins)")]
    PagePinned {
        /// The pinned page.
        page_id: PageId,
        /// Its pin count at the time of the call.
        pin_count: u32,
    },

    /// Unpin of a page whose pin count is already zero.
    #[error("page {page_id} is not pinned")]
    NotPinned {
        /// The page that was not pinned.
        page_id: PageId,
    },

    /// I/O error during page read or write-back, propagated unmodified.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config {
        /// What was wrong with the configuration.
        message: String,
    },
}

impl BufferError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a page not found error.
    pub fn page_not_found(page_id: PageId) -> Self {
        Self::PageNotFound { page_id }
    }

    /// Returns true if retrying after unpinning pages may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PoolExhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = BufferError::page_not_found(PageId::new(42));
        assert!(matches!(
            err,
            BufferError::PageNotFound { page_id } if page_id == PageId::new(42)
        ));
    }

    #[test]
    fn test_is_retryable() {
        assert!(BufferError::PoolExhausted.is_retryable());
        assert!(!BufferError::page_not_found(PageId::new(1)).is_retryable());
    }

    #[test]
    fn test_io_conversion() {
        let err: BufferError = io::Error::new(io::ErrorKind::Other, "disk gone").into();
        assert!(matches!(err, BufferError::Io { .. }));
    }
}
