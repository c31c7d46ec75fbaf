//! System-wide constants for BorealDB.

// =============================================================================
// Page and Memory Constants
// =============================================================================

/// Default page size in bytes (4 KB).
///
/// Matches the typical OS page size and filesystem block size.
pub const DEFAULT_PAGE_SIZE: usize = 4 * 1024;

/// Minimum page size in bytes (512 B).
pub const MIN_PAGE_SIZE: usize = 512;

/// Maximum page size in bytes (64 KB).
pub const MAX_PAGE_SIZE: usize = 64 * 1024;

// =============================================================================
// Buffer Pool Constants
// =============================================================================

/// Default number of frames in the buffer pool.
pub const DEFAULT_POOL_SIZE: usize = 64;

/// Default K parameter for the LRU-K replacement policy.
///
/// K = 2 distinguishes pages accessed repeatedly from pages touched once
/// in a scan, at minimal bookkeeping cost.
pub const DEFAULT_REPLACER_K: usize = 2;

/// Default bucket capacity for the page-table hash index.
pub const DEFAULT_BUCKET_SIZE: usize = 4;
