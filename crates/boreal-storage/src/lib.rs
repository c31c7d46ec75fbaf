//! # boreal-storage
//!
//! The memory-management layer of the BorealDB storage engine.
//!
//! This crate owns the path between disk pages and the in-memory frames
//! the rest of the engine works on:
//!
//! - [`disk`]: a blocking, page-granular disk manager trait with
//!   file-backed and in-memory implementations
//! - [`buffer`]: the buffer pool itself, with a fixed set of frames, a page
//!   table, pluggable replacement policies (CLOCK and LRU-K), and RAII guards
//! - [`log`]: the log-manager handle the pool holds by identity
//!
//! Persistence below the page boundary and recovery above it are out of
//! scope here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod disk;
pub mod log;
