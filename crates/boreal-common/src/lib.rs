//! # boreal-common
//!
//! Common types and constants for BorealDB.
//!
//! This crate provides the foundational pieces shared by the storage
//! subsystem:
//!
//! - **Types**: typed identifiers (`PageId`, `Lsn`) that prevent accidental
//!   mixing of raw integers
//! - **Constants**: system-wide sizes and tuning defaults
//!
//! ## Example
//!
//! ```rust
//! use boreal_common::types::PageId;
//!
//! let page_id = PageId::new(42);
//! assert!(page_id.is_valid());
//! assert_eq!(page_id.next(), PageId::new(43));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod types;

// Re-export commonly used items at the crate root
pub use constants::*;
pub use types::{Lsn, PageId};
