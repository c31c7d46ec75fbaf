//! Core type definitions for BorealDB.

mod ids;

pub use ids::{Lsn, PageId};
