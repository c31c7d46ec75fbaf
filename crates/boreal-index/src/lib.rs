//! In-memory index structures for BorealDB.
//!
//! This crate currently provides one container:
//!
//! - **Extendible hash table**: a dynamic hash table whose directory doubles
//!   on demand while buckets split individually. It backs the buffer pool's
//!   page table and is the building block for the database's hash indexes.
//!
//! # Example
//!
//! ```rust
//! use boreal_index::ExtendibleHashTable;
//!
//! let table = ExtendibleHashTable::new(4);
//! table.insert("key1", 1);
//! assert_eq!(table.find(&"key1"), Some(1));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod extendible;

pub use extendible::ExtendibleHashTable;
