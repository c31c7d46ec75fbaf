//! Extendible hash table.
//!
//! An extendible hash table keeps a *directory* of bucket references whose
//! length is always a power of two (`2^global_depth`). A key is routed by
//! the low `global_depth` bits of its hash. Each bucket carries its own
//! *local depth*; several directory slots share one bucket while the
//! bucket's local depth is below the global depth.
//!
//! When a bucket overflows it is split: its local depth grows by one, a
//! sibling bucket is allocated, and the overfull bucket's entries are
//! redistributed by the newly significant hash bit. If the splitting
//! bucket was already at the global depth, the directory doubles first.
//! Unlike a rehash-everything scheme, a split touches exactly one bucket.
//!
//! Buckets live in an arena (`Vec<Bucket>`); the directory stores arena
//! indices, so aliasing between slots needs no reference counting.
//!
//! All public operations are serialized by an internal latch, so a shared
//! reference to the table can be used from many threads.

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};

use parking_lot::Mutex;

/// A bucket holds up to `bucket_size` key/value pairs at a given local depth.
struct Bucket<K, V> {
    local_depth: u32,
    items: Vec<(K, V)>,
}

impl<K, V> Bucket<K, V> {
    fn new(local_depth: u32, capacity: usize) -> Self {
        Self {
            local_depth,
            items: Vec::with_capacity(capacity),
        }
    }
}

struct Inner<K, V> {
    /// Number of hash bits currently used to index the directory.
    global_depth: u32,
    /// Directory of length `2^global_depth`; values index into `buckets`.
    directory: Vec<usize>,
    /// Bucket arena. Splits append; nothing is ever removed.
    buckets: Vec<Bucket<K, V>>,
    /// Total number of entries across all buckets.
    len: usize,
}

/// A thread-safe extendible hash table.
///
/// Supports upsert-style [`insert`](Self::insert), [`find`](Self::find),
/// and [`remove`](Self::remove), plus observers for the directory shape.
/// Buckets split on overflow; the directory doubles when a splitting
/// bucket is already at the global depth. Buckets are never merged and
/// the directory never shrinks.
///
/// # Example
///
/// ```rust
/// use boreal_index::ExtendibleHashTable;
///
/// let table = ExtendibleHashTable::new(4);
/// for i in 0..64u64 {
///     table.insert(i, i * 2);
/// }
/// assert_eq!(table.find(&7), Some(14));
/// assert!(table.remove(&7));
/// assert_eq!(table.find(&7), None);
/// ```
pub struct ExtendibleHashTable<K, V, S = RandomState> {
    inner: Mutex<Inner<K, V>>,
    hasher: S,
    bucket_size: usize,
}

impl<K, V> ExtendibleHashTable<K, V, RandomState> {
    /// Creates a table whose buckets hold up to `bucket_size` entries.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_size` is zero.
    pub fn new(bucket_size: usize) -> Self {
        Self::with_hasher(bucket_size, RandomState::new())
    }
}

impl<K, V, S> ExtendibleHashTable<K, V, S> {
    /// Creates a table with a caller-provided hasher.
    ///
    /// Mainly useful for tests that need deterministic hash values to
    /// drive directory growth.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_size` is zero.
    pub fn with_hasher(bucket_size: usize, hasher: S) -> Self {
        assert!(bucket_size > 0, "bucket_size must be at least 1");
        Self {
            inner: Mutex::new(Inner {
                global_depth: 0,
                directory: vec![0],
                buckets: vec![Bucket::new(0, bucket_size)],
                len: 0,
            }),
            hasher,
            bucket_size,
        }
    }

    /// Returns the number of directory bits currently in use.
    pub fn global_depth(&self) -> u32 {
        self.inner.lock().global_depth
    }

    /// Returns the local depth of the bucket behind directory slot
    /// `dir_index`.
    ///
    /// # Panics
    ///
    /// Panics if `dir_index` is outside the current directory.
    pub fn local_depth(&self, dir_index: usize) -> u32 {
        let inner = self.inner.lock();
        inner.buckets[inner.directory[dir_index]].local_depth
    }

    /// Returns the number of distinct buckets.
    pub fn num_buckets(&self) -> usize {
        self.inner.lock().buckets.len()
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.inner.lock().len
    }

    /// Returns true if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry and resets the directory to a single bucket.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.global_depth = 0;
        inner.directory = vec![0];
        inner.buckets = vec![Bucket::new(0, self.bucket_size)];
        inner.len = 0;
    }
}

impl<K, V, S> ExtendibleHashTable<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Looks up `key` and returns a copy of its value.
    pub fn find<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let inner = self.inner.lock();
        let slot = Self::dir_slot(self.raw_hash(key), inner.global_depth);
        inner.buckets[inner.directory[slot]]
            .items
            .iter()
            .find(|(k, _)| k.borrow() == key)
            .map(|(_, v)| v.clone())
    }

    /// Returns true if `key` is present.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let inner = self.inner.lock();
        let slot = Self::dir_slot(self.raw_hash(key), inner.global_depth);
        inner.buckets[inner.directory[slot]]
            .items
            .iter()
            .any(|(k, _)| k.borrow() == key)
    }

    /// Inserts `key` with `value`, overwriting any previous value.
    ///
    /// Splits the target bucket (doubling the directory when needed) until
    /// the entry fits. A single insert may cascade through several splits
    /// when the colliding keys only diverge at a deeper hash bit.
    pub fn insert(&self, key: K, value: V) {
        let inner = &mut *self.inner.lock();
        let hash = self.raw_hash(&key);
        loop {
            let slot = Self::dir_slot(hash, inner.global_depth);
            let bucket_idx = inner.directory[slot];
            let bucket = &mut inner.buckets[bucket_idx];

            if let Some(entry) = bucket.items.iter_mut().find(|(k, _)| *k == key) {
                entry.1 = value;
                return;
            }
            if bucket.items.len() < self.bucket_size {
                bucket.items.push((key, value));
                inner.len += 1;
                return;
            }
            self.split(inner, bucket_idx);
        }
    }

    /// Removes the entry for `key`; returns whether anything was removed.
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let inner = &mut *self.inner.lock();
        let slot = Self::dir_slot(self.raw_hash(key), inner.global_depth);
        let bucket_idx = inner.directory[slot];
        let bucket = &mut inner.buckets[bucket_idx];
        match bucket.items.iter().position(|(k, _)| k.borrow() == key) {
            Some(pos) => {
                bucket.items.remove(pos);
                inner.len -= 1;
                true
            }
            None => false,
        }
    }

    /// Splits the bucket at arena index `bucket_idx`, doubling the
    /// directory first if the bucket is already at the global depth.
    fn split(&self, inner: &mut Inner<K, V>, bucket_idx: usize) {
        let local_depth = inner.buckets[bucket_idx].local_depth;
        if local_depth == inner.global_depth {
            // dir[i + 2^old] starts out aliasing dir[i]
            inner.directory.extend_from_within(..);
            inner.global_depth += 1;
        }

        let sibling_idx = inner.buckets.len();
        inner.buckets[bucket_idx].local_depth = local_depth + 1;
        inner
            .buckets
            .push(Bucket::new(local_depth + 1, self.bucket_size));

        // Directory slots that diverge at the newly significant bit now
        // reference the sibling.
        let slot_bit = 1usize << local_depth;
        for slot in 0..inner.directory.len() {
            if inner.directory[slot] == bucket_idx && slot & slot_bit != 0 {
                inner.directory[slot] = sibling_idx;
            }
        }

        // Redistribute the overfull bucket's entries by the same bit.
        let hash_bit = 1u64 << local_depth;
        let drained = std::mem::take(&mut inner.buckets[bucket_idx].items);
        let (moved, kept): (Vec<_>, Vec<_>) = drained
            .into_iter()
            .partition(|(k, _)| self.raw_hash(k) & hash_bit != 0);
        inner.buckets[bucket_idx].items = kept;
        inner.buckets[sibling_idx].items = moved;
    }

    fn raw_hash<Q>(&self, key: &Q) -> u64
    where
        Q: Hash + ?Sized,
    {
        self.hasher.hash_one(key)
    }

    #[inline]
    fn dir_slot(hash: u64, global_depth: u32) -> usize {
        (hash & ((1u64 << global_depth) - 1)) as usize
    }
}

impl<K, V, S> std::fmt::Debug for ExtendibleHashTable<K, V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ExtendibleHashTable")
            .field("global_depth", &inner.global_depth)
            .field("num_buckets", &inner.buckets.len())
            .field("len", &inner.len)
            .field("bucket_size", &self.bucket_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::Hasher;

    /// Hashes a `u64` key to itself so tests control bucket placement.
    #[derive(Clone, Default)]
    struct IdentityState;

    struct IdentityHasher(u64);

    impl Hasher for IdentityHasher {
        fn write(&mut self, bytes: &[u8]) {
            for &b in bytes {
                self.0 = (self.0 << 8) | u64::from(b);
            }
        }

        fn write_u64(&mut self, n: u64) {
            self.0 = n;
        }

        fn finish(&self) -> u64 {
            self.0
        }
    }

    impl BuildHasher for IdentityState {
        type Hasher = IdentityHasher;

        fn build_hasher(&self) -> IdentityHasher {
            IdentityHasher(0)
        }
    }

    fn identity_table<V>(bucket_size: usize) -> ExtendibleHashTable<u64, V, IdentityState> {
        ExtendibleHashTable::with_hasher(bucket_size, IdentityState)
    }

    #[test]
    fn test_insert_find_remove() {
        let table = ExtendibleHashTable::new(4);

        table.insert("a", 1);
        table.insert("b", 2);
        assert_eq!(table.find(&"a"), Some(1));
        assert_eq!(table.find(&"b"), Some(2));
        assert_eq!(table.find(&"c"), None);

        // Upsert overwrites in place
        table.insert("a", 10);
        assert_eq!(table.find(&"a"), Some(10));
        assert_eq!(table.len(), 2);

        assert!(table.remove(&"a"));
        assert!(!table.remove(&"a"));
        assert_eq!(table.find(&"a"), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_directory_growth() {
        let table = identity_table(2);
        assert_eq!(table.global_depth(), 0);
        assert_eq!(table.num_buckets(), 1);

        // Keys 0..4 diverge in their low two bits
        for i in 0..4u64 {
            table.insert(i, i);
        }
        assert!(table.global_depth() >= 1);
        for i in 0..4u64 {
            assert_eq!(table.find(&i), Some(i));
        }
    }

    #[test]
    fn test_split_cascade() {
        // Keys 0, 4, 8 share their low two bits, so one insert must split
        // repeatedly until the directory uses three bits.
        let table = identity_table(2);
        table.insert(0u64, 'a');
        table.insert(4u64, 'b');
        table.insert(8u64, 'c');

        assert_eq!(table.global_depth(), 3);
        assert_eq!(table.num_buckets(), 4);
        assert_eq!(table.find(&0), Some('a'));
        assert_eq!(table.find(&4), Some('b'));
        assert_eq!(table.find(&8), Some('c'));
    }

    #[test]
    fn test_directory_sharing_invariant() {
        // Two slots reference the same bucket iff their low local_depth
        // bits agree.
        let table = identity_table(2);
        for i in 0..32u64 {
            table.insert(i, i);
        }

        let dir_len = 1usize << table.global_depth();
        for i in 0..dir_len {
            let depth = table.local_depth(i);
            assert!(depth <= table.global_depth());
            let mask = (1usize << depth) - 1;
            // The canonical slot for this bucket has the same low bits.
            assert_eq!(table.local_depth(i & mask), depth);
        }
    }

    #[test]
    fn test_large_insert_with_default_hasher() {
        let table = ExtendibleHashTable::new(4);
        for i in 0..1000u64 {
            table.insert(i, i * 3);
        }
        assert_eq!(table.len(), 1000);
        for i in 0..1000u64 {
            assert_eq!(table.find(&i), Some(i * 3));
        }
        // Enough entries to force many splits
        assert!(table.num_buckets() > 1);
        assert!(table.global_depth() >= 1);
    }

    #[test]
    fn test_remove_then_reinsert() {
        let table = ExtendibleHashTable::new(2);
        for i in 0..16u64 {
            table.insert(i, i);
        }
        for i in 0..16u64 {
            assert!(table.remove(&i));
        }
        assert!(table.is_empty());
        // Directory keeps its shape; the table stays usable
        for i in 0..16u64 {
            table.insert(i, i + 100);
        }
        assert_eq!(table.find(&3), Some(103));
    }

    #[test]
    fn test_clear() {
        let table = ExtendibleHashTable::new(2);
        for i in 0..16u64 {
            table.insert(i, i);
        }
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.global_depth(), 0);
        assert_eq!(table.num_buckets(), 1);
        assert_eq!(table.find(&3), None);
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::Arc;
        use std::thread;

        let table = Arc::new(ExtendibleHashTable::new(4));
        let mut handles = Vec::new();
        for t in 0..4u64 {
            let table = Arc::clone(&table);
            handles.push(thread::spawn(move || {
                for i in 0..250u64 {
                    let key = t * 1000 + i;
                    table.insert(key, key);
                    assert_eq!(table.find(&key), Some(key));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(table.len(), 1000);
    }
}
