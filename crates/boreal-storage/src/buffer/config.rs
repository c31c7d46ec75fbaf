//! Buffer pool configuration.

use boreal_common::constants::{
    DEFAULT_BUCKET_SIZE, DEFAULT_PAGE_SIZE, DEFAULT_POOL_SIZE, DEFAULT_REPLACER_K, MIN_PAGE_SIZE,
};

/// Which replacement policy the pool drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// LRU-K: evict the frame with the largest backward k-distance.
    #[default]
    LruK,
    /// CLOCK: second-chance sweep over a ring of reference bits.
    Clock,
}

/// Configuration for the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolConfig {
    /// Number of page frames in the buffer pool.
    pub pool_size: usize,
    /// Page size in bytes.
    pub page_size: usize,
    /// K parameter forwarded to the LRU-K replacer.
    pub replacer_k: usize,
    /// Bucket capacity of the page-table hash index.
    pub bucket_size: usize,
    /// Replacement policy.
    pub policy: EvictionPolicy,
}

impl BufferPoolConfig {
    /// Creates a configuration with the specified number of frames.
    pub fn new(pool_size: usize) -> Self {
        Self {
            pool_size,
            page_size: DEFAULT_PAGE_SIZE,
            replacer_k: DEFAULT_REPLACER_K,
            bucket_size: DEFAULT_BUCKET_SIZE,
            policy: EvictionPolicy::default(),
        }
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the LRU-K history depth.
    pub fn with_replacer_k(mut self, replacer_k: usize) -> Self {
        self.replacer_k = replacer_k;
        self
    }

    /// Sets the page-table bucket capacity.
    pub fn with_bucket_size(mut self, bucket_size: usize) -> Self {
        self.bucket_size = bucket_size;
        self
    }

    /// Sets the replacement policy.
    pub fn with_policy(mut self, policy: EvictionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the total memory used by the frame buffers.
    pub fn memory_usage(&self) -> usize {
        self.pool_size * self.page_size
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.pool_size == 0 {
            return Err("pool_size must be > 0");
        }
        if !self.page_size.is_power_of_two() {
            return Err("page_size must be a power of 2");
        }
        if self.page_size < MIN_PAGE_SIZE {
            return Err("page_size below the supported minimum");
        }
        if self.replacer_k == 0 {
            return Err("replacer_k must be >= 1");
        }
        if self.bucket_size == 0 {
            return Err("bucket_size must be >= 1");
        }
        Ok(())
    }
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new() {
        let config = BufferPoolConfig::new(100);
        assert_eq!(config.pool_size, 100);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.policy, EvictionPolicy::LruK);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = BufferPoolConfig::new(16)
            .with_page_size(8192)
            .with_replacer_k(3)
            .with_bucket_size(8)
            .with_policy(EvictionPolicy::Clock);

        assert_eq!(config.page_size, 8192);
        assert_eq!(config.replacer_k, 3);
        assert_eq!(config.bucket_size, 8);
        assert_eq!(config.policy, EvictionPolicy::Clock);
        assert_eq!(config.memory_usage(), 16 * 8192);
    }

    #[test]
    fn test_validation() {
        assert!(BufferPoolConfig::new(0).validate().is_err());
        assert!(BufferPoolConfig::new(4)
            .with_page_size(1000)
            .validate()
            .is_err());
        assert!(BufferPoolConfig::new(4)
            .with_replacer_k(0)
            .validate()
            .is_err());
    }
}
