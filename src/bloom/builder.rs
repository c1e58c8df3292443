use crate::bloom::BloomFilter;

/// Convenience builder for constructing the key bloom filter while a
/// store is being built.
///
/// Usage:
/// 1. Create BloomFilterBuilder with the number of distinct keys
/// 2. Call add_key() for every key
/// 3. Call build() to get the final BloomFilter for serialization
pub struct BloomFilterBuilder {
    filter: BloomFilter,
}

impl BloomFilterBuilder {
    /// Create a builder expecting approximately `estimated_keys` keys.
    /// Zero is allowed and sizes the filter for a single key.
    pub fn new(estimated_keys: usize, false_positive_rate: f64) -> Self {
        BloomFilterBuilder {
            filter: BloomFilter::new(estimated_keys.max(1), false_positive_rate),
        }
    }

    /// Add a key to the bloom filter being built.
    pub fn add_key(&mut self, key: &[u8]) {
        self.filter.insert(key);
    }

    /// Finalize and return the bloom filter.
    pub fn build(self) -> BloomFilter {
        self.filter
    }
}
