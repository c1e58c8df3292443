/// Tuning knobs for building and loading a [`crate::RecordTrie`].
#[derive(Debug, Clone)]
pub struct Options {
    /// Target size of a prefix-compressed data block in bytes.
    /// Smaller blocks mean a bigger index but shorter scans per lookup.
    pub block_size: usize,
    /// Target false positive rate of the per-store key bloom filter.
    pub bloom_false_positive_rate: f64,
    /// Verify the image CRC when loading a persisted trie.
    /// Turning this off makes `load` O(index) instead of O(file).
    pub verify_checksums: bool,
    /// Collapse identical (key, value) records into one entry at build time.
    /// Off by default: duplicates are kept and reported once per occurrence.
    pub dedup: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            block_size: 4096,
            bloom_false_positive_rate: 0.01,
            verify_checksums: true,
            dedup: false,
        }
    }
}
