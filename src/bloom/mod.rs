pub mod builder;

pub use builder::BloomFilterBuilder;

use xxhash_rust::xxh3::xxh3_128;

use crate::error::{Error, Result};

/// num_hashes + num_bits.
const HEADER_SIZE: usize = 8;

/// Bloom filter over the distinct keys of a store.
///
/// A clear probe bit proves the key was never stored, so `exists` and
/// `find` return immediately without touching the trie. All bits set
/// means "maybe": the prefix scan decides.
///
/// Sized as bits_per_key = -1.44 * log2(fpr) and
/// num_hashes = bits_per_key * ln 2 (1% → ~10 bits, 7 probes).
/// Probes use double hashing over the two halves of one xxh3-128 hash:
/// p_i = h1 + i * h2 (mod num_bits).
pub struct BloomFilter {
    bits: Vec<u64>,
    num_hashes: u32,
    num_bits: u32,
}

impl BloomFilter {
    /// Create an empty filter sized for `expected_items` at the given rate.
    ///
    /// # Panics
    /// Panics if expected_items is 0 or the rate is not in (0, 1).
    /// [`BloomFilterBuilder`] clamps the item count for empty stores.
    pub fn new(expected_items: usize, false_positive_rate: f64) -> Self {
        assert!(expected_items > 0, "expected_items must be > 0");
        assert!(
            false_positive_rate > 0.0 && false_positive_rate < 1.0,
            "false positive rate must be in (0, 1)"
        );

        let bits_per_key = -1.44 * false_positive_rate.log2();
        let num_bits = ((expected_items as f64 * bits_per_key).ceil() as u32).max(64);
        let num_hashes = ((bits_per_key * std::f64::consts::LN_2).ceil() as u32).max(1);

        Self {
            bits: vec![0u64; (num_bits as usize).div_ceil(64)],
            num_hashes,
            num_bits,
        }
    }

    /// Record a key.
    pub fn insert(&mut self, key: &[u8]) {
        for pos in self.probes(key) {
            self.bits[pos / 64] |= 1 << (pos % 64);
        }
    }

    /// false → the key is definitely absent. true → it may be present.
    pub fn may_contain(&self, key: &[u8]) -> bool {
        self.probes(key)
            .all(|pos| (self.bits[pos / 64] >> (pos % 64)) & 1 == 1)
    }

    /// Serialize for storage as the trie meta block.
    /// Format: [num_hashes(4B)][num_bits(4B)][bit words(8B each)...]
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_SIZE + self.bits.len() * 8);
        buf.extend_from_slice(&self.num_hashes.to_le_bytes());
        buf.extend_from_slice(&self.num_bits.to_le_bytes());
        for word in &self.bits {
            buf.extend_from_slice(&word.to_le_bytes());
        }
        buf
    }

    /// Rebuild a filter from a meta block.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::Corruption("bloom filter too short".into()));
        }
        let num_hashes = u32::from_le_bytes(data[0..4].try_into().unwrap());
        let num_bits = u32::from_le_bytes(data[4..8].try_into().unwrap());
        if num_hashes == 0 || num_bits == 0 {
            return Err(Error::Corruption(format!(
                "bloom filter has {num_hashes} hashes over {num_bits} bits"
            )));
        }

        let body = &data[HEADER_SIZE..];
        let expected_len = (num_bits as usize).div_ceil(64) * 8;
        if body.len() != expected_len {
            return Err(Error::Corruption(format!(
                "bloom filter body: expected {expected_len} bytes, got {}",
                body.len()
            )));
        }
        let bits = body
            .chunks_exact(8)
            .map(|chunk| u64::from_le_bytes(chunk.try_into().unwrap()))
            .collect();

        Ok(Self {
            bits,
            num_hashes,
            num_bits,
        })
    }

    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    pub fn num_bits(&self) -> u32 {
        self.num_bits
    }

    /// Bit positions probed for `key`.
    fn probes(&self, key: &[u8]) -> impl Iterator<Item = usize> + use<> {
        let hash = xxh3_128(key);
        let (h1, h2) = (hash as u64, (hash >> 64) as u64);
        let num_bits = self.num_bits as u64;
        (0..self.num_hashes as u64)
            .map(move |i| (h1.wrapping_add(i.wrapping_mul(h2)) % num_bits) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basics() {
        let mut bf = BloomFilter::new(100, 0.01);
        bf.insert(b"hello");
        assert!(bf.may_contain(b"hello"));
        assert!(!bf.may_contain(b"world"));
    }

    #[test]
    fn serialized_size_matches_words() {
        let bf = BloomFilter::new(100, 0.01);
        let data = bf.serialize();
        assert_eq!(data.len(), HEADER_SIZE + bf.bits.len() * 8);
    }

    #[test]
    fn deserialize_rejects_truncated_body() {
        let mut data = BloomFilter::new(100, 0.01).serialize();
        data.pop();
        assert!(matches!(
            BloomFilter::deserialize(&data),
            Err(Error::Corruption(_))
        ));
    }
}
