use std::fmt;
use std::path::Path;

use tracing::{debug, info};

use crate::bloom::{BloomFilter, BloomFilterBuilder};
use crate::codec::{self, SENTINEL};
use crate::error::{Error, Result};
use crate::options::Options;
use crate::trie::{KeyTrie, PrefixIter, TrieBuilder};
use crate::types::{Key, Record, Value};

/// An immutable, multi-valued key-value store.
///
/// Every record is stored as one composite key `key ++ 0xFF ++ value` in a
/// [`KeyTrie`]. Queries are prefix scans over those composite keys:
///
/// | query                   | scan prefix        |
/// |-------------------------|--------------------|
/// | `exists` / `find`       | `key ++ 0xFF`      |
/// | `keys_starting_with(p)` | `p`                |
/// | `records`               | empty              |
///
/// Results come back in composite-key order, i.e. ascending by key bytes
/// with the end of a key comparing as 0xFF, then ascending by value.
///
/// Duplicate records are kept and reported once per occurrence unless the
/// store is built with [`Options::dedup`].
///
/// The store never changes after `new`/`load` returns, so `&RecordTrie`
/// can be shared across threads and queried concurrently.
pub struct RecordTrie {
    trie: KeyTrie,
    /// Bloom filter over the distinct keys; persisted as the trie meta block.
    bloom: BloomFilter,
}

impl RecordTrie {
    /// Build a store from records with default options.
    ///
    /// Fails with `Error::InvalidKey` if any key contains the sentinel byte,
    /// and with `Error::Build` if an encoded record (key, sentinel and value)
    /// is longer than [`MAX_KEY_LEN`](crate::trie::MAX_KEY_LEN), i.e. 65535
    /// bytes.
    pub fn new<I>(records: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Record>,
    {
        Self::with_options(records, &Options::default())
    }

    /// Build a store from records. Same failure modes as [`RecordTrie::new`].
    pub fn with_options<I>(records: I, options: &Options) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Record>,
    {
        check_options(options)?;

        let records: Vec<Record> = records.into_iter().map(Into::into).collect();
        for record in &records {
            codec::validate_key(&record.key)?;
        }

        let mut keys: Vec<&[u8]> = records.iter().map(|r| r.key.as_slice()).collect();
        keys.sort_unstable();
        keys.dedup();
        let mut bloom = BloomFilterBuilder::new(keys.len(), options.bloom_false_positive_rate);
        for key in &keys {
            bloom.add_key(key);
        }
        let bloom = bloom.build();
        let distinct_keys = keys.len();

        let mut builder = TrieBuilder::with_capacity(options, records.len());
        for record in &records {
            builder.push(codec::encode(&record.key, &record.value)?)?;
        }
        builder.set_meta(bloom.serialize());
        let trie = builder.finish()?;

        info!(
            records = records.len(),
            stored = trie.len(),
            distinct_keys,
            bytes = trie.size_bytes(),
            "built record trie"
        );
        Ok(RecordTrie { trie, bloom })
    }

    /// Load a store saved with [`RecordTrie::save`], with default options.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_options(path, &Options::default())
    }

    /// Memory-map a saved store. The file is queried in place; nothing is
    /// decoded or sorted up front. The file must not be modified while the
    /// returned store is alive.
    pub fn load_with_options(path: impl AsRef<Path>, options: &Options) -> Result<Self> {
        let path = path.as_ref();
        let trie = KeyTrie::open(path, options.verify_checksums)?;
        let bloom = BloomFilter::deserialize(trie.meta())?;
        debug!(path = %path.display(), "attached key bloom filter");
        Ok(RecordTrie { trie, bloom })
    }

    /// Persist the store to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.trie.save(path.as_ref())
    }

    /// Whether any record has exactly this key.
    pub fn exists(&self, key: &[u8]) -> bool {
        self.values(key).next().is_some()
    }

    /// Every value stored under `key`, ascending by value bytes.
    /// Empty when the key is absent.
    pub fn find(&self, key: &[u8]) -> Vec<Value> {
        self.values(key).collect()
    }

    /// Lazy form of [`RecordTrie::find`].
    pub fn values(&self, key: &[u8]) -> Values<'_> {
        // A key holding the sentinel was rejected at build time, and a
        // bloom miss proves absence; both skip the scan.
        let inner = match codec::key_prefix(key) {
            Ok(prefix) if self.bloom.may_contain(key) => Some(self.trie.predictive(&prefix)),
            _ => None,
        };
        Values { inner }
    }

    /// The key of every record whose key starts with `prefix`. A key with
    /// N stored values appears N times.
    pub fn keys_starting_with(&self, prefix: &[u8]) -> Vec<Key> {
        // No stored key contains the sentinel, so neither can a prefix of one.
        if prefix.contains(&SENTINEL) {
            return Vec::new();
        }
        self.iter_prefix(prefix).map(|(key, _)| key).collect()
    }

    /// Every stored record.
    pub fn records(&self) -> Vec<Record> {
        self.iter().map(Record::from).collect()
    }

    /// Lazily scan decoded records whose composite key starts with `prefix`.
    ///
    /// `prefix` is matched against the raw `key ++ 0xFF ++ value` bytes, so
    /// `b"foo\xFFba"` selects the values of `"foo"` starting with `"ba"`.
    pub fn iter_prefix(&self, prefix: &[u8]) -> Matches<'_> {
        Matches {
            inner: self.trie.predictive(prefix),
        }
    }

    /// Lazily scan every record.
    pub fn iter(&self) -> Matches<'_> {
        self.iter_prefix(&[])
    }

    /// Number of stored entries. Duplicates count unless deduplicated.
    pub fn len(&self) -> usize {
        self.trie.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }

    /// Size of the underlying trie image in bytes.
    pub fn size_bytes(&self) -> usize {
        self.trie.size_bytes()
    }

    /// Whether the store is backed by a memory-mapped file.
    pub fn is_mapped(&self) -> bool {
        self.trie.is_mapped()
    }
}

impl fmt::Debug for RecordTrie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordTrie")
            .field("len", &self.len())
            .field("size_bytes", &self.size_bytes())
            .field("mapped", &self.is_mapped())
            .finish()
    }
}

fn check_options(options: &Options) -> Result<()> {
    let fpr = options.bloom_false_positive_rate;
    if !(fpr > 0.0 && fpr < 1.0) {
        return Err(Error::Build(format!(
            "bloom false positive rate must be in (0, 1), got {fpr}"
        )));
    }
    Ok(())
}

/// Lazy scan of decoded `(key, value)` pairs, in composite-key order.
pub struct Matches<'a> {
    inner: PrefixIter<'a>,
}

impl Iterator for Matches<'_> {
    type Item = (Key, Value);

    fn next(&mut self) -> Option<Self::Item> {
        let composite = self.inner.next()?;
        let (key, value) = codec::decode(&composite);
        Some((key.to_vec(), value.to_vec()))
    }
}

/// Lazy scan of the values stored under one key, ascending.
pub struct Values<'a> {
    inner: Option<PrefixIter<'a>>,
}

impl Iterator for Values<'_> {
    type Item = Value;

    fn next(&mut self) -> Option<Self::Item> {
        let composite = self.inner.as_mut()?.next()?;
        let (_, value) = codec::decode(&composite);
        Some(value.to_vec())
    }
}
