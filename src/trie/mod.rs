//! Immutable, prefix-searchable sorted key set.
//!
//! This is the storage engine underneath [`crate::RecordTrie`]. It knows
//! nothing about records: it stores opaque byte strings, enumerates those
//! sharing a prefix in ascending byte order, and persists itself as a
//! single image that is memory-mapped back on load.
//!
//! Image layout:
//! ```text
//! ┌──────────────┬─────────────┬────────────┬──────────────┐
//! │ data blocks  │ index block │ meta block │ footer (56B) │
//! └──────────────┴─────────────┴────────────┴──────────────┘
//! ```

pub mod block;
pub mod builder;
pub mod footer;
pub mod iterator;

pub use builder::{MAX_KEY_LEN, TrieBuilder};
pub use iterator::PrefixIter;

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use memmap2::Mmap;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::trie::footer::{Footer, IndexEntry};

/// Bytes backing a trie: either built in memory or mapped from disk.
/// Dropping the trie drops the mapping with it.
enum Storage {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Deref for Storage {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Storage::Owned(buf) => buf.as_slice(),
            Storage::Mapped(mmap) => &mmap[..],
        }
    }
}

/// A sealed trie image plus its parsed index.
///
/// Reads never mutate anything, so a `KeyTrie` can be shared across
/// threads (`Send + Sync`) and queried concurrently without locking.
pub struct KeyTrie {
    storage: Storage,
    /// Index entries parsed from the index block, sorted by last key.
    index: Vec<IndexEntry>,
    footer: Footer,
}

impl KeyTrie {
    /// Wrap a freshly built image. The builder already produced a
    /// consistent image, so the checksum is not re-verified.
    pub(crate) fn from_bytes(image: Vec<u8>) -> Result<Self> {
        Self::from_storage(Storage::Owned(image), false)
    }

    /// Memory-map a persisted trie.
    ///
    /// Open errors are `Error::Io`; anything wrong with the content
    /// (short file, bad magic, CRC mismatch, out-of-range offsets) is
    /// `Error::Corruption`.
    pub fn open(path: &Path, verify_checksum: bool) -> Result<Self> {
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();
        if file_size < Footer::SIZE as u64 {
            return Err(Error::Corruption(format!(
                "{}: {file_size} bytes is too short to contain a footer",
                path.display()
            )));
        }

        // SAFETY: Mmap::map is unsafe because another process could modify
        // the file while it is mapped. The mapping is read-only and callers
        // must not rewrite a trie file while a store has it loaded.
        let mmap = unsafe { Mmap::map(&file)? };

        let trie = Self::from_storage(Storage::Mapped(mmap), verify_checksum)?;
        info!(
            path = %path.display(),
            entries = trie.len(),
            bytes = file_size,
            "loaded trie"
        );
        Ok(trie)
    }

    fn from_storage(storage: Storage, verify_checksum: bool) -> Result<Self> {
        let data: &[u8] = &storage;
        if data.len() < Footer::SIZE {
            return Err(Error::Corruption("image too short to contain footer".into()));
        }
        let footer_start = data.len() - Footer::SIZE;
        let footer = Footer::decode(&data[footer_start..])?;

        let index_range = checked_range(
            footer.index_block_offset,
            footer.index_block_size,
            footer_start,
            "index block",
        )?;
        let meta_range = checked_range(
            footer.meta_block_offset,
            footer.meta_block_size,
            footer_start,
            "meta block",
        )?;

        if verify_checksum {
            let actual = crc32fast::hash(&data[..footer_start]);
            if actual != footer.checksum {
                return Err(Error::Corruption(format!(
                    "checksum mismatch: expected {:#010x}, got {:#010x}",
                    footer.checksum, actual
                )));
            }
        }

        let index = parse_index(&data[index_range.clone()], index_range.start)?;
        if meta_range.start < index_range.end && meta_range.end > index_range.start {
            return Err(Error::Corruption("meta block overlaps index block".into()));
        }
        if index.is_empty() != (footer.entry_count == 0) {
            return Err(Error::Corruption(format!(
                "{} blocks for {} entries",
                index.len(),
                footer.entry_count
            )));
        }

        Ok(KeyTrie {
            storage,
            index,
            footer,
        })
    }

    /// Write the image to `path`.
    ///
    /// The bytes go to a uniquely named sibling temp file which is fsync'd
    /// and then renamed over `path`, so a failed save never leaves a
    /// truncated trie behind and concurrent saves never share a temp file.
    /// Saving over the file this trie was loaded from is safe: the existing
    /// mapping keeps the old inode alive.
    pub fn save(&self, path: &Path) -> Result<()> {
        let tmp_path = temp_path(path);
        // create_new: never clobber a file we did not create.
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)?;

        let result = (|| -> Result<()> {
            file.write_all(&self.storage)?;
            file.sync_all()?;
            fs::rename(&tmp_path, path)?;
            Ok(())
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
            return result;
        }

        debug!(path = %path.display(), bytes = self.storage.len(), "saved trie");
        Ok(())
    }

    /// Lazily enumerate every stored key starting with `prefix`,
    /// in ascending byte order. Duplicates are yielded once per copy.
    pub fn predictive<'a>(&'a self, prefix: &[u8]) -> PrefixIter<'a> {
        // First block whose last key >= prefix. Every earlier block holds
        // only keys < prefix and cannot match.
        let start = self
            .index
            .partition_point(|entry| entry.last_key.as_slice() < prefix);
        PrefixIter::new(&self.storage, &self.index, start, prefix.to_vec())
    }

    /// Enumerate every stored key.
    pub fn iter(&self) -> PrefixIter<'_> {
        self.predictive(&[])
    }

    /// The opaque meta block attached at build time.
    pub fn meta(&self) -> &[u8] {
        let start = self.footer.meta_block_offset as usize;
        &self.storage[start..start + self.footer.meta_block_size as usize]
    }

    /// Number of stored keys, duplicates included.
    pub fn len(&self) -> usize {
        self.footer.entry_count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.footer.entry_count == 0
    }

    /// Size of the full image in bytes.
    pub fn size_bytes(&self) -> usize {
        self.storage.len()
    }

    /// Whether the image is backed by a file mapping.
    pub fn is_mapped(&self) -> bool {
        matches!(self.storage, Storage::Mapped(_))
    }
}

/// `[offset, offset + size)` as a usize range, or corruption if it
/// escapes `[0, limit)`.
fn checked_range(
    offset: u64,
    size: u64,
    limit: usize,
    what: &str,
) -> Result<std::ops::Range<usize>> {
    let end = offset
        .checked_add(size)
        .filter(|&end| end <= limit as u64)
        .ok_or_else(|| {
            Error::Corruption(format!(
                "{what} [{offset}, +{size}) exceeds image of {limit} bytes"
            ))
        })?;
    Ok(offset as usize..end as usize)
}

/// Parse index entries and check each block lies, in order, inside the
/// data region that precedes the index block.
fn parse_index(data: &[u8], data_region_end: usize) -> Result<Vec<IndexEntry>> {
    let mut index: Vec<IndexEntry> = Vec::new();
    let mut offset = 0usize;
    let mut expected_block_offset = 0u64;

    while offset < data.len() {
        let (entry, consumed) = IndexEntry::decode(&data[offset..])?;
        if entry.offset != expected_block_offset || entry.size == 0 {
            return Err(Error::Corruption(format!(
                "block at {} (size {}) does not follow previous block ending at {}",
                entry.offset, entry.size, expected_block_offset
            )));
        }
        if let Some(prev) = index.last() {
            if entry.last_key < prev.last_key {
                return Err(Error::Corruption("index keys out of order".into()));
            }
        }
        let block_range =
            checked_range(entry.offset, entry.size, data_region_end, "data block")?;
        expected_block_offset = block_range.end as u64;
        index.push(entry);
        offset += consumed;
    }

    if expected_block_offset != data_region_end as u64 {
        return Err(Error::Corruption(format!(
            "data blocks end at {expected_block_offset}, index starts at {data_region_end}"
        )));
    }
    Ok(index)
}

/// Hidden sibling `.<name>.<pid>.<seq>.tmp`, unique per process and call.
fn temp_path(path: &Path) -> PathBuf {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);

    let mut name = std::ffi::OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(format!(".{}.{seq}.tmp", std::process::id()));
    path.with_file_name(name)
}
