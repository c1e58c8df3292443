use tracing::debug;

use crate::error::{Error, Result};
use crate::options::Options;
use crate::trie::block::BlockBuilder;
use crate::trie::footer::{FORMAT_VERSION, Footer, IndexEntry};
use crate::trie::KeyTrie;

/// Longest key the block format can describe.
pub const MAX_KEY_LEN: usize = u16::MAX as usize;

/// Builds a [`KeyTrie`] image from an unordered collection of keys.
///
/// Build process:
/// 1. Push keys in any order (length is checked on push)
/// 2. finish() sorts them, optionally deduplicates, and packs them into
///    prefix-compressed blocks
/// 3. The index block, meta block and footer are appended, and the image
///    is handed to [`KeyTrie`] as an owned buffer
///
/// The image is byte-identical to what [`KeyTrie::save`] writes to disk.
pub struct TrieBuilder {
    keys: Vec<Vec<u8>>,
    meta: Vec<u8>,
    block_size: usize,
    dedup: bool,
}

impl TrieBuilder {
    pub fn new(options: &Options) -> Self {
        TrieBuilder {
            keys: Vec::new(),
            meta: Vec::new(),
            block_size: options.block_size,
            dedup: options.dedup,
        }
    }

    /// Pre-size the key buffer.
    pub fn with_capacity(options: &Options, capacity: usize) -> Self {
        let mut builder = Self::new(options);
        builder.keys.reserve(capacity);
        builder
    }

    /// Queue a key. Rejects keys the block format cannot hold.
    pub fn push(&mut self, key: Vec<u8>) -> Result<()> {
        if key.len() > MAX_KEY_LEN {
            return Err(Error::Build(format!(
                "key of {} bytes exceeds the {MAX_KEY_LEN}-byte limit",
                key.len()
            )));
        }
        self.keys.push(key);
        Ok(())
    }

    /// Attach an opaque meta block, returned verbatim by [`KeyTrie::meta`].
    pub fn set_meta(&mut self, meta: Vec<u8>) {
        self.meta = meta;
    }

    /// Sort, pack and seal the image.
    pub fn finish(mut self) -> Result<KeyTrie> {
        self.keys.sort_unstable();
        if self.dedup {
            self.keys.dedup();
        }

        let mut image = Vec::new();
        let mut index_entries = Vec::new();
        let mut block = BlockBuilder::new(self.block_size);

        for key in &self.keys {
            if block.add(key) {
                continue;
            }
            flush_block(&mut image, &mut index_entries, &mut block, self.block_size);
            // A fresh block always takes its first entry.
            let accepted = block.add(key);
            debug_assert!(accepted);
        }
        flush_block(&mut image, &mut index_entries, &mut block, self.block_size);

        let index_block_offset = image.len() as u64;
        for entry in &index_entries {
            image.extend_from_slice(&entry.encode());
        }
        let index_block_size = image.len() as u64 - index_block_offset;

        let meta_block_offset = image.len() as u64;
        image.extend_from_slice(&self.meta);
        let meta_block_size = self.meta.len() as u64;

        let footer = Footer {
            index_block_offset,
            index_block_size,
            meta_block_offset,
            meta_block_size,
            entry_count: self.keys.len() as u64,
            checksum: crc32fast::hash(&image),
            version: FORMAT_VERSION,
        };
        image.extend_from_slice(&footer.encode());

        debug!(
            entries = self.keys.len(),
            blocks = index_entries.len(),
            bytes = image.len(),
            "built trie image"
        );

        KeyTrie::from_bytes(image)
    }
}

/// Seal the current block into the image and record its index entry.
fn flush_block(
    image: &mut Vec<u8>,
    index_entries: &mut Vec<IndexEntry>,
    block: &mut BlockBuilder,
    block_size: usize,
) {
    if block.is_empty() {
        return;
    }
    let last_key = block.last_key().to_vec();
    let old = std::mem::replace(block, BlockBuilder::new(block_size));
    let data = old.build();

    index_entries.push(IndexEntry {
        last_key,
        offset: image.len() as u64,
        size: data.len() as u64,
    });
    image.extend_from_slice(&data);
}
