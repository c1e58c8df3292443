use crate::error::{Error, Result};
use crate::trie::block::builder::ENTRY_HEADER_SIZE;

/// A decoded view over one prefix-compressed block.
/// Borrows the image bytes; nothing is copied until keys are rebuilt.
pub struct Block<'a> {
    entries: &'a [u8],
    num_entries: u16,
}

impl<'a> Block<'a> {
    /// Decode a block from its raw bytes (entries + 2-byte count).
    pub fn decode(data: &'a [u8]) -> Result<Self> {
        if data.len() < 2 {
            return Err(Error::Corruption("block too short".into()));
        }
        let split = data.len() - 2;
        let num_entries = u16::from_le_bytes([data[split], data[split + 1]]);
        if num_entries == 0 {
            return Err(Error::Corruption("empty block".into()));
        }
        Ok(Block {
            entries: &data[..split],
            num_entries,
        })
    }

    /// Number of keys in this block.
    pub fn len(&self) -> usize {
        self.num_entries as usize
    }

    pub fn is_empty(&self) -> bool {
        self.num_entries == 0
    }

    /// Create a cursor positioned before the first key.
    pub fn iter(&self) -> BlockIter<'a> {
        BlockIter {
            entries: self.entries,
            offset: 0,
            remaining: self.num_entries,
            key: Vec::new(),
        }
    }
}

/// Cursor over the keys of one block, rebuilding each full key
/// from the previous one.
pub struct BlockIter<'a> {
    entries: &'a [u8],
    offset: usize,
    remaining: u16,
    key: Vec<u8>,
}

impl BlockIter<'_> {
    /// Move to the next key. Returns Ok(false) once the block is exhausted.
    /// Malformed entries surface as corruption instead of panicking.
    pub fn advance(&mut self) -> Result<bool> {
        if self.remaining == 0 {
            if self.offset != self.entries.len() {
                return Err(Error::Corruption("trailing bytes after last entry".into()));
            }
            return Ok(false);
        }

        let header = self
            .entries
            .get(self.offset..self.offset + ENTRY_HEADER_SIZE)
            .ok_or_else(|| Error::Corruption("entry header truncated".into()))?;
        let shared = u16::from_le_bytes([header[0], header[1]]) as usize;
        let unshared = u16::from_le_bytes([header[2], header[3]]) as usize;

        if shared > self.key.len() {
            return Err(Error::Corruption(format!(
                "entry shares {shared} bytes with a {}-byte predecessor",
                self.key.len()
            )));
        }

        let start = self.offset + ENTRY_HEADER_SIZE;
        let suffix = self
            .entries
            .get(start..start + unshared)
            .ok_or_else(|| Error::Corruption("entry suffix truncated".into()))?;

        self.key.truncate(shared);
        self.key.extend_from_slice(suffix);
        self.offset = start + unshared;
        self.remaining -= 1;
        Ok(true)
    }

    /// Current key. Only meaningful after advance() returned Ok(true).
    pub fn key(&self) -> &[u8] {
        &self.key
    }
}
