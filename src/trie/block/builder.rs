/// Accumulates sorted keys and serializes them into a prefix-compressed block.
///
/// Each key stores only the bytes it does not share with the previous key
/// in the same block (front coding). Composite keys of one record key share
/// the whole key and sentinel, so a block of values for a hot key collapses
/// to little more than the values themselves.
///
/// On-disk layout of a block:
/// ```text
/// ┌──────────────────────────────────────────────────┐
/// │ Entry 0: [shared(2B)][unshared(2B)][suffix]       │
/// │ Entry 1: ...                                      │
/// │ Entry N: ...                                      │
/// ├──────────────────────────────────────────────────┤
/// │ Num entries (2B)                                  │
/// └──────────────────────────────────────────────────┘
/// ```
///
/// The first entry of every block has shared = 0, so a block decodes
/// without looking at its neighbours.
pub struct BlockBuilder {
    data: Vec<u8>,
    last_key: Vec<u8>,
    num_entries: u16,
    block_size: usize,
}

/// Per-entry header: shared + unshared lengths.
pub const ENTRY_HEADER_SIZE: usize = 4;

impl BlockBuilder {
    /// Create a new block builder with target block size.
    pub fn new(block_size: usize) -> Self {
        BlockBuilder {
            data: Vec::new(),
            last_key: Vec::new(),
            num_entries: 0,
            block_size,
        }
    }

    /// Add a key to the block.
    /// Returns false if the block is full (entry doesn't fit).
    /// First entry is always accepted even if it exceeds block_size.
    /// Keys MUST be added in sorted order and be at most u16::MAX bytes.
    pub fn add(&mut self, key: &[u8]) -> bool {
        let shared = if self.is_empty() {
            0
        } else {
            common_prefix_len(&self.last_key, key)
        };
        let unshared = key.len() - shared;
        let entry_size = ENTRY_HEADER_SIZE + unshared;

        if !self.is_empty()
            && (self.num_entries == u16::MAX
                || self.estimated_size() + entry_size > self.block_size)
        {
            return false;
        }

        self.data.extend_from_slice(&(shared as u16).to_le_bytes());
        self.data.extend_from_slice(&(unshared as u16).to_le_bytes());
        self.data.extend_from_slice(&key[shared..]);

        self.last_key.truncate(shared);
        self.last_key.extend_from_slice(&key[shared..]);
        self.num_entries += 1;

        true
    }

    /// Finalize the block: append entry count.
    pub fn build(self) -> Vec<u8> {
        let mut block = self.data;
        block.extend_from_slice(&self.num_entries.to_le_bytes());
        block
    }

    /// Last key added, i.e. the largest key in the block.
    pub fn last_key(&self) -> &[u8] {
        &self.last_key
    }

    /// Current estimated size of the block (entries + count).
    pub fn estimated_size(&self) -> usize {
        self.data.len() + 2
    }

    /// Whether the block is empty (no entries added).
    pub fn is_empty(&self) -> bool {
        self.num_entries == 0
    }
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    let max = a.len().min(b.len()).min(u16::MAX as usize);
    a.iter().zip(b).take(max).take_while(|(x, y)| x == y).count()
}
