use tracing::warn;

use crate::error::Result;
use crate::trie::block::{Block, BlockIter};
use crate::trie::footer::IndexEntry;

/// Lazy iterator over the stored keys that start with a prefix.
///
/// Yields keys in ascending byte order, decoding one block at a time.
/// Finite and not restartable: call [`crate::trie::KeyTrie::predictive`]
/// again to start over. Dropping it early is the "stop" signal.
///
/// Stops at the first key past the prefix range. A malformed block ends
/// iteration with a warning; it can only be reached when a trie was
/// loaded with checksum verification turned off.
pub struct PrefixIter<'a> {
    data: &'a [u8],
    index: &'a [IndexEntry],
    /// Next block to open once `current` is exhausted.
    next_block: usize,
    current: Option<BlockIter<'a>>,
    prefix: Vec<u8>,
    done: bool,
}

impl<'a> PrefixIter<'a> {
    pub(crate) fn new(
        data: &'a [u8],
        index: &'a [IndexEntry],
        start_block: usize,
        prefix: Vec<u8>,
    ) -> Self {
        PrefixIter {
            data,
            index,
            next_block: start_block,
            current: None,
            prefix,
            done: false,
        }
    }

    /// The prefix this iterator matches against.
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Step to the next key in the scan, opening blocks as needed.
    /// Ok(false) means the image is exhausted.
    fn step(&mut self) -> Result<bool> {
        loop {
            if let Some(iter) = self.current.as_mut() {
                if iter.advance()? {
                    return Ok(true);
                }
            }

            let Some(entry) = self.index.get(self.next_block) else {
                return Ok(false);
            };
            // Block bounds were validated when the trie was opened.
            let data = self.data;
            let start = entry.offset as usize;
            let block = Block::decode(&data[start..start + entry.size as usize])?;
            self.current = Some(block.iter());
            self.next_block += 1;
        }
    }
}

impl Iterator for PrefixIter<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.step() {
                Ok(true) => {
                    let Some(iter) = self.current.as_ref() else {
                        self.done = true;
                        break;
                    };
                    let key = iter.key();
                    if key.starts_with(&self.prefix) {
                        return Some(key.to_vec());
                    }
                    // Sorted keys: anything greater than the prefix that
                    // does not start with it is past the match range.
                    if key > self.prefix.as_slice() {
                        self.done = true;
                    }
                }
                Ok(false) => self.done = true,
                Err(e) => {
                    warn!(
                        block = self.next_block.saturating_sub(1),
                        error = %e,
                        "stopping prefix scan on malformed block"
                    );
                    self.done = true;
                }
            }
        }
        None
    }
}

impl std::iter::FusedIterator for PrefixIter<'_> {}
