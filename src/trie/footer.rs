use crate::error::{Error, Result};

/// Magic number identifying a persisted trie image ("RECTRIE\0").
pub const TRIE_MAGIC: u64 = u64::from_le_bytes(*b"RECTRIE\0");

/// On-disk format version. Bumped on any incompatible layout change.
pub const FORMAT_VERSION: u32 = 1;

/// An entry in the trie's index block.
/// Maps a block's last key to its location in the image.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    /// Last (largest) key in the block.
    pub last_key: Vec<u8>,
    /// Byte offset of the block in the image.
    pub offset: u64,
    /// Size of the block in bytes.
    pub size: u64,
}

impl IndexEntry {
    /// Encoded form: [key_len(2B)][last_key][offset(8B)][size(8B)]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(&(self.last_key.len() as u16).to_le_bytes());
        buf.extend_from_slice(&self.last_key);
        buf.extend_from_slice(&self.offset.to_le_bytes());
        buf.extend_from_slice(&self.size.to_le_bytes());
        buf
    }

    /// Decode the entry at the head of `data`, returning it with the
    /// number of bytes it occupied.
    pub fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let truncated = || Error::Corruption("index entry truncated".into());

        let key_len = data
            .get(..2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]) as usize)
            .ok_or_else(truncated)?;
        let body = data.get(2..2 + key_len + 16).ok_or_else(truncated)?;
        let (last_key, tail) = body.split_at(key_len);

        let entry = IndexEntry {
            last_key: last_key.to_vec(),
            offset: u64::from_le_bytes(tail[..8].try_into().unwrap()),
            size: u64::from_le_bytes(tail[8..].try_into().unwrap()),
        };
        let consumed = entry.encoded_len();
        Ok((entry, consumed))
    }

    fn encoded_len(&self) -> usize {
        2 + self.last_key.len() + 16
    }
}

/// The footer sits at the end of every trie image.
/// It tells the reader where to find the index and meta blocks.
///
/// ```text
/// ┌──────────────────────────────────────┐
/// │ Index block offset (8B)              │
/// │ Index block size (8B)                │
/// │ Meta block offset (8B)               │
/// │ Meta block size (8B)                 │
/// │ Entry count (8B)                     │
/// │ CRC32 of bytes before footer (4B)    │
/// │ Format version (4B)                  │
/// │ Magic number (8B)                    │
/// └──────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footer {
    pub index_block_offset: u64,
    pub index_block_size: u64,
    pub meta_block_offset: u64,
    pub meta_block_size: u64,
    pub entry_count: u64,
    pub checksum: u32,
    pub version: u32,
}

impl Footer {
    /// Size of the footer in bytes (fixed).
    pub const SIZE: usize = 8 * 5 + 4 + 4 + 8; // 56 bytes

    /// Encode footer to bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.extend_from_slice(&self.index_block_offset.to_le_bytes());
        buf.extend_from_slice(&self.index_block_size.to_le_bytes());
        buf.extend_from_slice(&self.meta_block_offset.to_le_bytes());
        buf.extend_from_slice(&self.meta_block_size.to_le_bytes());
        buf.extend_from_slice(&self.entry_count.to_le_bytes());
        buf.extend_from_slice(&self.checksum.to_le_bytes());
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&TRIE_MAGIC.to_le_bytes());
        buf
    }

    /// Decode footer from bytes. Checks magic and version only;
    /// offsets are validated against the image by the caller.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::Corruption("footer too short".into()));
        }
        let u64_at = |at: usize| u64::from_le_bytes(data[at..at + 8].try_into().unwrap());
        let u32_at = |at: usize| u32::from_le_bytes(data[at..at + 4].try_into().unwrap());

        let magic = u64_at(48);
        if magic != TRIE_MAGIC {
            return Err(Error::Corruption(format!(
                "bad magic: expected {:#x}, got {:#x}",
                TRIE_MAGIC, magic
            )));
        }

        let version = u32_at(44);
        if version != FORMAT_VERSION {
            return Err(Error::Corruption(format!(
                "unsupported format version {version}"
            )));
        }

        Ok(Footer {
            index_block_offset: u64_at(0),
            index_block_size: u64_at(8),
            meta_block_offset: u64_at(16),
            meta_block_size: u64_at(24),
            entry_count: u64_at(32),
            checksum: u32_at(40),
            version,
        })
    }
}
