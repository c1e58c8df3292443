//! # Record Trie
//!
//! An immutable, multi-valued key-value store on top of a prefix-searchable
//! sorted key trie.
//!
//! ## Core idea
//! Each (key, value) record becomes one byte string `key ++ 0xFF ++ value`.
//! Byte-wise order of those strings groups all values of a key together,
//! so every query is a prefix scan: `key ++ 0xFF` for one key's values, a
//! bare prefix for key enumeration, the empty prefix for everything.
//! Keys may not contain 0xFF; values may contain anything.
//!
//! The store is built once, never mutated, and can be saved to a single
//! file and memory-mapped back for zero-copy startup.
//!
//! ```no_run
//! use record_trie::RecordTrie;
//!
//! let store = RecordTrie::new([("fruits", "apple"), ("fruits", "pear"), ("foods", "pie")])?;
//! assert_eq!(store.find(b"fruits"), vec![b"apple".to_vec(), b"pear".to_vec()]);
//! assert_eq!(store.keys_starting_with(b"f").len(), 3);
//!
//! store.save("fruits.trie")?;
//! let loaded = RecordTrie::load("fruits.trie")?;
//! assert!(loaded.exists(b"foods"));
//! # Ok::<(), record_trie::Error>(())
//! ```

pub mod bloom;
pub mod codec;
pub mod error;
pub mod options;
pub mod store;
pub mod trie;
pub mod types;

// Public re-exports for the top-level API
pub use codec::SENTINEL;
pub use error::{Error, Result};
pub use options::Options;
pub use store::{Matches, RecordTrie, Values};
pub use types::{Key, Record, Value};
