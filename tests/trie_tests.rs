// Trie engine tests
// Build, prefix search and persistence of the raw sorted key set,
// independent of the record encoding on top.

use record_trie::trie::{KeyTrie, TrieBuilder};
use record_trie::Options;
use tempfile::tempdir;

fn build(keys: impl IntoIterator<Item = Vec<u8>>, block_size: usize) -> KeyTrie {
    let options = Options {
        block_size,
        ..Options::default()
    };
    let mut builder = TrieBuilder::new(&options);
    for key in keys {
        builder.push(key).unwrap();
    }
    builder.finish().unwrap()
}

// =============================================================================
// Test 1: 1000 keys in, 1000 keys out, sorted
// =============================================================================
#[test]
fn iterate_1000_keys() {
    let keys: Vec<Vec<u8>> = (0..1000u32)
        .rev()
        .map(|i| format!("key_{i:05}").into_bytes())
        .collect();
    let trie = build(keys.clone(), 256);

    let mut expected = keys;
    expected.sort();
    assert_eq!(trie.iter().collect::<Vec<_>>(), expected);
    assert_eq!(trie.len(), 1000);
}

// =============================================================================
// Test 2: predictive search at block boundaries
// =============================================================================
#[test]
fn predictive_at_every_prefix_length() {
    let keys: Vec<Vec<u8>> = (0..1000u32)
        .map(|i| format!("key_{i:05}").into_bytes())
        .collect();
    // Tiny blocks so nearly every prefix range crosses a boundary.
    let trie = build(keys.clone(), 24);

    for prefix in ["", "k", "key_", "key_00", "key_005", "key_0099", "key_00999", "key_01"] {
        let expected: Vec<Vec<u8>> = keys
            .iter()
            .filter(|k| k.starts_with(prefix.as_bytes()))
            .cloned()
            .collect();
        let actual: Vec<Vec<u8>> = trie.predictive(prefix.as_bytes()).collect();
        assert_eq!(actual, expected, "prefix {prefix:?}");
    }
}

// =============================================================================
// Test 3: prefix that is itself a stored key
// =============================================================================
#[test]
fn prefix_equal_to_stored_key() {
    let trie = build(
        [b"app".to_vec(), b"apple".to_vec(), b"apply".to_vec(), b"apq".to_vec()],
        4096,
    );
    let hits: Vec<Vec<u8>> = trie.predictive(b"app").collect();
    assert_eq!(hits, vec![b"app".to_vec(), b"apple".to_vec(), b"apply".to_vec()]);
}

// =============================================================================
// Test 4: stopping early leaves the trie usable
// =============================================================================
#[test]
fn early_stop() {
    let trie = build((0..100u8).map(|i| vec![b'a', i]), 64);
    assert_eq!(trie.predictive(b"a").take(3).count(), 3);
    assert_eq!(trie.predictive(b"a").count(), 100);
}

// =============================================================================
// Test 5: mapped copy answers like the built one
// =============================================================================
#[test]
fn mapped_matches_built() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keys.trie");
    let trie = build((0..500u32).map(|i| format!("{i}").into_bytes()), 128);
    trie.save(&path).unwrap();

    let mapped = KeyTrie::open(&path, true).unwrap();
    assert_eq!(mapped.size_bytes(), trie.size_bytes());
    for prefix in ["1", "12", "499", "5", "6"] {
        assert!(
            mapped.predictive(prefix.as_bytes()).eq(trie.predictive(prefix.as_bytes())),
            "prefix {prefix}"
        );
    }
}
