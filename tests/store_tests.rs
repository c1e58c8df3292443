// Record store query tests
// exists / find / keys_starting_with / records over in-memory stores.

use record_trie::trie::MAX_KEY_LEN;
use record_trie::{Error, Options, Record, RecordTrie};

fn sorted(mut items: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
    items.sort();
    items
}

fn bytes(items: &[&str]) -> Vec<Vec<u8>> {
    items.iter().map(|s| s.as_bytes().to_vec()).collect()
}

// =============================================================================
// Test 1: find returns every value of a key, ascending
// =============================================================================
#[test]
fn find_scenario() {
    let store = RecordTrie::new([("foo", "bar"), ("abc", "def"), ("foo", "baz")]).unwrap();

    assert_eq!(store.find(b"foo"), bytes(&["bar", "baz"]));
    assert_eq!(store.find(b"abc"), bytes(&["def"]));
    assert!(store.find(b"def").is_empty());
}

// =============================================================================
// Test 2: find orders values by bytes regardless of input order
// =============================================================================
#[test]
fn find_orders_values() {
    let store = RecordTrie::new([
        ("fruits", "pear"),
        ("fruits", "apple"),
        ("fruits", "peach"),
        ("foods", "pie"),
    ])
    .unwrap();

    assert_eq!(store.find(b"fruits"), bytes(&["apple", "peach", "pear"]));
}

// =============================================================================
// Test 3: keys_starting_with returns one key per matching record
// =============================================================================
#[test]
fn keys_starting_with_scenario() {
    let store = RecordTrie::new([
        ("foo", "bar"),
        ("abc", "def"),
        ("a", "apple"),
        ("ac", "acorn"),
        ("foo", "baz"),
    ])
    .unwrap();

    assert_eq!(
        sorted(store.keys_starting_with(b"a")),
        bytes(&["a", "abc", "ac"])
    );
    assert_eq!(store.keys_starting_with(b"ab"), bytes(&["abc"]));
    assert!(store.keys_starting_with(b"def").is_empty());
    assert_eq!(store.keys_starting_with(b"foo"), bytes(&["foo", "foo"]));
}

// =============================================================================
// Test 4: keys_starting_with follows composite order
// =============================================================================
#[test]
fn keys_starting_with_order() {
    let store = RecordTrie::new([("a", "apple"), ("abc", "def"), ("ac", "acorn")]).unwrap();

    // The end of a key compares as 0xFF, so longer keys sort first.
    assert_eq!(store.keys_starting_with(b"a"), bytes(&["abc", "ac", "a"]));
}

// =============================================================================
// Test 5: exists pins the key boundary
// =============================================================================
#[test]
fn exists_requires_exact_key() {
    let store = RecordTrie::new([("foobar", "1"), ("fo", "2")]).unwrap();

    assert!(store.exists(b"foobar"));
    assert!(store.exists(b"fo"));
    assert!(!store.exists(b"foo"));
    assert!(!store.exists(b"f"));
    assert!(!store.exists(b"foobarbaz"));
    assert!(store.find(b"foo").is_empty());
}

// =============================================================================
// Test 6: empty store answers everything with nothing
// =============================================================================
#[test]
fn empty_store() {
    let store = RecordTrie::new(Vec::<Record>::new()).unwrap();

    assert!(store.is_empty());
    assert_eq!(store.len(), 0);
    assert!(!store.exists(b""));
    assert!(!store.exists(b"anything"));
    assert!(store.find(b"anything").is_empty());
    assert!(store.keys_starting_with(b"").is_empty());
    assert!(store.records().is_empty());
}

// =============================================================================
// Test 7: sentinel in a key fails the build
// =============================================================================
#[test]
fn sentinel_key_is_validation_error() {
    let records = vec![
        Record::new("fine", "v"),
        Record::new(b"bad\xFFkey".to_vec(), "v"),
    ];

    match RecordTrie::new(records) {
        Err(Error::InvalidKey { position }) => assert_eq!(position, 3),
        other => panic!("expected InvalidKey, got {other:?}"),
    }
}

// =============================================================================
// Test 8: values may contain the sentinel
// =============================================================================
#[test]
fn sentinel_in_value_roundtrips() {
    let store = RecordTrie::new([
        Record::new("k", b"\xFF".to_vec()),
        Record::new("k", b"a\xFFb\xFF".to_vec()),
        Record::new("k2", b"".to_vec()),
    ])
    .unwrap();

    assert_eq!(
        store.find(b"k"),
        vec![b"a\xFFb\xFF".to_vec(), b"\xFF".to_vec()]
    );
    assert_eq!(store.find(b"k2"), vec![Vec::<u8>::new()]);
    assert!(store.exists(b"k2"));
}

// =============================================================================
// Test 9: records returns everything in composite order
// =============================================================================
#[test]
fn records_enumerates_all() {
    let input = vec![
        Record::new("foo", "bar"),
        Record::new("abc", "def"),
        Record::new("a", "apple"),
        Record::new("ac", "acorn"),
        Record::new("foo", "baz"),
    ];
    let store = RecordTrie::new(input.clone()).unwrap();

    let mut expected = input;
    expected.sort();
    assert_eq!(store.records(), expected);
    assert_eq!(store.len(), 5);
}

// =============================================================================
// Test 10: duplicates kept by default, collapsed with dedup
// =============================================================================
#[test]
fn duplicate_records_policy() {
    let input = [("k", "v"), ("k", "v"), ("k", "w")];

    let kept = RecordTrie::new(input).unwrap();
    assert_eq!(kept.find(b"k"), bytes(&["v", "v", "w"]));
    assert_eq!(kept.keys_starting_with(b"k").len(), 3);
    assert_eq!(kept.len(), 3);

    let options = Options {
        dedup: true,
        ..Options::default()
    };
    let deduped = RecordTrie::with_options(input, &options).unwrap();
    assert_eq!(deduped.find(b"k"), bytes(&["v", "w"]));
    assert_eq!(deduped.len(), 2);
}

// =============================================================================
// Test 11: empty key and empty value are ordinary data
// =============================================================================
#[test]
fn empty_key_is_a_key() {
    let store = RecordTrie::new([("", "root"), ("a", "")]).unwrap();

    assert!(store.exists(b""));
    assert_eq!(store.find(b""), bytes(&["root"]));
    assert_eq!(store.find(b"a"), bytes(&[""]));
    assert_eq!(sorted(store.keys_starting_with(b"")), bytes(&["", "a"]));
}

// =============================================================================
// Test 12: lazy iterators stop early and restart fresh
// =============================================================================
#[test]
fn lazy_iteration() {
    let store = RecordTrie::new((0..100).map(|i| (format!("key_{i:03}"), "v"))).unwrap();

    let first_two: Vec<_> = store.iter_prefix(b"key_05").take(2).collect();
    assert_eq!(first_two[0].0, b"key_050");
    assert_eq!(first_two[1].0, b"key_051");

    // A fresh call starts over.
    assert_eq!(store.iter_prefix(b"key_05").count(), 10);
    assert_eq!(store.iter().count(), 100);
    assert_eq!(store.values(b"key_042").collect::<Vec<_>>(), bytes(&["v"]));
}

// =============================================================================
// Test 13: small blocks give the same answers as large ones
// =============================================================================
#[test]
fn block_size_does_not_change_results() {
    let records: Vec<Record> = (0..500)
        .map(|i| Record::new(format!("k{}", i % 37), format!("value_{i:04}")))
        .collect();

    let big = RecordTrie::new(records.clone()).unwrap();
    let tiny = RecordTrie::with_options(
        records,
        &Options {
            block_size: 16,
            ..Options::default()
        },
    )
    .unwrap();

    assert_eq!(big.records(), tiny.records());
    for i in 0..40 {
        let key = format!("k{i}");
        assert_eq!(big.find(key.as_bytes()), tiny.find(key.as_bytes()));
        assert_eq!(
            big.keys_starting_with(key.as_bytes()),
            tiny.keys_starting_with(key.as_bytes())
        );
    }
}

// =============================================================================
// Test 14: oversized records are rejected by the trie builder
// =============================================================================
#[test]
fn oversized_record_is_build_error() {
    let huge_value = vec![b'v'; 70_000];
    let err = RecordTrie::new([Record::new("k", huge_value)]).unwrap_err();
    assert!(matches!(err, Error::Build(_)));
}

// =============================================================================
// Test 15: the largest record that fits is accepted, one more byte is not
// =============================================================================
#[test]
fn record_size_limit_boundary() {
    // key (1) + sentinel (1) + value == MAX_KEY_LEN
    let largest = vec![b'v'; MAX_KEY_LEN - 2];
    let store = RecordTrie::new([Record::new("k", largest.clone())]).unwrap();
    assert_eq!(store.find(b"k"), vec![largest]);

    let too_big = vec![b'v'; MAX_KEY_LEN - 1];
    let err = RecordTrie::new([Record::new("k", too_big)]).unwrap_err();
    assert!(matches!(err, Error::Build(_)));
}
