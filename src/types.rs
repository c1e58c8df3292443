use std::cmp::Ordering;

use crate::codec::SENTINEL;

/// Raw key bytes. Must not contain [`crate::codec::SENTINEL`].
pub type Key = Vec<u8>;

/// Raw value bytes. Unconstrained.
pub type Value = Vec<u8>;

/// A single (key, value) pair stored in a [`crate::RecordTrie`].
///
/// Ordering follows the encoded composite key `key ++ 0xFF ++ value`,
/// not plain tuple order: the end of a key compares as 0xFF, so `"ab"`
/// sorts before `"a"`. A sorted `Vec<Record>` therefore matches the
/// output of [`crate::RecordTrie::records`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    pub key: Key,
    pub value: Value,
}

impl Record {
    pub fn new(key: impl Into<Key>, value: impl Into<Value>) -> Self {
        Record {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl<K: Into<Key>, V: Into<Value>> From<(K, V)> for Record {
    fn from((key, value): (K, V)) -> Self {
        Record::new(key, value)
    }
}

impl From<Record> for (Key, Value) {
    fn from(record: Record) -> Self {
        (record.key, record.value)
    }
}

impl Ord for Record {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.key.iter().chain([&SENTINEL]).chain(self.value.iter());
        let rhs = other.key.iter().chain([&SENTINEL]).chain(other.value.iter());
        lhs.cmp(rhs)
    }
}

impl PartialOrd for Record {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longer_key_sorts_before_its_prefix() {
        let short = Record::new("a", "apple");
        let long = Record::new("ab", "zzz");
        assert!(long < short);
    }

    #[test]
    fn same_key_orders_by_value() {
        let mut records = vec![Record::new("foo", "baz"), Record::new("foo", "bar")];
        records.sort();
        assert_eq!(records[0].value, b"bar");
        assert_eq!(records[1].value, b"baz");
    }
}
