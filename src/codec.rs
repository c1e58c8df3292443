use crate::error::{Error, Result};

/// Byte separating the key from the value inside a composite key.
///
/// 0xFF never occurs in well-formed UTF-8, so text keys are always valid.
/// Keys are raw bytes though, so every key is checked with [`validate_key`].
pub const SENTINEL: u8 = 0xFF;

/// Reject keys containing the sentinel byte.
pub fn validate_key(key: &[u8]) -> Result<()> {
    match key.iter().position(|&b| b == SENTINEL) {
        Some(position) => Err(Error::InvalidKey { position }),
        None => Ok(()),
    }
}

/// Encode a (key, value) pair into one composite key.
///
/// Layout:
/// ```text
/// ┌────────────┬───────────┬──────────────┐
/// │ key (var)  │ 0xFF (1B) │ value (var)  │
/// └────────────┴───────────┴──────────────┘
/// ```
///
/// Byte-wise order of composite keys groups every value of a key
/// together, sub-ordered by value.
pub fn encode(key: &[u8], value: &[u8]) -> Result<Vec<u8>> {
    validate_key(key)?;
    let mut buf = Vec::with_capacity(key.len() + 1 + value.len());
    buf.extend_from_slice(key);
    buf.push(SENTINEL);
    buf.extend_from_slice(value);
    Ok(buf)
}

/// Search prefix matching exactly the entries of `key`.
///
/// The trailing sentinel pins the match to the key boundary, so `"foo"`
/// never matches entries of `"foobar"`.
pub fn key_prefix(key: &[u8]) -> Result<Vec<u8>> {
    encode(key, &[])
}

/// Split a composite key at the FIRST sentinel.
///
/// Without a sentinel the whole input is the key and the value is empty.
/// Sentinels after the first belong to the value verbatim.
pub fn decode(composite: &[u8]) -> (&[u8], &[u8]) {
    match composite.iter().position(|&b| b == SENTINEL) {
        Some(pos) => (&composite[..pos], &composite[pos + 1..]),
        None => (composite, &[][..]),
    }
}
