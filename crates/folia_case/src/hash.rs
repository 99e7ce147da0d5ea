//! Fast hashing utilities using xxHash3.
//!
//! Provides content hashing for change detection and the stable ordering
//! keys behind shuffled collection sorts.

use xxhash_rust::xxh3::xxh3_64;

/// Compute a 64-bit hash of the given bytes using xxHash3.
#[inline]
pub fn hash_bytes(data: &[u8]) -> u64 {
    xxh3_64(data)
}

/// Compute a 64-bit hash of the given string using xxHash3.
#[inline]
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}

/// Convert a hash to a hex string (16 characters).
#[inline]
pub fn hash_to_hex(hash: u64) -> String {
    format!("{:016x}", hash)
}

/// Compute hash of a string and return as hex.
#[inline]
pub fn content_hash(content: &str) -> String {
    hash_to_hex(hash_str(content))
}

/// Stable ordering key for a `(seed, id)` pair.
///
/// Shuffled sorts order items by this key instead of an RNG draw, so the
/// same input tree always resolves to the same item order.
#[inline]
pub fn ordering_key(seed: &str, id: &str) -> u64 {
    let mut buf = Vec::with_capacity(seed.len() + id.len() + 1);
    buf.extend_from_slice(seed.as_bytes());
    buf.push(0);
    buf.extend_from_slice(id.as_bytes());
    xxh3_64(&buf)
}
