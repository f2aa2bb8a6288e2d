//! Content digests for artifact bookkeeping
//!
//! [`ContentHash`] is not used for addressing; storage keys come from
//! [`crate::generate_key`]. The digest only ties log lines for the same
//! buffer together across upload, enhancement and rollback.

use std::fmt::{self, Display, Formatter};

/// A 32-byte Blake3 digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Compute Blake3 hash of arbitrary data
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Get reference to the underlying bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_bytes_same_digest() {
        assert_eq!(ContentHash::compute(b"front"), ContentHash::compute(b"front"));
        assert_ne!(ContentHash::compute(b"front"), ContentHash::compute(b"back"));
    }

    #[test]
    fn short_is_prefix_of_full() {
        let hash = ContentHash::compute(b"garment");
        let short = hash.short();
        assert_eq!(short.len(), 16);
        assert!(hash.to_string().starts_with(&short));
    }
}
