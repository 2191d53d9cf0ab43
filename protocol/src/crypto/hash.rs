//! # Hashing Utilities
//!
//! SHA-256 is the only hash function Coffer uses. Addresses, derived
//! account keys and the default program id are all SHA-256 digests, which
//! keeps the derivation scheme compatible with the SVM-style
//! program-derived-address convention that wallets already understand.
//!
//! Two entry points exist: [`sha256`] for a single buffer and [`hashv`]
//! for a sequence of buffers hashed as if concatenated. The latter is what
//! address derivation uses, because seeds arrive as separate slices and
//! copying them into one buffer first would be pointless work.

use sha2::{Digest, Sha256};

/// Output length of every digest produced by this module.
pub const HASH_LENGTH: usize = 32;

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use coffer_protocol::crypto::sha256;
///
/// let hash = sha256(b"coffer");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; HASH_LENGTH] {
    hashv(&[data])
}

/// Hash several byte slices as one contiguous message.
///
/// `hashv(&[a, b])` equals `sha256(a ++ b)`. Slice boundaries are not
/// encoded, so callers that need domain separation must add it themselves
/// (address derivation appends a fixed marker for exactly this reason).
pub fn hashv(parts: &[&[u8]]) -> [u8; HASH_LENGTH] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; HASH_LENGTH];
    output.copy_from_slice(&result);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        // SHA-256("abc") from FIPS 180-2, appendix B.1.
        let digest = sha256(b"abc");
        assert_eq!(
            digest[..4],
            [0xba, 0x78, 0x16, 0xbf],
            "leading bytes of the FIPS test vector"
        );
        assert_eq!(digest[28..], [0xf2, 0x00, 0x15, 0xad]);
    }

    #[test]
    fn hashv_matches_concatenation() {
        let joined = sha256(b"vaultowner");
        let split = hashv(&[b"vault", b"owner"]);
        assert_eq!(joined, split);
    }

    #[test]
    fn hashv_of_nothing_is_empty_digest() {
        assert_eq!(hashv(&[]), sha256(b""));
    }

    #[test]
    fn different_inputs_different_digests() {
        assert_ne!(sha256(b"vault"), sha256(b"Vault"));
    }
}
