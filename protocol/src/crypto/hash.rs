//! # Hashing Utilities
//!
//! SHA-256 is the only hash the gem bank uses. Derived addresses are defined
//! as SHA-256 over the seed list, and every client and validator has to land
//! on the same 32 bytes, so there is no room for a second function here.

use sha2::{Digest, Sha256};

/// SHA-256 over several byte slices as if they were concatenated.
///
/// Feeding the parts sequentially avoids building a temporary buffer. This is
/// the primitive behind address derivation: `hashv(&[seed_0, .., nonce,
/// program_id, marker])`.
///
/// # Example
///
/// ```
/// use gem_bank::crypto::hash::hashv;
///
/// let hash = hashv(&[&b"gem"[..], &b" bank"[..]]);
/// assert_eq!(hash, hashv(&[&b"gem bank"[..]]));
/// ```
pub fn hashv(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    output
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        // SHA-256("abc") from FIPS 180-2.
        assert_eq!(
            hex::encode(hashv(&[&b"abc"[..]])),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn empty_input() {
        let expected = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
        assert_eq!(hex::encode(hashv(&[])), expected);
        assert_eq!(hex::encode(hashv(&[&b""[..]])), expected);
    }

    #[test]
    fn parts_hash_as_concatenation() {
        let joined = hashv(&[&b"gem_boxvaultmint"[..]]);
        let parts = hashv(&[&b"gem_box"[..], &b"vault"[..], &b"mint"[..]]);
        assert_eq!(joined, parts);
    }
}
