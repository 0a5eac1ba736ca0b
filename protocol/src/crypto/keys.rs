//! # Key Management
//!
//! Addresses and Ed25519 keypairs for gem bank participants.
//!
//! A [`Pubkey`] is any 32-byte address: a user's Ed25519 verifying key, a
//! bank account, a mint, or a derived (off-curve) address. Only the on-curve
//! ones have a private key somewhere; derived addresses are authorised by
//! re-derivation instead (see [`super::pda`]).
//!
//! Key bytes are never logged. The `Debug` impl on [`Keypair`] prints the
//! public half only.

use std::fmt;
use std::str::FromStr;

use curve25519_dalek::edwards::CompressedEdwardsY;
use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during key and address parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid base58 address: {0}")]
    InvalidBase58(String),

    #[error("invalid address length: expected 32 bytes, got {0}")]
    InvalidLength(usize),

    #[error("invalid secret key bytes")]
    InvalidSecretKey,
}

// ---------------------------------------------------------------------------
// Pubkey
// ---------------------------------------------------------------------------

/// A 32-byte account address.
///
/// Displayed and parsed as base58, the format every wallet and explorer
/// uses for these addresses.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pubkey([u8; 32]);

impl Pubkey {
    /// Wrap raw bytes. `const` so program ids can live in `config`.
    pub const fn new_from_array(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Try to build an address from a byte slice of exactly 32 bytes.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; 32] = slice
            .try_into()
            .map_err(|_| KeyError::InvalidLength(slice.len()))?;
        Ok(Self(bytes))
    }

    /// A random address. Useful for mints and fixtures that never sign.
    pub fn new_unique() -> Self {
        Keypair::generate().pubkey()
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Raw bytes as an owned array.
    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }

    /// Returns `true` if the bytes decompress to an Ed25519 curve point.
    ///
    /// On-curve addresses may have a private key. Derived addresses must be
    /// off-curve so that nobody can ever sign for them.
    pub fn is_on_curve(&self) -> bool {
        CompressedEdwardsY(self.0).decompress().is_some()
    }

    /// Verify an Ed25519 signature against this address.
    ///
    /// Off-curve addresses never verify.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.0) else {
            return false;
        };
        let dalek_sig = DalekSignature::from_bytes(&signature.0);
        verifying_key.verify(message, &dalek_sig).is_ok()
    }

    /// Hex representation, used in storage keys during debugging.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for Pubkey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Pubkey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| KeyError::InvalidBase58(e.to_string()))?;
        Self::try_from_slice(&bytes)
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({})", self)
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; 64]);

impl Signature {
    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

// serde only derives fixed arrays up to 32 elements, so go through a slice.
impl Serialize for Signature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes: Vec<u8> = serde::Deserialize::deserialize(deserializer)?;
        let arr: [u8; 64] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| serde::de::Error::invalid_length(bytes.len(), &"64 bytes"))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = hex::encode(self.0);
        write!(f, "Signature({}...)", &hex_str[..16])
    }
}

// ---------------------------------------------------------------------------
// Keypair
// ---------------------------------------------------------------------------

/// An Ed25519 keypair for a user-controlled address.
///
/// Not `Serialize`. Secret bytes leave the process only through
/// [`Keypair::to_bytes`].
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Deterministic keypair from a 32-byte secret.
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(secret),
        }
    }

    /// Parse the 64-byte `secret ∥ public` layout used by keypair files.
    ///
    /// The public half is checked against the one recomputed from the
    /// secret.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; 64] = bytes.try_into().map_err(|_| KeyError::InvalidSecretKey)?;
        let signing_key =
            SigningKey::from_keypair_bytes(&arr).map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self { signing_key })
    }

    /// The 64-byte `secret ∥ public` layout.
    pub fn to_bytes(&self) -> [u8; 64] {
        self.signing_key.to_keypair_bytes()
    }

    /// The address this keypair signs for.
    pub fn pubkey(&self) -> Pubkey {
        Pubkey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }
}

impl Clone for Keypair {
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
        }
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair(pub={})", self.pubkey())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base58_roundtrip() {
        let key = Pubkey::new_unique();
        let parsed: Pubkey = key.to_string().parse().unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let short = bs58::encode([1u8; 16]).into_string();
        assert_eq!(
            short.parse::<Pubkey>().unwrap_err(),
            KeyError::InvalidLength(16)
        );
    }

    #[test]
    fn parse_rejects_bad_alphabet() {
        assert!(matches!(
            "0OIl".parse::<Pubkey>(),
            Err(KeyError::InvalidBase58(_))
        ));
    }

    #[test]
    fn keypair_pubkey_is_on_curve() {
        let kp = Keypair::generate();
        assert!(kp.pubkey().is_on_curve());
    }

    #[test]
    fn sign_and_verify() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"deposit 5");
        assert!(kp.pubkey().verify(b"deposit 5", &sig));
        assert!(!kp.pubkey().verify(b"deposit 6", &sig));
    }

    #[test]
    fn verify_with_other_key_fails() {
        let a = Keypair::generate();
        let b = Keypair::generate();
        let sig = a.sign(b"msg");
        assert!(!b.pubkey().verify(b"msg", &sig));
    }

    #[test]
    fn keypair_bytes_roundtrip() {
        let kp = Keypair::generate();
        let restored = Keypair::from_bytes(&kp.to_bytes()).unwrap();
        assert_eq!(restored.pubkey(), kp.pubkey());
    }

    #[test]
    fn keypair_bytes_reject_mismatched_public_half() {
        let a = Keypair::generate();
        let b = Keypair::generate();
        let mut bytes = a.to_bytes();
        bytes[32..].copy_from_slice(b.pubkey().as_bytes());
        assert!(Keypair::from_bytes(&bytes).is_err());
    }

    #[test]
    fn from_secret_is_deterministic() {
        let a = Keypair::from_secret_bytes(&[9u8; 32]);
        let b = Keypair::from_secret_bytes(&[9u8; 32]);
        assert_eq!(a.pubkey(), b.pubkey());
    }

    #[test]
    fn debug_hides_secret() {
        let kp = Keypair::from_secret_bytes(&[7u8; 32]);
        let dbg = format!("{kp:?}");
        assert!(dbg.starts_with("Keypair(pub="));
        assert!(!dbg.contains(&hex::encode([7u8; 32])));
    }

    #[test]
    fn signature_serde_roundtrip() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"x");
        let bytes = bincode::serialize(&sig).unwrap();
        let back: Signature = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, sig);
    }
}
