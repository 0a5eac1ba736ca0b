//! # Cryptographic Primitives
//!
//! Everything the gem bank needs from cryptography, and nothing more:
//!
//! - **SHA-256** for derived addresses.
//! - **Ed25519** for user signatures on transactions.
//! - **Curve membership** (via curve25519-dalek) to prove a derived address
//!   has no private key.
//!
//! All of it is a thin wrapper over audited crates.

pub mod hash;
pub mod keys;
pub mod pda;

pub use hash::hashv;
pub use keys::{KeyError, Keypair, Pubkey, Signature};
pub use pda::{
    create_program_address, find_program_address, DerivationError, DerivationProof,
    DerivedAddressResolver,
};
