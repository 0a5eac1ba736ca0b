//! # Authorities & Signers
//!
//! Two kinds of identity can move tokens or change records:
//!
//! - a **user**, proven by an Ed25519 signature over the transaction, and
//! - the **protocol** acting as a derived address, proven by re-deriving
//!   that address from its seeds.
//!
//! [`Authority`] makes that distinction a type instead of an address-space
//! convention. A derived address can never appear in a [`SignerSet`]
//! because nobody can produce a signature for an off-curve key.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::crypto::keys::Pubkey;
use crate::crypto::pda::DerivationProof;
use crate::error::{BankError, BankResult};

/// Who is acting on an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Authority {
    /// A key that signed the transaction.
    User(Pubkey),

    /// The protocol acting as a derived address.
    Protocol(DerivationProof),
}

impl Authority {
    /// The address this authority acts as.
    pub fn address(&self) -> Pubkey {
        match self {
            Authority::User(key) => *key,
            Authority::Protocol(proof) => proof.address(),
        }
    }

    /// Check that this authority may act for an account owned by `owner`.
    ///
    /// A user must own the account and have signed. A protocol authority
    /// must be derived under `program_id` and must re-derive to `owner`.
    pub fn authorize(
        &self,
        owner: &Pubkey,
        signers: &SignerSet,
        program_id: &Pubkey,
    ) -> BankResult<()> {
        let ok = match self {
            Authority::User(key) => key == owner && signers.contains(key),
            Authority::Protocol(proof) => {
                proof.program_id() == *program_id && proof.address() == *owner && proof.verify()
            }
        };
        if !ok {
            return Err(BankError::Unauthorized {
                role: "token owner",
                expected: *owner,
            });
        }
        Ok(())
    }
}

/// Keys whose signatures were verified for the current transaction.
///
/// A set produced by [`crate::instruction::Transaction::verify`] also
/// carries the transaction nonce. The processor consumes it for every
/// signer in the same commit as the operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignerSet {
    keys: BTreeSet<Pubkey>,
    nonce: Option<u64>,
}

impl SignerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trust `keys` as signers without checking signatures.
    ///
    /// For callers that authenticate out of band, and for tests. Signed
    /// transactions build their set through
    /// [`crate::instruction::Transaction::verify`].
    pub fn from_keys<I: IntoIterator<Item = Pubkey>>(keys: I) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            nonce: None,
        }
    }

    /// Attach the nonce the signers signed over.
    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn nonce(&self) -> Option<u64> {
        self.nonce
    }

    pub fn insert(&mut self, key: Pubkey) {
        self.keys.insert(key);
    }

    pub fn contains(&self, key: &Pubkey) -> bool {
        self.keys.contains(key)
    }

    /// Fail with [`BankError::Unauthorized`] unless `key` signed.
    pub fn require(&self, role: &'static str, key: &Pubkey) -> BankResult<()> {
        if !self.contains(key) {
            return Err(BankError::Unauthorized {
                role,
                expected: *key,
            });
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pubkey> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
