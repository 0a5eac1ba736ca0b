//! # Whitelist Proofs
//!
//! A [`WhitelistProof`] lives at `["whitelist", bank, address]` and admits
//! `address` into the bank's vaults as a creator, as a mint, or both. Its
//! existence is the only source of truth: no proof, no admission through
//! that path.

use serde::{Deserialize, Serialize};

use super::{IndexKind, Record, RecordKind};
use crate::crypto::keys::Pubkey;
use crate::error::{BankError, BankResult};

/// What a proof admits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistType {
    /// Admits any mint whose metadata lists this address as a verified
    /// creator.
    pub creator: bool,

    /// Admits this exact mint.
    pub mint: bool,
}

impl WhitelistType {
    pub const CREATOR_BIT: u8 = 1 << 0;
    pub const MINT_BIT: u8 = 1 << 1;

    pub fn creator() -> Self {
        Self {
            creator: true,
            mint: false,
        }
    }

    pub fn mint() -> Self {
        Self {
            creator: false,
            mint: true,
        }
    }

    pub fn both() -> Self {
        Self {
            creator: true,
            mint: true,
        }
    }

    pub fn is_empty(self) -> bool {
        !self.creator && !self.mint
    }

    pub fn to_bits(self) -> u8 {
        let mut bits = 0;
        if self.creator {
            bits |= Self::CREATOR_BIT;
        }
        if self.mint {
            bits |= Self::MINT_BIT;
        }
        bits
    }

    /// Rejects bits outside `CREATOR_BIT | MINT_BIT` and the empty set.
    pub fn from_bits(bits: u8) -> BankResult<Self> {
        if bits & !(Self::CREATOR_BIT | Self::MINT_BIT) != 0 {
            return Err(BankError::InvalidWhitelistType);
        }
        let ty = Self {
            creator: bits & Self::CREATOR_BIT != 0,
            mint: bits & Self::MINT_BIT != 0,
        };
        if ty.is_empty() {
            return Err(BankError::InvalidWhitelistType);
        }
        Ok(ty)
    }
}

/// A whitelist proof record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistProof {
    pub bank: Pubkey,
    pub whitelisted_address: Pubkey,
    pub whitelist_type: WhitelistType,
}

impl WhitelistProof {
    pub const BANK_OFFSET: usize = 0;
    pub const ADDRESS_OFFSET: usize = 32;

    pub fn new(bank: Pubkey, whitelisted_address: Pubkey, whitelist_type: WhitelistType) -> Self {
        Self {
            bank,
            whitelisted_address,
            whitelist_type,
        }
    }

    pub fn admits_mint(&self) -> bool {
        self.whitelist_type.mint
    }

    pub fn admits_creator(&self) -> bool {
        self.whitelist_type.creator
    }
}

impl Record for WhitelistProof {
    const KIND: RecordKind = RecordKind::WhitelistProof;

    fn index_entries(&self) -> Vec<(IndexKind, Pubkey)> {
        vec![(IndexKind::ProofsByBank, self.bank)]
    }
}
