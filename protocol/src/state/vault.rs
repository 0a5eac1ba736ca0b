//! # Vault
//!
//! One isolated custody unit per `(bank, creator)`. The creator is fixed at
//! creation; the owner can hand the vault over; the bank manager can lock it.
//! Tokens inside never sit in an account the owner controls directly. They
//! sit in gem boxes owned by the vault's derived custody authority.

use serde::{Deserialize, Serialize};

use super::{IndexKind, Record, RecordKind};
use crate::config::MAX_VAULT_NAME_LEN;
use crate::crypto::keys::Pubkey;
use crate::error::{BankError, BankResult};

/// A vault record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    pub bank: Pubkey,

    /// Signs deposits, withdrawals and owner changes.
    pub owner: Pubkey,

    /// Part of the vault's seeds, so it can never change.
    pub creator: Pubkey,

    /// Derived from the vault address; owns every gem box of this vault.
    pub authority: Pubkey,

    /// Nonce that re-derives `authority`.
    pub authority_bump: u8,

    /// Set by the bank manager; blocks deposits and withdrawals.
    pub locked: bool,

    pub gem_box_count: u64,

    /// Sum of all receipt amounts in this vault.
    pub gem_count: u64,

    pub name: String,
}

impl Vault {
    pub const BANK_OFFSET: usize = 0;
    pub const OWNER_OFFSET: usize = 32;
    pub const CREATOR_OFFSET: usize = 64;
    pub const AUTHORITY_OFFSET: usize = 96;

    pub fn new(
        bank: Pubkey,
        creator: Pubkey,
        owner: Pubkey,
        authority: Pubkey,
        authority_bump: u8,
        name: String,
    ) -> BankResult<Self> {
        if name.len() > MAX_VAULT_NAME_LEN {
            return Err(BankError::NameTooLong(name.len()));
        }
        Ok(Self {
            bank,
            owner,
            creator,
            authority,
            authority_bump,
            locked: false,
            gem_box_count: 0,
            gem_count: 0,
            name,
        })
    }
}

impl Record for Vault {
    const KIND: RecordKind = RecordKind::Vault;

    fn index_entries(&self) -> Vec<(IndexKind, Pubkey)> {
        vec![
            (IndexKind::VaultsByBank, self.bank),
            (IndexKind::VaultsByOwner, self.owner),
        ]
    }
}
