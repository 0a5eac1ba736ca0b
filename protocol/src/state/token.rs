//! # Token Records
//!
//! The slice of a token program the gem bank depends on: mints and token
//! accounts. Gem boxes are ordinary [`TokenAccount`]s whose owner is a vault
//! custody authority.

use serde::{Deserialize, Serialize};

use super::{Record, RecordKind};
use crate::crypto::keys::Pubkey;
use crate::error::BankResult;
use crate::math::{TryAdd, TrySub};

/// A token mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mint {
    pub mint_authority: Pubkey,
    pub supply: u64,
    pub decimals: u8,
}

impl Record for Mint {
    const KIND: RecordKind = RecordKind::Mint;
}

/// A token account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAccount {
    pub mint: Pubkey,

    /// Authority allowed to move tokens out: a user key, or a derived
    /// custody authority for gem boxes.
    pub owner: Pubkey,

    pub amount: u64,
}

impl TokenAccount {
    pub const MINT_OFFSET: usize = 0;
    pub const OWNER_OFFSET: usize = 32;

    pub fn new(mint: Pubkey, owner: Pubkey) -> Self {
        Self {
            mint,
            owner,
            amount: 0,
        }
    }

    pub fn credit(&mut self, amount: u64) -> BankResult<()> {
        self.amount.try_add_assign(amount)
    }

    pub fn debit(&mut self, amount: u64) -> BankResult<()> {
        self.amount.try_sub_assign(amount)
    }
}

impl Record for TokenAccount {
    const KIND: RecordKind = RecordKind::TokenAccount;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_cannot_go_negative() {
        let mut acct = TokenAccount::new(
            Pubkey::new_from_array([1u8; 32]),
            Pubkey::new_from_array([2u8; 32]),
        );
        acct.credit(3).unwrap();
        assert!(acct.debit(4).is_err());
        assert_eq!(acct.amount, 3);
    }
}
