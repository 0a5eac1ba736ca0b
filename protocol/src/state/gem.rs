//! # Gem Deposit Receipts
//!
//! A [`GemDepositReceipt`] (GDR) is the ledger entry for one `(vault, mint)`
//! pair. It sits next to the gem box, the token account that actually holds
//! the tokens, and the processor keeps `amount` equal to the gem box balance
//! by changing both in the same commit.
//!
//! Receipts are created on the first deposit of a mint and are never
//! deleted. A zero amount is a normal resting state.

use serde::{Deserialize, Serialize};

use super::{IndexKind, Record, RecordKind};
use crate::crypto::keys::Pubkey;
use crate::error::BankResult;
use crate::math::{TryAdd, TrySub};

/// A gem deposit receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GemDepositReceipt {
    pub vault: Pubkey,

    /// The gem box token account this receipt mirrors.
    pub gem_box: Pubkey,

    pub gem_mint: Pubkey,

    /// Tokens held in `gem_box`.
    pub amount: u64,
}

impl GemDepositReceipt {
    pub const VAULT_OFFSET: usize = 0;
    pub const GEM_BOX_OFFSET: usize = 32;
    pub const MINT_OFFSET: usize = 64;

    pub fn new(vault: Pubkey, gem_box: Pubkey, gem_mint: Pubkey) -> Self {
        Self {
            vault,
            gem_box,
            gem_mint,
            amount: 0,
        }
    }

    pub fn credit(&mut self, amount: u64) -> BankResult<u64> {
        self.amount.try_add_assign(amount)?;
        Ok(self.amount)
    }

    /// Callers check the balance first so the user sees
    /// `InsufficientBalance`; this only guards against underflow.
    pub fn debit(&mut self, amount: u64) -> BankResult<u64> {
        self.amount.try_sub_assign(amount)?;
        Ok(self.amount)
    }
}

impl Record for GemDepositReceipt {
    const KIND: RecordKind = RecordKind::GemDepositReceipt;

    fn index_entries(&self) -> Vec<(IndexKind, Pubkey)> {
        vec![(IndexKind::GdrsByVault, self.vault)]
    }
}
