//! # Bank
//!
//! The top-level registry. A bank owns its vaults and its whitelist, and its
//! manager is the only identity that can change policy: flags, vault locks,
//! whitelist entries, and the manager itself.

use serde::{Deserialize, Serialize};

use super::whitelist::WhitelistType;
use super::{IndexKind, Record, RecordKind};
use crate::config::LATEST_BANK_VERSION;
use crate::crypto::keys::Pubkey;
use crate::error::BankResult;
use crate::math::{TryAdd, TrySub};

/// Bank-wide switches.
///
/// Stored as named booleans. The bitset form only exists at the CLI and
/// instruction edge via [`BankFlags::to_bits`] / [`BankFlags::from_bits`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankFlags {
    /// Global circuit breaker: blocks vault creation, deposits,
    /// withdrawals and lock changes for every vault under the bank.
    pub freeze_vaults: bool,
}

impl BankFlags {
    const FREEZE_VAULTS: u32 = 1 << 0;

    pub fn frozen() -> Self {
        Self {
            freeze_vaults: true,
        }
    }

    pub fn to_bits(self) -> u32 {
        if self.freeze_vaults {
            Self::FREEZE_VAULTS
        } else {
            0
        }
    }

    /// Unknown bits are ignored.
    pub fn from_bits(bits: u32) -> Self {
        Self {
            freeze_vaults: bits & Self::FREEZE_VAULTS != 0,
        }
    }
}

/// A bank record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub version: u16,

    /// Signs every administrative operation.
    pub manager: Pubkey,

    pub flags: BankFlags,

    /// Live whitelist proofs with the creator bit.
    pub whitelisted_creators: u32,

    /// Live whitelist proofs with the mint bit.
    pub whitelisted_mints: u32,

    pub vault_count: u64,
}

impl Bank {
    /// Byte offset of `manager` in the serialized record.
    pub const MANAGER_OFFSET: usize = 2;

    pub fn new(manager: Pubkey) -> Self {
        Self {
            version: LATEST_BANK_VERSION,
            manager,
            flags: BankFlags::default(),
            whitelisted_creators: 0,
            whitelisted_mints: 0,
            vault_count: 0,
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.flags.freeze_vaults
    }

    /// Whether deposits have to pass a whitelist check at all.
    ///
    /// Enforcement is opt-in: a bank with no whitelisted mints and no
    /// whitelisted creators admits every mint.
    pub fn whitelist_enforced(&self) -> bool {
        self.whitelisted_mints > 0 || self.whitelisted_creators > 0
    }

    /// Move the whitelist counters from `previous` to `current`.
    ///
    /// `None` means no proof. Overwriting a proof with the same type is a
    /// no-op for the counters.
    pub fn apply_whitelist_change(
        &mut self,
        previous: Option<WhitelistType>,
        current: Option<WhitelistType>,
    ) -> BankResult<()> {
        let before = previous.unwrap_or_default();
        let after = current.unwrap_or_default();

        match (before.mint, after.mint) {
            (false, true) => self.whitelisted_mints.try_add_assign(1)?,
            (true, false) => self.whitelisted_mints.try_sub_assign(1)?,
            _ => {}
        }
        match (before.creator, after.creator) {
            (false, true) => self.whitelisted_creators.try_add_assign(1)?,
            (true, false) => self.whitelisted_creators.try_sub_assign(1)?,
            _ => {}
        }
        Ok(())
    }
}

impl Record for Bank {
    const KIND: RecordKind = RecordKind::Bank;

    fn index_entries(&self) -> Vec<(IndexKind, Pubkey)> {
        vec![(IndexKind::BanksByManager, self.manager)]
    }
}
