//! # Instructions
//!
//! The serializable form of every custody operation, and the signed
//! envelope that carries one to the processor.
//!
//! ```text
//! mod.rs         — Instruction enum, required signers
//! transaction.rs — Transaction: bincode message + Ed25519 signatures
//! ```
//!
//! Bitset encodings (`flags`, `whitelist_type`) only exist here, at the
//! edge. The processor converts them to [`BankFlags`] and
//! [`WhitelistType`] before touching any record.
//!
//! [`BankFlags`]: crate::state::BankFlags
//! [`WhitelistType`]: crate::state::WhitelistType

pub mod transaction;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::keys::Pubkey;
use crate::state::Creator;

pub use transaction::Transaction;

/// Errors from encoding or decoding instructions.
#[derive(Debug, Error)]
pub enum InstructionError {
    #[error("instruction encoding failed: {0}")]
    Encoding(String),

    #[error("instruction decoding failed: {0}")]
    Decoding(String),

    #[error("transaction is missing a signature from {0}")]
    MissingSignature(Pubkey),
}

/// Every operation the processor accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    // -- Bank ---------------------------------------------------------------
    InitBank {
        bank: Pubkey,
        manager: Pubkey,
        payer: Pubkey,
    },
    UpdateBankManager {
        bank: Pubkey,
        new_manager: Pubkey,
    },
    SetBankFlags {
        bank: Pubkey,
        flags: u32,
    },

    // -- Vault --------------------------------------------------------------
    InitVault {
        bank: Pubkey,
        creator: Pubkey,
        payer: Pubkey,
        owner: Pubkey,
        name: String,
    },
    UpdateVaultOwner {
        bank: Pubkey,
        vault: Pubkey,
        new_owner: Pubkey,
    },
    SetVaultLock {
        bank: Pubkey,
        vault: Pubkey,
        locked: bool,
    },

    // -- Whitelist ----------------------------------------------------------
    AddToWhitelist {
        bank: Pubkey,
        address: Pubkey,
        whitelist_type: u8,
    },
    RemoveFromWhitelist {
        bank: Pubkey,
        address: Pubkey,
    },

    // -- Custody ------------------------------------------------------------
    DepositGem {
        bank: Pubkey,
        vault: Pubkey,
        mint: Pubkey,
        source: Pubkey,
        depositor: Pubkey,
        amount: u64,
        mint_proof: Option<Pubkey>,
        metadata: Option<Pubkey>,
        creator_proof: Option<Pubkey>,
    },
    WithdrawGem {
        bank: Pubkey,
        vault: Pubkey,
        mint: Pubkey,
        destination: Pubkey,
        receiver: Pubkey,
        amount: u64,
    },

    // -- Collaborators ------------------------------------------------------
    CreateMint {
        mint: Pubkey,
        mint_authority: Pubkey,
        decimals: u8,
    },
    CreateTokenAccount {
        account: Pubkey,
        mint: Pubkey,
        owner: Pubkey,
    },
    CreateAssociatedTokenAccount {
        payer: Pubkey,
        owner: Pubkey,
        mint: Pubkey,
    },
    MintTo {
        mint: Pubkey,
        destination: Pubkey,
        amount: u64,
    },
    CreateMetadata {
        mint: Pubkey,
        update_authority: Pubkey,
        creators: Vec<Creator>,
    },
}

impl Instruction {
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::InitBank { .. } => "init_bank",
            Instruction::UpdateBankManager { .. } => "update_bank_manager",
            Instruction::SetBankFlags { .. } => "set_bank_flags",
            Instruction::InitVault { .. } => "init_vault",
            Instruction::UpdateVaultOwner { .. } => "update_vault_owner",
            Instruction::SetVaultLock { .. } => "set_vault_lock",
            Instruction::AddToWhitelist { .. } => "add_to_whitelist",
            Instruction::RemoveFromWhitelist { .. } => "remove_from_whitelist",
            Instruction::DepositGem { .. } => "deposit_gem",
            Instruction::WithdrawGem { .. } => "withdraw_gem",
            Instruction::CreateMint { .. } => "create_mint",
            Instruction::CreateTokenAccount { .. } => "create_token_account",
            Instruction::CreateAssociatedTokenAccount { .. } => {
                "create_associated_token_account"
            }
            Instruction::MintTo { .. } => "mint_to",
            Instruction::CreateMetadata { .. } => "create_metadata",
        }
    }

    /// Signers named by the instruction itself.
    ///
    /// Roles held in records (bank manager, vault owner, mint authority)
    /// are not listed here; the processor looks them up and checks them
    /// against the verified signer set.
    pub fn named_signers(&self) -> Vec<Pubkey> {
        match self {
            Instruction::InitBank { bank, payer, .. } => vec![*bank, *payer],
            Instruction::InitVault { creator, payer, .. } => vec![*creator, *payer],
            Instruction::DepositGem { depositor, .. } => vec![*depositor],
            Instruction::CreateMint { mint, .. } => vec![*mint],
            Instruction::CreateTokenAccount { account, .. } => vec![*account],
            Instruction::CreateAssociatedTokenAccount { payer, .. } => vec![*payer],
            Instruction::CreateMetadata {
                update_authority, ..
            } => vec![*update_authority],
            _ => Vec::new(),
        }
    }

    /// Canonical bytes, the message every signer signs.
    pub fn to_bytes(&self) -> Result<Vec<u8>, InstructionError> {
        bincode::serialize(self).map_err(|e| InstructionError::Encoding(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InstructionError> {
        bincode::deserialize(bytes).map_err(|e| InstructionError::Decoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_roundtrip() {
        let ix = Instruction::DepositGem {
            bank: Pubkey::new_unique(),
            vault: Pubkey::new_unique(),
            mint: Pubkey::new_unique(),
            source: Pubkey::new_unique(),
            depositor: Pubkey::new_unique(),
            amount: 5,
            mint_proof: None,
            metadata: Some(Pubkey::new_unique()),
            creator_proof: None,
        };
        let bytes = ix.to_bytes().unwrap();
        assert_eq!(Instruction::from_bytes(&bytes).unwrap(), ix);
    }

    #[test]
    fn garbage_does_not_decode() {
        assert!(matches!(
            Instruction::from_bytes(&[0xff, 0xff, 0xff, 0xff]),
            Err(InstructionError::Decoding(_))
        ));
    }

    #[test]
    fn init_vault_names_creator_and_payer() {
        let (creator, payer) = (Pubkey::new_unique(), Pubkey::new_unique());
        let ix = Instruction::InitVault {
            bank: Pubkey::new_unique(),
            creator,
            payer,
            owner: Pubkey::new_unique(),
            name: "v".into(),
        };
        assert_eq!(ix.named_signers(), vec![creator, payer]);
        assert_eq!(ix.name(), "init_vault");
    }
}
