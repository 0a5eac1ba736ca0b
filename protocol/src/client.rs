//! # Client Helpers
//!
//! What a caller needs before submitting anything: every derived address
//! for a vault and mint, and a builder for every instruction. Builders only
//! assemble data; signing goes through
//! [`Transaction::signed`](crate::instruction::Transaction::signed) with a
//! nonce from [`QueryIndex::next_nonce`](crate::storage::QueryIndex::next_nonce).
//!
//! Nothing here caches ledger state. Balances are always read fresh through
//! [`QueryIndex`](crate::storage::QueryIndex).

use crate::crypto::keys::Pubkey;
use crate::crypto::pda::{DerivationError, DerivedAddressResolver};
use crate::instruction::Instruction;
use crate::state::{BankFlags, Creator, WhitelistType};

/// Derived addresses of one vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultAddresses {
    pub vault: Pubkey,
    pub vault_bump: u8,
    pub authority: Pubkey,
    pub authority_bump: u8,
}

/// Derived addresses of one `(vault, mint)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GemAddresses {
    pub gem_box: Pubkey,
    pub gem_box_bump: u8,
    pub gdr: Pubkey,
    pub gdr_bump: u8,
}

/// Instruction builder bound to one set of program ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct GemBankClient {
    resolver: DerivedAddressResolver,
}

impl GemBankClient {
    pub fn new(resolver: DerivedAddressResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &DerivedAddressResolver {
        &self.resolver
    }

    // -- Addresses ----------------------------------------------------------

    pub fn vault_addresses(
        &self,
        bank: &Pubkey,
        creator: &Pubkey,
    ) -> Result<VaultAddresses, DerivationError> {
        let (vault, vault_bump) = self.resolver.vault(bank, creator)?;
        let (authority, authority_bump) = self.resolver.vault_authority(&vault)?;
        Ok(VaultAddresses {
            vault,
            vault_bump,
            authority,
            authority_bump,
        })
    }

    pub fn gem_addresses(
        &self,
        vault: &Pubkey,
        mint: &Pubkey,
    ) -> Result<GemAddresses, DerivationError> {
        let (gem_box, gem_box_bump) = self.resolver.gem_box(vault, mint)?;
        let (gdr, gdr_bump) = self.resolver.gdr(vault, mint)?;
        Ok(GemAddresses {
            gem_box,
            gem_box_bump,
            gdr,
            gdr_bump,
        })
    }

    pub fn whitelist_proof(&self, bank: &Pubkey, address: &Pubkey) -> Result<Pubkey, DerivationError> {
        Ok(self.resolver.whitelist_proof(bank, address)?.0)
    }

    pub fn metadata(&self, mint: &Pubkey) -> Result<Pubkey, DerivationError> {
        Ok(self.resolver.metadata(mint)?.0)
    }

    pub fn associated_token(&self, owner: &Pubkey, mint: &Pubkey) -> Result<Pubkey, DerivationError> {
        Ok(self.resolver.associated_token(owner, mint)?.0)
    }

    // -- Bank ---------------------------------------------------------------

    pub fn init_bank(&self, bank: Pubkey, manager: Pubkey, payer: Pubkey) -> Instruction {
        Instruction::InitBank {
            bank,
            manager,
            payer,
        }
    }

    pub fn update_bank_manager(&self, bank: Pubkey, new_manager: Pubkey) -> Instruction {
        Instruction::UpdateBankManager { bank, new_manager }
    }

    pub fn set_bank_flags(&self, bank: Pubkey, flags: BankFlags) -> Instruction {
        Instruction::SetBankFlags {
            bank,
            flags: flags.to_bits(),
        }
    }

    // -- Vault --------------------------------------------------------------

    pub fn init_vault(
        &self,
        bank: Pubkey,
        creator: Pubkey,
        payer: Pubkey,
        owner: Pubkey,
        name: impl Into<String>,
    ) -> Instruction {
        Instruction::InitVault {
            bank,
            creator,
            payer,
            owner,
            name: name.into(),
        }
    }

    pub fn update_vault_owner(&self, bank: Pubkey, vault: Pubkey, new_owner: Pubkey) -> Instruction {
        Instruction::UpdateVaultOwner {
            bank,
            vault,
            new_owner,
        }
    }

    pub fn set_vault_lock(&self, bank: Pubkey, vault: Pubkey, locked: bool) -> Instruction {
        Instruction::SetVaultLock {
            bank,
            vault,
            locked,
        }
    }

    // -- Whitelist ----------------------------------------------------------

    pub fn add_to_whitelist(
        &self,
        bank: Pubkey,
        address: Pubkey,
        whitelist_type: WhitelistType,
    ) -> Instruction {
        Instruction::AddToWhitelist {
            bank,
            address,
            whitelist_type: whitelist_type.to_bits(),
        }
    }

    pub fn remove_from_whitelist(&self, bank: Pubkey, address: Pubkey) -> Instruction {
        Instruction::RemoveFromWhitelist { bank, address }
    }

    // -- Custody ------------------------------------------------------------

    /// Deposit with no whitelist evidence attached.
    pub fn deposit_gem(
        &self,
        bank: Pubkey,
        vault: Pubkey,
        mint: Pubkey,
        source: Pubkey,
        depositor: Pubkey,
        amount: u64,
    ) -> Instruction {
        Instruction::DepositGem {
            bank,
            vault,
            mint,
            source,
            depositor,
            amount,
            mint_proof: None,
            metadata: None,
            creator_proof: None,
        }
    }

    /// Deposit admitted through the mint's own whitelist proof.
    pub fn deposit_gem_by_mint(
        &self,
        bank: Pubkey,
        vault: Pubkey,
        mint: Pubkey,
        source: Pubkey,
        depositor: Pubkey,
        amount: u64,
    ) -> Result<Instruction, DerivationError> {
        let mint_proof = self.whitelist_proof(&bank, &mint)?;
        Ok(Instruction::DepositGem {
            bank,
            vault,
            mint,
            source,
            depositor,
            amount,
            mint_proof: Some(mint_proof),
            metadata: None,
            creator_proof: None,
        })
    }

    /// Deposit admitted through a whitelisted creator listed in the mint's
    /// metadata.
    #[allow(clippy::too_many_arguments)]
    pub fn deposit_gem_by_creator(
        &self,
        bank: Pubkey,
        vault: Pubkey,
        mint: Pubkey,
        source: Pubkey,
        depositor: Pubkey,
        amount: u64,
        creator: &Pubkey,
    ) -> Result<Instruction, DerivationError> {
        Ok(Instruction::DepositGem {
            bank,
            vault,
            mint,
            source,
            depositor,
            amount,
            mint_proof: None,
            metadata: Some(self.metadata(&mint)?),
            creator_proof: Some(self.whitelist_proof(&bank, creator)?),
        })
    }

    /// Withdraw into the receiver's associated token account.
    pub fn withdraw_gem(
        &self,
        bank: Pubkey,
        vault: Pubkey,
        mint: Pubkey,
        receiver: Pubkey,
        amount: u64,
    ) -> Result<Instruction, DerivationError> {
        Ok(Instruction::WithdrawGem {
            bank,
            vault,
            mint,
            destination: self.associated_token(&receiver, &mint)?,
            receiver,
            amount,
        })
    }

    // -- Collaborators ------------------------------------------------------

    pub fn create_mint(&self, mint: Pubkey, mint_authority: Pubkey, decimals: u8) -> Instruction {
        Instruction::CreateMint {
            mint,
            mint_authority,
            decimals,
        }
    }

    pub fn create_token_account(&self, account: Pubkey, mint: Pubkey, owner: Pubkey) -> Instruction {
        Instruction::CreateTokenAccount {
            account,
            mint,
            owner,
        }
    }

    pub fn create_associated_token_account(
        &self,
        payer: Pubkey,
        owner: Pubkey,
        mint: Pubkey,
    ) -> Instruction {
        Instruction::CreateAssociatedTokenAccount { payer, owner, mint }
    }

    pub fn mint_to(&self, mint: Pubkey, destination: Pubkey, amount: u64) -> Instruction {
        Instruction::MintTo {
            mint,
            destination,
            amount,
        }
    }

    pub fn create_metadata(
        &self,
        mint: Pubkey,
        update_authority: Pubkey,
        creators: Vec<Creator>,
    ) -> Instruction {
        Instruction::CreateMetadata {
            mint,
            update_authority,
            creators,
        }
    }
}
