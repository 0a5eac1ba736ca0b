//! Deposit and withdraw accounting.
//!
//! A gem box and its deposit receipt always change in the same commit: the
//! token transfer and the receipt update are staged together and land as
//! one batch, or neither does.

use tracing::info;

use super::token::{ensure_token_account, transfer};
use super::vault::check_vault_bank;
use super::whitelist::AdmissionEvidence;
use super::CustodyProtocol;
use crate::authority::{Authority, SignerSet};
use crate::crypto::keys::Pubkey;
use crate::error::{BankError, BankResult};
use crate::math::{TryAdd, TrySub};
use crate::state::{Bank, GemDepositReceipt, TokenAccount, Vault};
use crate::storage::StagedWrites;

/// Accounts and amount for [`CustodyProtocol::deposit_gem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositGem {
    pub bank: Pubkey,
    pub vault: Pubkey,
    pub mint: Pubkey,
    /// Depositor's token account for `mint`.
    pub source: Pubkey,
    pub depositor: Pubkey,
    pub amount: u64,
    /// Whitelist proof for `(bank, mint)`.
    pub mint_proof: Option<Pubkey>,
    /// Metadata record of `mint`, for the creator path.
    pub metadata: Option<Pubkey>,
    /// Whitelist proof for `(bank, creator)`.
    pub creator_proof: Option<Pubkey>,
}

/// Accounts and amount for [`CustodyProtocol::withdraw_gem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawGem {
    pub bank: Pubkey,
    pub vault: Pubkey,
    pub mint: Pubkey,
    /// Must be the receiver's associated token account for `mint`.
    pub destination: Pubkey,
    pub receiver: Pubkey,
    pub amount: u64,
}

/// Checks shared by deposit and withdraw, in order: vault under bank, bank
/// not frozen, vault not locked, non-zero amount, owner signed.
fn check_access(
    tx: &StagedWrites<'_>,
    bank: &Pubkey,
    vault: &Pubkey,
    amount: u64,
    signers: &SignerSet,
) -> BankResult<(Bank, Vault)> {
    let bank_record = tx.load::<Bank>(bank)?;
    let vault_record = tx.load::<Vault>(vault)?;
    check_vault_bank(&vault_record, bank)?;

    if bank_record.is_frozen() {
        return Err(BankError::BankFrozen(*bank));
    }
    if vault_record.locked {
        return Err(BankError::VaultLocked(*vault));
    }
    if amount == 0 {
        return Err(BankError::InvalidAmount);
    }
    signers.require("vault owner", &vault_record.owner)?;
    Ok((bank_record, vault_record))
}

impl CustodyProtocol {
    /// Move tokens from the depositor into the vault's gem box for `mint`.
    ///
    /// The gem box and its receipt are created on the first deposit of a
    /// mint. Returns the receipt as committed.
    pub fn deposit_gem(
        &self,
        params: &DepositGem,
        signers: &SignerSet,
    ) -> BankResult<GemDepositReceipt> {
        let (gem_box, _) = self.resolver.gem_box(&params.vault, &params.mint)?;
        let (gdr_address, _) = self.resolver.gdr(&params.vault, &params.mint)?;
        let program_id = self.config().program_id;

        let receipt = self.run("deposit_gem", signers, |tx| {
            let (bank, mut vault) =
                check_access(tx, &params.bank, &params.vault, params.amount, signers)?;
            signers.require("depositor", &params.depositor)?;
            self.check_admission(
                tx,
                &params.bank,
                &bank,
                &params.mint,
                AdmissionEvidence {
                    mint_proof: params.mint_proof,
                    metadata: params.metadata,
                    creator_proof: params.creator_proof,
                },
            )?;

            let mut receipt = match tx.get::<GemDepositReceipt>(&gdr_address)? {
                Some(receipt) => receipt,
                None => {
                    tx.ensure_vacant::<TokenAccount>(&gem_box)?;
                    ensure_token_account(tx, &gem_box, &params.mint, &vault.authority)?;
                    vault.gem_box_count.try_add_assign(1)?;
                    GemDepositReceipt::new(params.vault, gem_box, params.mint)
                }
            };

            transfer(
                tx,
                &params.source,
                &gem_box,
                params.amount,
                &Authority::User(params.depositor),
                signers,
                &program_id,
            )?;
            receipt.credit(params.amount)?;
            vault.gem_count.try_add_assign(params.amount)?;

            tx.put(&gdr_address, &receipt)?;
            tx.put(&params.vault, &vault)?;
            Ok(receipt)
        })?;

        info!(
            vault = %params.vault,
            mint = %params.mint,
            amount = params.amount,
            balance = receipt.amount,
            "gem deposited"
        );
        Ok(receipt)
    }

    /// Move tokens out of the gem box into the receiver's associated token
    /// account, creating that account if needed.
    ///
    /// The gem box is owned by the vault authority, which has no key. The
    /// transfer is authorised by re-deriving that authority from the vault
    /// address and the stored bump.
    pub fn withdraw_gem(
        &self,
        params: &WithdrawGem,
        signers: &SignerSet,
    ) -> BankResult<GemDepositReceipt> {
        let (gdr_address, _) = self.resolver.gdr(&params.vault, &params.mint)?;
        let (destination, _) = self
            .resolver
            .associated_token(&params.receiver, &params.mint)?;
        let program_id = self.config().program_id;

        let receipt = self.run("withdraw_gem", signers, |tx| {
            let (_, mut vault) =
                check_access(tx, &params.bank, &params.vault, params.amount, signers)?;
            if params.destination != destination {
                return Err(BankError::AccountMismatch {
                    what: "withdraw destination",
                    expected: destination,
                    got: params.destination,
                });
            }

            let mut receipt = tx.load::<GemDepositReceipt>(&gdr_address)?;
            if params.amount > receipt.amount {
                return Err(BankError::InsufficientBalance {
                    requested: params.amount,
                    available: receipt.amount,
                });
            }

            let proof = self
                .resolver
                .vault_authority_proof(&params.vault, vault.authority_bump)?;
            if proof.address() != vault.authority {
                return Err(BankError::AccountMismatch {
                    what: "vault authority",
                    expected: proof.address(),
                    got: vault.authority,
                });
            }

            ensure_token_account(tx, &destination, &params.mint, &params.receiver)?;
            transfer(
                tx,
                &receipt.gem_box,
                &destination,
                params.amount,
                &Authority::Protocol(proof),
                signers,
                &program_id,
            )?;
            receipt.debit(params.amount)?;
            vault.gem_count.try_sub_assign(params.amount)?;

            tx.put(&gdr_address, &receipt)?;
            tx.put(&params.vault, &vault)?;
            Ok(receipt)
        })?;

        info!(
            vault = %params.vault,
            mint = %params.mint,
            amount = params.amount,
            balance = receipt.amount,
            "gem withdrawn"
        );
        Ok(receipt)
    }
}
