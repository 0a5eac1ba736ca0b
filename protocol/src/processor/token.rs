//! Token collaborator: mints, token accounts and the one transfer primitive
//! custody needs.
//!
//! [`transfer`] is only reachable through deposit and withdraw. The public
//! operations here set up the mints and accounts those two move tokens
//! between.

use tracing::info;

use super::CustodyProtocol;
use crate::authority::{Authority, SignerSet};
use crate::crypto::keys::Pubkey;
use crate::error::{BankError, BankResult};
use crate::math::TryAdd;
use crate::state::{Mint, TokenAccount};
use crate::storage::StagedWrites;

/// Move `amount` from `from` to `to`, authorised by `authority`.
pub(super) fn transfer(
    tx: &mut StagedWrites<'_>,
    from: &Pubkey,
    to: &Pubkey,
    amount: u64,
    authority: &Authority,
    signers: &SignerSet,
    program_id: &Pubkey,
) -> BankResult<()> {
    if from == to {
        return Err(BankError::AccountMismatch {
            what: "transfer destination",
            expected: *from,
            got: *to,
        });
    }

    let mut source = tx.load::<TokenAccount>(from)?;
    let mut destination = tx.load::<TokenAccount>(to)?;
    if source.mint != destination.mint {
        return Err(BankError::AccountMismatch {
            what: "token mint",
            expected: source.mint,
            got: destination.mint,
        });
    }
    authority.authorize(&source.owner, signers, program_id)?;
    if source.amount < amount {
        return Err(BankError::InsufficientBalance {
            requested: amount,
            available: source.amount,
        });
    }

    source.debit(amount)?;
    destination.credit(amount)?;
    tx.put(from, &source)?;
    tx.put(to, &destination)
}

/// Create the token account at `address` unless one is already there.
pub(super) fn ensure_token_account(
    tx: &mut StagedWrites<'_>,
    address: &Pubkey,
    mint: &Pubkey,
    owner: &Pubkey,
) -> BankResult<bool> {
    if tx.exists::<TokenAccount>(address)? {
        return Ok(false);
    }
    tx.load::<Mint>(mint)?;
    tx.put(address, &TokenAccount::new(*mint, *owner))?;
    Ok(true)
}

impl CustodyProtocol {
    /// Create a mint at a keypair-backed address. The mint key signs.
    pub fn create_mint(
        &self,
        mint: &Pubkey,
        mint_authority: &Pubkey,
        decimals: u8,
        signers: &SignerSet,
    ) -> BankResult<()> {
        self.run("create_mint", signers, |tx| {
            signers.require("mint", mint)?;
            tx.ensure_vacant::<Mint>(mint)?;
            tx.put(
                mint,
                &Mint {
                    mint_authority: *mint_authority,
                    supply: 0,
                    decimals,
                },
            )
        })?;
        info!(mint = %mint, decimals, "mint created");
        Ok(())
    }

    /// Create a token account at a keypair-backed address.
    pub fn create_token_account(
        &self,
        account: &Pubkey,
        mint: &Pubkey,
        owner: &Pubkey,
        signers: &SignerSet,
    ) -> BankResult<()> {
        self.run("create_token_account", signers, |tx| {
            signers.require("token account", account)?;
            tx.ensure_vacant::<TokenAccount>(account)?;
            ensure_token_account(tx, account, mint, owner).map(drop)
        })?;
        info!(account = %account, mint = %mint, owner = %owner, "token account created");
        Ok(())
    }

    /// Create `owner`'s associated token account for `mint` and return its
    /// address.
    pub fn create_associated_token_account(
        &self,
        payer: &Pubkey,
        owner: &Pubkey,
        mint: &Pubkey,
        signers: &SignerSet,
    ) -> BankResult<Pubkey> {
        let (address, _) = self.resolver.associated_token(owner, mint)?;
        self.run("create_associated_token_account", signers, |tx| {
            signers.require("payer", payer)?;
            tx.ensure_vacant::<TokenAccount>(&address)?;
            ensure_token_account(tx, &address, mint, owner).map(drop)
        })?;
        info!(account = %address, mint = %mint, owner = %owner, "associated token account created");
        Ok(address)
    }

    /// Issue new tokens into `destination`. The mint authority signs.
    pub fn mint_to(
        &self,
        mint: &Pubkey,
        destination: &Pubkey,
        amount: u64,
        signers: &SignerSet,
    ) -> BankResult<()> {
        self.run("mint_to", signers, |tx| {
            let mut mint_record = tx.load::<Mint>(mint)?;
            signers.require("mint authority", &mint_record.mint_authority)?;
            if amount == 0 {
                return Err(BankError::InvalidAmount);
            }

            let mut account = tx.load::<TokenAccount>(destination)?;
            if account.mint != *mint {
                return Err(BankError::AccountMismatch {
                    what: "token mint",
                    expected: *mint,
                    got: account.mint,
                });
            }
            mint_record.supply.try_add_assign(amount)?;
            account.credit(amount)?;
            tx.put(mint, &mint_record)?;
            tx.put(destination, &account)
        })?;
        info!(mint = %mint, destination = %destination, amount, "tokens minted");
        Ok(())
    }
}
