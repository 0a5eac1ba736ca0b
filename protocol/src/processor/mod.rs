//! # Custody Protocol
//!
//! The operation set that mutates banks, vaults, gem boxes, deposit receipts
//! and whitelist proofs.
//!
//! ```text
//! bank.rs      — init_bank, update_bank_manager, set_bank_flags
//! vault.rs     — init_vault, update_vault_owner, set_vault_lock
//! whitelist.rs — add_to_whitelist, remove_from_whitelist, admission check
//! custody.rs   — deposit_gem, withdraw_gem
//! token.rs     — mints, token accounts, transfers between them
//! metadata.rs  — asset metadata records
//! ```
//!
//! ## Execution model
//!
//! Every operation runs through [`CustodyProtocol::run`]: take the
//! sequencer, stage reads and writes in a [`StagedWrites`] overlay, and
//! commit the overlay as one ledger batch only if every check passed. When
//! the signers came from a verified [`Transaction`], their nonces are
//! checked and advanced in that same batch, so a replayed transaction is
//! rejected and a rejected operation does not burn its nonce. Two
//! operations never interleave, so a withdrawal always sees the balance the
//! previous withdrawal left behind. Queries bypass the sequencer entirely.
//!
//! Each operation follows the same shape: resolve the derived addresses it
//! needs, check policy (frozen, locked, signers, whitelist), then mutate.

mod bank;
mod custody;
mod metadata;
mod token;
mod vault;
mod whitelist;

use std::path::Path;

use parking_lot::Mutex;
use tracing::{debug, warn};

pub use custody::{DepositGem, WithdrawGem};

use crate::authority::SignerSet;
use crate::config::ProtocolConfig;
use crate::crypto::pda::DerivedAddressResolver;
use crate::error::{BankError, BankResult};
use crate::instruction::{Instruction, Transaction};
use crate::state::{BankFlags, SignerNonce, WhitelistType};
use crate::storage::{LedgerDB, QueryIndex, StagedWrites};

/// The gem bank processor over one ledger.
pub struct CustodyProtocol {
    db: LedgerDB,
    resolver: DerivedAddressResolver,
    sequencer: Mutex<()>,
}

impl CustodyProtocol {
    pub fn new(db: LedgerDB, config: ProtocolConfig) -> Self {
        Self {
            db,
            resolver: DerivedAddressResolver::new(config),
            sequencer: Mutex::new(()),
        }
    }

    /// Open a persistent ledger with the default program ids.
    pub fn open<P: AsRef<Path>>(path: P) -> BankResult<Self> {
        Ok(Self::new(LedgerDB::open(path)?, ProtocolConfig::default()))
    }

    /// In-memory ledger with the default program ids.
    pub fn open_temporary() -> BankResult<Self> {
        Ok(Self::new(
            LedgerDB::open_temporary()?,
            ProtocolConfig::default(),
        ))
    }

    pub fn resolver(&self) -> &DerivedAddressResolver {
        &self.resolver
    }

    pub fn config(&self) -> &ProtocolConfig {
        self.resolver.config()
    }

    /// Read-only view over committed state.
    pub fn query(&self) -> QueryIndex {
        QueryIndex::new(self.db.clone())
    }

    pub fn flush(&self) -> BankResult<()> {
        Ok(self.db.flush()?)
    }

    /// Run `op` under the sequencer and commit its writes atomically.
    ///
    /// If `op` returns an error, nothing it staged reaches the ledger.
    fn run<T>(
        &self,
        name: &'static str,
        signers: &SignerSet,
        op: impl FnOnce(&mut StagedWrites<'_>) -> BankResult<T>,
    ) -> BankResult<T> {
        let _guard = self.sequencer.lock();
        let mut staged = StagedWrites::new(&self.db);
        let result = consume_nonce(&mut staged, signers).and_then(|()| op(&mut staged));
        match result {
            Ok(out) => {
                let writes = staged.len();
                let sequence = staged.commit()?;
                debug!(op = name, sequence, writes, "operation committed");
                Ok(out)
            }
            Err(e) => {
                warn!(op = name, error = %e, "operation rejected");
                Err(e)
            }
        }
    }

    /// Verify a signed transaction and run its instruction.
    pub fn execute(&self, tx: &Transaction) -> BankResult<()> {
        let signers = tx.verify()?;
        self.dispatch(tx.instruction.clone(), &signers)
    }

    /// Run an instruction against an already-authenticated signer set.
    ///
    /// A set carrying a nonce (see [`SignerSet::with_nonce`]) is subject to
    /// the same replay check as [`Self::execute`].
    pub fn dispatch(&self, instruction: Instruction, signers: &SignerSet) -> BankResult<()> {
        match instruction {
            Instruction::InitBank {
                bank,
                manager,
                payer,
            } => self.init_bank(&bank, &manager, &payer, signers),
            Instruction::UpdateBankManager { bank, new_manager } => {
                self.update_bank_manager(&bank, &new_manager, signers)
            }
            Instruction::SetBankFlags { bank, flags } => {
                self.set_bank_flags(&bank, BankFlags::from_bits(flags), signers)
            }
            Instruction::InitVault {
                bank,
                creator,
                payer,
                owner,
                name,
            } => self
                .init_vault(&bank, &creator, &payer, &owner, name, signers)
                .map(drop),
            Instruction::UpdateVaultOwner {
                bank,
                vault,
                new_owner,
            } => self.update_vault_owner(&bank, &vault, &new_owner, signers),
            Instruction::SetVaultLock {
                bank,
                vault,
                locked,
            } => self.set_vault_lock(&bank, &vault, locked, signers),
            Instruction::AddToWhitelist {
                bank,
                address,
                whitelist_type,
            } => {
                let ty = WhitelistType::from_bits(whitelist_type)?;
                self.add_to_whitelist(&bank, &address, ty, signers).map(drop)
            }
            Instruction::RemoveFromWhitelist { bank, address } => {
                self.remove_from_whitelist(&bank, &address, signers)
            }
            Instruction::DepositGem {
                bank,
                vault,
                mint,
                source,
                depositor,
                amount,
                mint_proof,
                metadata,
                creator_proof,
            } => self
                .deposit_gem(
                    &DepositGem {
                        bank,
                        vault,
                        mint,
                        source,
                        depositor,
                        amount,
                        mint_proof,
                        metadata,
                        creator_proof,
                    },
                    signers,
                )
                .map(drop),
            Instruction::WithdrawGem {
                bank,
                vault,
                mint,
                destination,
                receiver,
                amount,
            } => self
                .withdraw_gem(
                    &WithdrawGem {
                        bank,
                        vault,
                        mint,
                        destination,
                        receiver,
                        amount,
                    },
                    signers,
                )
                .map(drop),
            Instruction::CreateMint {
                mint,
                mint_authority,
                decimals,
            } => self.create_mint(&mint, &mint_authority, decimals, signers),
            Instruction::CreateTokenAccount {
                account,
                mint,
                owner,
            } => self.create_token_account(&account, &mint, &owner, signers),
            Instruction::CreateAssociatedTokenAccount { payer, owner, mint } => self
                .create_associated_token_account(&payer, &owner, &mint, signers)
                .map(drop),
            Instruction::MintTo {
                mint,
                destination,
                amount,
            } => self.mint_to(&mint, &destination, amount, signers),
            Instruction::CreateMetadata {
                mint,
                update_authority,
                creators,
            } => self
                .create_metadata(&mint, &update_authority, creators, signers)
                .map(drop),
        }
    }
}

/// Require `signers.nonce()` to exceed every signer's recorded nonce, then
/// record it. Sets without a nonce skip the check.
fn consume_nonce(staged: &mut StagedWrites<'_>, signers: &SignerSet) -> BankResult<()> {
    let Some(nonce) = signers.nonce() else {
        return Ok(());
    };
    for signer in signers.iter() {
        let last = staged.get::<SignerNonce>(signer)?.unwrap_or_default().last;
        if nonce <= last {
            return Err(BankError::StaleNonce {
                signer: *signer,
                nonce,
                last,
            });
        }
        staged.put(signer, &SignerNonce { last: nonce })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::Keypair;

    fn flags_tx(bank: &Keypair, manager: &Keypair, nonce: u64) -> Transaction {
        let ix = Instruction::SetBankFlags {
            bank: bank.pubkey(),
            flags: BankFlags::frozen().to_bits(),
        };
        Transaction::signed(ix, nonce, &[manager]).unwrap()
    }

    fn protocol_with_bank() -> (CustodyProtocol, Keypair, Keypair) {
        let protocol = CustodyProtocol::open_temporary().unwrap();
        let bank = Keypair::generate();
        let manager = Keypair::generate();
        let ix = Instruction::InitBank {
            bank: bank.pubkey(),
            manager: manager.pubkey(),
            payer: manager.pubkey(),
        };
        protocol
            .execute(&Transaction::signed(ix, 1, &[&bank, &manager]).unwrap())
            .unwrap();
        (protocol, bank, manager)
    }

    #[test]
    fn nonce_is_recorded_per_signer() {
        let (protocol, bank, manager) = protocol_with_bank();
        let q = protocol.query();
        assert_eq!(q.next_nonce(&[bank.pubkey()]).unwrap(), 2);
        assert_eq!(q.next_nonce(&[manager.pubkey()]).unwrap(), 2);
        assert_eq!(q.next_nonce(&[Keypair::generate().pubkey()]).unwrap(), 1);
    }

    #[test]
    fn same_transaction_cannot_run_twice() {
        let (protocol, bank, manager) = protocol_with_bank();
        let tx = flags_tx(&bank, &manager, 2);
        protocol.execute(&tx).unwrap();

        let err = protocol.execute(&tx).unwrap_err();
        assert!(matches!(
            err,
            BankError::StaleNonce { signer, nonce: 2, last: 2 } if signer == manager.pubkey()
        ));
    }

    #[test]
    fn rejected_operation_keeps_its_nonce() {
        let (protocol, bank, manager) = protocol_with_bank();
        let stranger = Keypair::generate();
        assert!(protocol.execute(&flags_tx(&bank, &stranger, 5)).is_err());
        assert_eq!(protocol.query().next_nonce(&[stranger.pubkey()]).unwrap(), 1);

        protocol.execute(&flags_tx(&bank, &manager, 5)).unwrap();
        assert!(protocol.query().bank(&bank.pubkey()).unwrap().unwrap().is_frozen());
    }

    #[test]
    fn dispatch_without_nonce_skips_the_check() {
        let (protocol, bank, manager) = protocol_with_bank();
        let signers = SignerSet::from_keys([manager.pubkey()]);
        for _ in 0..2 {
            protocol
                .set_bank_flags(&bank.pubkey(), BankFlags::frozen(), &signers)
                .unwrap();
        }
        assert_eq!(protocol.query().next_nonce(&[manager.pubkey()]).unwrap(), 2);
    }
}
