//! Vault lifecycle.

use tracing::info;

use super::CustodyProtocol;
use crate::authority::SignerSet;
use crate::crypto::keys::Pubkey;
use crate::error::{BankError, BankResult};
use crate::math::TryAdd;
use crate::state::{Bank, Vault};

/// `vault` must be recorded under `bank`.
pub(super) fn check_vault_bank(vault: &Vault, bank: &Pubkey) -> BankResult<()> {
    if vault.bank != *bank {
        return Err(BankError::AccountMismatch {
            what: "vault bank",
            expected: vault.bank,
            got: *bank,
        });
    }
    Ok(())
}

impl CustodyProtocol {
    /// Create the vault for `(bank, creator)` and return its address.
    ///
    /// The address is derived, so each creator gets at most one vault per
    /// bank; a second call fails with [`BankError::AlreadyInitialized`].
    pub fn init_vault(
        &self,
        bank: &Pubkey,
        creator: &Pubkey,
        payer: &Pubkey,
        owner: &Pubkey,
        name: String,
        signers: &SignerSet,
    ) -> BankResult<Pubkey> {
        let (address, _) = self.resolver.vault(bank, creator)?;
        let (authority, bump) = self.resolver.vault_authority(&address)?;

        self.run("init_vault", signers, |tx| {
            signers.require("vault creator", creator)?;
            signers.require("payer", payer)?;

            let mut bank_record = tx.load::<Bank>(bank)?;
            if bank_record.is_frozen() {
                return Err(BankError::BankFrozen(*bank));
            }
            tx.ensure_vacant::<Vault>(&address)?;

            let vault = Vault::new(*bank, *creator, *owner, authority, bump, name)?;
            bank_record.vault_count.try_add_assign(1)?;

            tx.put(&address, &vault)?;
            tx.put(bank, &bank_record)
        })?;

        info!(bank = %bank, vault = %address, creator = %creator, owner = %owner, "vault initialized");
        Ok(address)
    }

    /// Transfer ownership. The current owner signs, not the creator.
    pub fn update_vault_owner(
        &self,
        bank: &Pubkey,
        vault: &Pubkey,
        new_owner: &Pubkey,
        signers: &SignerSet,
    ) -> BankResult<()> {
        self.run("update_vault_owner", signers, |tx| {
            let mut record = tx.load::<Vault>(vault)?;
            check_vault_bank(&record, bank)?;
            signers.require("vault owner", &record.owner)?;
            record.owner = *new_owner;
            tx.put(vault, &record)
        })?;
        info!(vault = %vault, owner = %new_owner, "vault owner updated");
        Ok(())
    }

    /// Lock or unlock a vault. Only the bank manager can, and not while the
    /// bank is frozen.
    pub fn set_vault_lock(
        &self,
        bank: &Pubkey,
        vault: &Pubkey,
        locked: bool,
        signers: &SignerSet,
    ) -> BankResult<()> {
        self.run("set_vault_lock", signers, |tx| {
            let bank_record = tx.load::<Bank>(bank)?;
            signers.require("bank manager", &bank_record.manager)?;

            let mut record = tx.load::<Vault>(vault)?;
            check_vault_bank(&record, bank)?;
            if bank_record.is_frozen() {
                return Err(BankError::BankFrozen(*bank));
            }

            record.locked = locked;
            tx.put(vault, &record)
        })?;
        info!(vault = %vault, locked, "vault lock set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::BankFlags;

    struct Fixture {
        protocol: CustodyProtocol,
        bank: Pubkey,
        manager: Pubkey,
        creator: Pubkey,
        owner: Pubkey,
    }

    fn fixture() -> Fixture {
        let protocol = CustodyProtocol::open_temporary().unwrap();
        let (bank, manager, creator, owner) = (
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
        );
        protocol
            .init_bank(&bank, &manager, &manager, &SignerSet::from_keys([bank, manager]))
            .unwrap();
        Fixture {
            protocol,
            bank,
            manager,
            creator,
            owner,
        }
    }

    fn init(f: &Fixture) -> BankResult<Pubkey> {
        f.protocol.init_vault(
            &f.bank,
            &f.creator,
            &f.creator,
            &f.owner,
            "vault".into(),
            &SignerSet::from_keys([f.creator]),
        )
    }

    #[test]
    fn init_records_authority_and_counts() {
        let f = fixture();
        let address = init(&f).unwrap();

        let q = f.protocol.query();
        let vault = q.vault(&address).unwrap().unwrap();
        let (authority, bump) = f.protocol.resolver().vault_authority(&address).unwrap();
        assert_eq!(vault.authority, authority);
        assert_eq!(vault.authority_bump, bump);
        assert_eq!(vault.creator, f.creator);
        assert_eq!(q.bank(&f.bank).unwrap().unwrap().vault_count, 1);
    }

    #[test]
    fn init_needs_creator_signature() {
        let f = fixture();
        let err = f
            .protocol
            .init_vault(
                &f.bank,
                &f.creator,
                &f.owner,
                &f.owner,
                "vault".into(),
                &SignerSet::from_keys([f.owner]),
            )
            .unwrap_err();
        assert!(matches!(err, BankError::Unauthorized { role: "vault creator", .. }));
    }

    #[test]
    fn frozen_bank_blocks_vault_creation() {
        let f = fixture();
        f.protocol
            .set_bank_flags(&f.bank, BankFlags::frozen(), &SignerSet::from_keys([f.manager]))
            .unwrap();
        assert!(matches!(init(&f), Err(BankError::BankFrozen(_))));
    }

    #[test]
    fn creator_cannot_change_owner() {
        let f = fixture();
        let vault = init(&f).unwrap();
        let err = f
            .protocol
            .update_vault_owner(&f.bank, &vault, &f.creator, &SignerSet::from_keys([f.creator]))
            .unwrap_err();
        assert!(matches!(err, BankError::Unauthorized { role: "vault owner", .. }));

        let next = Pubkey::new_unique();
        f.protocol
            .update_vault_owner(&f.bank, &vault, &next, &SignerSet::from_keys([f.owner]))
            .unwrap();
        assert_eq!(f.protocol.query().vault(&vault).unwrap().unwrap().owner, next);
    }

    #[test]
    fn owner_cannot_lock_but_manager_can() {
        let f = fixture();
        let vault = init(&f).unwrap();
        assert!(f
            .protocol
            .set_vault_lock(&f.bank, &vault, true, &SignerSet::from_keys([f.owner]))
            .is_err());

        f.protocol
            .set_vault_lock(&f.bank, &vault, true, &SignerSet::from_keys([f.manager]))
            .unwrap();
        assert!(f.protocol.query().vault(&vault).unwrap().unwrap().locked);
    }

    #[test]
    fn lock_change_blocked_while_frozen() {
        let f = fixture();
        let vault = init(&f).unwrap();
        let manager = SignerSet::from_keys([f.manager]);
        f.protocol
            .set_bank_flags(&f.bank, BankFlags::frozen(), &manager)
            .unwrap();
        assert!(matches!(
            f.protocol.set_vault_lock(&f.bank, &vault, true, &manager),
            Err(BankError::BankFrozen(_))
        ));
    }

    #[test]
    fn vault_must_belong_to_bank() {
        let f = fixture();
        let vault = init(&f).unwrap();

        let other_bank = Pubkey::new_unique();
        f.protocol
            .init_bank(
                &other_bank,
                &f.manager,
                &f.manager,
                &SignerSet::from_keys([other_bank, f.manager]),
            )
            .unwrap();
        let err = f
            .protocol
            .set_vault_lock(&other_bank, &vault, true, &SignerSet::from_keys([f.manager]))
            .unwrap_err();
        assert!(matches!(err, BankError::AccountMismatch { what: "vault bank", .. }));
    }
}
