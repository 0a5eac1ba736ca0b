//! Bank lifecycle and policy.

use tracing::info;

use super::CustodyProtocol;
use crate::authority::SignerSet;
use crate::crypto::keys::Pubkey;
use crate::error::BankResult;
use crate::state::{Bank, BankFlags};

impl CustodyProtocol {
    /// Create a bank at a keypair-backed address.
    ///
    /// The bank key and the payer must both sign. Flags start cleared and
    /// the whitelist starts empty.
    pub fn init_bank(
        &self,
        bank: &Pubkey,
        manager: &Pubkey,
        payer: &Pubkey,
        signers: &SignerSet,
    ) -> BankResult<()> {
        self.run("init_bank", signers, |tx| {
            signers.require("bank", bank)?;
            signers.require("payer", payer)?;
            tx.ensure_vacant::<Bank>(bank)?;
            tx.put(bank, &Bank::new(*manager))
        })?;
        info!(bank = %bank, manager = %manager, "bank initialized");
        Ok(())
    }

    /// Hand the bank to a new manager. Only the current manager can.
    pub fn update_bank_manager(
        &self,
        bank: &Pubkey,
        new_manager: &Pubkey,
        signers: &SignerSet,
    ) -> BankResult<()> {
        self.run("update_bank_manager", signers, |tx| {
            let mut record = tx.load::<Bank>(bank)?;
            signers.require("bank manager", &record.manager)?;
            record.manager = *new_manager;
            tx.put(bank, &record)
        })?;
        info!(bank = %bank, manager = %new_manager, "bank manager updated");
        Ok(())
    }

    /// Replace the bank flags.
    ///
    /// `freeze_vaults` blocks vault creation, deposits, withdrawals and lock
    /// changes under this bank until it is cleared again.
    pub fn set_bank_flags(
        &self,
        bank: &Pubkey,
        flags: BankFlags,
        signers: &SignerSet,
    ) -> BankResult<()> {
        self.run("set_bank_flags", signers, |tx| {
            let mut record = tx.load::<Bank>(bank)?;
            signers.require("bank manager", &record.manager)?;
            record.flags = flags;
            tx.put(bank, &record)
        })?;
        info!(bank = %bank, freeze_vaults = flags.freeze_vaults, "bank flags set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BankError;

    fn key(b: u8) -> Pubkey {
        Pubkey::new_from_array([b; 32])
    }

    fn setup() -> (CustodyProtocol, Pubkey, Pubkey) {
        let protocol = CustodyProtocol::open_temporary().unwrap();
        let (bank, manager, payer) = (key(1), key(2), key(3));
        protocol
            .init_bank(&bank, &manager, &payer, &SignerSet::from_keys([bank, payer]))
            .unwrap();
        (protocol, bank, manager)
    }

    #[test]
    fn init_bank_twice_fails() {
        let (protocol, bank, manager) = setup();
        let err = protocol
            .init_bank(&bank, &manager, &key(3), &SignerSet::from_keys([bank, key(3)]))
            .unwrap_err();
        assert!(matches!(err, BankError::AlreadyInitialized(a) if a == bank));
    }

    #[test]
    fn init_bank_requires_bank_signature() {
        let protocol = CustodyProtocol::open_temporary().unwrap();
        let err = protocol
            .init_bank(&key(1), &key(2), &key(3), &SignerSet::from_keys([key(3)]))
            .unwrap_err();
        assert!(matches!(err, BankError::Unauthorized { role: "bank", .. }));
        assert!(protocol.query().bank(&key(1)).unwrap().is_none());
    }

    #[test]
    fn only_manager_updates_manager() {
        let (protocol, bank, manager) = setup();
        let err = protocol
            .update_bank_manager(&bank, &key(9), &SignerSet::from_keys([key(9)]))
            .unwrap_err();
        assert!(matches!(err, BankError::Unauthorized { role: "bank manager", .. }));

        protocol
            .update_bank_manager(&bank, &key(9), &SignerSet::from_keys([manager]))
            .unwrap();
        assert_eq!(protocol.query().bank(&bank).unwrap().unwrap().manager, key(9));

        // The old manager has lost control.
        assert!(protocol
            .set_bank_flags(&bank, BankFlags::frozen(), &SignerSet::from_keys([manager]))
            .is_err());
    }

    #[test]
    fn flags_are_stored() {
        let (protocol, bank, manager) = setup();
        protocol
            .set_bank_flags(&bank, BankFlags::frozen(), &SignerSet::from_keys([manager]))
            .unwrap();
        assert!(protocol.query().bank(&bank).unwrap().unwrap().is_frozen());
    }

    #[test]
    fn missing_bank_is_not_found() {
        let protocol = CustodyProtocol::open_temporary().unwrap();
        let err = protocol
            .set_bank_flags(&key(1), BankFlags::default(), &SignerSet::new())
            .unwrap_err();
        assert!(matches!(err, BankError::NotFound { kind: "bank", .. }));
    }
}
