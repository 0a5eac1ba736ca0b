//! Whitelist maintenance and deposit-time admission.
//!
//! Admission has two independent paths; either one admits the deposit:
//!
//! 1. **Mint path** — a proof for `(bank, mint)` with the mint bit.
//! 2. **Creator path** — the mint's metadata record, located by derivation
//!    from the mint, lists a *verified* creator whose proof for
//!    `(bank, creator)` carries the creator bit.
//!
//! Enforcement is opt-in per bank: while the bank has no whitelisted mints
//! and no whitelisted creators, every mint is admitted.

use tracing::{debug, info, warn};

use super::CustodyProtocol;
use crate::authority::SignerSet;
use crate::crypto::keys::Pubkey;
use crate::error::{BankError, BankResult};
use crate::state::{Bank, Metadata, WhitelistProof, WhitelistType};
use crate::storage::StagedWrites;

/// Proofs and metadata a depositor offers for admission.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct AdmissionEvidence {
    pub mint_proof: Option<Pubkey>,
    pub metadata: Option<Pubkey>,
    pub creator_proof: Option<Pubkey>,
}

impl CustodyProtocol {
    /// Create or overwrite the proof for `(bank, address)`.
    ///
    /// Re-adding replaces the stored type; it does not merge. Returns the
    /// proof address.
    pub fn add_to_whitelist(
        &self,
        bank: &Pubkey,
        address: &Pubkey,
        whitelist_type: WhitelistType,
        signers: &SignerSet,
    ) -> BankResult<Pubkey> {
        let (proof_address, _) = self.resolver.whitelist_proof(bank, address)?;

        self.run("add_to_whitelist", signers, |tx| {
            let mut bank_record = tx.load::<Bank>(bank)?;
            signers.require("bank manager", &bank_record.manager)?;
            if whitelist_type.is_empty() {
                return Err(BankError::InvalidWhitelistType);
            }

            let previous = tx.get::<WhitelistProof>(&proof_address)?;
            bank_record.apply_whitelist_change(
                previous.map(|p| p.whitelist_type),
                Some(whitelist_type),
            )?;

            tx.put(
                &proof_address,
                &WhitelistProof::new(*bank, *address, whitelist_type),
            )?;
            tx.put(bank, &bank_record)
        })?;

        info!(
            bank = %bank,
            address = %address,
            creator = whitelist_type.creator,
            mint = whitelist_type.mint,
            "whitelist proof written"
        );
        Ok(proof_address)
    }

    /// Delete the proof for `(bank, address)`.
    pub fn remove_from_whitelist(
        &self,
        bank: &Pubkey,
        address: &Pubkey,
        signers: &SignerSet,
    ) -> BankResult<()> {
        let (proof_address, _) = self.resolver.whitelist_proof(bank, address)?;

        self.run("remove_from_whitelist", signers, |tx| {
            let mut bank_record = tx.load::<Bank>(bank)?;
            signers.require("bank manager", &bank_record.manager)?;

            let removed = tx.delete::<WhitelistProof>(&proof_address)?.ok_or(
                BankError::NotFound {
                    kind: "whitelist proof",
                    address: proof_address,
                },
            )?;
            bank_record.apply_whitelist_change(Some(removed.whitelist_type), None)?;
            tx.put(bank, &bank_record)
        })?;

        info!(bank = %bank, address = %address, "whitelist proof removed");
        Ok(())
    }

    /// Admit or reject a deposit of `mint` into a vault of `bank`.
    pub(super) fn check_admission(
        &self,
        tx: &StagedWrites<'_>,
        bank: &Pubkey,
        bank_record: &Bank,
        mint: &Pubkey,
        evidence: AdmissionEvidence,
    ) -> BankResult<()> {
        if !bank_record.whitelist_enforced() {
            return Ok(());
        }

        if let Some(proof_address) = evidence.mint_proof {
            if self.mint_path(tx, bank, mint, &proof_address)? {
                debug!(bank = %bank, mint = %mint, "admitted by mint proof");
                return Ok(());
            }
        }

        if let (Some(metadata), Some(proof_address)) = (evidence.metadata, evidence.creator_proof) {
            if let Some(creator) = self.creator_path(tx, bank, mint, &metadata, &proof_address)? {
                debug!(bank = %bank, mint = %mint, creator = %creator, "admitted by creator proof");
                return Ok(());
            }
        }

        warn!(bank = %bank, mint = %mint, "deposit rejected by whitelist");
        Err(BankError::WhitelistRejected(*mint))
    }

    fn mint_path(
        &self,
        tx: &StagedWrites<'_>,
        bank: &Pubkey,
        mint: &Pubkey,
        proof_address: &Pubkey,
    ) -> BankResult<bool> {
        let (expected, _) = self.resolver.whitelist_proof(bank, mint)?;
        if *proof_address != expected {
            return Ok(false);
        }
        Ok(tx
            .get::<WhitelistProof>(proof_address)?
            .is_some_and(|p| p.bank == *bank && p.admits_mint()))
    }

    /// Returns the creator that admitted the mint, if any.
    fn creator_path(
        &self,
        tx: &StagedWrites<'_>,
        bank: &Pubkey,
        mint: &Pubkey,
        metadata_address: &Pubkey,
        proof_address: &Pubkey,
    ) -> BankResult<Option<Pubkey>> {
        let mismatch = || BankError::MetadataMismatch {
            metadata: *metadata_address,
            mint: *mint,
        };

        let (expected, _) = self.resolver.metadata(mint)?;
        if *metadata_address != expected {
            return Err(mismatch());
        }
        let metadata = tx.get::<Metadata>(metadata_address)?.ok_or_else(mismatch)?;
        if metadata.mint != *mint {
            return Err(mismatch());
        }

        let Some(proof) = tx.get::<WhitelistProof>(proof_address)? else {
            return Ok(None);
        };
        if proof.bank != *bank || !proof.admits_creator() {
            return Ok(None);
        }
        for creator in metadata.verified_creators() {
            if *creator != proof.whitelisted_address {
                continue;
            }
            let (derived, _) = self.resolver.whitelist_proof(bank, creator)?;
            if derived == *proof_address {
                return Ok(Some(*creator));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (CustodyProtocol, Pubkey, SignerSet) {
        let protocol = CustodyProtocol::open_temporary().unwrap();
        let (bank, manager) = (Pubkey::new_unique(), Pubkey::new_unique());
        protocol
            .init_bank(&bank, &manager, &manager, &SignerSet::from_keys([bank, manager]))
            .unwrap();
        (protocol, bank, SignerSet::from_keys([manager]))
    }

    fn counters(protocol: &CustodyProtocol, bank: &Pubkey) -> (u32, u32) {
        let b = protocol.query().bank(bank).unwrap().unwrap();
        (b.whitelisted_mints, b.whitelisted_creators)
    }

    #[test]
    fn add_overwrite_remove_tracks_counters() {
        let (protocol, bank, manager) = setup();
        let addr = Pubkey::new_unique();

        protocol
            .add_to_whitelist(&bank, &addr, WhitelistType::both(), &manager)
            .unwrap();
        assert_eq!(counters(&protocol, &bank), (1, 1));

        // Overwrite, not merge.
        let proof = protocol
            .add_to_whitelist(&bank, &addr, WhitelistType::mint(), &manager)
            .unwrap();
        assert_eq!(counters(&protocol, &bank), (1, 0));
        let stored = protocol.query().whitelist_proof(&proof).unwrap().unwrap();
        assert_eq!(stored.whitelist_type, WhitelistType::mint());

        protocol
            .remove_from_whitelist(&bank, &addr, &manager)
            .unwrap();
        assert_eq!(counters(&protocol, &bank), (0, 0));
        assert!(protocol.query().whitelist_proof(&proof).unwrap().is_none());
    }

    #[test]
    fn remove_missing_proof_is_not_found() {
        let (protocol, bank, manager) = setup();
        let err = protocol
            .remove_from_whitelist(&bank, &Pubkey::new_unique(), &manager)
            .unwrap_err();
        assert!(matches!(err, BankError::NotFound { kind: "whitelist proof", .. }));
    }

    #[test]
    fn empty_type_rejected() {
        let (protocol, bank, manager) = setup();
        let err = protocol
            .add_to_whitelist(&bank, &Pubkey::new_unique(), WhitelistType::default(), &manager)
            .unwrap_err();
        assert!(matches!(err, BankError::InvalidWhitelistType));
        assert_eq!(counters(&protocol, &bank), (0, 0));
    }

    #[test]
    fn only_manager_edits_whitelist() {
        let (protocol, bank, _) = setup();
        let stranger = Pubkey::new_unique();
        let err = protocol
            .add_to_whitelist(
                &bank,
                &stranger,
                WhitelistType::mint(),
                &SignerSet::from_keys([stranger]),
            )
            .unwrap_err();
        assert!(matches!(err, BankError::Unauthorized { .. }));
    }

    #[test]
    fn proofs_are_listed_by_bank() {
        let (protocol, bank, manager) = setup();
        for _ in 0..3 {
            protocol
                .add_to_whitelist(&bank, &Pubkey::new_unique(), WhitelistType::creator(), &manager)
                .unwrap();
        }
        assert_eq!(protocol.query().proofs_by_bank(&bank).unwrap().len(), 3);
    }
}
