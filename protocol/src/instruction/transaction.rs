//! Signed instruction envelope.
//!
//! A [`Transaction`] carries one [`Instruction`] and the Ed25519 signatures
//! of everyone who authorised it. The signed message is the bincode encoding
//! of `(instruction, nonce)`. Verification yields the [`SignerSet`] the
//! processor checks roles against; a single bad signature rejects the whole
//! transaction.
//!
//! The nonce must exceed the last nonce the ledger recorded for each signer.
//! Executing the same transaction twice fails the second time with
//! [`BankError::StaleNonce`]. Use
//! [`crate::storage::QueryIndex::next_nonce`] to pick one.

use serde::{Deserialize, Serialize};

use super::{Instruction, InstructionError};
use crate::authority::SignerSet;
use crate::crypto::keys::{Keypair, Pubkey, Signature};
use crate::error::{BankError, BankResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub instruction: Instruction,
    pub nonce: u64,
    pub signatures: Vec<(Pubkey, Signature)>,
}

impl Transaction {
    /// An unsigned transaction.
    pub fn new(instruction: Instruction, nonce: u64) -> Self {
        Self {
            instruction,
            nonce,
            signatures: Vec::new(),
        }
    }

    /// Build and sign in one step.
    pub fn signed(
        instruction: Instruction,
        nonce: u64,
        signers: &[&Keypair],
    ) -> Result<Self, InstructionError> {
        let mut tx = Self::new(instruction, nonce);
        for kp in signers {
            tx.sign(kp)?;
        }
        Ok(tx)
    }

    pub fn message(&self) -> Result<Vec<u8>, InstructionError> {
        bincode::serialize(&(&self.instruction, self.nonce))
            .map_err(|e| InstructionError::Encoding(e.to_string()))
    }

    /// Add (or replace) `keypair`'s signature.
    pub fn sign(&mut self, keypair: &Keypair) -> Result<(), InstructionError> {
        let message = self.message()?;
        let key = keypair.pubkey();
        let signature = keypair.sign(&message);
        self.signatures.retain(|(k, _)| *k != key);
        self.signatures.push((key, signature));
        Ok(())
    }

    /// Check every signature and every signer the instruction names.
    pub fn verify(&self) -> BankResult<SignerSet> {
        let message = self.message()?;
        let mut signers = SignerSet::new();
        for (key, signature) in &self.signatures {
            if !key.verify(&message, signature) {
                return Err(BankError::InvalidSignature(*key));
            }
            signers.insert(*key);
        }
        for key in self.instruction.named_signers() {
            if !signers.contains(&key) {
                return Err(InstructionError::MissingSignature(key).into());
            }
        }
        Ok(signers.with_nonce(self.nonce))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags_ix(bank: Pubkey) -> Instruction {
        Instruction::SetBankFlags { bank, flags: 1 }
    }

    #[test]
    fn verified_signers_are_returned() {
        let manager = Keypair::generate();
        let tx = Transaction::signed(flags_ix(Pubkey::new_unique()), 1, &[&manager]).unwrap();
        let signers = tx.verify().unwrap();
        assert!(signers.contains(&manager.pubkey()));
        assert_eq!(signers.len(), 1);
        assert_eq!(signers.nonce(), Some(1));
    }

    #[test]
    fn nonce_is_covered_by_signature() {
        let manager = Keypair::generate();
        let mut tx = Transaction::signed(flags_ix(Pubkey::new_unique()), 7, &[&manager]).unwrap();
        tx.nonce = 8;
        assert!(matches!(tx.verify(), Err(BankError::InvalidSignature(_))));
    }

    #[test]
    fn tampered_instruction_fails() {
        let manager = Keypair::generate();
        let mut tx = Transaction::signed(flags_ix(Pubkey::new_unique()), 1, &[&manager]).unwrap();
        tx.instruction = flags_ix(Pubkey::new_unique());
        assert!(matches!(tx.verify(), Err(BankError::InvalidSignature(_))));
    }

    #[test]
    fn signature_from_wrong_key_fails() {
        let manager = Keypair::generate();
        let impostor = Keypair::generate();
        let mut tx = Transaction::signed(flags_ix(Pubkey::new_unique()), 1, &[&impostor]).unwrap();
        let (_, sig) = tx.signatures[0];
        tx.signatures[0] = (manager.pubkey(), sig);
        assert!(matches!(
            tx.verify(),
            Err(BankError::InvalidSignature(k)) if k == manager.pubkey()
        ));
    }

    #[test]
    fn named_signer_must_be_present() {
        let bank = Keypair::generate();
        let payer = Keypair::generate();
        let ix = Instruction::InitBank {
            bank: bank.pubkey(),
            manager: Pubkey::new_unique(),
            payer: payer.pubkey(),
        };
        let tx = Transaction::signed(ix, 1, &[&payer]).unwrap();
        assert!(matches!(
            tx.verify(),
            Err(BankError::Instruction(InstructionError::MissingSignature(k))) if k == bank.pubkey()
        ));
    }

    #[test]
    fn resigning_replaces_signature() {
        let kp = Keypair::generate();
        let mut tx = Transaction::new(flags_ix(Pubkey::new_unique()), 1);
        tx.sign(&kp).unwrap();
        tx.sign(&kp).unwrap();
        assert_eq!(tx.signatures.len(), 1);
    }
}
