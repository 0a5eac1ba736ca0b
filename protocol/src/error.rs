//! Error types for the custody protocol.
//!
//! Every operation returns [`BankError`]. A returned error always means the
//! operation committed nothing: the staged write set is dropped on the floor.

use thiserror::Error;

use crate::crypto::keys::Pubkey;
use crate::crypto::pda::DerivationError;
use crate::instruction::InstructionError;
use crate::storage::db::DbError;

/// Errors raised by the custody protocol.
#[derive(Debug, Error)]
pub enum BankError {
    /// The target address already holds a record.
    #[error("account {0} is already initialized")]
    AlreadyInitialized(Pubkey),

    /// A required signer did not sign, or signed as the wrong role.
    #[error("{expected} must sign as {role}")]
    Unauthorized {
        /// The role that was being checked (manager, owner, ...).
        role: &'static str,
        /// The address that should have signed.
        expected: Pubkey,
    },

    /// The bank has `freeze_vaults` set.
    #[error("bank {0} has frozen vault access")]
    BankFrozen(Pubkey),

    /// The vault is locked by the bank manager.
    #[error("vault {0} is locked")]
    VaultLocked(Pubkey),

    /// Tried to move more than the receipt records.
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        /// Amount requested.
        requested: u64,
        /// Amount held.
        available: u64,
    },

    /// Neither the mint path nor the creator path admitted the deposit.
    #[error("mint {0} is not whitelisted for this bank")]
    WhitelistRejected(Pubkey),

    /// The supplied metadata does not belong to the deposited mint.
    #[error("metadata {metadata} does not describe mint {mint}")]
    MetadataMismatch {
        /// The metadata account that was supplied.
        metadata: Pubkey,
        /// The mint being deposited.
        mint: Pubkey,
    },

    /// Zero amounts are rejected.
    #[error("amount must be greater than zero")]
    InvalidAmount,

    /// Address derivation found no off-curve candidate.
    #[error("address derivation exhausted the nonce space")]
    DerivationExhausted,

    /// Seeds violated the derivation limits.
    #[error("invalid derivation seeds: {0}")]
    InvalidSeeds(DerivationError),

    /// No record of the expected kind at this address.
    #[error("{kind} {address} not found")]
    NotFound {
        /// Record kind that was looked up.
        kind: &'static str,
        /// The address that was looked up.
        address: Pubkey,
    },

    /// A supplied account does not match the one the seeds or the
    /// records imply.
    #[error("account mismatch for {what}: expected {expected}, got {got}")]
    AccountMismatch {
        /// Which relationship failed.
        what: &'static str,
        /// The address the protocol derived or recorded.
        expected: Pubkey,
        /// The address the caller supplied.
        got: Pubkey,
    },

    /// A whitelist type with neither bit set.
    #[error("whitelist type must include creator or mint")]
    InvalidWhitelistType,

    /// Vault names are limited to 32 bytes.
    #[error("vault name is {0} bytes, limit is 32")]
    NameTooLong(usize),

    /// Checked arithmetic failed.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    /// A transaction signature failed verification.
    #[error("invalid signature for {0}")]
    InvalidSignature(Pubkey),

    /// The transaction nonce does not exceed the last one executed for
    /// this signer. Replays land here.
    #[error("stale nonce {nonce} for {signer}: last executed was {last}")]
    StaleNonce {
        /// The signer whose nonce was checked.
        signer: Pubkey,
        /// Nonce carried by the transaction.
        nonce: u64,
        /// Last nonce recorded for the signer.
        last: u64,
    },

    /// The instruction could not be encoded, decoded, or lacks a signer.
    #[error(transparent)]
    Instruction(#[from] InstructionError),

    /// The ledger store failed underneath the protocol.
    #[error("storage error: {0}")]
    Storage(#[from] DbError),
}

impl From<DerivationError> for BankError {
    fn from(e: DerivationError) -> Self {
        match e {
            DerivationError::Exhausted => BankError::DerivationExhausted,
            other => BankError::InvalidSeeds(other),
        }
    }
}

/// Convenience alias used throughout the processor.
pub type BankResult<T> = Result<T, BankError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhaustion_maps_to_its_own_variant() {
        let err: BankError = DerivationError::Exhausted.into();
        assert!(matches!(err, BankError::DerivationExhausted));
    }

    #[test]
    fn other_derivation_errors_are_invalid_seeds() {
        let err: BankError = DerivationError::TooManySeeds(17).into();
        assert!(matches!(err, BankError::InvalidSeeds(_)));
    }

    #[test]
    fn messages_name_the_account() {
        let key = Pubkey::new_from_array([1u8; 32]);
        let msg = BankError::VaultLocked(key).to_string();
        assert!(msg.contains(&key.to_string()));
    }
}
