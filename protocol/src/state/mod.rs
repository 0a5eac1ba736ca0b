//! # Records
//!
//! Every piece of ledger state the gem bank reads or writes.
//!
//! ```text
//! bank.rs      — Bank: manager, flags, whitelist counters
//! vault.rs     — Vault: per-(bank, creator) custody unit
//! gem.rs       — GemDepositReceipt: per-(vault, mint) balance entry
//! whitelist.rs — WhitelistProof and WhitelistType
//! token.rs     — Mint and TokenAccount (gem boxes are token accounts)
//! metadata.rs  — asset Metadata with its declared creators
//! nonce.rs     — SignerNonce: last executed transaction nonce per signer
//! ```
//!
//! ## Serialization
//!
//! Records are `bincode`-encoded. Addresses serialize as 32 raw bytes with
//! no length prefix, so every address field sits at a fixed offset. Each
//! record type publishes those offsets (e.g. [`Vault::BANK_OFFSET`]) for
//! [`crate::storage::query::Memcmp`] filters.
//!
//! ## Indexes
//!
//! A record declares the secondary indexes it belongs to through
//! [`Record::index_entries`]. The staged write set keeps them in step with
//! the primary record on every put and delete.

pub mod bank;
pub mod gem;
pub mod metadata;
pub mod nonce;
pub mod token;
pub mod vault;
pub mod whitelist;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::crypto::keys::Pubkey;

pub use bank::{Bank, BankFlags};
pub use gem::GemDepositReceipt;
pub use metadata::{Creator, Metadata};
pub use nonce::SignerNonce;
pub use token::{Mint, TokenAccount};
pub use vault::Vault;
pub use whitelist::{WhitelistProof, WhitelistType};

/// Storage tag for each record type. The tag is the first byte of the
/// primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordKind {
    Bank = 0x01,
    Vault = 0x02,
    GemDepositReceipt = 0x03,
    WhitelistProof = 0x04,
    TokenAccount = 0x05,
    Mint = 0x06,
    Metadata = 0x07,
    SignerNonce = 0x08,
}

impl RecordKind {
    pub const ALL: [RecordKind; 8] = [
        RecordKind::Bank,
        RecordKind::Vault,
        RecordKind::GemDepositReceipt,
        RecordKind::WhitelistProof,
        RecordKind::TokenAccount,
        RecordKind::Mint,
        RecordKind::Metadata,
        RecordKind::SignerNonce,
    ];

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            RecordKind::Bank => "bank",
            RecordKind::Vault => "vault",
            RecordKind::GemDepositReceipt => "gem deposit receipt",
            RecordKind::WhitelistProof => "whitelist proof",
            RecordKind::TokenAccount => "token account",
            RecordKind::Mint => "mint",
            RecordKind::Metadata => "metadata",
            RecordKind::SignerNonce => "signer nonce",
        }
    }
}

/// Secondary indexes maintained next to the primary records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IndexKind {
    VaultsByBank = 0x81,
    VaultsByOwner = 0x82,
    GdrsByVault = 0x83,
    ProofsByBank = 0x84,
    BanksByManager = 0x85,
}

impl IndexKind {
    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// A ledger record type.
pub trait Record: Serialize + DeserializeOwned {
    const KIND: RecordKind;

    /// `(index, field value)` pairs this record should be listed under.
    fn index_entries(&self) -> Vec<(IndexKind, Pubkey)> {
        Vec::new()
    }
}
