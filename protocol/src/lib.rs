// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Gem Bank — Custody Protocol
//!
//! A bank holds isolated vaults; each vault warehouses deposited tokens for
//! its owner in per-mint gem boxes, with admission gated by a whitelist and
//! subject to a bank-wide freeze and per-vault locks.
//!
//! ## Architecture
//!
//! - **crypto** — addresses, Ed25519 keys, and derived (private-key-less)
//!   addresses with re-derivation proofs.
//! - **state** — the records: Bank, Vault, GemDepositReceipt,
//!   WhitelistProof, plus the token and metadata records custody reads.
//! - **authority** — user signers vs. protocol-derived authorities.
//! - **processor** — `CustodyProtocol`, the operation set and its rules.
//! - **instruction** — serializable instructions and signed transactions.
//! - **storage** — sled ledger, per-operation overlay, query index.
//! - **client** — derived-address helpers and instruction builders.
//! - **config** — program ids, seed namespaces, limits.
//!
//! ## Invariants
//!
//! 1. A vault address is a pure function of `(bank, creator)`; at most one
//!    vault per pair ever exists.
//! 2. A gem box and its receipt are a pure function of `(vault, mint)`.
//! 3. The vault authority has no private key. Only re-derivation lets the
//!    protocol act as it.
//! 4. A receipt's amount always equals its gem box balance.
//! 5. Every operation commits completely or not at all.

pub mod authority;
pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod instruction;
pub mod math;
pub mod processor;
pub mod state;
pub mod storage;

pub use authority::{Authority, SignerSet};
pub use client::GemBankClient;
pub use config::ProtocolConfig;
pub use crypto::{DerivedAddressResolver, Keypair, Pubkey};
pub use error::{BankError, BankResult};
pub use instruction::{Instruction, Transaction};
pub use processor::{CustodyProtocol, DepositGem, WithdrawGem};
pub use storage::{LedgerDB, QueryIndex};
