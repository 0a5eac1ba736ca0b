//! # Storage Module
//!
//! The ledger behind the custody protocol.
//!
//! ## Architecture
//!
//! ```text
//! db.rs     — LedgerDB: sled tree of records + index entries, atomic batches
//! staged.rs — StagedWrites: per-operation overlay, committed as one batch
//! query.rs  — QueryIndex: fetch, indexed enumeration, Memcmp filters
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! CustodyProtocol ──► StagedWrites ──commit──► LedgerDB ◄── QueryIndex
//!   (sequenced)        (overlay)      (Batch)    (sled)     (lock-free)
//! ```
//!
//! ## Design Decisions
//!
//! 1. **One tree.** sled batches are atomic per tree, so records and their
//!    index entries share one keyspace separated by a leading tag byte.
//!
//! 2. **Indexes are derived.** Records declare their index entries; the
//!    overlay computes the diff on every put. No caller maintains an index
//!    by hand.
//!
//! 3. **Bincode for on-disk serialization.** Fixed-width fields keep every
//!    address at a known offset, which is what makes `Memcmp` filters work.

pub mod db;
pub mod query;
pub mod staged;

pub use db::{DbError, DbResult, LedgerDB};
pub use query::{Memcmp, QueryIndex};
pub use staged::StagedWrites;
