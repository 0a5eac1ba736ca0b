//! Per-operation write set.
//!
//! Every custody operation reads through and writes into a [`StagedWrites`]
//! overlay. Nothing touches the ledger until [`StagedWrites::commit`], which
//! hands the whole overlay to [`LedgerDB::apply`] as a single batch. An
//! operation that fails simply drops its overlay, so a failed precondition
//! can never leave a partial effect behind.
//!
//! Index entries are derived from the records themselves: a put removes the
//! entries of the record it replaces and inserts the entries of the new one.

use std::collections::BTreeMap;

use super::db::{decode, encode, index_key, record_key, DbResult, LedgerDB};
use crate::crypto::keys::Pubkey;
use crate::error::{BankError, BankResult};
use crate::state::Record;

/// Staged puts (`Some`) and deletes (`None`) over a ledger snapshot.
pub struct StagedWrites<'a> {
    db: &'a LedgerDB,
    overlay: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> StagedWrites<'a> {
    pub fn new(db: &'a LedgerDB) -> Self {
        Self {
            db,
            overlay: BTreeMap::new(),
        }
    }

    fn raw(&self, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        match self.overlay.get(key) {
            Some(staged) => Ok(staged.clone()),
            None => self.db.get_raw(key),
        }
    }

    /// The record at `address` as this operation currently sees it.
    pub fn get<R: Record>(&self, address: &Pubkey) -> BankResult<Option<R>> {
        match self.raw(&record_key(R::KIND, address))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Like [`Self::get`], but a missing record is [`BankError::NotFound`].
    pub fn load<R: Record>(&self, address: &Pubkey) -> BankResult<R> {
        self.get(address)?.ok_or(BankError::NotFound {
            kind: R::KIND.name(),
            address: *address,
        })
    }

    pub fn exists<R: Record>(&self, address: &Pubkey) -> BankResult<bool> {
        Ok(self.raw(&record_key(R::KIND, address))?.is_some())
    }

    /// Fail with [`BankError::AlreadyInitialized`] if `address` holds an `R`.
    pub fn ensure_vacant<R: Record>(&self, address: &Pubkey) -> BankResult<()> {
        if self.exists::<R>(address)? {
            return Err(BankError::AlreadyInitialized(*address));
        }
        Ok(())
    }

    /// Stage `record` at `address`, replacing whatever is there.
    pub fn put<R: Record>(&mut self, address: &Pubkey, record: &R) -> BankResult<()> {
        let previous = self.get::<R>(address)?;
        let old_entries = previous.map(|p| p.index_entries()).unwrap_or_default();
        let new_entries = record.index_entries();

        for (index, field) in &old_entries {
            if !new_entries.contains(&(*index, *field)) {
                self.overlay.insert(index_key(*index, field, address), None);
            }
        }
        for (index, field) in &new_entries {
            self.overlay
                .insert(index_key(*index, field, address), Some(Vec::new()));
        }
        self.overlay
            .insert(record_key(R::KIND, address), Some(encode(record)?));
        Ok(())
    }

    /// Stage removal of the `R` at `address`. Returns the removed record.
    pub fn delete<R: Record>(&mut self, address: &Pubkey) -> BankResult<Option<R>> {
        let Some(previous) = self.get::<R>(address)? else {
            return Ok(None);
        };
        for (index, field) in previous.index_entries() {
            self.overlay.insert(index_key(index, &field, address), None);
        }
        self.overlay.insert(record_key(R::KIND, address), None);
        Ok(Some(previous))
    }

    /// Number of staged keys, index entries included.
    pub fn len(&self) -> usize {
        self.overlay.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlay.is_empty()
    }

    /// Apply the overlay to the ledger as one atomic batch.
    pub fn commit(self) -> BankResult<u64> {
        Ok(self.db.apply(self.overlay)?)
    }
}
