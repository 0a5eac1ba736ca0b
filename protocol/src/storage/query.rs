//! # QueryIndex — Read Side
//!
//! Read-only access to committed ledger state: fetch one record by address,
//! enumerate records through a secondary index, or filter records by a byte
//! range of their serialized form.
//!
//! Queries go straight to sled and never take the processor's sequencer, so
//! they never block writers. Every call reads the latest committed state;
//! nothing is cached between calls.
//!
//! ## Filters
//!
//! A [`Memcmp`] compares `bytes` against the serialized record at `offset`.
//! Record types publish the offsets of their address fields, e.g.
//! `Memcmp::new(Vault::OWNER_OFFSET, owner)`.

use serde::Serialize;

use super::db::{decode, DbResult, LedgerDB};
use crate::crypto::keys::Pubkey;
use crate::state::{
    Bank, GemDepositReceipt, IndexKind, Metadata, Mint, Record, RecordKind, SignerNonce,
    TokenAccount, Vault, WhitelistProof,
};

/// Byte-range equality predicate over a serialized record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Memcmp {
    pub offset: usize,
    pub bytes: Vec<u8>,
}

impl Memcmp {
    pub fn new(offset: usize, bytes: impl AsRef<[u8]>) -> Self {
        Self {
            offset,
            bytes: bytes.as_ref().to_vec(),
        }
    }

    /// False when the window runs past `data` or past `usize::MAX`.
    pub fn matches(&self, data: &[u8]) -> bool {
        let Some(end) = self.offset.checked_add(self.bytes.len()) else {
            return false;
        };
        data.get(self.offset..end) == Some(self.bytes.as_slice())
    }
}

/// Read-only view of the ledger.
#[derive(Debug, Clone)]
pub struct QueryIndex {
    db: LedgerDB,
}

impl QueryIndex {
    pub fn new(db: LedgerDB) -> Self {
        Self { db }
    }

    // -- Fetch by address ---------------------------------------------------

    pub fn bank(&self, address: &Pubkey) -> DbResult<Option<Bank>> {
        self.db.get(address)
    }

    pub fn vault(&self, address: &Pubkey) -> DbResult<Option<Vault>> {
        self.db.get(address)
    }

    pub fn gdr(&self, address: &Pubkey) -> DbResult<Option<GemDepositReceipt>> {
        self.db.get(address)
    }

    pub fn whitelist_proof(&self, address: &Pubkey) -> DbResult<Option<WhitelistProof>> {
        self.db.get(address)
    }

    /// Gem boxes are token accounts, so this fetches either.
    pub fn token_account(&self, address: &Pubkey) -> DbResult<Option<TokenAccount>> {
        self.db.get(address)
    }

    pub fn mint(&self, address: &Pubkey) -> DbResult<Option<Mint>> {
        self.db.get(address)
    }

    pub fn metadata(&self, address: &Pubkey) -> DbResult<Option<Metadata>> {
        self.db.get(address)
    }

    /// Smallest nonce every one of `signers` can still use.
    pub fn next_nonce(&self, signers: &[Pubkey]) -> DbResult<u64> {
        let mut last = 0;
        for signer in signers {
            if let Some(record) = self.db.get::<SignerNonce>(signer)? {
                last = last.max(record.last);
            }
        }
        Ok(last.saturating_add(1))
    }

    // -- Indexed enumeration ------------------------------------------------

    pub fn vaults_by_bank(&self, bank: &Pubkey) -> DbResult<Vec<(Pubkey, Vault)>> {
        self.indexed(IndexKind::VaultsByBank, bank, &[])
    }

    pub fn vaults_by_owner(&self, owner: &Pubkey) -> DbResult<Vec<(Pubkey, Vault)>> {
        self.indexed(IndexKind::VaultsByOwner, owner, &[])
    }

    pub fn gdrs_by_vault(&self, vault: &Pubkey) -> DbResult<Vec<(Pubkey, GemDepositReceipt)>> {
        self.indexed(IndexKind::GdrsByVault, vault, &[])
    }

    pub fn proofs_by_bank(&self, bank: &Pubkey) -> DbResult<Vec<(Pubkey, WhitelistProof)>> {
        self.indexed(IndexKind::ProofsByBank, bank, &[])
    }

    pub fn banks_by_manager(&self, manager: &Pubkey) -> DbResult<Vec<(Pubkey, Bank)>> {
        self.indexed(IndexKind::BanksByManager, manager, &[])
    }

    /// Records listed under `field` in `index`, narrowed by `filters`.
    ///
    /// The index picks the candidates; filters only look at those, never
    /// at the whole keyspace.
    pub fn indexed<R: Record>(
        &self,
        index: IndexKind,
        field: &Pubkey,
        filters: &[Memcmp],
    ) -> DbResult<Vec<(Pubkey, R)>> {
        let mut out = Vec::new();
        for address in self.db.index_members(index, field)? {
            // An index entry and its record are written in the same batch;
            // a missing record means the entry belongs to another kind.
            let Some(bytes) = self.db.get_record_bytes(R::KIND, &address)? else {
                continue;
            };
            if filters.iter().all(|f| f.matches(&bytes)) {
                out.push((address, decode(&bytes)?));
            }
        }
        Ok(out)
    }

    /// Every record of type `R` that passes all `filters`.
    ///
    /// Walks every record of the kind. Prefer an indexed enumeration when
    /// one exists for the field.
    pub fn filter<R: Record>(&self, filters: &[Memcmp]) -> DbResult<Vec<(Pubkey, R)>> {
        let mut out = Vec::new();
        for (address, bytes) in self.db.scan_kind(R::KIND)? {
            if filters.iter().all(|f| f.matches(&bytes)) {
                out.push((address, decode(&bytes)?));
            }
        }
        Ok(out)
    }

    pub fn count(&self, kind: RecordKind) -> usize {
        self.db.record_count(kind)
    }

    /// Ledger sequence number of the latest committed operation.
    pub fn sequence(&self) -> DbResult<u64> {
        self.db.sequence()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::staged::StagedWrites;

    fn key(b: u8) -> Pubkey {
        Pubkey::new_from_array([b; 32])
    }

    fn seeded() -> QueryIndex {
        let db = LedgerDB::open_temporary().unwrap();
        let mut staged = StagedWrites::new(&db);
        staged.put(&key(1), &Bank::new(key(100))).unwrap();
        staged.put(&key(2), &Bank::new(key(101))).unwrap();
        for (addr, bank, owner) in [(10u8, 1u8, 50u8), (11, 1, 51), (12, 2, 50)] {
            let v = Vault::new(key(bank), key(addr), key(owner), key(0), 255, "v".into()).unwrap();
            staged.put(&key(addr), &v).unwrap();
        }
        staged.commit().unwrap();
        QueryIndex::new(db)
    }

    #[test]
    fn memcmp_bounds() {
        let f = Memcmp::new(2, [7u8, 8]);
        assert!(f.matches(&[0, 0, 7, 8]));
        assert!(!f.matches(&[0, 0, 7, 9]));
        assert!(!f.matches(&[0, 0, 7]));
    }

    #[test]
    fn memcmp_offset_overflow_is_no_match() {
        let f = Memcmp::new(usize::MAX, [1u8]);
        assert!(!f.matches(&[1, 1, 1]));
    }

    #[test]
    fn next_nonce_takes_the_highest_signer() {
        let db = LedgerDB::open_temporary().unwrap();
        let mut staged = StagedWrites::new(&db);
        staged.put(&key(1), &SignerNonce { last: 4 }).unwrap();
        staged.put(&key(2), &SignerNonce { last: 9 }).unwrap();
        staged.commit().unwrap();

        let q = QueryIndex::new(db);
        assert_eq!(q.next_nonce(&[key(1)]).unwrap(), 5);
        assert_eq!(q.next_nonce(&[key(1), key(2)]).unwrap(), 10);
        assert_eq!(q.next_nonce(&[key(3)]).unwrap(), 1);
    }

    #[test]
    fn vaults_by_bank_only_lists_that_bank() {
        let q = seeded();
        let vaults = q.vaults_by_bank(&key(1)).unwrap();
        let addrs: Vec<_> = vaults.iter().map(|(a, _)| *a).collect();
        assert_eq!(addrs, vec![key(10), key(11)]);
        assert!(vaults.iter().all(|(_, v)| v.bank == key(1)));
    }

    #[test]
    fn indexed_candidates_can_be_filtered() {
        let q = seeded();
        let owned: Vec<(Pubkey, Vault)> = q
            .indexed(
                IndexKind::VaultsByBank,
                &key(1),
                &[Memcmp::new(Vault::OWNER_OFFSET, key(51))],
            )
            .unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].0, key(11));
    }

    #[test]
    fn full_filter_matches_index() {
        let q = seeded();
        let by_filter: Vec<(Pubkey, Vault)> = q
            .filter(&[Memcmp::new(Vault::OWNER_OFFSET, key(50))])
            .unwrap();
        let by_index = q.vaults_by_owner(&key(50)).unwrap();
        assert_eq!(by_filter, by_index);
        assert_eq!(by_index.len(), 2);
    }

    #[test]
    fn banks_by_manager() {
        let q = seeded();
        let banks = q.banks_by_manager(&key(101)).unwrap();
        assert_eq!(banks.len(), 1);
        assert_eq!(banks[0].0, key(2));
        assert_eq!(q.count(RecordKind::Bank), 2);
    }
}
