//! # LedgerDB — Persistent Record Store
//!
//! The persistence layer for the gem bank ledger, built on sled's embedded
//! key-value store. Every record and every secondary index entry lives in a
//! single tree so that one committed operation is one atomic `Batch`.
//!
//! ## Key Layout
//!
//! | Prefix              | Key                                     | Value            |
//! |---------------------|-----------------------------------------|------------------|
//! | `0x00`              | `0x00 ∥ "sequence"`                     | `u64` (8B BE)    |
//! | record tag `0x01..` | `tag ∥ address`                         | `bincode(record)`|
//! | index tag `0x81..`  | `tag ∥ field ∥ address`                 | empty            |
//!
//! Index keys carry the indexed field value before the record address, so a
//! prefix scan over `tag ∥ field` enumerates exactly the records whose field
//! equals `field`, in address order.
//!
//! ## Atomicity
//!
//! [`LedgerDB::apply`] writes all staged puts and deletes plus the bumped
//! sequence number in one `apply_batch` call. sled guarantees a batch on a
//! single tree lands completely or not at all.

use std::path::Path;

use sled::{Batch, Db, Tree};

use crate::crypto::keys::Pubkey;
use crate::state::{IndexKind, Record, RecordKind};

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during ledger store operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("corrupt key in {0} space")]
    CorruptKey(&'static str),
}

pub type DbResult<T> = Result<T, DbError>;

const ACCOUNTS_TREE: &str = "accounts";

/// Reserved prefix for ledger bookkeeping; no record or index uses it.
const META_PREFIX: u8 = 0x00;
const SEQUENCE_KEY: &[u8] = b"\x00sequence";

// ---------------------------------------------------------------------------
// Keys & encoding
// ---------------------------------------------------------------------------

/// Primary key for a record of `kind` at `address`.
pub fn record_key(kind: RecordKind, address: &Pubkey) -> Vec<u8> {
    let mut key = Vec::with_capacity(33);
    key.push(kind.tag());
    key.extend_from_slice(address.as_bytes());
    key
}

/// Scan prefix for every record of `kind`.
pub fn record_prefix(kind: RecordKind) -> [u8; 1] {
    [kind.tag()]
}

/// Index entry listing `address` under `field`.
pub fn index_key(index: IndexKind, field: &Pubkey, address: &Pubkey) -> Vec<u8> {
    let mut key = index_prefix(index, field);
    key.extend_from_slice(address.as_bytes());
    key
}

/// Scan prefix for every entry under `field` in `index`.
pub fn index_prefix(index: IndexKind, field: &Pubkey) -> Vec<u8> {
    let mut key = Vec::with_capacity(65);
    key.push(index.tag());
    key.extend_from_slice(field.as_bytes());
    key
}

pub fn encode<R: Record>(record: &R) -> DbResult<Vec<u8>> {
    bincode::serialize(record).map_err(|e| DbError::Serialization(e.to_string()))
}

pub fn decode<R: Record>(bytes: &[u8]) -> DbResult<R> {
    bincode::deserialize(bytes).map_err(|e| DbError::Serialization(e.to_string()))
}

/// The trailing 32 bytes of a record or index key.
fn trailing_address(key: &[u8], space: &'static str) -> DbResult<Pubkey> {
    if key.len() < 32 {
        return Err(DbError::CorruptKey(space));
    }
    Pubkey::try_from_slice(&key[key.len() - 32..]).map_err(|_| DbError::CorruptKey(space))
}

// ---------------------------------------------------------------------------
// LedgerDB
// ---------------------------------------------------------------------------

/// Persistent ledger store.
///
/// Cloning is cheap; clones share the same underlying sled handles. Reads
/// are lock-free and always observe the latest applied batch.
#[derive(Debug, Clone)]
pub struct LedgerDB {
    db: Db,
    accounts: Tree,
}

impl LedgerDB {
    /// Open or create a ledger at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// An in-memory ledger that disappears when dropped. Used by tests and
    /// the CLI demo.
    pub fn open_temporary() -> DbResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> DbResult<Self> {
        let accounts = db.open_tree(ACCOUNTS_TREE)?;
        Ok(Self { db, accounts })
    }

    // -- Reads --------------------------------------------------------------

    pub fn get_raw(&self, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        Ok(self.accounts.get(key)?.map(|v| v.to_vec()))
    }

    /// Fetch and decode the record of type `R` at `address`.
    pub fn get<R: Record>(&self, address: &Pubkey) -> DbResult<Option<R>> {
        match self.accounts.get(record_key(R::KIND, address))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Raw serialized bytes of the record of `kind` at `address`.
    pub fn get_record_bytes(
        &self,
        kind: RecordKind,
        address: &Pubkey,
    ) -> DbResult<Option<Vec<u8>>> {
        self.get_raw(&record_key(kind, address))
    }

    /// Addresses listed under `field` in `index`, in address order.
    pub fn index_members(&self, index: IndexKind, field: &Pubkey) -> DbResult<Vec<Pubkey>> {
        let mut members = Vec::new();
        for item in self.accounts.scan_prefix(index_prefix(index, field)) {
            let (key, _) = item?;
            members.push(trailing_address(&key, "index")?);
        }
        Ok(members)
    }

    /// Every `(address, serialized record)` of `kind`.
    pub fn scan_kind(&self, kind: RecordKind) -> DbResult<Vec<(Pubkey, Vec<u8>)>> {
        let mut out = Vec::new();
        for item in self.accounts.scan_prefix(record_prefix(kind)) {
            let (key, value) = item?;
            out.push((trailing_address(&key, kind.name())?, value.to_vec()));
        }
        Ok(out)
    }

    /// Number of records of `kind`.
    pub fn record_count(&self, kind: RecordKind) -> usize {
        self.accounts.scan_prefix(record_prefix(kind)).count()
    }

    /// Number of batches applied so far.
    pub fn sequence(&self) -> DbResult<u64> {
        match self.accounts.get(SEQUENCE_KEY)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes[..]
                    .try_into()
                    .map_err(|_| DbError::CorruptKey("sequence"))?;
                Ok(u64::from_be_bytes(raw))
            }
            None => Ok(0),
        }
    }

    // -- Writes -------------------------------------------------------------

    /// Apply a set of writes atomically and bump the sequence number.
    ///
    /// `None` deletes the key. Returns the new sequence number. Callers
    /// must already hold the processor's sequencer; the read of the current
    /// sequence is not itself guarded.
    pub fn apply<I>(&self, writes: I) -> DbResult<u64>
    where
        I: IntoIterator<Item = (Vec<u8>, Option<Vec<u8>>)>,
    {
        let next = self.sequence()? + 1;
        let mut batch = Batch::default();
        for (key, value) in writes {
            debug_assert_ne!(key.first(), Some(&META_PREFIX));
            match value {
                Some(value) => batch.insert(key, value),
                None => batch.remove(key),
            }
        }
        batch.insert(SEQUENCE_KEY, next.to_be_bytes().to_vec());
        self.accounts.apply_batch(batch)?;
        Ok(next)
    }

    /// Block until all applied batches are durable.
    pub fn flush(&self) -> DbResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Bank, Vault};

    fn key(b: u8) -> Pubkey {
        Pubkey::new_from_array([b; 32])
    }

    fn vault(bank: u8, owner: u8) -> Vault {
        Vault::new(key(bank), key(50), key(owner), key(60), 200, "v".into()).unwrap()
    }

    #[test]
    fn open_temporary_database() {
        let db = LedgerDB::open_temporary().expect("should create temp db");
        assert_eq!(db.sequence().unwrap(), 0);
        assert_eq!(db.record_count(RecordKind::Bank), 0);
    }

    #[test]
    fn reopen_persistent_ledger() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let db = LedgerDB::open(dir.path()).unwrap();
            let bank = Bank::new(key(1));
            db.apply([(record_key(RecordKind::Bank, &key(9)), Some(encode(&bank).unwrap()))])
                .unwrap();
            db.flush().unwrap();
        }
        let db = LedgerDB::open(dir.path()).unwrap();
        let bank: Bank = db.get(&key(9)).unwrap().expect("bank persisted");
        assert_eq!(bank.manager, key(1));
        assert_eq!(db.sequence().unwrap(), 1);
    }

    #[test]
    fn apply_bumps_sequence_once_per_batch() {
        let db = LedgerDB::open_temporary().unwrap();
        let writes = vec![
            (record_key(RecordKind::Bank, &key(1)), Some(encode(&Bank::new(key(2))).unwrap())),
            (record_key(RecordKind::Bank, &key(3)), Some(encode(&Bank::new(key(4))).unwrap())),
        ];
        assert_eq!(db.apply(writes).unwrap(), 1);
        assert_eq!(db.record_count(RecordKind::Bank), 2);

        assert_eq!(
            db.apply([(record_key(RecordKind::Bank, &key(1)), None)]).unwrap(),
            2
        );
        assert_eq!(db.record_count(RecordKind::Bank), 1);
    }

    #[test]
    fn kinds_do_not_share_a_keyspace() {
        let db = LedgerDB::open_temporary().unwrap();
        db.apply([(
            record_key(RecordKind::Vault, &key(1)),
            Some(encode(&vault(2, 3)).unwrap()),
        )])
        .unwrap();
        assert!(db.get::<Vault>(&key(1)).unwrap().is_some());
        assert!(db.get::<Bank>(&key(1)).unwrap().is_none());
        assert_eq!(db.scan_kind(RecordKind::Vault).unwrap().len(), 1);
        assert!(db.scan_kind(RecordKind::Bank).unwrap().is_empty());
    }

    #[test]
    fn index_members_are_scoped_by_field() {
        let db = LedgerDB::open_temporary().unwrap();
        db.apply([
            (index_key(IndexKind::VaultsByBank, &key(1), &key(10)), Some(Vec::new())),
            (index_key(IndexKind::VaultsByBank, &key(1), &key(11)), Some(Vec::new())),
            (index_key(IndexKind::VaultsByBank, &key(2), &key(12)), Some(Vec::new())),
            (index_key(IndexKind::VaultsByOwner, &key(1), &key(13)), Some(Vec::new())),
        ])
        .unwrap();

        assert_eq!(
            db.index_members(IndexKind::VaultsByBank, &key(1)).unwrap(),
            vec![key(10), key(11)]
        );
        assert_eq!(
            db.index_members(IndexKind::VaultsByBank, &key(2)).unwrap(),
            vec![key(12)]
        );
    }

    #[test]
    fn sequence_key_is_not_a_record() {
        let db = LedgerDB::open_temporary().unwrap();
        db.apply(Vec::<(Vec<u8>, Option<Vec<u8>>)>::new()).unwrap();
        for kind in RecordKind::ALL {
            assert_eq!(db.record_count(kind), 0);
        }
    }
}
