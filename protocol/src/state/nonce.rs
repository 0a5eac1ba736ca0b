//! Per-signer replay protection.

use serde::{Deserialize, Serialize};

use super::{Record, RecordKind};

/// Highest transaction nonce a signer has had executed. Stored at the
/// signer's own address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerNonce {
    pub last: u64,
}

impl Record for SignerNonce {
    const KIND: RecordKind = RecordKind::SignerNonce;
}
