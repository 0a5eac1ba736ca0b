//! Asset metadata as published by the metadata program.
//!
//! Only the parts the creator whitelist path reads are modelled: the mint
//! the record describes and its declared creators.

use serde::{Deserialize, Serialize};

use super::{Record, RecordKind};
use crate::crypto::keys::Pubkey;

/// One entry of a metadata creator list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub address: Pubkey,

    /// The creator signed off on this asset. Unverified entries are
    /// ignored by the whitelist check; anyone can list anyone.
    pub verified: bool,

    /// Royalty share in percent. Carried, never interpreted here.
    pub share: u8,
}

/// Metadata record at `["metadata", metadata_program, mint]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub update_authority: Pubkey,
    pub mint: Pubkey,
    pub creators: Vec<Creator>,
}

impl Metadata {
    pub fn verified_creators(&self) -> impl Iterator<Item = &Pubkey> {
        self.creators
            .iter()
            .filter(|c| c.verified)
            .map(|c| &c.address)
    }
}

impl Record for Metadata {
    const KIND: RecordKind = RecordKind::Metadata;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unverified_creators_are_skipped() {
        let a = Pubkey::new_from_array([1u8; 32]);
        let b = Pubkey::new_from_array([2u8; 32]);
        let meta = Metadata {
            update_authority: a,
            mint: Pubkey::new_from_array([9u8; 32]),
            creators: vec![
                Creator {
                    address: a,
                    verified: true,
                    share: 50,
                },
                Creator {
                    address: b,
                    verified: false,
                    share: 50,
                },
            ],
        };
        let verified: Vec<_> = meta.verified_creators().collect();
        assert_eq!(verified, vec![&a]);
    }
}
