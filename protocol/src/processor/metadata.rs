//! Asset metadata collaborator.

use tracing::info;

use super::CustodyProtocol;
use crate::authority::SignerSet;
use crate::crypto::keys::Pubkey;
use crate::error::BankResult;
use crate::state::{Creator, Metadata, Mint};

impl CustodyProtocol {
    /// Publish metadata for `mint` at its derived address and return that
    /// address.
    ///
    /// The mint's mint authority must sign. A creator entry may only be
    /// marked verified if that creator signed.
    pub fn create_metadata(
        &self,
        mint: &Pubkey,
        update_authority: &Pubkey,
        creators: Vec<Creator>,
        signers: &SignerSet,
    ) -> BankResult<Pubkey> {
        let (address, _) = self.resolver.metadata(mint)?;

        self.run("create_metadata", signers, |tx| {
            signers.require("update authority", update_authority)?;
            for creator in creators.iter().filter(|c| c.verified) {
                signers.require("verified creator", &creator.address)?;
            }
            let mint_record = tx.load::<Mint>(mint)?;
            signers.require("mint authority", &mint_record.mint_authority)?;
            tx.ensure_vacant::<Metadata>(&address)?;
            tx.put(
                &address,
                &Metadata {
                    update_authority: *update_authority,
                    mint: *mint,
                    creators,
                },
            )
        })?;

        info!(metadata = %address, mint = %mint, "metadata created");
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BankError;

    #[test]
    fn verified_creator_must_sign() {
        let protocol = CustodyProtocol::open_temporary().unwrap();
        let (mint, authority, creator) =
            (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        protocol
            .create_mint(&mint, &authority, 0, &SignerSet::from_keys([mint]))
            .unwrap();

        let creators = vec![Creator {
            address: creator,
            verified: true,
            share: 100,
        }];
        let err = protocol
            .create_metadata(&mint, &authority, creators.clone(), &SignerSet::from_keys([authority]))
            .unwrap_err();
        assert!(matches!(err, BankError::Unauthorized { role: "verified creator", .. }));

        let address = protocol
            .create_metadata(&mint, &authority, creators, &SignerSet::from_keys([authority, creator]))
            .unwrap();
        assert_eq!(address, protocol.resolver().metadata(&mint).unwrap().0);
        assert_eq!(protocol.query().metadata(&address).unwrap().unwrap().mint, mint);
    }

    #[test]
    fn only_mint_authority_publishes_metadata() {
        let protocol = CustodyProtocol::open_temporary().unwrap();
        let (mint, authority, stranger) =
            (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        protocol
            .create_mint(&mint, &authority, 0, &SignerSet::from_keys([mint]))
            .unwrap();

        let creators = vec![Creator {
            address: stranger,
            verified: true,
            share: 100,
        }];
        let err = protocol
            .create_metadata(&mint, &stranger, creators, &SignerSet::from_keys([stranger]))
            .unwrap_err();
        assert!(matches!(
            err,
            BankError::Unauthorized { role: "mint authority", expected } if expected == authority
        ));
        let (address, _) = protocol.resolver().metadata(&mint).unwrap();
        assert!(protocol.query().metadata(&address).unwrap().is_none());
    }
}
