//! # Derived Addresses
//!
//! Deterministic, private-key-less addresses computed from a seed list and a
//! program id. The gem bank uses them for every record it owns (vaults, gem
//! boxes, deposit receipts, whitelist proofs) and for the vault custody
//! authority that signs token movements out of a gem box.
//!
//! ## Construction
//!
//! ```text
//! candidate(nonce) = SHA-256(seed_0 ∥ … ∥ seed_n ∥ [nonce] ∥ program_id ∥ "ProgramDerivedAddress")
//! ```
//!
//! `seed_0` is always a namespace tag (`b"vault"`, `b"gem_box"`, ...), so two
//! derivations over the same entity addresses but different tags hash
//! different preimages. A candidate is accepted only if it is *not* a valid
//! Ed25519 point: no secret key exists for it, so the only way to act as that
//! address is to re-derive it from the same seeds.
//!
//! ## Nonce search
//!
//! [`find_program_address`] walks the nonce from 255 down to 0 and stops at
//! the first off-curve candidate. Roughly half of all hashes are off-curve,
//! so in practice the first or second candidate wins. If all 256 fail, the
//! search returns [`DerivationError::Exhausted`] instead of looping.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::hash::hashv;
use super::keys::Pubkey;
use crate::config::{
    ProtocolConfig, AUTHORITY_SEED, GDR_SEED, GEM_BOX_SEED, MAX_SEEDS, MAX_SEED_LEN,
    METADATA_SEED, PDA_MARKER, VAULT_SEED, WHITELIST_SEED,
};

/// Errors from address derivation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DerivationError {
    /// A seed longer than [`MAX_SEED_LEN`] bytes.
    #[error("seed {index} is {len} bytes, limit is {}", MAX_SEED_LEN)]
    MaxSeedLengthExceeded { index: usize, len: usize },

    /// More than [`MAX_SEEDS`] seeds.
    #[error("{0} seeds supplied, limit is {}", MAX_SEEDS)]
    TooManySeeds(usize),

    /// The candidate for an explicit nonce is on the curve.
    #[error("seeds and nonce {0} produce an on-curve address")]
    OnCurve(u8),

    /// No nonce in `0..=255` produced an off-curve address.
    #[error("no off-curve address in the nonce space")]
    Exhausted,
}

fn check_seeds(seeds: &[&[u8]]) -> Result<(), DerivationError> {
    if seeds.len() > MAX_SEEDS {
        return Err(DerivationError::TooManySeeds(seeds.len()));
    }
    for (index, seed) in seeds.iter().enumerate() {
        if seed.len() > MAX_SEED_LEN {
            return Err(DerivationError::MaxSeedLengthExceeded {
                index,
                len: seed.len(),
            });
        }
    }
    Ok(())
}

fn candidate(seeds: &[&[u8]], nonce: u8, program_id: &Pubkey) -> Pubkey {
    let nonce = [nonce];
    let mut parts: Vec<&[u8]> = Vec::with_capacity(seeds.len() + 3);
    parts.extend_from_slice(seeds);
    parts.push(&nonce);
    parts.push(program_id.as_ref());
    parts.push(PDA_MARKER);
    Pubkey::new_from_array(hashv(&parts))
}

/// Re-derive the address for an explicit nonce.
///
/// This is the verification half: given the seeds and the nonce a record
/// claims, recompute the address and let the caller compare.
pub fn create_program_address(
    seeds: &[&[u8]],
    nonce: u8,
    program_id: &Pubkey,
) -> Result<Pubkey, DerivationError> {
    check_seeds(seeds)?;
    let address = candidate(seeds, nonce, program_id);
    if address.is_on_curve() {
        return Err(DerivationError::OnCurve(nonce));
    }
    Ok(address)
}

/// Find the canonical `(address, nonce)` for a seed list.
///
/// Deterministic: the same seeds and program id always return the same
/// pair.
pub fn find_program_address(
    seeds: &[&[u8]],
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), DerivationError> {
    check_seeds(seeds)?;
    search_nonce(seeds, program_id, |address| !address.is_on_curve())
}

/// Bounded nonce search, highest nonce first.
fn search_nonce(
    seeds: &[&[u8]],
    program_id: &Pubkey,
    accept: impl Fn(&Pubkey) -> bool,
) -> Result<(Pubkey, u8), DerivationError> {
    for nonce in (0..=u8::MAX).rev() {
        let address = candidate(seeds, nonce, program_id);
        if accept(&address) {
            return Ok((address, nonce));
        }
    }
    Err(DerivationError::Exhausted)
}

// ---------------------------------------------------------------------------
// DerivationProof
// ---------------------------------------------------------------------------

/// Evidence that an address was derived from a specific seed list.
///
/// A proof is just the inputs plus the claimed output. It carries no secret;
/// its value comes entirely from [`DerivationProof::verify`], which redoes
/// the hash. The processor turns a verified proof into a protocol authority
/// (see [`crate::authority::Authority`]).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationProof {
    program_id: Pubkey,
    seeds: Vec<Vec<u8>>,
    nonce: u8,
    address: Pubkey,
}

impl DerivationProof {
    /// Derive the canonical address for `seeds` and record how.
    pub fn derive(program_id: Pubkey, seeds: &[&[u8]]) -> Result<Self, DerivationError> {
        let (address, nonce) = find_program_address(seeds, &program_id)?;
        Ok(Self {
            program_id,
            seeds: seeds.iter().map(|s| s.to_vec()).collect(),
            nonce,
            address,
        })
    }

    /// Rebuild a proof from a stored nonce (e.g. `Vault::authority_bump`).
    pub fn from_nonce(
        program_id: Pubkey,
        seeds: &[&[u8]],
        nonce: u8,
    ) -> Result<Self, DerivationError> {
        let address = create_program_address(seeds, nonce, &program_id)?;
        Ok(Self {
            program_id,
            seeds: seeds.iter().map(|s| s.to_vec()).collect(),
            nonce,
            address,
        })
    }

    /// Assemble a proof from parts without checking it. Only
    /// [`DerivationProof::verify`] decides whether it is any good.
    pub fn claim(program_id: Pubkey, seeds: Vec<Vec<u8>>, nonce: u8, address: Pubkey) -> Self {
        Self {
            program_id,
            seeds,
            nonce,
            address,
        }
    }

    /// Recompute the address from the recorded seeds and nonce.
    pub fn verify(&self) -> bool {
        let seeds: Vec<&[u8]> = self.seeds.iter().map(Vec::as_slice).collect();
        matches!(
            create_program_address(&seeds, self.nonce, &self.program_id),
            Ok(address) if address == self.address
        )
    }

    pub fn address(&self) -> Pubkey {
        self.address
    }

    pub fn nonce(&self) -> u8 {
        self.nonce
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    pub fn seeds(&self) -> &[Vec<u8>] {
        &self.seeds
    }
}

// ---------------------------------------------------------------------------
// DerivedAddressResolver
// ---------------------------------------------------------------------------

/// Typed derivations for every address the gem bank touches.
///
/// Clients use this to compute accounts before submitting an instruction;
/// the processor uses the very same functions to check that the accounts it
/// was handed are the ones the seeds imply.
#[derive(Debug, Clone, Copy, Default)]
pub struct DerivedAddressResolver {
    config: ProtocolConfig,
}

impl DerivedAddressResolver {
    pub fn new(config: ProtocolConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Namespace tag plus entity addresses, under the gem bank program.
    pub fn resolve(
        &self,
        namespace: &[u8],
        entities: &[&Pubkey],
    ) -> Result<(Pubkey, u8), DerivationError> {
        let mut seeds: Vec<&[u8]> = Vec::with_capacity(entities.len() + 1);
        seeds.push(namespace);
        seeds.extend(entities.iter().map(|e| e.as_bytes().as_slice()));
        find_program_address(&seeds, &self.config.program_id)
    }

    /// `["vault", bank, creator]`
    pub fn vault(&self, bank: &Pubkey, creator: &Pubkey) -> Result<(Pubkey, u8), DerivationError> {
        self.resolve(VAULT_SEED, &[bank, creator])
    }

    /// `["authority", vault]`
    pub fn vault_authority(&self, vault: &Pubkey) -> Result<(Pubkey, u8), DerivationError> {
        self.resolve(AUTHORITY_SEED, &[vault])
    }

    /// Proof form of [`Self::vault_authority`] for an already-stored nonce.
    pub fn vault_authority_proof(
        &self,
        vault: &Pubkey,
        nonce: u8,
    ) -> Result<DerivationProof, DerivationError> {
        DerivationProof::from_nonce(
            self.config.program_id,
            &[AUTHORITY_SEED, vault.as_ref()],
            nonce,
        )
    }

    /// `["gem_box", vault, mint]`
    pub fn gem_box(&self, vault: &Pubkey, mint: &Pubkey) -> Result<(Pubkey, u8), DerivationError> {
        self.resolve(GEM_BOX_SEED, &[vault, mint])
    }

    /// `["gem_deposit_receipt", vault, mint]`
    pub fn gdr(&self, vault: &Pubkey, mint: &Pubkey) -> Result<(Pubkey, u8), DerivationError> {
        self.resolve(GDR_SEED, &[vault, mint])
    }

    /// `["whitelist", bank, address]`
    pub fn whitelist_proof(
        &self,
        bank: &Pubkey,
        address: &Pubkey,
    ) -> Result<(Pubkey, u8), DerivationError> {
        self.resolve(WHITELIST_SEED, &[bank, address])
    }

    /// `["metadata", metadata_program, mint]` under the metadata program.
    pub fn metadata(&self, mint: &Pubkey) -> Result<(Pubkey, u8), DerivationError> {
        let program = self.config.metadata_program_id;
        find_program_address(&[METADATA_SEED, program.as_ref(), mint.as_ref()], &program)
    }

    /// `[owner, token_program, mint]` under the associated token program.
    pub fn associated_token(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<(Pubkey, u8), DerivationError> {
        find_program_address(
            &[
                owner.as_ref(),
                self.config.token_program_id.as_ref(),
                mint.as_ref(),
            ],
            &self.config.associated_token_program_id,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
