//! # Protocol Configuration & Constants
//!
//! Every magic number in the gem bank lives here: program identifiers, seed
//! namespaces for derived addresses, and the limits the processor enforces.
//!
//! Seed tags are consensus-critical. Changing one silently moves every vault,
//! gem box and whitelist proof ever derived with it to a new address, so treat
//! them as frozen once records exist.

use crate::crypto::keys::Pubkey;

// ---------------------------------------------------------------------------
// Program Identifiers
// ---------------------------------------------------------------------------

/// The gem bank program (`bankHHdqMuaaST4qQk6mkzxGeKPHWmqdgor6Gs8r88m`).
///
/// Every vault, gem box, deposit receipt and whitelist proof is derived
/// under this id.
pub const GEM_BANK_PROGRAM_ID: Pubkey = Pubkey::new_from_array([
    8, 219, 243, 217, 253, 220, 74, 182, 3, 70, 137, 48, 27, 195, 194, 57, 51, 19, 235, 138, 74,
    0, 103, 188, 215, 99, 200, 91, 12, 195, 31, 86,
]);

/// The token metadata program (`metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s`).
///
/// Asset metadata (including the declared creator list) is derived under
/// this id, which is what lets the creator whitelist path tie a metadata
/// record to exactly one mint.
pub const METADATA_PROGRAM_ID: Pubkey = Pubkey::new_from_array([
    11, 112, 101, 177, 227, 209, 124, 69, 56, 157, 82, 127, 107, 4, 195, 205, 88, 184, 108, 115,
    26, 160, 253, 181, 73, 182, 209, 188, 3, 248, 41, 70,
]);

/// The token program (`TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`).
pub const TOKEN_PROGRAM_ID: Pubkey = Pubkey::new_from_array([
    6, 221, 246, 225, 215, 101, 161, 147, 217, 203, 225, 70, 206, 235, 121, 172, 28, 180, 133,
    237, 95, 91, 55, 145, 58, 140, 245, 133, 126, 255, 0, 169,
]);

/// The associated token account program
/// (`ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL`).
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey = Pubkey::new_from_array([
    140, 151, 37, 143, 78, 36, 137, 241, 187, 61, 16, 41, 20, 142, 13, 131, 11, 90, 19, 153, 218,
    255, 16, 132, 4, 142, 123, 216, 219, 233, 248, 89,
]);

// ---------------------------------------------------------------------------
// Derivation Namespaces
// ---------------------------------------------------------------------------

/// Vault address: `["vault", bank, creator]`.
pub const VAULT_SEED: &[u8] = b"vault";

/// Vault custody authority: `["authority", vault]`.
///
/// The vault address is the only entity seed, so each vault has exactly one
/// authority and no other record can derive it.
pub const AUTHORITY_SEED: &[u8] = b"authority";

/// Gem box token account: `["gem_box", vault, mint]`.
pub const GEM_BOX_SEED: &[u8] = b"gem_box";

/// Gem deposit receipt: `["gem_deposit_receipt", vault, mint]`.
pub const GDR_SEED: &[u8] = b"gem_deposit_receipt";

/// Whitelist proof: `["whitelist", bank, whitelisted_address]`.
pub const WHITELIST_SEED: &[u8] = b"whitelist";

/// Asset metadata: `["metadata", metadata_program, mint]` under the
/// metadata program.
pub const METADATA_SEED: &[u8] = b"metadata";

/// Domain marker appended to every derivation preimage.
pub const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Maximum number of seeds in one derivation (nonce excluded).
pub const MAX_SEEDS: usize = 16;

/// Maximum length of a single seed in bytes.
pub const MAX_SEED_LEN: usize = 32;

/// Vault names are stored as a fixed 32-byte field on chain.
pub const MAX_VAULT_NAME_LEN: usize = 32;

/// Record layout version written into new banks.
pub const LATEST_BANK_VERSION: u16 = 0;

/// Crate version string surfaced by the CLI.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// ProtocolConfig
// ---------------------------------------------------------------------------

/// Program ids the processor and client derive against.
///
/// The defaults are the deployed program ids. Tests and local ledgers can
/// point the protocol at a different program id to get an isolated address
/// space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Program that owns banks, vaults, gem boxes, receipts and proofs.
    pub program_id: Pubkey,
    /// Program that owns asset metadata records.
    pub metadata_program_id: Pubkey,
    /// Program that owns token accounts.
    pub token_program_id: Pubkey,
    /// Program under which associated token accounts are derived.
    pub associated_token_program_id: Pubkey,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            program_id: GEM_BANK_PROGRAM_ID,
            metadata_program_id: METADATA_PROGRAM_ID,
            token_program_id: TOKEN_PROGRAM_ID,
            associated_token_program_id: ASSOCIATED_TOKEN_PROGRAM_ID,
        }
    }
}

impl ProtocolConfig {
    /// Same as the default, but with a different gem bank program id.
    pub fn with_program_id(program_id: Pubkey) -> Self {
        Self {
            program_id,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
