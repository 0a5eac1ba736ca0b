//! # CLI Interface
//!
//! Defines the command-line argument structure for `gem-bank` using `clap`
//! derive. Every state-changing command builds one instruction, signs it
//! with the keypair files it is given, and executes it against the ledger.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use gem_bank::state::WhitelistType;
use gem_bank::Pubkey;

use crate::logging::LogFormat;

/// Gem bank custody client.
///
/// Operates on a local ledger directory. Keypairs are JSON files holding
/// the 64-byte `secret ∥ public` array, as written by `gem-bank keygen`.
#[derive(Parser, Debug)]
#[command(
    name = "gem-bank",
    about = "Gem bank custody protocol client",
    version,
    propagate_version = true
)]
pub struct GemBankCli {
    /// Ledger directory. Created on first use.
    #[arg(long, global = true, env = "GEM_BANK_LEDGER", default_value = "gem-bank-ledger")]
    pub ledger: PathBuf,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a keypair file and print its address.
    Keygen(KeygenArgs),
    /// Print derived addresses without touching the ledger.
    #[command(subcommand)]
    Derive(DeriveCommand),
    /// Create a bank.
    InitBank(InitBankArgs),
    /// Hand the bank to a new manager.
    SetManager(SetManagerArgs),
    /// Freeze or unfreeze every vault in a bank.
    SetFreeze(SetFreezeArgs),
    /// Create a vault for a creator.
    InitVault(InitVaultArgs),
    /// Hand a vault to a new owner.
    SetOwner(SetOwnerArgs),
    /// Lock or unlock a single vault.
    SetLock(SetLockArgs),
    /// Manage the bank whitelist.
    #[command(subcommand)]
    Whitelist(WhitelistCommand),
    /// Create a mint.
    CreateMint(CreateMintArgs),
    /// Mint tokens into a holder's associated token account.
    MintTo(MintToArgs),
    /// Publish asset metadata for a mint.
    CreateMetadata(CreateMetadataArgs),
    /// Deposit tokens into a vault.
    Deposit(DepositArgs),
    /// Withdraw tokens from a vault.
    Withdraw(WithdrawArgs),
    /// Print the record stored at an address.
    Show(ShowArgs),
    /// List records through the ledger indexes.
    #[command(subcommand)]
    List(ListCommand),
    /// Run a full deposit/withdraw walk-through on a scratch ledger.
    Demo,
}

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Where to write the keypair file.
    #[arg(long, short = 'o')]
    pub out: PathBuf,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

#[derive(Subcommand, Debug)]
pub enum DeriveCommand {
    /// Vault and vault authority for `(bank, creator)`.
    Vault { bank: Pubkey, creator: Pubkey },
    /// Gem box and deposit receipt for `(vault, mint)`.
    Gem { vault: Pubkey, mint: Pubkey },
    /// Whitelist proof for `(bank, address)`.
    Proof { bank: Pubkey, address: Pubkey },
    /// Associated token account for `(owner, mint)`.
    Ata { owner: Pubkey, mint: Pubkey },
}

#[derive(Args, Debug)]
pub struct InitBankArgs {
    /// Keypair of the new bank account.
    #[arg(long)]
    pub bank: PathBuf,
    /// Keypair of the manager; also pays.
    #[arg(long)]
    pub manager: PathBuf,
}

#[derive(Args, Debug)]
pub struct SetManagerArgs {
    #[arg(long)]
    pub bank: Pubkey,
    /// Current manager keypair.
    #[arg(long)]
    pub manager: PathBuf,
    #[arg(long)]
    pub new_manager: Pubkey,
}

#[derive(Args, Debug)]
pub struct SetFreezeArgs {
    #[arg(long)]
    pub bank: Pubkey,
    #[arg(long)]
    pub manager: PathBuf,
    /// `true` to freeze, `false` to unfreeze.
    #[arg(long, action = clap::ArgAction::Set)]
    pub frozen: bool,
}

#[derive(Args, Debug)]
pub struct InitVaultArgs {
    #[arg(long)]
    pub bank: Pubkey,
    /// Creator keypair; also pays.
    #[arg(long)]
    pub creator: PathBuf,
    /// Vault owner. Defaults to the creator.
    #[arg(long)]
    pub owner: Option<Pubkey>,
    #[arg(long, default_value = "")]
    pub name: String,
}

#[derive(Args, Debug)]
pub struct SetOwnerArgs {
    #[arg(long)]
    pub bank: Pubkey,
    #[arg(long)]
    pub vault: Pubkey,
    /// Current owner keypair.
    #[arg(long)]
    pub owner: PathBuf,
    #[arg(long)]
    pub new_owner: Pubkey,
}

#[derive(Args, Debug)]
pub struct SetLockArgs {
    #[arg(long)]
    pub bank: Pubkey,
    #[arg(long)]
    pub vault: Pubkey,
    #[arg(long)]
    pub manager: PathBuf,
    #[arg(long, action = clap::ArgAction::Set)]
    pub locked: bool,
}

#[derive(Subcommand, Debug)]
pub enum WhitelistCommand {
    /// Add or overwrite an entry.
    Add {
        #[arg(long)]
        bank: Pubkey,
        #[arg(long)]
        manager: PathBuf,
        #[arg(long)]
        address: Pubkey,
        #[arg(long = "type", value_enum)]
        kind: WhitelistKind,
    },
    /// Remove an entry.
    Remove {
        #[arg(long)]
        bank: Pubkey,
        #[arg(long)]
        manager: PathBuf,
        #[arg(long)]
        address: Pubkey,
    },
}

/// Which admission paths a whitelist entry opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WhitelistKind {
    Mint,
    Creator,
    Both,
}

impl From<WhitelistKind> for WhitelistType {
    fn from(kind: WhitelistKind) -> Self {
        match kind {
            WhitelistKind::Mint => WhitelistType::mint(),
            WhitelistKind::Creator => WhitelistType::creator(),
            WhitelistKind::Both => WhitelistType::both(),
        }
    }
}

#[derive(Args, Debug)]
pub struct CreateMintArgs {
    /// Keypair of the new mint account.
    #[arg(long)]
    pub mint: PathBuf,
    #[arg(long)]
    pub authority: Pubkey,
    #[arg(long, default_value_t = 0)]
    pub decimals: u8,
}

#[derive(Args, Debug)]
pub struct MintToArgs {
    #[arg(long)]
    pub mint: Pubkey,
    /// Mint authority keypair; also pays for a new token account.
    #[arg(long)]
    pub authority: PathBuf,
    #[arg(long)]
    pub holder: Pubkey,
    #[arg(long)]
    pub amount: u64,
}

#[derive(Args, Debug)]
pub struct CreateMetadataArgs {
    #[arg(long)]
    pub mint: Pubkey,
    /// Mint authority keypair. It also becomes the update authority.
    #[arg(long)]
    pub authority: PathBuf,
    /// Creator keypairs. Each one signs and is listed as verified.
    #[arg(long = "creator")]
    pub creators: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DepositArgs {
    #[arg(long)]
    pub bank: Pubkey,
    #[arg(long)]
    pub vault: Pubkey,
    #[arg(long)]
    pub mint: Pubkey,
    /// Vault owner keypair; deposits from its associated token account.
    #[arg(long)]
    pub owner: PathBuf,
    #[arg(long)]
    pub amount: u64,
    /// Attach the mint's whitelist proof.
    #[arg(long, conflicts_with = "creator")]
    pub by_mint: bool,
    /// Attach metadata and the whitelist proof of this creator.
    #[arg(long)]
    pub creator: Option<Pubkey>,
}

#[derive(Args, Debug)]
pub struct WithdrawArgs {
    #[arg(long)]
    pub bank: Pubkey,
    #[arg(long)]
    pub vault: Pubkey,
    #[arg(long)]
    pub mint: Pubkey,
    #[arg(long)]
    pub owner: PathBuf,
    #[arg(long)]
    pub amount: u64,
    /// Defaults to the owner.
    #[arg(long)]
    pub receiver: Option<Pubkey>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    pub address: Pubkey,
}

#[derive(Subcommand, Debug)]
pub enum ListCommand {
    /// Vaults under a bank.
    Vaults { bank: Pubkey },
    /// Vaults held by an owner.
    Owned { owner: Pubkey },
    /// Deposit receipts of a vault.
    Receipts { vault: Pubkey },
    /// Whitelist proofs of a bank.
    Whitelist { bank: Pubkey },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        GemBankCli::command().debug_assert();
    }

    #[test]
    fn parses_addresses_and_flags() {
        let bank = Pubkey::new_unique();
        let cli = GemBankCli::try_parse_from([
            "gem-bank",
            "set-freeze",
            "--bank",
            &bank.to_string(),
            "--manager",
            "m.json",
            "--frozen",
            "true",
        ])
        .unwrap();
        match cli.command {
            Commands::SetFreeze(args) => {
                assert_eq!(args.bank, bank);
                assert!(args.frozen);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_address() {
        assert!(GemBankCli::try_parse_from(["gem-bank", "show", "not-base58!"]).is_err());
    }

    #[test]
    fn by_mint_conflicts_with_creator() {
        let k = Pubkey::new_unique().to_string();
        let res = GemBankCli::try_parse_from([
            "gem-bank", "deposit", "--bank", &k, "--vault", &k, "--mint", &k, "--owner", "o.json",
            "--amount", "1", "--by-mint", "--creator", &k,
        ]);
        assert!(res.is_err());
    }
}
