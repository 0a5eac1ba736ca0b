//! Command handlers.
//!
//! Each handler returns a JSON value that `main` prints to stdout.
//! State-changing handlers go through [`Session::submit`]: build the
//! instruction, sign it with the loaded keypairs, execute, flush.

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use std::path::Path;
use tracing::info;

use gem_bank::state::{
    Bank, BankFlags, Creator, GemDepositReceipt, Metadata, Mint, TokenAccount, Vault,
    WhitelistProof, WhitelistType,
};
use gem_bank::{CustodyProtocol, GemBankClient, Instruction, Keypair, Pubkey, Transaction};

use crate::cli::{
    Commands, CreateMetadataArgs, DepositArgs, DeriveCommand, ListCommand, MintToArgs,
    WhitelistCommand, WithdrawArgs,
};
use crate::keyfile;

/// A ledger plus a client bound to the same program ids.
pub struct Session {
    protocol: CustodyProtocol,
    client: GemBankClient,
}

impl Session {
    pub fn open(ledger: &Path) -> Result<Self> {
        std::fs::create_dir_all(ledger)
            .with_context(|| format!("failed to create ledger directory {}", ledger.display()))?;
        let protocol = CustodyProtocol::open(ledger)
            .with_context(|| format!("failed to open ledger at {}", ledger.display()))?;
        info!(path = %ledger.display(), "ledger opened");
        Ok(Self::new(protocol))
    }

    pub fn new(protocol: CustodyProtocol) -> Self {
        let client = GemBankClient::new(*protocol.resolver());
        Self { protocol, client }
    }

    fn submit(&self, ix: Instruction, signers: &[&Keypair]) -> Result<()> {
        let name = ix.name();
        let keys: Vec<Pubkey> = signers.iter().map(|kp| kp.pubkey()).collect();
        let nonce = self.protocol.query().next_nonce(&keys)?;
        let tx = Transaction::signed(ix, nonce, signers)?;
        self.protocol
            .execute(&tx)
            .with_context(|| format!("{name} failed"))?;
        self.protocol.flush()?;
        Ok(())
    }

    fn ensure_ata(&self, payer: &Keypair, owner: &Pubkey, mint: &Pubkey) -> Result<Pubkey> {
        let ata = self.client.associated_token(owner, mint)?;
        if self.protocol.query().token_account(&ata)?.is_none() {
            self.submit(
                self.client
                    .create_associated_token_account(payer.pubkey(), *owner, *mint),
                &[payer],
            )?;
        }
        Ok(ata)
    }
}

/// Run one parsed command against `ledger`.
pub fn run(command: Commands, ledger: &Path) -> Result<Value> {
    match command {
        Commands::Keygen(args) => {
            let kp = Keypair::generate();
            keyfile::write(&args.out, &kp, args.force)?;
            Ok(json!({ "address": kp.pubkey().to_string(), "path": args.out.display().to_string() }))
        }
        Commands::Derive(cmd) => derive(&GemBankClient::default(), cmd),
        Commands::Demo => demo(),
        other => {
            let session = Session::open(ledger)?;
            run_on(&session, other)
        }
    }
}

fn derive(client: &GemBankClient, cmd: DeriveCommand) -> Result<Value> {
    Ok(match cmd {
        DeriveCommand::Vault { bank, creator } => {
            let a = client.vault_addresses(&bank, &creator)?;
            json!({
                "vault": a.vault.to_string(),
                "vault_bump": a.vault_bump,
                "authority": a.authority.to_string(),
                "authority_bump": a.authority_bump,
            })
        }
        DeriveCommand::Gem { vault, mint } => {
            let a = client.gem_addresses(&vault, &mint)?;
            json!({
                "gem_box": a.gem_box.to_string(),
                "gem_box_bump": a.gem_box_bump,
                "gdr": a.gdr.to_string(),
                "gdr_bump": a.gdr_bump,
            })
        }
        DeriveCommand::Proof { bank, address } => {
            json!({ "whitelist_proof": client.whitelist_proof(&bank, &address)?.to_string() })
        }
        DeriveCommand::Ata { owner, mint } => {
            json!({ "associated_token": client.associated_token(&owner, &mint)?.to_string() })
        }
    })
}

fn run_on(s: &Session, command: Commands) -> Result<Value> {
    let c = &s.client;
    match command {
        Commands::InitBank(args) => {
            let bank = keyfile::read(&args.bank)?;
            let manager = keyfile::read(&args.manager)?;
            s.submit(
                c.init_bank(bank.pubkey(), manager.pubkey(), manager.pubkey()),
                &[&bank, &manager],
            )?;
            show(s, &bank.pubkey())
        }
        Commands::SetManager(args) => {
            let manager = keyfile::read(&args.manager)?;
            s.submit(c.update_bank_manager(args.bank, args.new_manager), &[&manager])?;
            show(s, &args.bank)
        }
        Commands::SetFreeze(args) => {
            let manager = keyfile::read(&args.manager)?;
            let flags = BankFlags {
                freeze_vaults: args.frozen,
            };
            s.submit(c.set_bank_flags(args.bank, flags), &[&manager])?;
            show(s, &args.bank)
        }
        Commands::InitVault(args) => {
            let creator = keyfile::read(&args.creator)?;
            let owner = args.owner.unwrap_or_else(|| creator.pubkey());
            s.submit(
                c.init_vault(args.bank, creator.pubkey(), creator.pubkey(), owner, args.name),
                &[&creator],
            )?;
            let vault = c.vault_addresses(&args.bank, &creator.pubkey())?.vault;
            show(s, &vault)
        }
        Commands::SetOwner(args) => {
            let owner = keyfile::read(&args.owner)?;
            s.submit(
                c.update_vault_owner(args.bank, args.vault, args.new_owner),
                &[&owner],
            )?;
            show(s, &args.vault)
        }
        Commands::SetLock(args) => {
            let manager = keyfile::read(&args.manager)?;
            s.submit(c.set_vault_lock(args.bank, args.vault, args.locked), &[&manager])?;
            show(s, &args.vault)
        }
        Commands::Whitelist(WhitelistCommand::Add {
            bank,
            manager,
            address,
            kind,
        }) => {
            let manager = keyfile::read(&manager)?;
            s.submit(c.add_to_whitelist(bank, address, kind.into()), &[&manager])?;
            show(s, &c.whitelist_proof(&bank, &address)?)
        }
        Commands::Whitelist(WhitelistCommand::Remove {
            bank,
            manager,
            address,
        }) => {
            let manager = keyfile::read(&manager)?;
            s.submit(c.remove_from_whitelist(bank, address), &[&manager])?;
            show(s, &bank)
        }
        Commands::CreateMint(args) => {
            let mint = keyfile::read(&args.mint)?;
            s.submit(c.create_mint(mint.pubkey(), args.authority, args.decimals), &[&mint])?;
            show(s, &mint.pubkey())
        }
        Commands::MintTo(args) => mint_to(s, args),
        Commands::CreateMetadata(args) => create_metadata(s, args),
        Commands::Deposit(args) => deposit(s, args),
        Commands::Withdraw(args) => withdraw(s, args),
        Commands::Show(args) => show(s, &args.address),
        Commands::List(cmd) => list(s, cmd),
        Commands::Keygen(_) | Commands::Derive(_) | Commands::Demo => {
            bail!("command does not use the ledger")
        }
    }
}

fn mint_to(s: &Session, args: MintToArgs) -> Result<Value> {
    let authority = keyfile::read(&args.authority)?;
    let ata = s.ensure_ata(&authority, &args.holder, &args.mint)?;
    s.submit(s.client.mint_to(args.mint, ata, args.amount), &[&authority])?;
    show(s, &ata)
}

fn create_metadata(s: &Session, args: CreateMetadataArgs) -> Result<Value> {
    let authority = keyfile::read(&args.authority)?;
    let creators = args
        .creators
        .iter()
        .map(|p| keyfile::read(p))
        .collect::<Result<Vec<_>>>()?;

    let count = creators.len().max(1) as u8;
    let entries = creators
        .iter()
        .enumerate()
        .map(|(i, kp)| Creator {
            address: kp.pubkey(),
            verified: true,
            // First creator takes the rounding remainder.
            share: 100 / count + if i == 0 { 100 % count } else { 0 },
        })
        .collect();

    let mut signers: Vec<&Keypair> = vec![&authority];
    signers.extend(creators.iter());
    s.submit(
        s.client
            .create_metadata(args.mint, authority.pubkey(), entries),
        &signers,
    )?;
    show(s, &s.client.metadata(&args.mint)?)
}

fn deposit(s: &Session, args: DepositArgs) -> Result<Value> {
    let c = &s.client;
    let owner = keyfile::read(&args.owner)?;
    let source = c.associated_token(&owner.pubkey(), &args.mint)?;
    let ix = match (args.by_mint, args.creator) {
        (true, _) => {
            c.deposit_gem_by_mint(args.bank, args.vault, args.mint, source, owner.pubkey(), args.amount)?
        }
        (false, Some(creator)) => c.deposit_gem_by_creator(
            args.bank,
            args.vault,
            args.mint,
            source,
            owner.pubkey(),
            args.amount,
            &creator,
        )?,
        (false, None) => {
            c.deposit_gem(args.bank, args.vault, args.mint, source, owner.pubkey(), args.amount)
        }
    };
    s.submit(ix, &[&owner])?;
    show(s, &c.gem_addresses(&args.vault, &args.mint)?.gdr)
}

fn withdraw(s: &Session, args: WithdrawArgs) -> Result<Value> {
    let c = &s.client;
    let owner = keyfile::read(&args.owner)?;
    let receiver = args.receiver.unwrap_or_else(|| owner.pubkey());
    s.submit(
        c.withdraw_gem(args.bank, args.vault, args.mint, receiver, args.amount)?,
        &[&owner],
    )?;
    show(s, &c.gem_addresses(&args.vault, &args.mint)?.gdr)
}

fn list(s: &Session, cmd: ListCommand) -> Result<Value> {
    let q = s.protocol.query();
    let rows: Vec<Value> = match cmd {
        ListCommand::Vaults { bank } => q
            .vaults_by_bank(&bank)?
            .iter()
            .map(|(a, v)| vault_json(a, v))
            .collect(),
        ListCommand::Owned { owner } => q
            .vaults_by_owner(&owner)?
            .iter()
            .map(|(a, v)| vault_json(a, v))
            .collect(),
        ListCommand::Receipts { vault } => q
            .gdrs_by_vault(&vault)?
            .iter()
            .map(|(a, r)| gdr_json(a, r))
            .collect(),
        ListCommand::Whitelist { bank } => q
            .proofs_by_bank(&bank)?
            .iter()
            .map(|(a, p)| proof_json(a, p))
            .collect(),
    };
    Ok(Value::Array(rows))
}

/// Whatever record lives at `address`, rendered as JSON.
pub fn show(s: &Session, address: &Pubkey) -> Result<Value> {
    let q = s.protocol.query();
    if let Some(bank) = q.bank(address)? {
        return Ok(bank_json(address, &bank));
    }
    if let Some(vault) = q.vault(address)? {
        return Ok(vault_json(address, &vault));
    }
    if let Some(gdr) = q.gdr(address)? {
        return Ok(gdr_json(address, &gdr));
    }
    if let Some(proof) = q.whitelist_proof(address)? {
        return Ok(proof_json(address, &proof));
    }
    if let Some(account) = q.token_account(address)? {
        return Ok(token_account_json(address, &account));
    }
    if let Some(mint) = q.mint(address)? {
        return Ok(mint_json(address, &mint));
    }
    if let Some(metadata) = q.metadata(address)? {
        return Ok(metadata_json(address, &metadata));
    }
    bail!("no record at {address}")
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn bank_json(address: &Pubkey, b: &Bank) -> Value {
    json!({
        "kind": "bank",
        "address": address.to_string(),
        "version": b.version,
        "manager": b.manager.to_string(),
        "frozen": b.is_frozen(),
        "whitelisted_mints": b.whitelisted_mints,
        "whitelisted_creators": b.whitelisted_creators,
        "vault_count": b.vault_count,
    })
}

fn vault_json(address: &Pubkey, v: &Vault) -> Value {
    json!({
        "kind": "vault",
        "address": address.to_string(),
        "bank": v.bank.to_string(),
        "owner": v.owner.to_string(),
        "creator": v.creator.to_string(),
        "authority": v.authority.to_string(),
        "locked": v.locked,
        "gem_box_count": v.gem_box_count,
        "gem_count": v.gem_count,
        "name": v.name,
    })
}

fn gdr_json(address: &Pubkey, r: &GemDepositReceipt) -> Value {
    json!({
        "kind": "gem_deposit_receipt",
        "address": address.to_string(),
        "vault": r.vault.to_string(),
        "gem_box": r.gem_box.to_string(),
        "gem_mint": r.gem_mint.to_string(),
        "amount": r.amount,
    })
}

fn whitelist_type_json(t: WhitelistType) -> Value {
    json!({ "mint": t.mint, "creator": t.creator })
}

fn proof_json(address: &Pubkey, p: &WhitelistProof) -> Value {
    json!({
        "kind": "whitelist_proof",
        "address": address.to_string(),
        "bank": p.bank.to_string(),
        "whitelisted_address": p.whitelisted_address.to_string(),
        "whitelist_type": whitelist_type_json(p.whitelist_type),
    })
}

fn token_account_json(address: &Pubkey, a: &TokenAccount) -> Value {
    json!({
        "kind": "token_account",
        "address": address.to_string(),
        "mint": a.mint.to_string(),
        "owner": a.owner.to_string(),
        "amount": a.amount,
    })
}

fn mint_json(address: &Pubkey, m: &Mint) -> Value {
    json!({
        "kind": "mint",
        "address": address.to_string(),
        "mint_authority": m.mint_authority.to_string(),
        "supply": m.supply,
        "decimals": m.decimals,
    })
}

fn metadata_json(address: &Pubkey, m: &Metadata) -> Value {
    let creators: Vec<Value> = m
        .creators
        .iter()
        .map(|c| json!({ "address": c.address.to_string(), "verified": c.verified, "share": c.share }))
        .collect();
    json!({
        "kind": "metadata",
        "address": address.to_string(),
        "mint": m.mint.to_string(),
        "update_authority": m.update_authority.to_string(),
        "creators": creators,
    })
}

// ---------------------------------------------------------------------------
// Demo
// ---------------------------------------------------------------------------

/// Bank, vault, whitelisted mint, deposit 5, withdraw 3, then an
/// over-withdraw that is refused. Runs on a scratch ledger.
fn demo() -> Result<Value> {
    let s = Session::new(CustodyProtocol::open_temporary()?);
    let c = &s.client;
    let (bank, manager, creator) = (Keypair::generate(), Keypair::generate(), Keypair::generate());
    let (mint, mint_authority) = (Keypair::generate(), Keypair::generate());

    s.submit(
        c.init_bank(bank.pubkey(), manager.pubkey(), manager.pubkey()),
        &[&bank, &manager],
    )?;
    s.submit(
        c.init_vault(bank.pubkey(), creator.pubkey(), creator.pubkey(), creator.pubkey(), "demo"),
        &[&creator],
    )?;
    let vault = c.vault_addresses(&bank.pubkey(), &creator.pubkey())?.vault;

    s.submit(c.create_mint(mint.pubkey(), mint_authority.pubkey(), 0), &[&mint])?;
    let source = s.ensure_ata(&creator, &creator.pubkey(), &mint.pubkey())?;
    s.submit(c.mint_to(mint.pubkey(), source, 10), &[&mint_authority])?;
    s.submit(
        c.add_to_whitelist(bank.pubkey(), mint.pubkey(), WhitelistType::mint()),
        &[&manager],
    )?;

    let mut steps = Vec::new();
    let gdr = c.gem_addresses(&vault, &mint.pubkey())?.gdr;

    s.submit(
        c.deposit_gem_by_mint(bank.pubkey(), vault, mint.pubkey(), source, creator.pubkey(), 5)?,
        &[&creator],
    )?;
    steps.push(json!({ "step": "deposit 5", "receipt": show(&s, &gdr)? }));

    let withdraw = || c.withdraw_gem(bank.pubkey(), vault, mint.pubkey(), creator.pubkey(), 3);
    s.submit(withdraw()?, &[&creator])?;
    steps.push(json!({ "step": "withdraw 3", "receipt": show(&s, &gdr)? }));

    let refused = s.submit(withdraw()?, &[&creator]).err().map(|e| format!("{e:#}"));
    steps.push(json!({
        "step": "withdraw 3",
        "error": refused,
        "receipt": show(&s, &gdr)?,
    }));

    Ok(json!({
        "bank": bank.pubkey().to_string(),
        "vault": show(&s, &vault)?,
        "steps": steps,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{InitBankArgs, InitVaultArgs, ShowArgs};
    use std::path::PathBuf;

    fn key_file(dir: &Path, name: &str) -> (PathBuf, Pubkey) {
        let path = dir.join(name);
        let kp = Keypair::generate();
        keyfile::write(&path, &kp, false).unwrap();
        (path, kp.pubkey())
    }

    #[test]
    fn demo_ends_with_two_left() {
        let out = demo().unwrap();
        let steps = out["steps"].as_array().unwrap();
        assert_eq!(steps[0]["receipt"]["amount"], 5);
        assert_eq!(steps[1]["receipt"]["amount"], 2);
        assert!(steps[2]["error"].as_str().unwrap().contains("insufficient"));
        assert_eq!(steps[2]["receipt"]["amount"], 2);
    }

    #[test]
    fn commands_share_a_persistent_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("ledger");
        let (bank_path, bank) = key_file(dir.path(), "bank.json");
        let (manager_path, _) = key_file(dir.path(), "manager.json");
        let (creator_path, creator) = key_file(dir.path(), "creator.json");

        run(
            Commands::InitBank(InitBankArgs {
                bank: bank_path,
                manager: manager_path,
            }),
            &ledger,
        )
        .unwrap();
        let vault = run(
            Commands::InitVault(InitVaultArgs {
                bank,
                creator: creator_path,
                owner: None,
                name: "cli".into(),
            }),
            &ledger,
        )
        .unwrap();
        assert_eq!(vault["owner"], creator.to_string());

        let shown = run(Commands::Show(ShowArgs { address: bank }), &ledger).unwrap();
        assert_eq!(shown["vault_count"], 1);
    }

    #[test]
    fn show_unknown_address_fails() {
        let dir = tempfile::tempdir().unwrap();
        let res = run(
            Commands::Show(ShowArgs {
                address: Pubkey::new_unique(),
            }),
            &dir.path().join("ledger"),
        );
        assert!(res.is_err());
    }
}
