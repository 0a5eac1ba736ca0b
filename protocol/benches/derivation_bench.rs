// Derivation and custody benchmarks for the gem bank.
//
// Covers canonical address search, proof re-derivation, the full set of
// addresses a client resolves per deposit, and a deposit/withdraw cycle
// against a temporary ledger.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gem_bank::authority::SignerSet;
use gem_bank::config::{GEM_BANK_PROGRAM_ID, VAULT_SEED};
use gem_bank::crypto::keys::Pubkey;
use gem_bank::crypto::pda::find_program_address;
use gem_bank::{CustodyProtocol, DepositGem, GemBankClient, WithdrawGem};

fn bench_find_program_address(c: &mut Criterion) {
    let (bank, creator) = (Pubkey::new_unique(), Pubkey::new_unique());

    c.bench_function("pda/find_vault", |b| {
        b.iter(|| {
            find_program_address(
                &[VAULT_SEED, bank.as_bytes(), creator.as_bytes()],
                black_box(&GEM_BANK_PROGRAM_ID),
            )
        });
    });
}

fn bench_proof_verify(c: &mut Criterion) {
    let client = GemBankClient::default();
    let (vault, bump) = client
        .resolver()
        .vault(&Pubkey::new_unique(), &Pubkey::new_unique())
        .unwrap();
    let proof = client.resolver().vault_authority_proof(&vault, bump).unwrap();

    c.bench_function("pda/verify_authority_proof", |b| {
        b.iter(|| black_box(&proof).verify());
    });
}

fn bench_client_addresses(c: &mut Criterion) {
    let client = GemBankClient::default();
    let (bank, creator, mint) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());

    c.bench_function("client/vault_and_gem_addresses", |b| {
        b.iter(|| {
            let vault = client.vault_addresses(&bank, &creator).unwrap();
            client.gem_addresses(&vault.vault, &mint).unwrap()
        });
    });
}

fn bench_deposit_withdraw(c: &mut Criterion) {
    let protocol = CustodyProtocol::open_temporary().unwrap();
    let client = GemBankClient::new(*protocol.resolver());
    let (bank, manager, creator, owner) = (
        Pubkey::new_unique(),
        Pubkey::new_unique(),
        Pubkey::new_unique(),
        Pubkey::new_unique(),
    );
    let (mint, mint_authority) = (Pubkey::new_unique(), Pubkey::new_unique());

    protocol
        .init_bank(&bank, &manager, &manager, &SignerSet::from_keys([bank, manager]))
        .unwrap();
    let vault = protocol
        .init_vault(&bank, &creator, &creator, &owner, "bench".into(), &SignerSet::from_keys([creator]))
        .unwrap();
    protocol
        .create_mint(&mint, &mint_authority, 0, &SignerSet::from_keys([mint]))
        .unwrap();
    let source = protocol
        .create_associated_token_account(&owner, &owner, &mint, &SignerSet::from_keys([owner]))
        .unwrap();
    protocol
        .mint_to(&mint, &source, 1_000, &SignerSet::from_keys([mint_authority]))
        .unwrap();

    let owner_signs = SignerSet::from_keys([owner]);
    let deposit = DepositGem {
        bank,
        vault,
        mint,
        source,
        depositor: owner,
        amount: 1,
        mint_proof: None,
        metadata: None,
        creator_proof: None,
    };
    let withdraw = WithdrawGem {
        bank,
        vault,
        mint,
        destination: client.associated_token(&owner, &mint).unwrap(),
        receiver: owner,
        amount: 1,
    };

    c.bench_function("custody/deposit_withdraw", |b| {
        b.iter(|| {
            protocol.deposit_gem(&deposit, &owner_signs).unwrap();
            protocol.withdraw_gem(&withdraw, &owner_signs).unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_find_program_address,
    bench_proof_verify,
    bench_client_addresses,
    bench_deposit_withdraw,
);
criterion_main!(benches);
