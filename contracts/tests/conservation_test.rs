//! Conservation tests.
//!
//! Drives the vault with long random operation sequences (seeded, so
//! failures reproduce) and with many threads at once, checking after the
//! fact that no value was created or destroyed:
//!
//! ```text
//! sum(account balances) + fee pool == deposited - withdrawn == vault holding
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use gamevault_contracts::{GameVault, VaultError};
use gamevault_protocol::assets::{
    AssetDirectory, FungibleAsset, NativeWrapper, SimulatedToken, SimulatedWrappedNative,
};
use gamevault_protocol::config::VaultConfig;
use gamevault_protocol::{Address, Amount, AssetId, CallContext};

const PLAYERS: usize = 6;

fn controller() -> CallContext {
    CallContext::new(Address::derive("controller"))
}

fn player(i: usize) -> CallContext {
    CallContext::new(Address::derive(&format!("player-{i}")))
}

/// Helper: two listed tokens plus a native wrapper, each player funded with
/// `funding` units of both tokens and pre-approved for the vault.
struct Arena {
    vault: GameVault,
    tokens: Vec<Arc<SimulatedToken>>,
    native: Arc<SimulatedWrappedNative>,
}

impl Arena {
    fn new(funding: Amount) -> Self {
        gamevault_protocol::logging::init_test_logging();

        let directory = Arc::new(AssetDirectory::new());
        let tokens: Vec<Arc<SimulatedToken>> = ["GOLD", "GEMS"]
            .iter()
            .map(|symbol| Arc::new(SimulatedToken::new(symbol, symbol)))
            .collect();
        let native = Arc::new(SimulatedWrappedNative::new());
        for token in &tokens {
            directory.register(token.clone());
        }
        directory.register(native.clone());

        let wrapper: Arc<dyn NativeWrapper> = native.clone();
        let vault = GameVault::new(
            Address::derive("vault"),
            controller().sender,
            &VaultConfig::default(),
            directory,
            Some(wrapper),
        )
        .unwrap();

        for token in &tokens {
            vault.add_asset(&controller(), token.id()).unwrap();
            for i in 0..PLAYERS {
                token.mint(&player(i).sender, funding).unwrap();
                token.approve(&player(i).sender, &vault.address(), Amount::MAX);
            }
        }

        Self {
            vault,
            tokens,
            native,
        }
    }

    fn assets(&self) -> Vec<AssetId> {
        let mut assets: Vec<AssetId> = self.tokens.iter().map(|t| t.id()).collect();
        assets.push(NativeWrapper::id(self.native.as_ref()));
        assets
    }

    fn assert_conserved(&self) {
        for asset in self.assets() {
            let report = self.vault.custody_report(&asset);
            assert!(report.is_conserved(), "books drifted: {report:?}");
            assert_eq!(
                report.held_externally,
                Some(report.net_inflow),
                "custody mismatch: {report:?}"
            );

            let sum: Amount = (0..PLAYERS)
                .map(|i| self.vault.get_account_asset(&asset, &player(i).sender))
                .sum();
            assert_eq!(sum, report.ledger_total);
        }
    }
}

// ---------------------------------------------------------------------------
// Randomized Sequences
// ---------------------------------------------------------------------------

/// Expected ledger, kept alongside the vault and compared after every step.
type Model = HashMap<(AssetId, Address), Amount>;

fn model_balance(model: &Model, asset: AssetId, account: Address) -> Amount {
    model.get(&(asset, account)).copied().unwrap_or(0)
}

fn run_sequence(seed: u64, steps: usize) {
    let arena = Arena::new(1_000_000);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut model: Model = HashMap::new();
    let mut fee_on = false;
    let mut pools: HashMap<AssetId, Amount> = HashMap::new();
    let assets = arena.assets();
    let wrapped = NativeWrapper::id(arena.native.as_ref());

    for _ in 0..steps {
        let asset = assets[rng.gen_range(0..assets.len())];
        let who = player(rng.gen_range(0..PLAYERS));
        let held = model_balance(&model, asset, who.sender);

        match rng.gen_range(0..6) {
            0 => {
                let amount = rng.gen_range(1..=20_000);
                let result = if asset == wrapped {
                    arena.vault.deposit_native(&who.with_value(amount))
                } else {
                    arena.vault.deposit(&who, asset, amount)
                };
                match result {
                    Ok(balance) => {
                        *model.entry((asset, who.sender)).or_insert(0) += amount;
                        assert_eq!(balance, held + amount);
                    }
                    // Player ran out of tokens outside the vault.
                    Err(VaultError::Collaborator(_)) => {}
                    Err(other) => panic!("unexpected deposit failure: {other}"),
                }
            }
            1 => {
                // Sometimes over-withdraw on purpose.
                let amount = rng.gen_range(1..=held + 10);
                let result = if asset == wrapped {
                    arena.vault.withdraw_native(&who, amount)
                } else {
                    arena.vault.withdraw(&who, asset, amount)
                };
                if amount <= held {
                    assert_eq!(result.unwrap(), held - amount);
                    *model.entry((asset, who.sender)).or_insert(0) -= amount;
                } else {
                    assert!(matches!(result, Err(VaultError::Ledger(_))));
                }
            }
            2 | 3 => {
                let to = player(rng.gen_range(0..PLAYERS));
                let amount = rng.gen_range(1..=held + 10);
                let result = arena.vault.transfer_account_asset(
                    &controller(),
                    asset,
                    who.sender,
                    to.sender,
                    amount,
                );
                if amount <= held {
                    let quote = result.unwrap();
                    let expected_fee = if fee_on { amount * 3 / 1_000 } else { 0 };
                    assert_eq!(quote.fee, expected_fee);
                    assert_eq!(quote.net + quote.fee, amount);
                    *model.entry((asset, who.sender)).or_insert(0) -= amount;
                    *model.entry((asset, to.sender)).or_insert(0) += quote.net;
                    *pools.entry(asset).or_insert(0) += quote.fee;
                } else {
                    assert!(matches!(result, Err(VaultError::Ledger(_))));
                }
            }
            4 => {
                fee_on = !fee_on;
                arena.vault.set_fee_on(&controller(), fee_on).unwrap();
            }
            _ => {
                // Unauthorized transfer attempt: must change nothing.
                let result = arena.vault.transfer_account_asset(
                    &who,
                    asset,
                    who.sender,
                    player(0).sender,
                    1,
                );
                assert!(result.is_err());
            }
        }

        for ((asset, account), expected) in &model {
            assert_eq!(arena.vault.get_account_asset(asset, account), *expected);
        }
        for asset in &assets {
            assert_eq!(
                arena.vault.get_asset_fees(asset),
                pools.get(asset).copied().unwrap_or(0)
            );
        }
    }

    arena.assert_conserved();
}

#[test]
fn random_sequences_conserve_value() {
    for seed in [1, 7, 42, 1_337, 90_210] {
        run_sequence(seed, 400);
    }
}

#[test]
fn draining_everything_leaves_only_fees() {
    let arena = Arena::new(10_000);
    let asset = arena.tokens[0].id();
    arena.vault.set_fee_on(&controller(), true).unwrap();

    for i in 0..PLAYERS {
        arena.vault.deposit(&player(i), asset, 10_000).unwrap();
    }
    // Funnel everything to player 0.
    for i in 1..PLAYERS {
        arena
            .vault
            .transfer_account_asset(&controller(), asset, player(i).sender, player(0).sender, 10_000)
            .unwrap();
    }
    let owned = arena.vault.get_account_asset(&asset, &player(0).sender);
    arena.vault.withdraw(&player(0), asset, owned).unwrap();

    let fees = arena.vault.get_asset_fees(&asset);
    assert_eq!(fees, (PLAYERS as Amount - 1) * 30);
    assert_eq!(arena.tokens[0].balance_of(&arena.vault.address()), fees);
    arena.assert_conserved();
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_players_conserve_value() {
    let arena = Arc::new(Arena::new(100_000));
    let mut handles = Vec::new();

    for i in 0..PLAYERS {
        let arena = Arc::clone(&arena);
        handles.push(tokio::task::spawn_blocking(move || {
            let me = player(i);
            let next = player((i + 1) % PLAYERS);
            let asset = arena.tokens[i % arena.tokens.len()].id();
            for round in 0..200u128 {
                arena.vault.deposit(&me, asset, 100).unwrap();
                // Push some of it to a neighbour, who may be withdrawing too.
                let _ = arena.vault.transfer_account_asset(
                    &controller(),
                    asset,
                    me.sender,
                    next.sender,
                    50,
                );
                if round % 3 == 0 {
                    arena.vault.deposit_native(&me.with_value(7)).unwrap();
                }
                let mine = arena.vault.get_account_asset(&asset, &me.sender);
                if mine > 0 {
                    // The neighbour's transfer may race this read; a refusal
                    // is fine, an inconsistency is not.
                    let _ = arena.vault.withdraw(&me, asset, mine.min(80));
                }
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    arena.assert_conserved();
    let journal = arena.vault.events();
    for (index, record) in journal.iter().enumerate() {
        assert_eq!(record.seq, index as u64 + 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_withdrawals_never_overdraw() {
    let arena = Arc::new(Arena::new(1_000));
    let asset = arena.tokens[0].id();
    arena.vault.deposit(&player(0), asset, 1_000).unwrap();

    // Many tasks race to withdraw from the same account.
    let mut handles = Vec::new();
    for _ in 0..16 {
        let arena = Arc::clone(&arena);
        handles.push(tokio::task::spawn_blocking(move || {
            (0..20)
                .filter(|_| arena.vault.withdraw(&player(0), asset, 10).is_ok())
                .count()
        }));
    }

    let mut successes = 0;
    for handle in handles {
        successes += handle.await.unwrap();
    }

    assert_eq!(successes, 100);
    assert_eq!(arena.tokens[0].balance_of(&player(0).sender), 1_000);
    assert_eq!(arena.vault.get_account_asset(&asset, &player(0).sender), 0);
    arena.assert_conserved();
}
