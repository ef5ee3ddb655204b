// crates/farm-economics/tests/chef_scenarios.rs
//
// End-to-end farming scenarios against the in-memory bank.
//
// Fixture: start block 0, 20 blocks per period, last period index 2,
// 1000 reward per block initially, 50% kept per period, 50% of emission
// routed to the pools. Pool 0 (ALI self-staking) has weight 1000.

use farm_core::{AccountId, Amount, AssetId, FarmError, TokenLedger};
use farm_economics::{
    EmissionParams, InMemoryBank, MasterChef, StakingSettings, ACC_REWARD_PRECISION,
    STAKING_POOL,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const BLOCK_PER_PERIOD: u64 = 20;
const MAXIMUM_PERIOD_INDEX: u64 = 2;
const MAX_BLOCK: u64 = BLOCK_PER_PERIOD * (MAXIMUM_PERIOD_INDEX + 1);

fn ali() -> AssetId {
    AssetId::new("ALI")
}

fn lp(n: u32) -> AssetId {
    AssetId::new(format!("LP{}", n))
}

fn alice() -> AccountId {
    AccountId::from_label("alice")
}

fn bob() -> AccountId {
    AccountId::from_label("bob")
}

fn fixture() -> MasterChef<InMemoryBank> {
    let mut chef = MasterChef::new(
        &EmissionParams::default(),
        &StakingSettings::default(),
        InMemoryBank::new(),
    )
    .unwrap();
    for who in [alice(), bob()] {
        chef.ledger_mut().fund(&lp(1), &who, 2_000).unwrap();
    }
    chef
}

fn balance(chef: &MasterChef<InMemoryBank>, asset: &AssetId, who: &AccountId) -> Amount {
    chef.ledger().balance_of(asset, who)
}

// ---------------------------------------------------------------------------
// Emission schedule
// ---------------------------------------------------------------------------

#[test]
fn first_period_rate_is_initial_rate() {
    let chef = fixture();
    assert_eq!(chef.reward_per_block(0), 1_000);
}

#[test]
fn second_period_rate_keeps_percent() {
    let chef = fixture();
    assert_eq!(chef.reward_per_block(1), 1_000 * 50 / 100);
}

#[test]
fn reward_stays_claimable_after_last_period() {
    let chef = fixture();
    let current_block = MAX_BLOCK + 10;
    let expected = (chef.reward_per_block(0) * 20
        + chef.reward_per_block(1) * 20
        + chef.reward_per_block(2) * 20)
        * 50
        / 100;
    assert_eq!(chef.claimable_reward(0, current_block).unwrap(), expected);
    assert_eq!(expected, 17_500);
}

// ---------------------------------------------------------------------------
// Pool registry
// ---------------------------------------------------------------------------

#[test]
fn staking_pool_uses_reward_token() {
    let chef = fixture();
    assert_eq!(chef.pool_info(STAKING_POOL).unwrap().stake_asset(), &ali());
}

#[test]
fn adding_five_pools_gives_six() {
    let mut chef = fixture();
    let weights = [2_000, 1_000, 500, 500, 500];
    for (i, weight) in weights.iter().enumerate() {
        chef.add(*weight, lp(i as u32 + 1), true, i as u64 + 1).unwrap();
    }
    assert_eq!(chef.pool_length(), 6);
    assert_eq!(chef.total_alloc_point(), 1_000 + weights.iter().sum::<Amount>());
}

#[test]
fn add_with_update_locks_in_old_weights() {
    let mut chef = fixture();
    let pid = chef.add(1_000, lp(1), true, 0).unwrap();
    chef.deposit(&alice(), pid, 10, 0).unwrap();

    // 10 blocks at weight 1000/2000, then a new pool halves the share
    chef.add(2_000, lp(2), true, 10).unwrap();
    let at_add = chef.pool_info(pid).unwrap().acc_reward_per_share();
    assert_eq!(at_add, 2_500 * ACC_REWARD_PRECISION / 10);

    // 10 more blocks at weight 1000/4000
    let pending = chef.pending_reward(pid, &alice(), 20).unwrap();
    assert_eq!(pending, 2_500 + 1_250);
}

// ---------------------------------------------------------------------------
// Deposits and withdrawals
// ---------------------------------------------------------------------------

#[test]
fn pending_matches_formula_after_one_block() {
    let mut chef = fixture();
    let pid = chef.add(2_000, lp(1), true, 1).unwrap();
    let total_alloc_point = chef.total_alloc_point();
    let amount = 20;

    chef.deposit(&alice(), pid, amount, 2).unwrap();
    let current_block = 3;

    let last_reward_block = chef.pool_info(pid).unwrap().last_reward_block();
    let all_pool_reward = chef.claimable_reward(last_reward_block, current_block).unwrap();
    let pool_reward = all_pool_reward * 2_000 / total_alloc_point;
    let lp_supply = balance(&chef, &lp(1), chef.account());
    let acc = pool_reward * ACC_REWARD_PRECISION / lp_supply;
    let expected = amount * acc / ACC_REWARD_PRECISION;

    assert_eq!(chef.pending_reward(pid, &alice(), current_block).unwrap(), expected);
    assert_eq!(expected, 333);
}

#[test]
fn pending_equals_zero_deposit_harvest() {
    let mut chef = fixture();
    let pid = chef.add(2_000, lp(1), true, 1).unwrap();
    chef.deposit(&alice(), pid, 20, 2).unwrap();
    chef.deposit(&bob(), pid, 50, 9).unwrap();

    for (who, block) in [(alice(), 15), (bob(), 27), (alice(), 70)] {
        let pending = chef.pending_reward(pid, &who, block).unwrap();
        let before = balance(&chef, &ali(), &who);
        let paid = chef.deposit(&who, pid, 0, block).unwrap();
        assert_eq!(paid, pending);
        assert_eq!(balance(&chef, &ali(), &who) - before, pending);
        assert_eq!(chef.pending_reward(pid, &who, block).unwrap(), 0);
    }
}

#[test]
fn deposit_then_withdraw_pays_reward() {
    let mut chef = fixture();
    assert_eq!(balance(&chef, &ali(), &alice()), 0);

    let pid = chef.add(2_000, lp(1), true, 1).unwrap();
    let amount = 20;
    chef.deposit(&alice(), pid, amount, 2).unwrap();
    assert_eq!(chef.user_info(pid, &alice()).unwrap().amount(), amount);
    let debt_before = chef.user_info(pid, &alice()).unwrap().reward_debt();

    chef.withdraw(&alice(), pid, amount, 3).unwrap();

    let user = chef.user_info(pid, &alice()).unwrap();
    let acc = chef.pool_info(pid).unwrap().acc_reward_per_share();
    assert_eq!(user.amount(), 0);
    assert_eq!(user.reward_debt(), 0);
    assert_eq!(
        balance(&chef, &ali(), &alice()),
        amount * acc / ACC_REWARD_PRECISION - debt_before
    );
    assert_eq!(balance(&chef, &lp(1), &alice()), 2_000);
}

#[test]
fn late_depositor_does_not_share_earlier_reward() {
    let mut chef = fixture();
    let pid = chef.add(1_000, lp(1), true, 0).unwrap();
    chef.deposit(&alice(), pid, 100, 0).unwrap();
    chef.deposit(&bob(), pid, 100, 10).unwrap();

    // blocks 0..10 belong to alice alone: 10 * 500 * 1000/2000 = 2500
    assert_eq!(chef.pending_reward(pid, &alice(), 10).unwrap(), 2_500);
    assert_eq!(chef.pending_reward(pid, &bob(), 10).unwrap(), 0);

    // blocks 10..20 are split evenly
    assert_eq!(chef.pending_reward(pid, &alice(), 20).unwrap(), 2_500 + 1_250);
    assert_eq!(chef.pending_reward(pid, &bob(), 20).unwrap(), 1_250);
}

#[test]
fn withdrawn_stake_earns_nothing_afterwards() {
    let mut chef = fixture();
    let pid = chef.add(1_000, lp(1), true, 0).unwrap();
    chef.deposit(&alice(), pid, 100, 0).unwrap();
    chef.deposit(&bob(), pid, 100, 0).unwrap();
    chef.withdraw(&alice(), pid, 100, 10).unwrap();

    assert_eq!(chef.pending_reward(pid, &alice(), 30).unwrap(), 0);
    let alice_total = balance(&chef, &ali(), &alice());
    chef.deposit(&alice(), pid, 0, 30).unwrap();
    assert_eq!(balance(&chef, &ali(), &alice()), alice_total);
}

#[test]
fn harvest_after_schedule_end_pays_everything_earned() {
    let mut chef = fixture();
    let pid = chef.add(1_000, lp(1), true, 0).unwrap();
    chef.deposit(&alice(), pid, 100, 0).unwrap();

    let paid = chef.deposit(&alice(), pid, 0, MAX_BLOCK + 500).unwrap();
    // pool owns half of the 17500 pool-side emission
    assert_eq!(paid, 8_750);
    assert_eq!(chef.deposit(&alice(), pid, 0, MAX_BLOCK + 900).unwrap(), 0);
}

#[test]
fn withdraw_more_than_staked_fails() {
    let mut chef = fixture();
    let pid = chef.add(2_000, lp(1), true, 1).unwrap();
    chef.deposit(&alice(), pid, 20, 2).unwrap();
    let err = chef.withdraw(&alice(), pid, 21, 3).unwrap_err();
    assert!(matches!(err, FarmError::InsufficientStake { .. }));
    assert_eq!(chef.user_info(pid, &alice()).unwrap().amount(), 20);
}

// ---------------------------------------------------------------------------
// Self-staking pool
// ---------------------------------------------------------------------------

#[test]
fn enter_and_leave_staking_returns_principal_plus_reward() {
    let mut chef = fixture();
    let initial_amount = 1_000;
    chef.ledger_mut().fund(&ali(), &alice(), initial_amount).unwrap();

    let staking_amount = 10;
    chef.enter_staking(&alice(), staking_amount, 3).unwrap();
    assert_eq!(
        chef.user_info(STAKING_POOL, &alice()).unwrap().amount(),
        staking_amount
    );
    let receipt = AssetId::new("xALI");
    assert_eq!(balance(&chef, &receipt, &alice()), staking_amount);
    let debt_before = chef.user_info(STAKING_POOL, &alice()).unwrap().reward_debt();

    chef.leave_staking(&alice(), staking_amount, 4).unwrap();

    let user = chef.user_info(STAKING_POOL, &alice()).unwrap();
    assert_eq!(user.amount(), 0);
    let acc = chef.pool_info(STAKING_POOL).unwrap().acc_reward_per_share();
    let reward = staking_amount * acc / ACC_REWARD_PRECISION - debt_before;
    assert_eq!(reward, 500);
    assert_eq!(
        balance(&chef, &ali(), &alice()),
        initial_amount - staking_amount + staking_amount + reward
    );
    assert_eq!(balance(&chef, &receipt, &alice()), 0);
    assert_eq!(chef.ledger().total_supply(&receipt), 0);
}

#[test]
fn leave_staking_without_receipts_rolls_back() {
    let mut chef = fixture();
    chef.ledger_mut().fund(&ali(), &alice(), 100).unwrap();
    chef.enter_staking(&alice(), 10, 1).unwrap();

    // alice gives her receipts away; she can no longer burn them
    let receipt = AssetId::new("xALI");
    chef.ledger_mut()
        .apply(&[farm_core::LedgerOp::Transfer {
            asset: receipt.clone(),
            from: alice(),
            to: bob(),
            amount: 10,
        }])
        .unwrap();

    let err = chef.leave_staking(&alice(), 10, 5).unwrap_err();
    assert!(matches!(err, FarmError::TransferFailure(_)));
    assert_eq!(chef.user_info(STAKING_POOL, &alice()).unwrap().amount(), 10);
    assert_eq!(chef.pool_info(STAKING_POOL).unwrap().last_reward_block(), 1);
    assert_eq!(balance(&chef, &ali(), &alice()), 90);
}

#[test]
fn staking_pool_and_farm_share_emission() {
    let mut chef = fixture();
    chef.ledger_mut().fund(&ali(), &bob(), 100).unwrap();
    let pid = chef.add(1_000, lp(1), true, 0).unwrap();
    chef.enter_staking(&bob(), 100, 0).unwrap();
    chef.deposit(&alice(), pid, 100, 0).unwrap();

    // each pool gets half of 10 * 500
    assert_eq!(chef.pending_reward(STAKING_POOL, &bob(), 10).unwrap(), 2_500);
    assert_eq!(chef.pending_reward(pid, &alice(), 10).unwrap(), 2_500);

    chef.mass_update_pools(10).unwrap();
    let vault_balance = balance(&chef, &ali(), chef.vault().account());
    assert_eq!(vault_balance, 5_000);
}

// ---------------------------------------------------------------------------
// Rounding
// ---------------------------------------------------------------------------

#[test]
fn pending_matches_payout_when_rounding_outruns_the_vault() {
    let mut chef = MasterChef::new(
        &EmissionParams::default(),
        &StakingSettings::default(),
        InMemoryBank::new(),
    )
    .unwrap();
    let users: Vec<AccountId> = ["alice", "bob", "carol"]
        .iter()
        .map(|name| AccountId::from_label(name))
        .collect();
    for who in &users {
        chef.ledger_mut().fund(&lp(1), who, 1_000_000).unwrap();
    }
    let pid = chef.add(2_000, lp(1), true, 0).unwrap();

    // (user, amount, blocks advanced, deposit?) with floored debts that
    // leave one unit more owed than the vault was minted
    let steps: [(usize, Amount, u64, bool); 11] = [
        (1, 153, 8, true),
        (2, 35, 4, true),
        (2, 35, 7, false),
        (2, 0, 9, false),
        (1, 226, 6, true),
        (0, 98, 1, true),
        (1, 225, 6, false),
        (1, 17, 13, false),
        (0, 0, 6, false),
        (0, 0, 0, false),
        (1, 0, 0, false),
    ];
    let mut block = 0;
    for (who, amount, advance, is_deposit) in steps {
        block += advance;
        let user = users[who];
        let pending = chef.pending_reward(pid, &user, block).unwrap();
        let paid = if is_deposit {
            chef.deposit(&user, pid, amount, block).unwrap()
        } else {
            chef.withdraw(&user, pid, amount, block).unwrap()
        };
        assert_eq!(paid, pending, "block {} user {}", block, who);
    }

    // what the vault could not cover is still owed, not lost
    let vault = *chef.vault().account();
    let owed: Amount = users
        .iter()
        .map(|u| chef.user_info(pid, u).unwrap().unpaid())
        .sum();
    let paid: Amount = users.iter().map(|u| balance(&chef, &ali(), u)).sum();
    assert_eq!(paid + balance(&chef, &ali(), &vault), chef.ledger().total_supply(&ali()));
    chef.ledger_mut().fund(&ali(), &vault, owed).unwrap();
    for user in &users {
        let owed_to_user = chef.user_info(pid, user).unwrap().unpaid();
        let pending = chef.pending_reward(pid, user, block).unwrap();
        assert!(pending >= owed_to_user);
    }
}
