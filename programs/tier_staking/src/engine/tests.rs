use std::collections::BTreeMap;

use anchor_lang::error::Error;
use proptest::prelude::*;

use super::reward::{pending_reward, total_reward};
use super::vault::mock::MockVault;
use super::*;
use crate::constants::*;
use crate::state::{EngineConfig, InvestorAccount, StakeOrder, StakePool};

const T0: i64 = 1_700_000_000;
const DAY: i64 = SECONDS_PER_DAY;
const ONE_TOKEN: u64 = 1_000_000_000;

/// Pool, vault and the order accounts a validator would hold.
struct Harness {
    pool_key: Pubkey,
    pool: StakePool,
    vault: MockVault,
    orders: BTreeMap<u64, StakeOrder>,
}

type Snapshot = (Vec<u8>, Vec<Vec<u8>>, Vec<u8>, u64);

impl Harness {
    fn new() -> Self {
        let pool = StakePool::new(
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            EngineConfig::new(DEFAULT_MAX_CLAIM_PER_TX).unwrap(),
            T0,
        );
        Self {
            pool_key: Pubkey::new_unique(),
            pool,
            vault: MockVault::default(),
            orders: BTreeMap::new(),
        }
    }

    fn funded(reserves: u64) -> Self {
        let mut h = Self::new();
        if reserves > 0 {
            h.engine().fund(&Pubkey::new_unique(), reserves, T0).unwrap();
        }
        h
    }

    fn engine(&mut self) -> StakingEngine<'_, &mut MockVault> {
        StakingEngine::new(&mut self.pool, &mut self.vault)
    }

    fn authority(&self) -> Pubkey {
        self.pool.authority
    }

    fn investor(&self) -> (Pubkey, InvestorAccount) {
        let key = Pubkey::new_unique();
        (key, InvestorAccount::new(key, self.pool_key, 255))
    }

    fn stake(
        &mut self,
        caller: &Pubkey,
        investor: &mut InvestorAccount,
        amount: u64,
        tier_id: u8,
        locked: bool,
        now: i64,
    ) -> Result<u64> {
        let order = StakingEngine::new(&mut self.pool, &mut self.vault)
            .stake(caller, investor, amount, tier_id, locked, now)?;
        let order_id = order.order_id;
        self.orders.insert(order_id, order);
        Ok(order_id)
    }

    fn claim(&mut self, caller: &Pubkey, investor: &mut InvestorAccount, id: u64, now: i64) -> Result<u64> {
        let order = self.orders.get_mut(&id).ok_or(StakingError::OrderNotFound)?;
        StakingEngine::new(&mut self.pool, &mut self.vault).claim(caller, investor, order, now)
    }

    fn unstake(
        &mut self,
        caller: &Pubkey,
        investor: &mut InvestorAccount,
        id: u64,
        now: i64,
    ) -> Result<UnstakeReceipt> {
        let order = self.orders.get_mut(&id).ok_or(StakingError::OrderNotFound)?;
        StakingEngine::new(&mut self.pool, &mut self.vault).unstake(caller, investor, order, now)
    }

    fn emergency_withdraw(
        &mut self,
        caller: &Pubkey,
        investor: &mut InvestorAccount,
        id: u64,
        now: i64,
    ) -> Result<PenaltySplit> {
        let order = self.orders.get_mut(&id).ok_or(StakingError::OrderNotFound)?;
        StakingEngine::new(&mut self.pool, &mut self.vault)
            .emergency_withdraw(caller, investor, order, now)
    }

    fn settle(&mut self, id: u64, now: i64) -> Result<bool> {
        let order = self.orders.get_mut(&id).ok_or(StakingError::OrderNotFound)?;
        StakingEngine::new(&mut self.pool, &mut self.vault).settle_order(order, now)
    }

    fn order(&self, id: u64) -> &StakeOrder {
        &self.orders[&id]
    }

    fn pending(&self, id: u64, now: i64) -> u64 {
        pending_reward(self.order(id), now).unwrap()
    }

    /// Every ledger byte: pool, orders and investor.
    fn ledger(&self, investor: &InvestorAccount) -> (Vec<u8>, Vec<Vec<u8>>, Vec<u8>) {
        (
            self.pool.try_to_vec().unwrap(),
            self.orders.values().map(|o| o.try_to_vec().unwrap()).collect(),
            investor.try_to_vec().unwrap(),
        )
    }

    fn snapshot(&self, investor: &InvestorAccount) -> Snapshot {
        let (pool, orders, investor) = self.ledger(investor);
        (pool, orders, investor, self.vault.holdings)
    }
}

fn assert_err<T: std::fmt::Debug>(result: Result<T>, expected: StakingError) {
    match result {
        Err(Error::AnchorError(e)) => assert_eq!(
            e.error_code_number,
            u32::from(expected),
            "unexpected error: {}",
            e.error_msg
        ),
        other => panic!("expected {:?}, got {:?}", expected, other),
    }
}

// ==================== STAKE ====================

#[test]
fn test_stake_rejects_invalid_input_without_state_change() {
    let mut h = Harness::funded(ONE_TOKEN);
    let (alice, mut inv) = h.investor();
    let before = h.snapshot(&inv);

    assert_err(h.stake(&alice, &mut inv, 0, tier::MONTH, false, T0), StakingError::ZeroAmount);
    assert_err(
        h.stake(&alice, &mut inv, 1_000, TIER_COUNT as u8, false, T0),
        StakingError::InvalidTier,
    );
    assert_err(
        h.stake(&alice, &mut inv, MAX_STAKE_AMOUNT + 1, tier::MONTH, false, T0),
        StakingError::AmountTooLarge,
    );
    let mallory = Pubkey::new_unique();
    assert_err(
        h.stake(&mallory, &mut inv, 1_000, tier::MONTH, false, T0),
        StakingError::Unauthorized,
    );

    assert_eq!(h.snapshot(&inv), before);
}

#[test]
fn test_stake_updates_counters() {
    let mut h = Harness::funded(ONE_TOKEN);
    let (alice, mut a) = h.investor();
    let (bob, mut b) = h.investor();

    let first = h.stake(&alice, &mut a, 100, tier::MONTH, false, T0).unwrap();
    let second = h.stake(&alice, &mut a, 200, tier::MONTH, true, T0).unwrap();
    let third = h.stake(&alice, &mut a, 300, tier::YEAR, true, T0).unwrap();
    let fourth = h.stake(&bob, &mut b, 400, tier::MONTH, false, T0).unwrap();
    assert_eq!((first, second, third, fourth), (1, 2, 3, 4));

    let totals = &h.pool.totals;
    assert_eq!(totals.next_order_id, 5);
    assert_eq!(totals.total_staked_ever, 1_000);
    assert_eq!(totals.current_staked_outstanding, 1_000);
    assert_eq!(totals.total_distinct_stakers, 2);
    assert_eq!(totals.tier_staker_count[tier::MONTH as usize], 2);
    assert_eq!(totals.tier_staker_count[tier::YEAR as usize], 1);
    assert_eq!(totals.tier_staked_amount[tier::MONTH as usize], 700);
    assert_eq!(totals.tier_staked_amount[tier::YEAR as usize], 300);
    assert_eq!(a.principal_balance, 600);
    assert!(a.has_ever_staked && a.staked_in_tier[tier::YEAR as usize]);

    assert_eq!(a.order_ids, vec![1, 2, 3]);
    assert_eq!(b.order_ids, vec![4]);
    assert_eq!(h.order(2).stake_pool, h.pool_key);
    assert_eq!(h.order(4).owner, bob);
}

#[test]
fn test_stake_sizes_order_by_amount_received() {
    let mut h = Harness::new();
    h.vault.fee_percent = 1;
    h.engine().fund(&Pubkey::new_unique(), ONE_TOKEN, T0).unwrap();
    let (alice, mut inv) = h.investor();

    let id = h.stake(&alice, &mut inv, ONE_TOKEN, tier::YEAR, false, T0).unwrap();

    assert_eq!(h.order(id).principal, 990_000_000);
    assert_eq!(h.pool.totals.current_staked_outstanding, 990_000_000);
    assert_eq!(inv.principal_balance, 990_000_000);
}

#[test]
fn test_stake_rejected_when_reserves_insufficient() {
    let mut h = Harness::new();
    let (alice, mut inv) = h.investor();
    let before = h.snapshot(&inv);

    // 1000 deposited against a 1050 requirement
    assert_err(
        h.stake(&alice, &mut inv, 1_000, tier::MONTH, false, T0),
        StakingError::InsufficientReserves,
    );
    assert_eq!(h.snapshot(&inv), before);

    h.engine().fund(&Pubkey::new_unique(), 50, T0).unwrap();
    h.stake(&alice, &mut inv, 1_000, tier::MONTH, false, T0).unwrap();
    assert!(h.engine().check_reserves(T0).unwrap());
}

#[test]
fn test_stake_rejected_past_investor_order_limit() {
    let mut h = Harness::funded(ONE_TOKEN);
    let (alice, mut inv) = h.investor();
    inv.order_ids = (1..=MAX_ORDERS_PER_INVESTOR as u64).collect();
    let before = h.snapshot(&inv);

    assert_err(
        h.stake(&alice, &mut inv, 1_000, tier::MONTH, false, T0),
        StakingError::TooManyOrders,
    );
    assert_eq!(h.snapshot(&inv), before);
}

#[test]
fn test_stake_disabled_by_authority() {
    let mut h = Harness::funded(ONE_TOKEN);
    let (alice, mut inv) = h.investor();
    let authority = h.authority();

    assert_err(admin::toggle_staking(&mut h.pool, &alice, false, T0), StakingError::Unauthorized);
    admin::toggle_staking(&mut h.pool, &authority, false, T0).unwrap();
    assert_err(
        h.stake(&alice, &mut inv, 1_000, tier::MONTH, false, T0),
        StakingError::StakingDisabled,
    );

    admin::toggle_staking(&mut h.pool, &authority, true, T0).unwrap();
    assert!(h.stake(&alice, &mut inv, 1_000, tier::MONTH, false, T0).is_ok());
}

// ==================== REWARDS ====================

#[test]
fn test_unlocked_reward_half_term() {
    let mut h = Harness::funded(100);
    let (alice, mut inv) = h.investor();
    let id = h.stake(&alice, &mut inv, 1_000, tier::MONTH, false, T0).unwrap();

    // floor(1000 * 35 * 1_296_000 / (1000 * 31_536_000)) = 1
    assert_eq!(h.pending(id, T0 + 15 * DAY), 1);
    assert_eq!(h.pending(id, T0), 0);
}

#[test]
fn test_locked_order_earns_tier_boost() {
    let mut h = Harness::funded(ONE_TOKEN);
    let (alice, mut inv) = h.investor();
    let locked = h.stake(&alice, &mut inv, ONE_TOKEN, tier::MONTH, true, T0).unwrap();
    let unlocked = h.stake(&alice, &mut inv, ONE_TOKEN, tier::MONTH, false, T0).unwrap();
    let now = T0 + 15 * DAY;

    let base = h.pending(unlocked, now);
    assert_eq!(base, 1_438_356);
    // tier 0 multiplier is 1100: base + base * 100 / 1000
    assert_eq!(h.pending(locked, now), base + base * 100 / 1_000);
}

#[test]
fn test_order_from_another_pool_rejected() {
    let mut h = Harness::funded(ONE_TOKEN);
    let (alice, mut inv) = h.investor();
    let id = h.stake(&alice, &mut inv, ONE_TOKEN, tier::YEAR, false, T0).unwrap();

    inv.stake_pool = Pubkey::new_unique();
    assert_err(h.claim(&alice, &mut inv, id, T0 + 8 * DAY), StakingError::OrderNotFound);
    assert_err(h.unstake(&alice, &mut inv, id, T0 + 8 * DAY), StakingError::OrderNotFound);
}

// ==================== CLAIM ====================

#[test]
fn test_claim_then_cooldown() {
    let mut h = Harness::funded(ONE_TOKEN);
    let (alice, mut inv) = h.investor();
    let id = h.stake(&alice, &mut inv, ONE_TOKEN, tier::YEAR, false, T0).unwrap();

    let now = T0 + 8 * DAY;
    let expected = total_reward(h.order(id), now).unwrap();
    let paid = h.claim(&alice, &mut inv, id, now).unwrap();
    assert_eq!(paid, expected);
    assert_eq!(h.vault.paid_to(&alice), expected);
    assert_eq!(inv.last_claim_time, now);
    assert_eq!(inv.total_reward_claimed, expected);
    assert_eq!(h.pool.totals.total_reward_distributed, expected);

    let order = h.order(id).clone();
    assert!(!order.claimed);
    assert_eq!(
        h.pending(id, now),
        total_reward(&order, now).unwrap() - order.claimed_reward
    );

    // reward keeps accruing, but the cooldown blocks the next claim
    let later = now + DAY;
    assert!(h.pending(id, later) > 0);
    let before = h.snapshot(&inv);
    assert_err(h.claim(&alice, &mut inv, id, later), StakingError::ClaimCooldownActive);
    assert_eq!(h.snapshot(&inv), before);

    assert!(h.claim(&alice, &mut inv, id, now + CLAIM_COOLDOWN).is_ok());
    assert!(h.engine().check_reserves(now + CLAIM_COOLDOWN).unwrap());
}

#[test]
fn test_cooldown_is_shared_across_orders() {
    let mut h = Harness::funded(ONE_TOKEN);
    let (alice, mut inv) = h.investor();
    let first = h.stake(&alice, &mut inv, ONE_TOKEN, tier::YEAR, false, T0).unwrap();
    let second = h.stake(&alice, &mut inv, ONE_TOKEN, tier::YEAR, false, T0).unwrap();

    let now = T0 + 10 * DAY;
    h.claim(&alice, &mut inv, first, now).unwrap();
    assert_err(h.claim(&alice, &mut inv, second, now), StakingError::ClaimCooldownActive);
}

#[test]
fn test_claim_locked_requires_maturity() {
    let mut h = Harness::funded(ONE_TOKEN);
    let (alice, mut inv) = h.investor();
    let id = h.stake(&alice, &mut inv, ONE_TOKEN, tier::MONTH, true, T0).unwrap();

    assert_err(
        h.claim(&alice, &mut inv, id, T0 + 10 * DAY),
        StakingError::LockPeriodNotEnded,
    );

    let maturity = T0 + 30 * DAY;
    let paid = h.claim(&alice, &mut inv, id, maturity).unwrap();
    // base 2_876_712 plus a 10% boost
    assert_eq!(paid, 2_876_712 + 287_671);
    assert!(!h.order(id).claimed);
    // claiming at maturity also settles the order
    assert!(!h.order(id).accruing);
}

#[test]
fn test_claim_capped_per_call() {
    let mut h = Harness::funded(ONE_TOKEN);
    h.pool.config.max_claim_per_tx = 1_000;
    let (alice, mut inv) = h.investor();
    let id = h.stake(&alice, &mut inv, ONE_TOKEN, tier::YEAR, false, T0).unwrap();

    let now = T0 + 8 * DAY;
    let pending = h.pending(id, now);
    assert_eq!(h.claim(&alice, &mut inv, id, now).unwrap(), 1_000);
    assert_eq!(h.pending(id, now), pending - 1_000);
    assert_eq!(h.order(id).claimed_reward, 1_000);
    assert_eq!(h.pool.totals.accrual.claimed_open, 1_000);
}

#[test]
fn test_claim_rejections() {
    let mut h = Harness::funded(ONE_TOKEN);
    let (alice, mut inv) = h.investor();
    let (bob, mut bob_inv) = h.investor();
    let id = h.stake(&alice, &mut inv, ONE_TOKEN, tier::YEAR, false, T0).unwrap();

    assert_err(h.claim(&alice, &mut inv, id, T0), StakingError::NoRewardsAvailable);
    assert_err(h.claim(&bob, &mut bob_inv, id, T0 + DAY), StakingError::NotOrderOwner);
    assert_err(h.claim(&alice, &mut inv, 99, T0 + DAY), StakingError::OrderNotFound);

    h.unstake(&alice, &mut inv, id, T0 + DAY).unwrap();
    assert_err(h.claim(&alice, &mut inv, id, T0 + 9 * DAY), StakingError::AlreadyClaimed);
}

#[test]
fn test_claim_rejected_when_projected_reserves_insufficient() {
    let mut h = Harness::funded(100_000_000);
    let (alice, mut inv) = h.investor();
    let id = h.stake(&alice, &mut inv, ONE_TOKEN, tier::YEAR, false, T0).unwrap();

    h.vault.drain(60_000_000);
    let before = h.snapshot(&inv);
    assert_err(
        h.claim(&alice, &mut inv, id, T0 + 8 * DAY),
        StakingError::InsufficientReserves,
    );
    assert_eq!(h.snapshot(&inv), before);
    assert!(h.vault.payouts.is_empty());
}

#[test]
fn test_failed_transfer_leaves_ledger_unchanged() {
    let mut h = Harness::funded(ONE_TOKEN);
    let (alice, mut inv) = h.investor();
    let id = h.stake(&alice, &mut inv, ONE_TOKEN, tier::YEAR, false, T0).unwrap();

    h.vault.fail_transfers = true;
    let before = h.snapshot(&inv);
    assert_err(h.claim(&alice, &mut inv, id, T0 + 8 * DAY), StakingError::TransferFailed);
    assert_err(h.unstake(&alice, &mut inv, id, T0 + 8 * DAY), StakingError::TransferFailed);
    assert_err(
        h.stake(&alice, &mut inv, ONE_TOKEN, tier::YEAR, false, T0),
        StakingError::TransferFailed,
    );
    assert_eq!(h.snapshot(&inv), before);
    assert!(!h.pool.entered);
}

// ==================== UNSTAKE ====================

#[test]
fn test_early_unstake_of_locked_order_penalizes_reward_only() {
    let mut h = Harness::funded(ONE_TOKEN);
    let (alice, mut inv) = h.investor();
    let id = h.stake(&alice, &mut inv, ONE_TOKEN, tier::HALF_YEAR, true, T0).unwrap();

    let now = T0 + 90 * DAY;
    let pending = h.pending(id, now);
    // base 14_794_520 plus a 20% boost
    assert_eq!(pending, 17_753_424);

    let outstanding = h.pool.totals.current_staked_outstanding;
    let receipt = h.unstake(&alice, &mut inv, id, now).unwrap();
    assert_eq!(receipt.penalty, pending * 5 / 100);
    assert_eq!(receipt.penalty, 887_671);
    assert_eq!(receipt.reward, pending - receipt.penalty);
    assert_eq!(receipt.principal, ONE_TOKEN);
    assert_eq!(h.vault.paid_to(&alice), ONE_TOKEN + 16_865_753);

    assert_eq!(h.pool.totals.current_staked_outstanding, outstanding - ONE_TOKEN);
    assert_eq!(inv.principal_balance, 0);
    assert!(h.order(id).claimed);
    assert_eq!(h.pending(id, now + DAY), 0);
    assert_err(h.unstake(&alice, &mut inv, id, now), StakingError::AlreadyClaimed);
    assert!(h.order(id).claimed);
}

#[test]
fn test_unstake_without_penalty() {
    let mut h = Harness::funded(ONE_TOKEN);
    let (alice, mut inv) = h.investor();
    let matured = h.stake(&alice, &mut inv, ONE_TOKEN, tier::MONTH, true, T0).unwrap();
    let flexible = h.stake(&alice, &mut inv, ONE_TOKEN, tier::YEAR, false, T0).unwrap();

    let now = T0 + 40 * DAY;
    let expected = h.pending(matured, now);
    let receipt = h.unstake(&alice, &mut inv, matured, now).unwrap();
    assert_eq!(receipt.penalty, 0);
    assert_eq!(receipt.reward, expected);

    let expected = h.pending(flexible, now);
    let receipt = h.unstake(&alice, &mut inv, flexible, now).unwrap();
    assert_eq!(receipt.penalty, 0);
    assert_eq!(receipt.reward, expected);
    assert_eq!(h.pool.totals.current_staked_outstanding, 0);
    assert_eq!(h.pool.totals.tier_staked_amount, [0; TIER_COUNT]);
    assert_eq!(h.pool.totals.accrual, AccrualTotals::default());
}

#[test]
fn test_unstake_by_stranger_rejected() {
    let mut h = Harness::funded(ONE_TOKEN);
    let (alice, mut inv) = h.investor();
    let (bob, mut bob_inv) = h.investor();
    let id = h.stake(&alice, &mut inv, ONE_TOKEN, tier::YEAR, false, T0).unwrap();

    assert_err(h.unstake(&bob, &mut bob_inv, id, T0 + DAY), StakingError::NotOrderOwner);
}

#[test]
fn test_unstake_unaffected_by_other_orders() {
    let now = T0 + 40 * DAY;

    let mut alone = Harness::funded(ONE_TOKEN);
    let (alice, mut inv) = alone.investor();
    let id = alone.stake(&alice, &mut inv, ONE_TOKEN, tier::YEAR, true, T0).unwrap();
    let expected = alone.unstake(&alice, &mut inv, id, now).unwrap();

    let mut crowded = Harness::funded(ONE_TOKEN);
    let (alice, mut inv) = crowded.investor();
    let id = crowded.stake(&alice, &mut inv, ONE_TOKEN, tier::YEAR, true, T0).unwrap();
    for i in 0..600u64 {
        let (other, mut other_inv) = crowded.investor();
        let tier_id = (i % TIER_COUNT as u64) as u8;
        crowded
            .stake(&other, &mut other_inv, 1_000 + i, tier_id, i % 2 == 0, T0 + 1)
            .unwrap();
    }
    let others = crowded.pool.totals.accrual;
    let others_principal: u64 = (0..600u64).map(|i| 1_000 + i).sum();

    // the operation is handed only its own order
    let receipt = crowded.unstake(&alice, &mut inv, id, now).unwrap();
    assert_eq!(receipt, expected);
    assert_eq!(crowded.vault.paid_to(&alice), alone.vault.paid_to(&alice));
    assert_eq!(crowded.pool.totals.current_staked_outstanding, others_principal);
    assert!(crowded.pool.totals.accrual.rate < others.rate);
}

// ==================== SETTLEMENT ====================

#[test]
fn test_settle_order_after_maturity() {
    let mut h = Harness::funded(ONE_TOKEN);
    let (alice, mut inv) = h.investor();
    let short = h.stake(&alice, &mut inv, ONE_TOKEN, tier::MONTH, false, T0).unwrap();
    let long = h.stake(&alice, &mut inv, ONE_TOKEN, tier::YEAR, false, T0).unwrap();

    assert_err(h.settle(short, T0 + 29 * DAY), StakingError::LockPeriodNotEnded);

    let now = T0 + 90 * DAY;
    let exact = h.pending(short, now) + h.pending(long, now);
    assert!(h.pool.totals.accrual.owed(now).unwrap() > exact + 1_000);

    assert!(h.settle(short, now).unwrap());
    assert!(!h.order(short).accruing);
    assert!(!h.settle(short, now).unwrap());

    let owed = h.pool.totals.accrual.owed(now).unwrap();
    assert!(owed >= exact && owed <= exact + 7);

    h.unstake(&alice, &mut inv, short, now).unwrap();
    h.unstake(&alice, &mut inv, long, now).unwrap();
    assert_eq!(h.pool.totals.accrual, AccrualTotals::default());
    assert_err(h.settle(short, now), StakingError::AlreadyClaimed);
}

// ==================== EMERGENCY ====================

#[test]
fn test_emergency_withdraw_only_while_insolvent() {
    let mut h = Harness::funded(100_000_000);
    let (alice, mut inv) = h.investor();
    let id = h.stake(&alice, &mut inv, ONE_TOKEN, tier::YEAR, true, T0).unwrap();
    let authority = h.authority();

    let now = T0 + DAY;
    assert!(h.engine().check_reserves(now).unwrap());
    assert_err(
        h.emergency_withdraw(&alice, &mut inv, id, now),
        StakingError::ReservesSufficient,
    );

    h.vault.drain(100_000_000);
    assert!(!h.engine().check_reserves(now).unwrap());

    let split = h.emergency_withdraw(&alice, &mut inv, id, now).unwrap();
    assert_eq!(split.payable, 900_000_000);
    assert_eq!(split.penalty, 100_000_000);
    assert_eq!(h.vault.paid_to(&alice), 900_000_000);
    assert_eq!(h.vault.paid_to(&authority), 100_000_000);
    assert_eq!(h.pool.totals.current_staked_outstanding, 0);
    assert_eq!(h.pool.totals.accrual, AccrualTotals::default());
    assert_eq!(inv.total_reward_claimed, 0);
    assert!(h.order(id).claimed);

    assert_err(
        h.emergency_withdraw(&alice, &mut inv, id, now),
        StakingError::AlreadyClaimed,
    );
}

#[test]
fn test_emergency_withdraw_transfer_failure_leaves_ledger_unchanged() {
    let mut h = Harness::funded(100_000_000);
    let (alice, mut inv) = h.investor();
    let id = h.stake(&alice, &mut inv, ONE_TOKEN, tier::YEAR, true, T0).unwrap();
    let now = T0 + DAY;
    h.vault.drain(200_000_000);

    h.vault.fail_transfers = true;
    let before = h.snapshot(&inv);
    assert_err(h.emergency_withdraw(&alice, &mut inv, id, now), StakingError::TransferFailed);
    assert_eq!(h.snapshot(&inv), before);
    assert!(!h.pool.entered);

    // vault holds exactly the investor's share: the first payout goes
    // through, the penalty transfer fails
    h.vault.fail_transfers = false;
    assert_eq!(h.vault.holdings, 900_000_000);
    let ledger = h.ledger(&inv);
    assert_err(h.emergency_withdraw(&alice, &mut inv, id, now), StakingError::TransferFailed);
    assert_eq!(h.ledger(&inv), ledger);
    assert!(!h.order(id).claimed);
    assert!(!h.pool.entered);
    // only the host's transaction rollback undoes this payout
    assert_eq!(h.vault.paid_to(&alice), 900_000_000);
}

// ==================== ADMIN ====================

#[test]
fn test_withdraw_surplus_of_staked_asset() {
    let mut h = Harness::funded(500_000_000);
    let (alice, mut inv) = h.investor();
    h.stake(&alice, &mut inv, ONE_TOKEN, tier::YEAR, false, T0).unwrap();
    let authority = h.authority();

    assert_err(
        h.engine().withdraw_surplus(&alice, SurplusAsset::Staked, T0),
        StakingError::Unauthorized,
    );

    let amount = h.engine().withdraw_surplus(&authority, SurplusAsset::Staked, T0).unwrap();
    assert_eq!(amount, 500_000_000);
    assert_eq!(h.vault.holdings, ONE_TOKEN);
    assert_err(
        h.engine().withdraw_surplus(&authority, SurplusAsset::Staked, T0),
        StakingError::NoSurplus,
    );

    // principal alone no longer meets the 105% ratio
    assert!(!h.engine().check_reserves(T0).unwrap());
}

#[test]
fn test_withdraw_surplus_of_foreign_asset() {
    let mut h = Harness::new();
    let authority = h.authority();
    let mut foreign = MockVault {
        holdings: 77,
        ..Default::default()
    };

    let amount = h
        .engine()
        .withdraw_surplus(&authority, SurplusAsset::Foreign(&mut foreign), T0)
        .unwrap();
    assert_eq!(amount, 77);
    assert_eq!(foreign.paid_to(&authority), 77);
    assert_eq!(foreign.holdings, 0);
}

#[test]
fn test_withdraw_surplus_transfer_failure_leaves_ledger_unchanged() {
    let mut h = Harness::funded(500_000_000);
    let (alice, mut inv) = h.investor();
    h.stake(&alice, &mut inv, ONE_TOKEN, tier::YEAR, false, T0).unwrap();
    let authority = h.authority();

    h.vault.fail_transfers = true;
    let before = h.snapshot(&inv);
    assert_err(
        h.engine().withdraw_surplus(&authority, SurplusAsset::Staked, T0 + DAY),
        StakingError::TransferFailed,
    );
    assert_eq!(h.snapshot(&inv), before);
    assert!(!h.pool.entered);

    let mut foreign = MockVault {
        holdings: 77,
        fail_transfers: true,
        ..Default::default()
    };
    assert_err(
        h.engine()
            .withdraw_surplus(&authority, SurplusAsset::Foreign(&mut foreign), T0 + DAY),
        StakingError::TransferFailed,
    );
    assert_eq!(foreign.holdings, 77);
    assert_eq!(h.snapshot(&inv), before);
    assert!(!h.pool.entered);
}

#[test]
fn test_two_step_authority_transfer() {
    let mut h = Harness::new();
    let old = h.authority();
    let new = Pubkey::new_unique();
    let stranger = Pubkey::new_unique();

    assert_err(admin::propose_authority(&mut h.pool, &stranger, new, T0), StakingError::Unauthorized);
    assert_err(
        admin::propose_authority(&mut h.pool, &old, Pubkey::default(), T0),
        StakingError::InvalidRecipient,
    );
    assert_err(admin::accept_authority(&mut h.pool, &new, T0), StakingError::NotPendingAuthority);

    admin::propose_authority(&mut h.pool, &old, new, T0).unwrap();
    assert_eq!(h.pool.authority, old);
    assert_err(admin::accept_authority(&mut h.pool, &stranger, T0), StakingError::NotPendingAuthority);

    admin::accept_authority(&mut h.pool, &new, T0).unwrap();
    assert_eq!(h.pool.authority, new);
    assert_eq!(h.pool.pending_authority, None);
    assert_err(admin::toggle_staking(&mut h.pool, &old, false, T0), StakingError::Unauthorized);
    assert!(admin::toggle_staking(&mut h.pool, &new, false, T0).is_ok());
}

// ==================== GUARD ====================

#[test]
fn test_reentrant_call_rejected() {
    let mut h = Harness::funded(ONE_TOKEN);
    let (alice, mut inv) = h.investor();
    let authority = h.authority();

    h.pool.entered = true;
    assert_err(
        h.stake(&alice, &mut inv, ONE_TOKEN, tier::YEAR, false, T0),
        StakingError::Reentrancy,
    );
    assert_err(admin::toggle_staking(&mut h.pool, &authority, false, T0), StakingError::Reentrancy);
    assert!(h.pool.flags.staking_enabled);

    h.pool.entered = false;
    assert_err(h.stake(&alice, &mut inv, 0, tier::YEAR, false, T0), StakingError::ZeroAmount);
    assert!(!h.pool.entered);
    assert!(h.stake(&alice, &mut inv, ONE_TOKEN, tier::YEAR, false, T0).is_ok());
    assert!(!h.pool.entered);
}

#[test]
fn test_fund_rejects_zero() {
    let mut h = Harness::new();
    assert_err(h.engine().fund(&Pubkey::new_unique(), 0, T0), StakingError::ZeroAmount);
    assert_eq!(h.vault.holdings, 0);
}

// ==================== RESERVE RATIO ====================

#[derive(Clone, Debug)]
enum Step {
    Stake { amount: u64, tier_id: u8, locked: bool },
    Claim { pick: usize },
}

fn step() -> impl Strategy<Value = (Step, i64)> {
    let stake = (1u64..=5_000_000_000, 0..TIER_COUNT as u8, any::<bool>())
        .prop_map(|(amount, tier_id, locked)| Step::Stake { amount, tier_id, locked });
    let claim = any::<usize>().prop_map(|pick| Step::Claim { pick });
    (prop_oneof![stake, claim], 0..40 * DAY)
}

proptest! {
    #[test]
    fn prop_gated_operations_keep_reserve_ratio(
        reserves in 0u64..=2_000_000_000,
        steps in prop::collection::vec(step(), 1..40),
    ) {
        let mut h = Harness::funded(reserves);
        let (alice, mut inv) = h.investor();
        let mut now = T0;

        for (step, dt) in steps {
            now += dt;
            let before = h.snapshot(&inv);
            let result = match step {
                Step::Stake { amount, tier_id, locked } => {
                    h.stake(&alice, &mut inv, amount, tier_id, locked, now).map(|_| ())
                }
                Step::Claim { pick } => {
                    if h.orders.is_empty() {
                        continue;
                    }
                    let id = *h.orders.keys().nth(pick % h.orders.len()).unwrap();
                    h.claim(&alice, &mut inv, id, now).map(|_| ())
                }
            };

            match result {
                Ok(()) => prop_assert!(h.engine().check_reserves(now).unwrap()),
                Err(_) => prop_assert_eq!(h.snapshot(&inv), before),
            }
            prop_assert!(!h.pool.entered);
        }
    }
}
