//! Staking ledger engine.
//!
//! [`StakingEngine`] composes the catalog, reward formula, penalties, claim
//! throttle and solvency guard over a [`TokenVault`]. It works on one order
//! at a time; pool-wide reward owed comes from the running totals kept on
//! the pool, so no operation visits other orders.
//!
//! Every mutating operation validates and computes on working copies first,
//! moves tokens, and only then commits ledger changes, all inside the
//! reentrancy guard. The engine does not undo a transfer that already
//! succeeded when a later one fails; the host must make the whole operation
//! atomic, as the Solana runtime does by reverting the transaction.

pub mod admin;
pub mod penalty;
pub mod reward;
pub mod solvency;
pub mod throttle;
pub mod vault;

use anchor_lang::prelude::*;

use crate::constants::MAX_STAKE_AMOUNT;
use crate::error::StakingError;
use crate::events::*;
use crate::state::{AccrualTotals, InvestorAccount, StakeOrder, StakePool};

pub use penalty::PenaltySplit;
pub use solvency::SolvencyGuard;
pub use throttle::ClaimThrottle;
pub use vault::{SplVault, TokenVault};

/// Amounts paid by a voluntary unstake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnstakeReceipt {
    pub principal: u64,
    pub reward: u64,
    pub penalty: u64,
}

/// Which pool-held asset a surplus withdrawal targets.
pub enum SurplusAsset<'v> {
    /// The staking vault; only the balance above outstanding principal is surplus.
    Staked,
    /// Any other token account held by the pool; its whole balance is surplus.
    Foreign(&'v mut dyn TokenVault),
}

pub struct StakingEngine<'a, V: TokenVault> {
    pub pool: &'a mut StakePool,
    pub vault: V,
}

impl<'a, V: TokenVault> StakingEngine<'a, V> {
    pub fn new(pool: &'a mut StakePool, vault: V) -> Self {
        Self { pool, vault }
    }

    /// Runs `op` holding the pool's reentrancy flag, released on every exit path.
    fn guarded<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.pool.enter()?;
        let result = op(self);
        self.pool.release();
        result
    }

    fn solvency<'g>(&self, accrual: &'g AccrualTotals) -> SolvencyGuard<'g> {
        SolvencyGuard {
            accrual,
            outstanding: self.pool.totals.current_staked_outstanding,
            reserve_ratio_percent: self.pool.config.reserve_ratio_percent,
        }
    }

    fn throttle(&self) -> ClaimThrottle {
        ClaimThrottle::new(self.pool.config.claim_cooldown)
    }

    /// Common checks for operations on an existing order.
    fn check_order(caller: &Pubkey, investor: &InvestorAccount, order: &StakeOrder) -> Result<()> {
        require!(order.owner == *caller, StakingError::NotOrderOwner);
        require!(investor.owner == *caller, StakingError::Unauthorized);
        require!(
            order.stake_pool == investor.stake_pool,
            StakingError::OrderNotFound
        );
        require!(!order.claimed, StakingError::AlreadyClaimed);
        Ok(())
    }

    // ========== Reads ==========

    pub fn check_reserves(&mut self, now: i64) -> Result<bool> {
        let balance = self.vault.balance()?;
        let accrual = self.pool.totals.accrual;
        self.solvency(&accrual).check_reserves(balance, now)
    }

    // ========== Investor operations ==========

    /// Opens a new order sized by what the vault actually received and
    /// returns it. The caller stores it under `order_id`.
    pub fn stake(
        &mut self,
        caller: &Pubkey,
        investor: &mut InvestorAccount,
        amount: u64,
        tier_id: u8,
        locked: bool,
        now: i64,
    ) -> Result<StakeOrder> {
        self.guarded(|engine| engine.stake_inner(caller, investor, amount, tier_id, locked, now))
    }

    fn stake_inner(
        &mut self,
        caller: &Pubkey,
        investor: &mut InvestorAccount,
        amount: u64,
        tier_id: u8,
        locked: bool,
        now: i64,
    ) -> Result<StakeOrder> {
        require!(self.pool.flags.staking_enabled, StakingError::StakingDisabled);
        require!(amount > 0, StakingError::ZeroAmount);
        require!(amount <= MAX_STAKE_AMOUNT, StakingError::AmountTooLarge);
        let def = *self.pool.config.catalog.lookup(tier_id)?;
        require!(now >= 0, StakingError::InvalidTimestamp);
        now.checked_add(def.lockup_duration)
            .ok_or(StakingError::InvalidTimestamp)?;
        require!(investor.owner == *caller, StakingError::Unauthorized);
        require!(investor.has_order_capacity(), StakingError::TooManyOrders);

        // Optimistic check before any tokens move; re-checked with the actual amount below.
        let accrual = self.pool.totals.accrual;
        let balance_before = self.vault.balance()?;
        self.solvency(&accrual)
            .ensure_after_stake(balance_before.saturating_add(amount), amount, now)?;

        let received = self.vault.transfer_in(amount)?;
        let balance_after = self.vault.balance()?;
        self.solvency(&accrual)
            .ensure_after_stake(balance_after, received, now)?;

        let order_id = self.pool.totals.next_order_id;
        let order = StakeOrder::open(
            investor.stake_pool,
            order_id,
            *caller,
            received,
            &def,
            locked,
            now,
        )?;

        let tier = tier_id as usize;
        let totals = &self.pool.totals;
        let next_order_id = order_id.checked_add(1).ok_or(StakingError::MathOverflow)?;
        let total_staked_ever = totals
            .total_staked_ever
            .checked_add(received)
            .ok_or(StakingError::MathOverflow)?;
        let outstanding = totals
            .current_staked_outstanding
            .checked_add(received)
            .ok_or(StakingError::MathOverflow)?;
        let tier_staked = totals.tier_staked_amount[tier]
            .checked_add(received)
            .ok_or(StakingError::MathOverflow)?;
        let principal_balance = investor
            .principal_balance
            .checked_add(received)
            .ok_or(StakingError::MathOverflow)?;
        let mut accrual = accrual;
        accrual.add_order(&order)?;

        let totals = &mut self.pool.totals;
        totals.next_order_id = next_order_id;
        totals.total_staked_ever = total_staked_ever;
        totals.current_staked_outstanding = outstanding;
        totals.tier_staked_amount[tier] = tier_staked;
        totals.accrual = accrual;
        if !investor.staked_in_tier[tier] {
            investor.staked_in_tier[tier] = true;
            totals.tier_staker_count[tier] = totals.tier_staker_count[tier].saturating_add(1);
        }
        if !investor.has_ever_staked {
            investor.has_ever_staked = true;
            totals.total_distinct_stakers = totals.total_distinct_stakers.saturating_add(1);
        }
        investor.principal_balance = principal_balance;
        investor.order_ids.push(order_id);
        self.pool.last_updated = now;

        emit!(StakeDeposited {
            owner: *caller,
            order_id,
            tier_id,
            requested: amount,
            received,
            locked,
            end_time: order.end_time,
        });
        msg!(
            "Staked {} (received {}) in tier {} as order {}",
            amount,
            received,
            tier_id,
            order_id
        );
        msg!("Outstanding principal: {}", outstanding);

        Ok(order)
    }

    /// Pays accrued reward on one order, capped per call. The order stays open.
    pub fn claim(
        &mut self,
        caller: &Pubkey,
        investor: &mut InvestorAccount,
        order: &mut StakeOrder,
        now: i64,
    ) -> Result<u64> {
        self.guarded(|engine| engine.claim_inner(caller, investor, order, now))
    }

    fn claim_inner(
        &mut self,
        caller: &Pubkey,
        investor: &mut InvestorAccount,
        order: &mut StakeOrder,
        now: i64,
    ) -> Result<u64> {
        Self::check_order(caller, investor, order)?;
        self.throttle().check(investor, now)?;
        if order.locked {
            require!(order.is_matured(now), StakingError::LockPeriodNotEnded);
        }

        let pending = reward::pending_reward(order, now)?;
        require!(pending > 0, StakingError::NoRewardsAvailable);
        let payout = pending.min(self.pool.config.max_claim_per_tx);

        let mut updated = order.clone();
        let mut accrual = self.pool.totals.accrual;
        accrual.settle(&mut updated, now)?;

        let balance = self.vault.balance()?;
        self.solvency(&accrual)
            .ensure_after_claim(balance, payout, now)?;

        updated.claimed_reward = updated
            .claimed_reward
            .checked_add(payout)
            .ok_or(StakingError::MathOverflow)?;
        accrual.record_claim(payout)?;
        let investor_claimed = investor
            .total_reward_claimed
            .checked_add(payout)
            .ok_or(StakingError::MathOverflow)?;
        let distributed = self
            .pool
            .totals
            .total_reward_distributed
            .checked_add(payout)
            .ok_or(StakingError::MathOverflow)?;

        self.vault.transfer_out(caller, payout)?;

        *order = updated;
        investor.total_reward_claimed = investor_claimed;
        self.throttle().record(investor, now);
        self.pool.totals.accrual = accrual;
        self.pool.totals.total_reward_distributed = distributed;
        self.pool.last_updated = now;

        emit!(RewardClaimed {
            owner: *caller,
            order_id: order.order_id,
            amount: payout,
            remaining_pending: pending - payout,
        });
        msg!("Claimed {} reward on order {}", payout, order.order_id);
        msg!("Total rewards claimed by investor: {}", investor_claimed);

        Ok(payout)
    }

    /// Closes an order, paying principal plus reward. Locked orders leaving
    /// before maturity forfeit part of the reward, never principal.
    pub fn unstake(
        &mut self,
        caller: &Pubkey,
        investor: &mut InvestorAccount,
        order: &mut StakeOrder,
        now: i64,
    ) -> Result<UnstakeReceipt> {
        self.guarded(|engine| engine.unstake_inner(caller, investor, order, now))
    }

    fn unstake_inner(
        &mut self,
        caller: &Pubkey,
        investor: &mut InvestorAccount,
        order: &mut StakeOrder,
        now: i64,
    ) -> Result<UnstakeReceipt> {
        Self::check_order(caller, investor, order)?;

        let pending = reward::pending_reward(order, now)?;
        let split = if order.locked && !order.is_matured(now) {
            penalty::early_exit(pending, self.pool.config.early_exit_penalty_percent)?
        } else {
            PenaltySplit {
                penalty: 0,
                payable: pending,
            }
        };
        let principal = order.principal;
        let payout = principal
            .checked_add(split.payable)
            .ok_or(StakingError::MathOverflow)?;

        let mut updated = order.clone();
        let closing = self.closing(investor, &updated, self.pool.totals.accrual)?;
        updated.claimed_reward = updated
            .claimed_reward
            .checked_add(split.payable)
            .ok_or(StakingError::MathOverflow)?;
        updated.mark_claimed()?;
        let investor_claimed = investor
            .total_reward_claimed
            .checked_add(split.payable)
            .ok_or(StakingError::MathOverflow)?;
        let distributed = self
            .pool
            .totals
            .total_reward_distributed
            .checked_add(split.payable)
            .ok_or(StakingError::MathOverflow)?;

        self.vault.transfer_out(caller, payout)?;

        *order = updated;
        self.commit_close(investor, &closing);
        investor.total_reward_claimed = investor_claimed;
        self.pool.totals.total_reward_distributed = distributed;
        self.pool.last_updated = now;

        emit!(Withdrawn {
            owner: *caller,
            order_id: order.order_id,
            principal,
            reward: split.payable,
            penalty: split.penalty,
        });
        msg!(
            "Unstaked order {}: principal {}, reward {}, penalty {}",
            order.order_id,
            principal,
            split.payable,
            split.penalty
        );

        Ok(UnstakeReceipt {
            principal,
            reward: split.payable,
            penalty: split.penalty,
        })
    }

    /// Penalized unwind, only while the reserve ratio is violated.
    pub fn emergency_withdraw(
        &mut self,
        caller: &Pubkey,
        investor: &mut InvestorAccount,
        order: &mut StakeOrder,
        now: i64,
    ) -> Result<PenaltySplit> {
        self.guarded(|engine| engine.emergency_withdraw_inner(caller, investor, order, now))
    }

    fn emergency_withdraw_inner(
        &mut self,
        caller: &Pubkey,
        investor: &mut InvestorAccount,
        order: &mut StakeOrder,
        now: i64,
    ) -> Result<PenaltySplit> {
        Self::check_order(caller, investor, order)?;

        let mut updated = order.clone();
        let mut accrual = self.pool.totals.accrual;
        accrual.settle(&mut updated, now)?;
        let balance = self.vault.balance()?;
        require!(
            !self.solvency(&accrual).check_reserves(balance, now)?,
            StakingError::ReservesSufficient
        );

        let split = penalty::emergency_exit(
            updated.principal,
            self.pool.config.emergency_penalty_percent,
        )?;
        let authority = self.pool.authority;
        let closing = self.closing(investor, &updated, accrual)?;
        updated.mark_claimed()?;

        if split.payable > 0 {
            self.vault.transfer_out(caller, split.payable)?;
        }
        if split.penalty > 0 {
            self.vault.transfer_out(&authority, split.penalty)?;
        }

        *order = updated;
        self.commit_close(investor, &closing);
        self.pool.last_updated = now;

        emit!(EmergencyWithdrawn {
            owner: *caller,
            order_id: order.order_id,
            paid: split.payable,
            penalty: split.penalty,
            authority,
        });
        msg!(
            "Emergency withdrawal of order {}: paid {}, penalty {} to authority",
            order.order_id,
            split.payable,
            split.penalty
        );

        Ok(split)
    }

    /// Counter values once `order` is closed. `accrual` must be the totals
    /// as they currently account for `order`.
    fn closing(
        &self,
        investor: &InvestorAccount,
        order: &StakeOrder,
        mut accrual: AccrualTotals,
    ) -> Result<ClosedTotals> {
        let tier = order.tier_id as usize;
        let totals = &self.pool.totals;
        accrual.remove_order(order)?;

        Ok(ClosedTotals {
            tier,
            outstanding: totals
                .current_staked_outstanding
                .checked_sub(order.principal)
                .ok_or(StakingError::MathOverflow)?,
            tier_staked: totals.tier_staked_amount[tier]
                .checked_sub(order.principal)
                .ok_or(StakingError::MathOverflow)?,
            principal_balance: investor
                .principal_balance
                .checked_sub(order.principal)
                .ok_or(StakingError::MathOverflow)?,
            accrual,
        })
    }

    fn commit_close(&mut self, investor: &mut InvestorAccount, closed: &ClosedTotals) {
        let totals = &mut self.pool.totals;
        totals.current_staked_outstanding = closed.outstanding;
        totals.tier_staked_amount[closed.tier] = closed.tier_staked;
        totals.accrual = closed.accrual;
        investor.principal_balance = closed.principal_balance;
    }

    /// Folds a matured order into the settled part of the accrual totals so
    /// it stops inflating reward owed. Anyone may call this.
    pub fn settle_order(&mut self, order: &mut StakeOrder, now: i64) -> Result<bool> {
        self.guarded(|engine| {
            require!(!order.claimed, StakingError::AlreadyClaimed);
            require!(order.is_matured(now), StakingError::LockPeriodNotEnded);

            let mut updated = order.clone();
            let mut accrual = engine.pool.totals.accrual;
            if !accrual.settle(&mut updated, now)? {
                msg!("Order {} already settled", order.order_id);
                return Ok(false);
            }

            *order = updated;
            engine.pool.totals.accrual = accrual;
            engine.pool.last_updated = now;

            emit!(OrderSettled {
                order_id: order.order_id,
                owner: order.owner,
            });
            msg!("Order {} settled at maturity", order.order_id);
            Ok(true)
        })
    }

    /// Adds reward reserves to the vault. Creates no order.
    pub fn fund(&mut self, funder: &Pubkey, amount: u64, now: i64) -> Result<u64> {
        self.guarded(|engine| {
            require!(amount > 0, StakingError::ZeroAmount);
            let received = engine.vault.transfer_in(amount)?;
            engine.pool.last_updated = now;

            emit!(VaultFunded {
                funder: *funder,
                requested: amount,
                received,
            });
            msg!("Vault funded with {} (received {})", amount, received);
            Ok(received)
        })
    }

    // ========== Admin operations ==========

    /// Pays the authority everything the pool holds beyond what it owes as principal.
    pub fn withdraw_surplus(
        &mut self,
        caller: &Pubkey,
        asset: SurplusAsset<'_>,
        now: i64,
    ) -> Result<u64> {
        self.guarded(|engine| {
            require!(engine.pool.is_authority(caller), StakingError::Unauthorized);

            let (amount, staked_asset) = match asset {
                SurplusAsset::Staked => {
                    let balance = engine.vault.balance()?;
                    let surplus =
                        balance.saturating_sub(engine.pool.totals.current_staked_outstanding);
                    require!(surplus > 0, StakingError::NoSurplus);
                    engine.vault.transfer_out(caller, surplus)?;
                    (surplus, true)
                }
                SurplusAsset::Foreign(foreign) => {
                    let balance = foreign.balance()?;
                    require!(balance > 0, StakingError::NoSurplus);
                    foreign.transfer_out(caller, balance)?;
                    (balance, false)
                }
            };
            engine.pool.last_updated = now;

            emit!(SurplusWithdrawn {
                authority: *caller,
                staked_asset,
                amount,
            });
            msg!("Surplus withdrawn: {}", amount);
            Ok(amount)
        })
    }
}

/// Ledger counters computed ahead of closing an order.
struct ClosedTotals {
    tier: usize,
    outstanding: u64,
    tier_staked: u64,
    principal_balance: u64,
    accrual: AccrualTotals,
}

#[cfg(test)]
mod tests;
