use anchor_lang::prelude::*;

use crate::constants::NEUTRAL_MULTIPLIER;
use crate::error::StakingError;
use crate::state::PoolDefinition;

/// One stake deposit, stored in its own PDA keyed by `order_id`.
///
/// Only `claimed_reward`, `claimed` and `accruing` change after creation.
#[account]
#[derive(Debug, PartialEq, Eq)]
pub struct StakeOrder {
    pub stake_pool: Pubkey,
    pub order_id: u64,
    pub owner: Pubkey,

    pub principal: u64,
    pub tier_id: u8,
    pub apy: u16,
    pub multiplier: u16,

    pub start_time: i64,
    pub end_time: i64,

    pub claimed_reward: u64,
    pub claimed: bool,
    pub locked: bool,
    /// Counted at its per-second rate in the pool's accrual totals.
    /// Cleared once maturity has been settled into the totals.
    pub accruing: bool,
    pub bump: u8,
}

impl StakeOrder {
    pub const LEN: usize = 8 + 32 + 8 + 32 + 8 + 1 + 2 + 2 + 8 + 8 + 8 + 1 + 1 + 1 + 1;

    /// A fresh order. The PDA bump is filled in by the caller.
    pub fn open(
        stake_pool: Pubkey,
        order_id: u64,
        owner: Pubkey,
        principal: u64,
        pool: &PoolDefinition,
        locked: bool,
        now: i64,
    ) -> Result<Self> {
        require!(principal > 0, StakingError::ZeroAmount);
        let end_time = now
            .checked_add(pool.lockup_duration)
            .ok_or(StakingError::InvalidTimestamp)?;

        Ok(Self {
            stake_pool,
            order_id,
            owner,
            principal,
            tier_id: pool.tier_id,
            apy: pool.apy,
            multiplier: if locked {
                pool.multiplier
            } else {
                NEUTRAL_MULTIPLIER
            },
            start_time: now,
            end_time,
            claimed_reward: 0,
            claimed: false,
            locked,
            accruing: true,
            bump: 0,
        })
    }

    pub fn is_matured(&self, now: i64) -> bool {
        now >= self.end_time
    }

    /// `principal * apy * multiplier`; divided by `ACCRUAL_DENOMINATOR`
    /// this is the reward earned per second.
    pub fn accrual_rate(&self) -> Result<u128> {
        Ok((self.principal as u128)
            .checked_mul(self.apy as u128)
            .ok_or(StakingError::MathOverflow)?
            .checked_mul(self.multiplier as u128)
            .ok_or(StakingError::MathOverflow)?)
    }

    pub fn term_seconds(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time).max(0) as u64
    }

    /// One-way transition into the closed state.
    pub fn mark_claimed(&mut self) -> Result<()> {
        require!(!self.claimed, StakingError::AlreadyClaimed);
        self.claimed = true;
        Ok(())
    }
}
