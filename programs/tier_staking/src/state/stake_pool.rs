use anchor_lang::prelude::*;

use crate::constants::*;
use crate::error::StakingError;
use crate::state::{PoolCatalog, StakeOrder};

/// Parameters fixed at initialization.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub catalog: PoolCatalog,
    pub reserve_ratio_percent: u64,
    pub early_exit_penalty_percent: u64,
    pub emergency_penalty_percent: u64,
    pub claim_cooldown: i64,
    pub max_claim_per_tx: u64,
}

impl EngineConfig {
    pub const LEN: usize = PoolCatalog::LEN + 8 * 5;

    pub fn new(max_claim_per_tx: u64) -> Result<Self> {
        require!(max_claim_per_tx > 0, StakingError::ZeroClaimCap);
        Ok(Self {
            catalog: PoolCatalog::canonical(),
            reserve_ratio_percent: RESERVE_RATIO_PERCENT,
            early_exit_penalty_percent: EARLY_EXIT_PENALTY_PERCENT,
            emergency_penalty_percent: EMERGENCY_PENALTY_PERCENT,
            claim_cooldown: CLAIM_COOLDOWN,
            max_claim_per_tx,
        })
    }
}

/// Switches changed only through admin instructions.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OperationalFlags {
    pub staking_enabled: bool,
}

impl OperationalFlags {
    pub const LEN: usize = 1;
}

/// Running sum of reward owed on open orders, maintained without visiting them.
///
/// In units of `1 / ACCRUAL_DENOMINATOR` tokens, at time `t`:
///
/// ```text
/// owed(t) = rate * t - weighted_start + settled - claimed_open * ACCRUAL_DENOMINATOR
/// ```
///
/// Each order contributes `accrual_rate * elapsed`, the unfloored form of its
/// reward, so the total never understates what [`crate::engine::reward`] owes.
/// A matured order keeps accruing here until it is settled.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccrualTotals {
    /// Sum of `accrual_rate` over open orders still accruing.
    pub rate: u128,
    /// Sum of `accrual_rate * start_time` over the same orders.
    pub weighted_start: u128,
    /// Full-term accrual of open orders whose maturity has been settled.
    pub settled: u128,
    /// Reward already paid on orders that are still open.
    pub claimed_open: u64,
}

impl AccrualTotals {
    pub const LEN: usize = 16 * 3 + 8;

    pub fn add_order(&mut self, order: &StakeOrder) -> Result<()> {
        let rate = order.accrual_rate()?;
        self.rate = self.rate.checked_add(rate).ok_or(StakingError::MathOverflow)?;
        self.weighted_start = self
            .weighted_start
            .checked_add(Self::weighted(rate, order.start_time)?)
            .ok_or(StakingError::MathOverflow)?;
        Ok(())
    }

    /// Freezes a matured order at its full-term accrual. Returns false if
    /// there was nothing to settle.
    pub fn settle(&mut self, order: &mut StakeOrder, now: i64) -> Result<bool> {
        if order.claimed || !order.accruing || !order.is_matured(now) {
            return Ok(false);
        }
        let rate = order.accrual_rate()?;
        self.stop_accruing(rate, order.start_time)?;
        self.settled = self
            .settled
            .checked_add(Self::full_term(rate, order)?)
            .ok_or(StakingError::MathOverflow)?;
        order.accruing = false;
        Ok(true)
    }

    pub fn record_claim(&mut self, amount: u64) -> Result<()> {
        self.claimed_open = self
            .claimed_open
            .checked_add(amount)
            .ok_or(StakingError::MathOverflow)?;
        Ok(())
    }

    /// Drops every trace of `order` as it was last recorded here.
    pub fn remove_order(&mut self, order: &StakeOrder) -> Result<()> {
        let rate = order.accrual_rate()?;
        if order.accruing {
            self.stop_accruing(rate, order.start_time)?;
        } else {
            self.settled = self
                .settled
                .checked_sub(Self::full_term(rate, order)?)
                .ok_or(StakingError::MathOverflow)?;
        }
        self.claimed_open = self
            .claimed_open
            .checked_sub(order.claimed_reward)
            .ok_or(StakingError::MathOverflow)?;
        Ok(())
    }

    /// Reward owed across all open orders at `now`, rounded up.
    pub fn owed(&self, now: i64) -> Result<u64> {
        let now = now.max(0) as u128;
        let accrued = self
            .rate
            .checked_mul(now)
            .and_then(|v| v.checked_add(self.settled))
            .ok_or(StakingError::MathOverflow)?;
        let paid = (self.claimed_open as u128)
            .checked_mul(ACCRUAL_DENOMINATOR)
            .and_then(|v| v.checked_add(self.weighted_start))
            .ok_or(StakingError::MathOverflow)?;
        let owed = accrued
            .saturating_sub(paid)
            .checked_add(ACCRUAL_DENOMINATOR - 1)
            .ok_or(StakingError::MathOverflow)?
            / ACCRUAL_DENOMINATOR;
        u64::try_from(owed).map_err(|_| error!(StakingError::MathOverflow))
    }

    fn stop_accruing(&mut self, rate: u128, start_time: i64) -> Result<()> {
        self.rate = self.rate.checked_sub(rate).ok_or(StakingError::MathOverflow)?;
        self.weighted_start = self
            .weighted_start
            .checked_sub(Self::weighted(rate, start_time)?)
            .ok_or(StakingError::MathOverflow)?;
        Ok(())
    }

    fn weighted(rate: u128, start_time: i64) -> Result<u128> {
        require!(start_time >= 0, StakingError::InvalidTimestamp);
        Ok(rate
            .checked_mul(start_time as u128)
            .ok_or(StakingError::MathOverflow)?)
    }

    fn full_term(rate: u128, order: &StakeOrder) -> Result<u128> {
        Ok(rate
            .checked_mul(order.term_seconds() as u128)
            .ok_or(StakingError::MathOverflow)?)
    }
}

/// Global counters of the ledger.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedgerTotals {
    pub next_order_id: u64,
    pub total_staked_ever: u64,
    /// Sum of principal over orders that are not closed.
    pub current_staked_outstanding: u64,
    pub total_distinct_stakers: u64,
    pub total_reward_distributed: u64,
    pub tier_staked_amount: [u64; TIER_COUNT],
    pub tier_staker_count: [u64; TIER_COUNT],
    pub accrual: AccrualTotals,
}

impl LedgerTotals {
    pub const LEN: usize = 8 * 5 + 8 * TIER_COUNT * 2 + AccrualTotals::LEN;

    pub fn new() -> Self {
        Self {
            next_order_id: 1,
            ..Default::default()
        }
    }
}

#[account]
pub struct StakePool {
    pub authority: Pubkey,
    pub pending_authority: Option<Pubkey>,
    pub staking_mint: Pubkey,
    pub staking_vault: Pubkey,

    pub config: EngineConfig,
    pub flags: OperationalFlags,
    pub totals: LedgerTotals,

    /// Held for the duration of every mutating operation.
    pub entered: bool,

    pub last_updated: i64,
    pub created_at: i64,

    pub vault_bump: u8,
    pub bump: u8,
}

impl StakePool {
    pub const LEN: usize = 8
        + 32
        + (1 + 32)
        + (32 * 2)
        + EngineConfig::LEN
        + OperationalFlags::LEN
        + LedgerTotals::LEN
        + 1
        + (8 * 2)
        + 2;

    /// Fresh pool with staking enabled. Bumps are filled in by the caller.
    pub fn new(
        authority: Pubkey,
        staking_mint: Pubkey,
        staking_vault: Pubkey,
        config: EngineConfig,
        now: i64,
    ) -> Self {
        Self {
            authority,
            pending_authority: None,
            staking_mint,
            staking_vault,
            config,
            flags: OperationalFlags {
                staking_enabled: true,
            },
            totals: LedgerTotals::new(),
            entered: false,
            last_updated: now,
            created_at: now,
            vault_bump: 0,
            bump: 0,
        }
    }

    pub fn is_authority(&self, key: &Pubkey) -> bool {
        self.authority == *key
    }

    /// Takes the reentrancy flag. Must be paired with [`StakePool::release`].
    pub fn enter(&mut self) -> Result<()> {
        require!(!self.entered, StakingError::Reentrancy);
        self.entered = true;
        Ok(())
    }

    pub fn release(&mut self) {
        self.entered = false;
    }
}
