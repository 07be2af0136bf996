//! Reserve-ratio checks.
//!
//! Obligations are outstanding principal plus the reward owed on open
//! orders, read from the pool's running [`AccrualTotals`]; the vault must
//! hold `obligations * reserve_ratio / 100`.

use anchor_lang::prelude::*;

use crate::error::StakingError;
use crate::state::AccrualTotals;

pub struct SolvencyGuard<'a> {
    pub accrual: &'a AccrualTotals,
    pub outstanding: u64,
    pub reserve_ratio_percent: u64,
}

impl<'a> SolvencyGuard<'a> {
    /// Pending reward over every open order. Never below the exact sum.
    pub fn aggregate_pending(&self, now: i64) -> Result<u64> {
        self.accrual.owed(now)
    }

    /// Minimum vault balance backing `obligations`.
    pub fn required_reserves(&self, obligations: u128) -> Result<u128> {
        Ok(obligations
            .checked_mul(self.reserve_ratio_percent as u128)
            .ok_or(StakingError::MathOverflow)?
            / 100)
    }

    pub fn obligations(&self, now: i64) -> Result<u128> {
        Ok(self.outstanding as u128 + self.aggregate_pending(now)? as u128)
    }

    /// Whether `vault_balance` backs already-computed `obligations`.
    pub fn covers(&self, vault_balance: u64, obligations: u128) -> Result<bool> {
        Ok(vault_balance as u128 >= self.required_reserves(obligations)?)
    }

    pub fn check_reserves(&self, vault_balance: u64, now: i64) -> Result<bool> {
        self.covers(vault_balance, self.obligations(now)?)
    }

    /// Reserves after a deposit of `received` that becomes new principal.
    pub fn ensure_after_stake(&self, balance_after: u64, received: u64, now: i64) -> Result<()> {
        let obligations = self.obligations(now)? + received as u128;
        require!(
            self.covers(balance_after, obligations)?,
            StakingError::InsufficientReserves
        );
        Ok(())
    }

    /// Reserves after `payout` of already-accrued reward leaves the vault.
    pub fn ensure_after_claim(&self, balance: u64, payout: u64, now: i64) -> Result<()> {
        let balance_after = balance
            .checked_sub(payout)
            .ok_or(StakingError::InsufficientReserves)?;
        let obligations = self.obligations(now)?.saturating_sub(payout as u128);
        require!(
            self.covers(balance_after, obligations)?,
            StakingError::InsufficientReserves
        );
        Ok(())
    }
}
