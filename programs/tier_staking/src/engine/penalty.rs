//! Early-exit and emergency-exit deductions.

use anchor_lang::prelude::*;

use crate::error::StakingError;

/// Split of an amount into the forfeited part and the part paid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PenaltySplit {
    pub penalty: u64,
    pub payable: u64,
}

fn split(amount: u64, rate_percent: u64) -> Result<PenaltySplit> {
    let penalty = (amount as u128)
        .checked_mul(rate_percent as u128)
        .ok_or(StakingError::MathOverflow)?
        / 100;
    let penalty = u64::try_from(penalty).map_err(|_| error!(StakingError::MathOverflow))?;
    Ok(PenaltySplit {
        penalty,
        payable: amount.checked_sub(penalty).ok_or(StakingError::MathOverflow)?,
    })
}

/// Penalty on the pending reward of a locked order leaving before maturity.
/// Principal is never touched.
pub fn early_exit(pending_reward: u64, rate_percent: u64) -> Result<PenaltySplit> {
    split(pending_reward, rate_percent)
}

/// Penalty on principal for an emergency exit. No reward is paid on this path.
pub fn emergency_exit(principal: u64, rate_percent: u64) -> Result<PenaltySplit> {
    split(principal, rate_percent)
}
