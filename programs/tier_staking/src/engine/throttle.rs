//! Per-investor claim cooldown, shared across all of the investor's orders.

use anchor_lang::prelude::*;

use crate::error::StakingError;
use crate::state::InvestorAccount;

#[derive(Clone, Copy, Debug)]
pub struct ClaimThrottle {
    pub cooldown: i64,
}

impl ClaimThrottle {
    pub fn new(cooldown: i64) -> Self {
        Self { cooldown }
    }

    pub fn next_allowed(&self, investor: &InvestorAccount) -> i64 {
        investor.last_claim_time.saturating_add(self.cooldown)
    }

    pub fn check(&self, investor: &InvestorAccount, now: i64) -> Result<()> {
        require!(
            now >= self.next_allowed(investor),
            StakingError::ClaimCooldownActive
        );
        Ok(())
    }

    pub fn record(&self, investor: &mut InvestorAccount, now: i64) {
        investor.last_claim_time = now;
    }
}
