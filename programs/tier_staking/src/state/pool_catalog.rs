use anchor_lang::prelude::*;

use crate::constants::*;
use crate::error::StakingError;

/// One fixed lockup/APY/multiplier configuration.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolDefinition {
    pub tier_id: u8,
    /// Lockup in seconds.
    pub lockup_duration: i64,
    /// Yearly rate scaled by PRECISION.
    pub apy: u16,
    /// Boost for locked orders scaled by PRECISION.
    pub multiplier: u16,
}

impl PoolDefinition {
    pub const LEN: usize = 1 + 8 + 2 + 2;
}

/// Static tier table, fixed when the pool is initialized.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolCatalog {
    pub tiers: [PoolDefinition; TIER_COUNT],
}

impl PoolCatalog {
    pub const LEN: usize = PoolDefinition::LEN * TIER_COUNT;

    /// The five canonical tiers (30d / 180d / 365d / 730d / 1095d).
    pub fn canonical() -> Self {
        let mut tiers = [PoolDefinition {
            tier_id: 0,
            lockup_duration: 0,
            apy: 0,
            multiplier: NEUTRAL_MULTIPLIER,
        }; TIER_COUNT];
        for (i, def) in tiers.iter_mut().enumerate() {
            def.tier_id = i as u8;
            def.lockup_duration = TIER_LOCKUP_DAYS[i] * SECONDS_PER_DAY;
            def.apy = TIER_APY[i];
            def.multiplier = TIER_MULTIPLIER[i];
        }
        Self { tiers }
    }

    pub fn lookup(&self, tier_id: u8) -> Result<&PoolDefinition> {
        self.tiers
            .get(tier_id as usize)
            .ok_or_else(|| error!(StakingError::InvalidTier))
    }

    /// Tier selection by lockup length, as older clients pass the duration.
    pub fn lookup_by_duration(&self, lockup_duration: i64) -> Result<&PoolDefinition> {
        self.tiers
            .iter()
            .find(|def| def.lockup_duration == lockup_duration)
            .ok_or_else(|| error!(StakingError::InvalidTier))
    }
}
