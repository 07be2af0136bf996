//! Program constants for the Tier Staking program.
//!
//! This module defines all constant values used throughout the staking program,
//! including time periods, the tier table, penalty and reserve rates, and PDA seeds.

/// Seed for deriving the stake pool PDA
pub const STAKE_POOL_SEED: &[u8] = b"stake_pool";

/// Seed for deriving stake order PDAs (one per order id)
pub const ORDER_SEED: &[u8] = b"order";

/// Seed for deriving investor account PDAs
pub const INVESTOR_SEED: &[u8] = b"investor";

/// Seed for deriving the pool vault PDA
pub const POOL_VAULT_SEED: &[u8] = b"pool_vault";

/// Number of seconds in a day
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Number of seconds in a year (365 days)
pub const SECONDS_PER_YEAR: u64 = 365 * 86_400;

/// Fixed-point scale shared by APY and multiplier values (1000 = 100% / 1.000x)
pub const PRECISION: u64 = 1_000;

/// Multiplier applied to unlocked orders (1.000x)
pub const NEUTRAL_MULTIPLIER: u16 = 1_000;

/// Vault holdings must cover outstanding obligations by this percentage
pub const RESERVE_RATIO_PERCENT: u64 = 105;

/// Share of pending reward forfeited when a locked order exits before maturity
pub const EARLY_EXIT_PENALTY_PERCENT: u64 = 5;

/// Share of principal forfeited on emergency exit (2x the early-exit rate)
pub const EMERGENCY_PENALTY_PERCENT: u64 = 2 * EARLY_EXIT_PENALTY_PERCENT;

/// Minimum time between two successful claims by the same investor (7 days)
pub const CLAIM_COOLDOWN: i64 = 7 * SECONDS_PER_DAY;

/// Default ceiling on a single claim payout, independent of tier
pub const DEFAULT_MAX_CLAIM_PER_TX: u64 = 10_000_000_000_000;

/// Largest principal accepted by a single stake
pub const MAX_STAKE_AMOUNT: u64 = 1_000_000_000_000_000_000;

/// Most orders a single investor may open
pub const MAX_ORDERS_PER_INVESTOR: usize = 256;

/// Most order ids returned by one page of the investor order view
/// (Anchor return data is capped at 1024 bytes)
pub const MAX_ORDER_IDS_PER_PAGE: u32 = 100;

/// Divisor turning `principal * apy * multiplier * seconds` into token units
pub const ACCRUAL_DENOMINATOR: u128 =
    PRECISION as u128 * SECONDS_PER_YEAR as u128 * PRECISION as u128;

/// Number of tiers in the catalog
pub const TIER_COUNT: usize = 5;

/// Lockup per tier in days
pub const TIER_LOCKUP_DAYS: [i64; TIER_COUNT] = [30, 180, 365, 730, 1_095];

/// APY per tier, scaled by PRECISION (35 = 3.5%)
pub const TIER_APY: [u16; TIER_COUNT] = [35, 60, 90, 120, 150];

/// Locked-stake multiplier per tier, scaled by PRECISION (1500 = 1.5x)
pub const TIER_MULTIPLIER: [u16; TIER_COUNT] = [1_100, 1_200, 1_300, 1_400, 1_500];

/// Staking tier enum values
pub mod tier {
    /// 30 day lock
    pub const MONTH: u8 = 0;
    /// 180 day lock
    pub const HALF_YEAR: u8 = 1;
    /// 365 day lock
    pub const YEAR: u8 = 2;
    /// 730 day lock
    pub const TWO_YEARS: u8 = 3;
    /// 1095 day lock
    pub const THREE_YEARS: u8 = 4;
}
