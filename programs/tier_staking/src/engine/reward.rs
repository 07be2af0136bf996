//! Time-weighted reward accrual.
//!
//! Rewards accrue linearly from `start_time` and stop at `end_time`:
//!
//! ```text
//! base  = principal * apy * elapsed / (PRECISION * SECONDS_PER_YEAR)
//! total = base + base * (multiplier - PRECISION) / PRECISION   (locked orders)
//! ```
//!
//! All arithmetic is integer, multiplies before dividing and floors.

use anchor_lang::prelude::*;

use crate::constants::*;
use crate::error::StakingError;
use crate::state::StakeOrder;

/// Seconds of accrual, clamped to the order's lockup window.
pub fn accrual_seconds(order: &StakeOrder, now: i64) -> u64 {
    now.min(order.end_time)
        .saturating_sub(order.start_time)
        .max(0) as u64
}

/// Reward earned since the order opened, ignoring what was already paid.
pub fn total_reward(order: &StakeOrder, now: i64) -> Result<u64> {
    let elapsed = accrual_seconds(order, now) as u128;
    if elapsed == 0 {
        return Ok(0);
    }

    let precision = PRECISION as u128;
    let base = (order.principal as u128)
        .checked_mul(order.apy as u128)
        .ok_or(StakingError::MathOverflow)?
        .checked_mul(elapsed)
        .ok_or(StakingError::MathOverflow)?
        .checked_div(precision * SECONDS_PER_YEAR as u128)
        .ok_or(StakingError::MathOverflow)?;

    let total = if order.locked {
        let boost_bps = (order.multiplier as u128).saturating_sub(precision);
        let boost = base
            .checked_mul(boost_bps)
            .ok_or(StakingError::MathOverflow)?
            / precision;
        base.checked_add(boost).ok_or(StakingError::MathOverflow)?
    } else {
        base
    };

    u64::try_from(total).map_err(|_| error!(StakingError::MathOverflow))
}

/// Reward still owed on the order. Zero once the order is closed.
pub fn pending_reward(order: &StakeOrder, now: i64) -> Result<u64> {
    if order.claimed {
        return Ok(0);
    }
    Ok(total_reward(order, now)?.saturating_sub(order.claimed_reward))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_lang::prelude::Pubkey;
    use proptest::prelude::*;

    fn order(principal: u64, apy: u16, multiplier: u16, locked: bool) -> StakeOrder {
        StakeOrder {
            stake_pool: Pubkey::default(),
            order_id: 1,
            owner: Pubkey::default(),
            principal,
            tier_id: 0,
            apy,
            multiplier,
            start_time: 0,
            end_time: 30 * SECONDS_PER_DAY,
            claimed_reward: 0,
            claimed: false,
            locked,
            accruing: true,
            bump: 0,
        }
    }

    #[test]
    fn test_unlocked_half_term() {
        let o = order(1_000, 35, NEUTRAL_MULTIPLIER, false);
        let now = 15 * SECONDS_PER_DAY;

        // 1000 * 35 * 1_296_000 / (1000 * 31_536_000) = 1.438... -> 1
        let expected = 1_000u128 * 35 * 1_296_000 / (1_000 * 31_536_000);
        assert_eq!(expected, 1);
        assert_eq!(pending_reward(&o, now).unwrap(), expected as u64);
    }

    #[test]
    fn test_locked_boost() {
        let principal = 1_000_000_000u64;
        let o = order(principal, 35, 1_150, true);
        let now = 15 * SECONDS_PER_DAY;

        let base = principal as u128 * 35 * 1_296_000 / (1_000 * 31_536_000);
        let expected = base + base * 150 / 1_000;
        assert_eq!(base, 1_438_356);
        assert_eq!(total_reward(&o, now).unwrap(), expected as u64);
        assert_eq!(expected, 1_654_109);
    }

    #[test]
    fn test_neutral_multiplier_on_locked_order_adds_nothing() {
        let locked = order(5_000_000, 90, NEUTRAL_MULTIPLIER, true);
        let unlocked = order(5_000_000, 90, NEUTRAL_MULTIPLIER, false);
        let now = 20 * SECONDS_PER_DAY;
        assert_eq!(
            total_reward(&locked, now).unwrap(),
            total_reward(&unlocked, now).unwrap()
        );
    }

    #[test]
    fn test_accrual_stops_at_maturity() {
        let o = order(10_000_000, 35, NEUTRAL_MULTIPLIER, false);
        let at_end = pending_reward(&o, o.end_time).unwrap();
        assert_eq!(pending_reward(&o, o.end_time + SECONDS_PER_DAY).unwrap(), at_end);
        assert_eq!(pending_reward(&o, i64::MAX).unwrap(), at_end);
    }

    #[test]
    fn test_claimed_reward_is_subtracted() {
        let mut o = order(10_000_000, 35, NEUTRAL_MULTIPLIER, false);
        let now = 10 * SECONDS_PER_DAY;
        let total = total_reward(&o, now).unwrap();
        o.claimed_reward = total / 2;
        assert_eq!(pending_reward(&o, now).unwrap(), total - total / 2);

        o.claimed_reward = total + 1;
        assert_eq!(pending_reward(&o, now).unwrap(), 0);
    }

    #[test]
    fn test_closed_order_pays_nothing() {
        let mut o = order(10_000_000, 35, NEUTRAL_MULTIPLIER, false);
        o.claimed = true;
        assert_eq!(pending_reward(&o, o.end_time).unwrap(), 0);
    }

    #[test]
    fn test_time_before_start_accrues_nothing() {
        let mut o = order(10_000_000, 35, NEUTRAL_MULTIPLIER, false);
        o.start_time = 1_000;
        o.end_time = 2_000;
        assert_eq!(accrual_seconds(&o, 500), 0);
        assert_eq!(pending_reward(&o, 500).unwrap(), 0);
    }

    #[test]
    fn test_max_principal_does_not_overflow() {
        let mut o = order(u64::MAX, 150, 1_500, true);
        o.end_time = 1_095 * SECONDS_PER_DAY;
        assert!(total_reward(&o, o.end_time).is_ok());
    }

    proptest! {
        #[test]
        fn prop_pending_is_monotonic_until_maturity(
            principal in 1u64..=MAX_STAKE_AMOUNT,
            tier in 0usize..TIER_COUNT,
            locked in any::<bool>(),
            t1 in 0i64..(1_200 * SECONDS_PER_DAY),
            dt in 0i64..(400 * SECONDS_PER_DAY),
        ) {
            let mut o = order(
                principal,
                TIER_APY[tier],
                if locked { TIER_MULTIPLIER[tier] } else { NEUTRAL_MULTIPLIER },
                locked,
            );
            o.end_time = TIER_LOCKUP_DAYS[tier] * SECONDS_PER_DAY;

            let a = pending_reward(&o, t1).unwrap();
            let b = pending_reward(&o, t1 + dt).unwrap();
            prop_assert!(b >= a);
            if t1 >= o.end_time {
                prop_assert_eq!(a, b);
            }
        }
    }
}
