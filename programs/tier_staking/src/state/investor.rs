use anchor_lang::prelude::*;

use crate::constants::{MAX_ORDERS_PER_INVESTOR, MAX_ORDER_IDS_PER_PAGE, TIER_COUNT};

#[account]
pub struct InvestorAccount {
    pub owner: Pubkey,
    pub stake_pool: Pubkey,

    /// Sum of principal over this investor's open orders.
    pub principal_balance: u64,
    pub total_reward_claimed: u64,
    pub last_claim_time: i64,

    pub has_ever_staked: bool,
    pub staked_in_tier: [bool; TIER_COUNT],
    pub bump: u8,

    /// Every order id this investor opened, ascending.
    pub order_ids: Vec<u64>,
}

impl InvestorAccount {
    /// Sized for the full order list up front so the account never reallocs.
    pub const LEN: usize =
        8 + 32 + 32 + 8 + 8 + 8 + 1 + TIER_COUNT + 1 + (4 + 8 * MAX_ORDERS_PER_INVESTOR);

    pub fn new(owner: Pubkey, stake_pool: Pubkey, bump: u8) -> Self {
        Self {
            owner,
            stake_pool,
            principal_balance: 0,
            total_reward_claimed: 0,
            last_claim_time: 0,
            has_ever_staked: false,
            staked_in_tier: [false; TIER_COUNT],
            bump,
            order_ids: Vec::new(),
        }
    }

    pub fn has_order_capacity(&self) -> bool {
        self.order_ids.len() < MAX_ORDERS_PER_INVESTOR
    }

    /// Up to `limit` ids starting at `offset`; `limit` is clamped to one page.
    pub fn order_ids_page(&self, offset: u32, limit: u32) -> Vec<u64> {
        self.order_ids
            .iter()
            .skip(offset as usize)
            .take(limit.min(MAX_ORDER_IDS_PER_PAGE) as usize)
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_orders(count: u64) -> InvestorAccount {
        let mut investor = InvestorAccount::new(Pubkey::new_unique(), Pubkey::new_unique(), 255);
        investor.order_ids = (1..=count).collect();
        investor
    }

    #[test]
    fn test_len_fits_full_order_list() {
        let investor = with_orders(MAX_ORDERS_PER_INVESTOR as u64);
        assert_eq!(investor.try_to_vec().unwrap().len() + 8, InvestorAccount::LEN);
        assert!(!investor.has_order_capacity());
        assert!(with_orders(MAX_ORDERS_PER_INVESTOR as u64 - 1).has_order_capacity());
    }

    #[test]
    fn test_order_ids_page_is_clamped() {
        let investor = with_orders(250);

        let first = investor.order_ids_page(0, u32::MAX);
        assert_eq!(first.len(), MAX_ORDER_IDS_PER_PAGE as usize);
        assert_eq!(first[0], 1);
        // return data holds a 4-byte length plus the ids
        assert!(4 + 8 * first.len() <= 1024);

        assert_eq!(investor.order_ids_page(240, 5), vec![241, 242, 243, 244, 245]);
        assert_eq!(investor.order_ids_page(248, 10), vec![249, 250]);
        assert!(investor.order_ids_page(500, 10).is_empty());
    }
}
