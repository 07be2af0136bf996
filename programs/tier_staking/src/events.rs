//! Events emitted for off-chain consumers.

use anchor_lang::prelude::*;

#[event]
pub struct StakeDeposited {
    pub owner: Pubkey,
    pub order_id: u64,
    pub tier_id: u8,
    pub requested: u64,
    pub received: u64,
    pub locked: bool,
    pub end_time: i64,
}

#[event]
pub struct RewardClaimed {
    pub owner: Pubkey,
    pub order_id: u64,
    pub amount: u64,
    pub remaining_pending: u64,
}

#[event]
pub struct Withdrawn {
    pub owner: Pubkey,
    pub order_id: u64,
    pub principal: u64,
    pub reward: u64,
    pub penalty: u64,
}

#[event]
pub struct EmergencyWithdrawn {
    pub owner: Pubkey,
    pub order_id: u64,
    pub paid: u64,
    pub penalty: u64,
    pub authority: Pubkey,
}

#[event]
pub struct StakingToggled {
    pub authority: Pubkey,
    pub enabled: bool,
}

#[event]
pub struct SurplusWithdrawn {
    pub authority: Pubkey,
    pub staked_asset: bool,
    pub amount: u64,
}

#[event]
pub struct VaultFunded {
    pub funder: Pubkey,
    pub requested: u64,
    pub received: u64,
}

#[event]
pub struct AuthorityTransferStarted {
    pub authority: Pubkey,
    pub pending_authority: Pubkey,
}

#[event]
pub struct AuthorityTransferAccepted {
    pub previous_authority: Pubkey,
    pub new_authority: Pubkey,
}

#[event]
pub struct OrderSettled {
    pub order_id: u64,
    pub owner: Pubkey,
}
