//! # Tier Staking Program
//!
//! A single-token, multi-tier staking ledger. Every deposit opens its own
//! order account in one of five tiers:
//!
//! - **Tier 0**: 30-day term, 3.5% APY, 1.1x locked multiplier
//! - **Tier 1**: 180-day term, 6% APY, 1.2x locked multiplier
//! - **Tier 2**: 365-day term, 9% APY, 1.3x locked multiplier
//! - **Tier 3**: 730-day term, 12% APY, 1.4x locked multiplier
//! - **Tier 4**: 1095-day term, 15% APY, 1.5x locked multiplier
//!
//! ## Features
//! - Linear reward accrual per order, clamped at the end of its term
//! - Locked orders earn the tier multiplier but pay an early-exit penalty
//! - Claims throttled by a per-investor cooldown and a per-claim cap
//! - Reserve-ratio solvency gate on every stake and claim, backed by running
//!   accrual totals so no instruction reads other investors' orders
//! - Penalized emergency withdrawal while reserves are insufficient
//! - Two-step authority hand-over and surplus withdrawal
//! - Reentrancy guard and checked math on every mutating path

use anchor_lang::prelude::*;

declare_id!("9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin");

pub mod constants;
pub mod engine;
pub mod error;
pub mod events;
pub mod instructions;
pub mod state;

use instructions::*;

#[program]
pub mod tier_staking {
    use super::*;

    /// Initializes the stake pool and its vault.
    ///
    /// # Arguments
    /// * `ctx` - The context containing all accounts needed for initialization
    /// * `max_claim_per_tx` - Ceiling on a single claim payout
    ///
    /// # Errors
    /// Returns an error if `max_claim_per_tx` is zero.
    pub fn initialize(ctx: Context<Initialize>, max_claim_per_tx: u64) -> Result<()> {
        instructions::initialize::handler(ctx, max_claim_per_tx)
    }

    /// Deposits reward reserves into the vault. Anyone may fund.
    ///
    /// # Errors
    /// Returns an error if amount is zero or nothing arrives in the vault.
    pub fn fund_vault(ctx: Context<FundVault>, amount: u64) -> Result<()> {
        instructions::fund_vault::handler(ctx, amount)
    }

    /// Opens a new stake order.
    ///
    /// # Arguments
    /// * `ctx` - The context containing all accounts needed for staking
    /// * `amount` - Amount of tokens to deposit
    /// * `tier` - Tier id, 0 through 4
    /// * `locked` - Opt into the tier multiplier and early-exit penalty
    ///
    /// # Errors
    /// Returns an error if:
    /// - Staking is disabled
    /// - Amount is zero or above the maximum
    /// - Invalid tier specified
    /// - The investor already holds the maximum number of orders
    /// - Reserves would fall below the required ratio
    pub fn stake(ctx: Context<Stake>, amount: u64, tier: u8, locked: bool) -> Result<()> {
        instructions::stake::handler(ctx, amount, tier, locked)
    }

    /// Claims accrued reward on one order without closing it.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Caller does not own the order, or it is closed
    /// - The claim cooldown is active
    /// - A locked order has not matured
    /// - Nothing is pending
    /// - Paying out would break the reserve ratio
    pub fn claim(ctx: Context<Claim>, order_id: u64) -> Result<()> {
        instructions::claim::handler(ctx, order_id)
    }

    /// Closes an order, paying principal plus reward.
    ///
    /// # Errors
    /// Returns an error if caller does not own the order or it is closed.
    pub fn unstake(ctx: Context<Unstake>, order_id: u64) -> Result<()> {
        instructions::unstake::handler(ctx, order_id)
    }

    /// Closes an order at a principal penalty while reserves are insufficient.
    ///
    /// # Errors
    /// Returns an error if reserves are sufficient.
    pub fn emergency_withdraw(ctx: Context<EmergencyWithdraw>, order_id: u64) -> Result<()> {
        instructions::emergency_withdraw::handler(ctx, order_id)
    }

    /// Folds a matured order into the settled accrual totals. Anyone may call.
    ///
    /// # Errors
    /// Returns an error if the order is closed or has not matured.
    pub fn settle_order(ctx: Context<SettleOrder>, order_id: u64) -> Result<()> {
        instructions::settle::handler(ctx, order_id)
    }

    /// Admin function to enable or disable new stakes.
    pub fn toggle_staking(ctx: Context<AdminControl>, enabled: bool) -> Result<()> {
        instructions::admin::toggle_staking_handler(ctx, enabled)
    }

    /// Admin function to withdraw surplus: staking vault balance above
    /// outstanding principal, or the full balance of a foreign asset.
    ///
    /// # Errors
    /// Returns an error if there is no surplus.
    pub fn withdraw_surplus(ctx: Context<WithdrawSurplus>) -> Result<()> {
        instructions::admin::withdraw_surplus_handler(ctx)
    }

    /// Admin function to propose a new authority.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Caller is not the current admin
    /// - New authority is the zero address
    pub fn propose_authority(ctx: Context<AdminControl>, new_authority: Pubkey) -> Result<()> {
        instructions::admin::propose_authority_handler(ctx, new_authority)
    }

    /// Completes an authority hand-over. Signed by the proposed authority.
    pub fn accept_authority(ctx: Context<AcceptAuthority>) -> Result<()> {
        instructions::admin::accept_authority_handler(ctx)
    }

    /// Returns the pending reward of an order.
    pub fn pending_rewards(ctx: Context<ViewOrder>, order_id: u64) -> Result<u64> {
        instructions::views::pending_rewards_handler(ctx, order_id)
    }

    /// Returns up to `limit` order ids opened by `owner`, starting at `offset`.
    pub fn investor_order_ids(
        ctx: Context<ViewInvestor>,
        owner: Pubkey,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<u64>> {
        instructions::views::investor_order_ids_handler(ctx, owner, offset, limit)
    }

    /// Returns whether the vault holds the required reserve.
    pub fn check_reserves(ctx: Context<ViewPool>) -> Result<bool> {
        instructions::views::check_reserves_handler(ctx)
    }
}
