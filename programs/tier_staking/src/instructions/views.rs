//! Read-only instructions.
//!
//! These return their result through Anchor return data and never write to
//! any account, so clients can simulate them.

use anchor_lang::prelude::*;
use anchor_spl::token::TokenAccount;

use crate::constants::*;
use crate::engine::reward::pending_reward;
use crate::engine::SolvencyGuard;
use crate::error::StakingError;
use crate::state::{InvestorAccount, StakeOrder, StakePool};

/// Accounts read by the reserve check.
#[derive(Accounts)]
pub struct ViewPool<'info> {
    #[account(
        seeds = [STAKE_POOL_SEED, stake_pool.staking_mint.as_ref()],
        bump = stake_pool.bump,
        has_one = staking_vault
    )]
    pub stake_pool: Account<'info, StakePool>,

    pub staking_vault: Account<'info, TokenAccount>,
}

/// One order of the pool.
#[derive(Accounts)]
#[instruction(order_id: u64)]
pub struct ViewOrder<'info> {
    #[account(
        seeds = [STAKE_POOL_SEED, stake_pool.staking_mint.as_ref()],
        bump = stake_pool.bump
    )]
    pub stake_pool: Account<'info, StakePool>,

    #[account(
        seeds = [ORDER_SEED, stake_pool.key().as_ref(), &order_id.to_le_bytes()],
        bump = order.bump,
        constraint = order.order_id == order_id @ StakingError::OrderNotFound
    )]
    pub order: Account<'info, StakeOrder>,
}

/// The investor account of `owner`.
#[derive(Accounts)]
#[instruction(owner: Pubkey)]
pub struct ViewInvestor<'info> {
    #[account(
        seeds = [STAKE_POOL_SEED, stake_pool.staking_mint.as_ref()],
        bump = stake_pool.bump
    )]
    pub stake_pool: Account<'info, StakePool>,

    #[account(
        seeds = [INVESTOR_SEED, stake_pool.key().as_ref(), owner.as_ref()],
        bump = investor.bump
    )]
    pub investor: Account<'info, InvestorAccount>,
}

/// Reward accrued on an order and not yet paid.
pub fn pending_rewards_handler(ctx: Context<ViewOrder>, order_id: u64) -> Result<u64> {
    let clock = Clock::get()?;
    let pending = pending_reward(&ctx.accounts.order, clock.unix_timestamp)?;

    msg!("Order {} pending reward: {}", order_id, pending);
    Ok(pending)
}

/// A page of the order ids opened by `owner`, open or closed, ascending.
///
/// At most `MAX_ORDER_IDS_PER_PAGE` ids are returned per call; page with
/// `offset` until fewer than `limit` come back.
pub fn investor_order_ids_handler(
    ctx: Context<ViewInvestor>,
    _owner: Pubkey,
    offset: u32,
    limit: u32,
) -> Result<Vec<u64>> {
    let investor = &ctx.accounts.investor;
    msg!("Investor has {} orders", investor.order_ids.len());
    Ok(investor.order_ids_page(offset, limit))
}

/// Whether the vault currently holds the required reserve.
pub fn check_reserves_handler(ctx: Context<ViewPool>) -> Result<bool> {
    let clock = Clock::get()?;
    let pool = &ctx.accounts.stake_pool;
    let guard = SolvencyGuard {
        accrual: &pool.totals.accrual,
        outstanding: pool.totals.current_staked_outstanding,
        reserve_ratio_percent: pool.config.reserve_ratio_percent,
    };
    let balance = ctx.accounts.staking_vault.amount;
    let obligations = guard.obligations(clock.unix_timestamp)?;
    let healthy = guard.covers(balance, obligations)?;

    msg!(
        "Reserves {}: balance {}, obligations {}",
        if healthy { "sufficient" } else { "INSUFFICIENT" },
        balance,
        obligations
    );
    Ok(healthy)
}
