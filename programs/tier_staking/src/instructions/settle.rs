//! Settle order instruction handler.
//!
//! Folds a matured order into the pool's settled accrual so it stops
//! counting towards reward owed. Permissionless.

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::constants::*;
use crate::engine::{SplVault, StakingEngine};
use crate::error::StakingError;
use crate::state::{StakeOrder, StakePool};

/// Accounts required for settling an order.
#[derive(Accounts)]
#[instruction(order_id: u64)]
pub struct SettleOrder<'info> {
    /// Anyone; only pays the transaction fee.
    pub caller: Signer<'info>,

    #[account(
        mut,
        seeds = [STAKE_POOL_SEED, stake_pool.staking_mint.as_ref()],
        bump = stake_pool.bump,
        has_one = staking_vault
    )]
    pub stake_pool: Account<'info, StakePool>,

    /// The matured order.
    #[account(
        mut,
        seeds = [ORDER_SEED, stake_pool.key().as_ref(), &order_id.to_le_bytes()],
        bump = order.bump,
        constraint = order.order_id == order_id @ StakingError::OrderNotFound
    )]
    pub order: Account<'info, StakeOrder>,

    /// Pool's staking vault. Not debited.
    pub staking_vault: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

/// Settle a matured order.
///
/// # Arguments
/// * `ctx` - SettleOrder accounts context
/// * `order_id` - Id of the `order` account, checked by its seeds
///
/// # Returns
/// Result indicating success or error
pub fn handler(mut ctx: Context<SettleOrder>, order_id: u64) -> Result<()> {
    let clock = Clock::get()?;
    let accounts = &mut ctx.accounts;

    let vault = SplVault {
        pool: accounts.stake_pool.to_account_info(),
        staking_mint: accounts.stake_pool.staking_mint,
        pool_bump: accounts.stake_pool.bump,
        token_program: accounts.token_program.to_account_info(),
        depositor: None,
        payees: Vec::new(),
        vault: &mut accounts.staking_vault,
    };

    let mut engine = StakingEngine::new(&mut accounts.stake_pool, vault);
    let settled = engine.settle_order(&mut accounts.order, clock.unix_timestamp)?;

    msg!("Settle order {} by {}: {}", order_id, accounts.caller.key(), settled);
    Ok(())
}
