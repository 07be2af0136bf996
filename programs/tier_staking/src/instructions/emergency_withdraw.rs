//! Emergency withdraw instruction handler.
//!
//! Lets investors unwind an order at a principal penalty while the vault is
//! below the required reserve ratio. The penalty goes to the pool authority.

use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::*;
use crate::engine::{SplVault, StakingEngine};
use crate::error::StakingError;
use crate::state::{InvestorAccount, StakeOrder, StakePool};

/// Accounts required for an emergency withdrawal.
#[derive(Accounts)]
#[instruction(order_id: u64)]
pub struct EmergencyWithdraw<'info> {
    /// The investor withdrawing.
    #[account(mut)]
    pub user: Signer<'info>,

    /// The stake pool.
    #[account(
        mut,
        seeds = [STAKE_POOL_SEED, stake_pool.staking_mint.as_ref()],
        bump = stake_pool.bump,
        has_one = staking_vault,
        has_one = staking_mint
    )]
    pub stake_pool: Account<'info, StakePool>,

    /// The order being unwound.
    #[account(
        mut,
        seeds = [ORDER_SEED, stake_pool.key().as_ref(), &order_id.to_le_bytes()],
        bump = order.bump,
        constraint = order.order_id == order_id @ StakingError::OrderNotFound
    )]
    pub order: Account<'info, StakeOrder>,

    /// Investor account.
    #[account(
        mut,
        seeds = [INVESTOR_SEED, stake_pool.key().as_ref(), user.key().as_ref()],
        bump = investor.bump,
        constraint = investor.owner == user.key() @ StakingError::Unauthorized,
        constraint = investor.stake_pool == stake_pool.key()
    )]
    pub investor: Account<'info, InvestorAccount>,

    /// The staking token mint.
    pub staking_mint: Account<'info, Mint>,

    /// User's token account for receiving the reduced principal.
    #[account(
        mut,
        constraint = user_token_account.mint == staking_mint.key() @ StakingError::InvalidRecipient,
        constraint = user_token_account.owner == user.key() @ StakingError::InvalidRecipient
    )]
    pub user_token_account: Account<'info, TokenAccount>,

    /// Authority's token account receiving the penalty.
    #[account(
        mut,
        constraint = authority_token_account.mint == staking_mint.key() @ StakingError::InvalidRecipient,
        constraint = authority_token_account.owner == stake_pool.authority @ StakingError::InvalidRecipient
    )]
    pub authority_token_account: Account<'info, TokenAccount>,

    /// Pool's staking vault.
    #[account(mut)]
    pub staking_vault: Account<'info, TokenAccount>,

    /// Token program.
    pub token_program: Program<'info, Token>,
}

/// Emergency-withdraw an order.
///
/// # Arguments
/// * `ctx` - EmergencyWithdraw accounts context
/// * `_order_id` - Id of the `order` account, checked by its seeds
///
/// # Returns
/// Result indicating success or error
pub fn handler(mut ctx: Context<EmergencyWithdraw>, _order_id: u64) -> Result<()> {
    let clock = Clock::get()?;
    let accounts = &mut ctx.accounts;
    let user = accounts.user.key();
    let authority = accounts.stake_pool.authority;

    let vault = SplVault {
        pool: accounts.stake_pool.to_account_info(),
        staking_mint: accounts.stake_pool.staking_mint,
        pool_bump: accounts.stake_pool.bump,
        token_program: accounts.token_program.to_account_info(),
        depositor: None,
        payees: vec![
            (user, accounts.user_token_account.to_account_info()),
            (authority, accounts.authority_token_account.to_account_info()),
        ],
        vault: &mut accounts.staking_vault,
    };

    let mut engine = StakingEngine::new(&mut accounts.stake_pool, vault);
    engine.emergency_withdraw(
        &user,
        &mut accounts.investor,
        &mut accounts.order,
        clock.unix_timestamp,
    )?;

    Ok(())
}
