//! Stake instruction handler.
//!
//! Handles staking tokens into one of the catalog tiers as a new order.

use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::*;
use crate::engine::{SplVault, StakingEngine};
use crate::error::StakingError;
use crate::state::{InvestorAccount, StakeOrder, StakePool};

/// Accounts required for staking.
#[derive(Accounts)]
pub struct Stake<'info> {
    /// The investor staking tokens.
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

    /// The new order, addressed by the pool's next order id.
    #[account(
        init,
        payer = user,
        space = StakeOrder::LEN,
        seeds = [
            ORDER_SEED,
            stake_pool.key().as_ref(),
            &stake_pool.totals.next_order_id.to_le_bytes()
        ],
        bump
    )]
    pub order: Account<'info, StakeOrder>,

    /// Investor account (created on first stake).
    #[account(
        init_if_needed,
        payer = user,
        space = InvestorAccount::LEN,
        seeds = [INVESTOR_SEED, stake_pool.key().as_ref(), user.key().as_ref()],
        bump
    )]
    pub investor: Account<'info, InvestorAccount>,

    /// The staking token mint.
    pub staking_mint: Account<'info, Mint>,

    /// User's token account for the staking token.
    #[account(
        mut,
        constraint = user_token_account.mint == staking_mint.key() @ StakingError::InvalidRecipient,
        constraint = user_token_account.owner == user.key() @ StakingError::Unauthorized
    )]
    pub user_token_account: Account<'info, TokenAccount>,

    /// Pool's staking vault.
    #[account(mut)]
    pub staking_vault: Account<'info, TokenAccount>,

    /// System program.
    pub system_program: Program<'info, System>,

    /// Token program.
    pub token_program: Program<'info, Token>,
}

/// Stake tokens into the pool.
///
/// # Arguments
/// * `ctx` - Stake accounts context
/// * `amount` - Amount of tokens to stake
/// * `tier` - Catalog tier (0..=4)
/// * `locked` - Whether the order forfeits liquidity for the tier multiplier
///
/// # Returns
/// Result indicating success or error
pub fn handler(mut ctx: Context<Stake>, amount: u64, tier: u8, locked: bool) -> Result<()> {
    let clock = Clock::get()?;
    let investor_bump = ctx.bumps.investor;
    let order_bump = ctx.bumps.order;
    let accounts = &mut ctx.accounts;

    let user = accounts.user.key();
    let pool_key = accounts.stake_pool.key();
    if !accounts.investor.has_ever_staked && accounts.investor.owner == Pubkey::default() {
        accounts
            .investor
            .set_inner(InvestorAccount::new(user, pool_key, investor_bump));
    }

    let vault = SplVault {
        pool: accounts.stake_pool.to_account_info(),
        staking_mint: accounts.stake_pool.staking_mint,
        pool_bump: accounts.stake_pool.bump,
        token_program: accounts.token_program.to_account_info(),
        depositor: Some((
            accounts.user_token_account.to_account_info(),
            accounts.user.to_account_info(),
        )),
        payees: Vec::new(),
        vault: &mut accounts.staking_vault,
    };

    let mut engine = StakingEngine::new(&mut accounts.stake_pool, vault);
    let mut order = engine.stake(
        &user,
        &mut accounts.investor,
        amount,
        tier,
        locked,
        clock.unix_timestamp,
    )?;

    order.bump = order_bump;
    accounts.order.set_inner(order);

    Ok(())
}
