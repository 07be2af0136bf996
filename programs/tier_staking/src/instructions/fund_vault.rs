/// Fund vault instruction handler.
///
/// Handles depositing reward reserves into the pool vault.
///
/// ## Security Guarantees
/// - Vault validation ensures correct PDA
/// - Mint validation prevents wrong token deposits
/// - Anyone can fund (no admin restriction)

use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::*;
use crate::engine::{SplVault, StakingEngine};
use crate::error::StakingError;
use crate::state::StakePool;

/// Accounts required for funding the vault.
///
/// ## Security Notes
/// - Vault must match pool's staking vault
/// - Funder token account must be for the staking mint
#[derive(Accounts)]
pub struct FundVault<'info> {
    /// The funder (anyone can fund - no admin restriction).
    #[account(mut)]
    pub funder: Signer<'info>,

    /// The stake pool.
    /// SECURITY: PDA + has_one validations.
    #[account(
        mut,
        seeds = [STAKE_POOL_SEED, stake_pool.staking_mint.as_ref()],
        bump = stake_pool.bump,
        has_one = staking_vault,
        has_one = staking_mint
    )]
    pub stake_pool: Account<'info, StakePool>,

    /// The staking token mint.
    pub staking_mint: Account<'info, Mint>,

    /// Funder's token account.
    /// SECURITY: Mint and owner validation.
    #[account(
        mut,
        constraint = funder_token_account.mint == staking_mint.key() @ StakingError::InvalidRecipient,
        constraint = funder_token_account.owner == funder.key() @ StakingError::Unauthorized
    )]
    pub funder_token_account: Account<'info, TokenAccount>,

    /// Pool's staking vault.
    #[account(mut)]
    pub staking_vault: Account<'info, TokenAccount>,

    /// Token program.
    pub token_program: Program<'info, Token>,
}

/// Fund the vault with reward reserves.
///
/// # Arguments
/// * `ctx` - FundVault accounts context
/// * `amount` - Amount of tokens to fund
///
/// # Returns
/// Result indicating success or error
pub fn handler(mut ctx: Context<FundVault>, amount: u64) -> Result<()> {
    let clock = Clock::get()?;
    let accounts = &mut ctx.accounts;
    let funder = accounts.funder.key();

    let vault = SplVault {
        pool: accounts.stake_pool.to_account_info(),
        staking_mint: accounts.stake_pool.staking_mint,
        pool_bump: accounts.stake_pool.bump,
        token_program: accounts.token_program.to_account_info(),
        depositor: Some((
            accounts.funder_token_account.to_account_info(),
            accounts.funder.to_account_info(),
        )),
        payees: Vec::new(),
        vault: &mut accounts.staking_vault,
    };

    let mut engine = StakingEngine::new(&mut accounts.stake_pool, vault);
    engine.fund(&funder, amount, clock.unix_timestamp)?;

    msg!("New vault balance: {}", accounts.staking_vault.amount);

    Ok(())
}
