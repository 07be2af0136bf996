/// Initialize instruction handler.
///
/// Creates and configures a new staking pool with security validations.
///
/// ## Security Guarantees
/// - Vault is a PDA owned by the stake pool
/// - Mint address is locked to pool state permanently
/// - Tier table and rates are fixed at this point and never change

use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::*;
use crate::error::StakingError;
use crate::state::{EngineConfig, StakePool};

/// Accounts required for pool initialization.
///
/// ## Security Notes
/// - `staking_vault` is a PDA with `stake_pool` as authority
/// - Mint is validated and locked to pool state
#[derive(Accounts)]
pub struct Initialize<'info> {
    /// The admin authority that will control the pool.
    #[account(mut)]
    pub authority: Signer<'info>,

    /// The stake pool account to be created.
    /// SECURITY: PDA derived from STAKE_POOL_SEED + mint ensures uniqueness per token.
    #[account(
        init,
        payer = authority,
        space = StakePool::LEN,
        seeds = [STAKE_POOL_SEED, staking_mint.key().as_ref()],
        bump
    )]
    pub stake_pool: Account<'info, StakePool>,

    /// The mint for the staking token.
    pub staking_mint: Account<'info, Mint>,

    /// The vault holding both staked principal and reward reserves.
    #[account(
        init,
        payer = authority,
        seeds = [POOL_VAULT_SEED, stake_pool.key().as_ref()],
        bump,
        token::mint = staking_mint,
        token::authority = stake_pool
    )]
    pub staking_vault: Account<'info, TokenAccount>,

    /// System program for account creation.
    pub system_program: Program<'info, System>,

    /// Token program for token account operations.
    pub token_program: Program<'info, Token>,

    /// Rent sysvar for rent-exempt calculations.
    pub rent: Sysvar<'info, Rent>,
}

/// Initialize a new staking pool.
///
/// # Arguments
/// * `ctx` - Initialize accounts context
/// * `max_claim_per_tx` - Ceiling on a single claim payout
///
/// # Returns
/// Result indicating success or error
pub fn handler(ctx: Context<Initialize>, max_claim_per_tx: u64) -> Result<()> {
    let config = EngineConfig::new(max_claim_per_tx)?;

    require!(
        ctx.accounts.staking_vault.owner == ctx.accounts.stake_pool.key(),
        StakingError::InvalidRecipient
    );

    let clock = Clock::get()?;

    let mut pool = StakePool::new(
        ctx.accounts.authority.key(),
        ctx.accounts.staking_mint.key(),
        ctx.accounts.staking_vault.key(),
        config,
        clock.unix_timestamp,
    );
    pool.bump = ctx.bumps.stake_pool;
    pool.vault_bump = ctx.bumps.staking_vault;
    ctx.accounts.stake_pool.set_inner(pool);

    msg!("Tier Staking Pool initialized successfully");
    msg!("Admin: {}", ctx.accounts.authority.key());
    msg!("Mint: {}", ctx.accounts.staking_mint.key());
    msg!("Max claim per tx: {}", max_claim_per_tx);
    for def in config.catalog.tiers.iter() {
        msg!(
            "Tier {}: {}d lock, apy {}, multiplier {}",
            def.tier_id,
            def.lockup_duration / SECONDS_PER_DAY,
            def.apy,
            def.multiplier
        );
    }

    Ok(())
}
