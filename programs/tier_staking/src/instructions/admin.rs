/// Admin instruction handlers.
///
/// Handles authority-only operations on the stake pool.
///
/// ## Security Guarantees
/// - Every handler requires signer == pool.authority, except
///   `accept_authority`, which requires signer == pool.pending_authority
/// - PDA validation ensures correct pool
/// - Surplus withdrawal never touches principal owed to investors

use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::*;
use crate::engine::{admin, SplVault, StakingEngine, SurplusAsset};
use crate::error::StakingError;
use crate::state::StakePool;

/// Accounts required for admin switches.
///
/// ## Security Notes
/// - Authority must be signer
/// - Authority must match stake_pool.authority (has_one constraint)
/// - Pool PDA validated via seeds
#[derive(Accounts)]
pub struct AdminControl<'info> {
    /// The pool authority.
    /// SECURITY: Must be signer AND match pool.authority.
    pub authority: Signer<'info>,

    /// The stake pool to modify.
    /// SECURITY: PDA validation + has_one authority.
    #[account(
        mut,
        seeds = [STAKE_POOL_SEED, stake_pool.staking_mint.as_ref()],
        bump = stake_pool.bump,
        has_one = authority @ StakingError::Unauthorized
    )]
    pub stake_pool: Account<'info, StakePool>,
}

/// Accounts required to accept a pending authority hand-over.
#[derive(Accounts)]
pub struct AcceptAuthority<'info> {
    /// The proposed authority.
    /// SECURITY: Must match pool.pending_authority (checked by the engine).
    pub new_authority: Signer<'info>,

    #[account(
        mut,
        seeds = [STAKE_POOL_SEED, stake_pool.staking_mint.as_ref()],
        bump = stake_pool.bump
    )]
    pub stake_pool: Account<'info, StakePool>,
}

/// Accounts required for withdrawing surplus.
///
/// ## Security Notes
/// - Only the pool authority may withdraw
/// - A foreign asset account must be owned by the pool PDA
/// - Destination must be the authority's account for the withdrawn mint
#[derive(Accounts)]
pub struct WithdrawSurplus<'info> {
    /// The pool authority.
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [STAKE_POOL_SEED, stake_pool.staking_mint.as_ref()],
        bump = stake_pool.bump,
        has_one = authority @ StakingError::Unauthorized,
        has_one = staking_vault,
        has_one = staking_mint
    )]
    pub stake_pool: Account<'info, StakePool>,

    /// The staking token mint.
    pub staking_mint: Account<'info, Mint>,

    /// Pool's staking vault.
    #[account(mut)]
    pub staking_vault: Account<'info, TokenAccount>,

    /// Token account of some other mint held by the pool. When present, its
    /// whole balance is withdrawn instead of the staking vault surplus.
    #[account(
        mut,
        constraint = foreign_asset.owner == stake_pool.key() @ StakingError::InvalidRecipient,
        constraint = foreign_asset.mint != staking_mint.key() @ StakingError::InvalidRecipient
    )]
    pub foreign_asset: Option<Account<'info, TokenAccount>>,

    /// Authority's token account receiving the surplus.
    #[account(
        mut,
        constraint = authority_token_account.owner == authority.key() @ StakingError::InvalidRecipient
    )]
    pub authority_token_account: Account<'info, TokenAccount>,

    /// Token program.
    pub token_program: Program<'info, Token>,
}

/// Enable or disable new stakes.
///
/// # Security
/// - Only pool.authority can call this
/// - Claims, unstakes and emergency withdrawals remain available
///
/// # Arguments
/// * `ctx` - AdminControl accounts context
/// * `enabled` - True to accept new stakes
///
/// # Returns
/// Result indicating success or error
pub fn toggle_staking_handler(ctx: Context<AdminControl>, enabled: bool) -> Result<()> {
    let clock = Clock::get()?;
    let authority = ctx.accounts.authority.key();

    admin::toggle_staking(
        &mut ctx.accounts.stake_pool,
        &authority,
        enabled,
        clock.unix_timestamp,
    )
}

/// Propose a new authority. Takes effect once the proposed key accepts.
///
/// # Arguments
/// * `ctx` - AdminControl accounts context
/// * `new_authority` - Proposed authority pubkey
///
/// # Returns
/// Result indicating success or error
pub fn propose_authority_handler(ctx: Context<AdminControl>, new_authority: Pubkey) -> Result<()> {
    let clock = Clock::get()?;
    let authority = ctx.accounts.authority.key();

    admin::propose_authority(
        &mut ctx.accounts.stake_pool,
        &authority,
        new_authority,
        clock.unix_timestamp,
    )
}

/// Accept a pending authority hand-over.
pub fn accept_authority_handler(ctx: Context<AcceptAuthority>) -> Result<()> {
    let clock = Clock::get()?;
    let caller = ctx.accounts.new_authority.key();

    admin::accept_authority(&mut ctx.accounts.stake_pool, &caller, clock.unix_timestamp)
}

/// Withdraw surplus to the authority.
///
/// # Security
/// - Staking vault: only balance above outstanding principal is released
/// - Foreign asset: the full balance is released
///
/// # Arguments
/// * `ctx` - WithdrawSurplus accounts context
///
/// # Returns
/// Result indicating success or error
pub fn withdraw_surplus_handler(mut ctx: Context<WithdrawSurplus>) -> Result<()> {
    let clock = Clock::get()?;
    let accounts = &mut ctx.accounts;
    let authority = accounts.authority.key();
    let pool_info = accounts.stake_pool.to_account_info();
    let staking_mint = accounts.stake_pool.staking_mint;
    let pool_bump = accounts.stake_pool.bump;
    let destination = accounts.authority_token_account.to_account_info();
    let token_program = accounts.token_program.to_account_info();

    match accounts.foreign_asset.as_mut() {
        Some(foreign_account) => {
            require!(
                accounts.authority_token_account.mint == foreign_account.mint,
                StakingError::InvalidRecipient
            );
            let mut foreign = SplVault {
                vault: foreign_account,
                pool: pool_info.clone(),
                staking_mint,
                pool_bump,
                token_program: token_program.clone(),
                depositor: None,
                payees: vec![(authority, destination.clone())],
            };
            // Staking vault is only read, never debited, on this path.
            let vault = SplVault {
                vault: &mut accounts.staking_vault,
                pool: pool_info,
                staking_mint,
                pool_bump,
                token_program,
                depositor: None,
                payees: Vec::new(),
            };
            let mut engine = StakingEngine::new(&mut accounts.stake_pool, vault);
            engine.withdraw_surplus(
                &authority,
                SurplusAsset::Foreign(&mut foreign),
                clock.unix_timestamp,
            )?;
        }
        None => {
            require!(
                accounts.authority_token_account.mint == staking_mint,
                StakingError::InvalidRecipient
            );
            let vault = SplVault {
                vault: &mut accounts.staking_vault,
                pool: pool_info,
                staking_mint,
                pool_bump,
                token_program,
                depositor: None,
                payees: vec![(authority, destination)],
            };
            let mut engine = StakingEngine::new(&mut accounts.stake_pool, vault);
            engine.withdraw_surplus(&authority, SurplusAsset::Staked, clock.unix_timestamp)?;
        }
    }

    Ok(())
}
