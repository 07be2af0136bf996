//! Token movements in and out of the pool vault.
//!
//! The engine only sees [`TokenVault`]. Deposits are sized by diffing the
//! vault balance around the transfer so that fee-charging mints credit the
//! amount that actually arrived.

use anchor_lang::prelude::*;
use anchor_spl::token::{self, TokenAccount, Transfer};

use crate::constants::STAKE_POOL_SEED;
use crate::error::StakingError;

pub trait TokenVault {
    /// Current holdings of the vault.
    fn balance(&mut self) -> Result<u64>;

    /// Moves `amount` from the depositor into the vault.
    fn pull_from_depositor(&mut self, amount: u64) -> Result<()>;

    /// Moves `amount` from the vault to the token account owned by `to`.
    fn push_to(&mut self, to: &Pubkey, amount: u64) -> Result<()>;

    /// Deposits `amount` and returns what the vault actually received.
    fn transfer_in(&mut self, amount: u64) -> Result<u64> {
        let before = self.balance()?;
        self.pull_from_depositor(amount)?;
        let after = self.balance()?;

        let received = after
            .checked_sub(before)
            .ok_or(StakingError::UnexpectedTransferDelta)?;
        require!(
            received > 0 && received <= amount,
            StakingError::UnexpectedTransferDelta
        );
        Ok(received)
    }

    /// Pays `amount` to `to`; the vault must shrink by exactly that much.
    fn transfer_out(&mut self, to: &Pubkey, amount: u64) -> Result<()> {
        let before = self.balance()?;
        self.push_to(to, amount)?;
        let after = self.balance()?;
        require!(
            before.checked_sub(after) == Some(amount),
            StakingError::UnexpectedTransferDelta
        );
        Ok(())
    }
}

impl<T: TokenVault + ?Sized> TokenVault for &mut T {
    fn balance(&mut self) -> Result<u64> {
        (**self).balance()
    }

    fn pull_from_depositor(&mut self, amount: u64) -> Result<()> {
        (**self).pull_from_depositor(amount)
    }

    fn push_to(&mut self, to: &Pubkey, amount: u64) -> Result<()> {
        (**self).push_to(to, amount)
    }
}

/// SPL token account owned by the stake pool PDA.
pub struct SplVault<'a, 'info> {
    pub vault: &'a mut Account<'info, TokenAccount>,
    /// Stake pool PDA, the vault's token authority.
    pub pool: AccountInfo<'info>,
    pub staking_mint: Pubkey,
    pub pool_bump: u8,
    pub token_program: AccountInfo<'info>,
    /// Source token account and its signing owner, for deposits.
    pub depositor: Option<(AccountInfo<'info>, AccountInfo<'info>)>,
    /// Allowed destinations keyed by the wallet that owns each token account.
    pub payees: Vec<(Pubkey, AccountInfo<'info>)>,
}

impl<'a, 'info> TokenVault for SplVault<'a, 'info> {
    fn balance(&mut self) -> Result<u64> {
        self.vault.reload()?;
        Ok(self.vault.amount)
    }

    fn pull_from_depositor(&mut self, amount: u64) -> Result<()> {
        let (from, authority) = self
            .depositor
            .clone()
            .ok_or(StakingError::InvalidRecipient)?;

        let cpi_accounts = Transfer {
            from,
            to: self.vault.to_account_info(),
            authority,
        };
        let cpi_ctx = CpiContext::new(self.token_program.clone(), cpi_accounts);
        token::transfer(cpi_ctx, amount).map_err(|e| {
            msg!("Deposit transfer failed: {:?}", e);
            error!(StakingError::TransferFailed)
        })
    }

    fn push_to(&mut self, to: &Pubkey, amount: u64) -> Result<()> {
        let destination = self
            .payees
            .iter()
            .find(|(owner, _)| owner == to)
            .map(|(_, account)| account.clone())
            .ok_or(StakingError::InvalidRecipient)?;

        let bump = [self.pool_bump];
        let seeds: &[&[u8]] = &[STAKE_POOL_SEED, self.staking_mint.as_ref(), &bump];
        let signer_seeds = &[seeds];

        let cpi_accounts = Transfer {
            from: self.vault.to_account_info(),
            to: destination,
            authority: self.pool.clone(),
        };
        let cpi_ctx =
            CpiContext::new_with_signer(self.token_program.clone(), cpi_accounts, signer_seeds);
        token::transfer(cpi_ctx, amount).map_err(|e| {
            msg!("Payout transfer failed: {:?}", e);
            error!(StakingError::TransferFailed)
        })
    }
}
