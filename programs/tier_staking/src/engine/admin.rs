//! Authority-only switches that never touch the vault.

use anchor_lang::prelude::*;

use crate::error::StakingError;
use crate::events::*;
use crate::state::StakePool;

fn guarded<T>(pool: &mut StakePool, op: impl FnOnce(&mut StakePool) -> Result<T>) -> Result<T> {
    pool.enter()?;
    let result = op(pool);
    pool.release();
    result
}

/// Enables or disables new stakes. Claims and exits are unaffected.
pub fn toggle_staking(pool: &mut StakePool, caller: &Pubkey, enabled: bool, now: i64) -> Result<()> {
    guarded(pool, |pool| {
        require!(pool.is_authority(caller), StakingError::Unauthorized);

        let previous = pool.flags.staking_enabled;
        pool.flags.staking_enabled = enabled;
        pool.last_updated = now;

        emit!(StakingToggled {
            authority: *caller,
            enabled,
        });
        msg!(
            "Staking {} (was {})",
            if enabled { "ENABLED" } else { "DISABLED" },
            if previous { "enabled" } else { "disabled" }
        );
        Ok(())
    })
}

/// First step of an authority hand-over.
pub fn propose_authority(
    pool: &mut StakePool,
    caller: &Pubkey,
    new_authority: Pubkey,
    now: i64,
) -> Result<()> {
    guarded(pool, |pool| {
        require!(pool.is_authority(caller), StakingError::Unauthorized);
        require!(
            new_authority != Pubkey::default(),
            StakingError::InvalidRecipient
        );

        pool.pending_authority = Some(new_authority);
        pool.last_updated = now;

        emit!(AuthorityTransferStarted {
            authority: *caller,
            pending_authority: new_authority,
        });
        msg!("Authority transfer proposed: {} -> {}", caller, new_authority);
        Ok(())
    })
}

/// Second step: the proposed authority takes over.
pub fn accept_authority(pool: &mut StakePool, caller: &Pubkey, now: i64) -> Result<()> {
    guarded(pool, |pool| {
        require!(
            pool.pending_authority == Some(*caller),
            StakingError::NotPendingAuthority
        );

        let previous = pool.authority;
        pool.authority = *caller;
        pool.pending_authority = None;
        pool.last_updated = now;

        emit!(AuthorityTransferAccepted {
            previous_authority: previous,
            new_authority: *caller,
        });
        msg!("Authority transferred: {} -> {}", previous, caller);
        Ok(())
    })
}
